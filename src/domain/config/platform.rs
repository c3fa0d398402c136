// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::config::stack::{
    AppConf, ChartsConf, FleetConf, MeshConf, NodePoolConf, StackConf,
};
use crate::domain::region::RegionCatalog;
use crate::infrastructure::constants::{
    DEFAULT_SERVICES, FLEET_SERVICES, MAX_PREFIX_LEN, RESERVED_POOL_PREFIX,
};
use crate::shared::error::PlanError;
use regex::Regex;
use std::collections::HashSet;
use tracing::info;

const PREFIX_PATTERN: &str = r"^[a-z][a-z0-9-]*$";
const DOMAIN_PATTERN: &str = r"^(?i)([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$";

/// Resolved configuration for one planning pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub project: String,
    pub prefix: String,
    pub domain: Option<String>,
    pub services: Vec<String>,
    pub identity_pool_revision: u32,
    pub enabled_regions: Option<Vec<String>>,
    pub node_pool: NodePoolConf,
    pub mesh: MeshConf,
    pub charts: ChartsConf,
    pub app: AppConf,
    pub fleet: FleetConf,
}

impl PlannerConfig {
    pub fn new(project: impl Into<String>, prefix: impl Into<String>, domain: Option<String>) -> Self {
        Self {
            project: project.into(),
            prefix: prefix.into(),
            domain: normalize_domain(domain),
            services: DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect(),
            identity_pool_revision: 0,
            enabled_regions: None,
            node_pool: NodePoolConf::default(),
            mesh: MeshConf::default(),
            charts: ChartsConf::default(),
            app: AppConf::default(),
            fleet: FleetConf::default(),
        }
    }

    /// Missing project or prefix resolve to empty strings and are reported by `validate`.
    pub fn from_stack(conf: &StackConf) -> Self {
        Self {
            project: conf.project.clone().unwrap_or_default(),
            prefix: conf.prefix.clone().unwrap_or_default(),
            domain: normalize_domain(conf.domain.clone()),
            services: conf.services.clone(),
            identity_pool_revision: conf.identity_pool_revision,
            enabled_regions: conf.regions.enabled.clone(),
            node_pool: conf.node_pool.clone(),
            mesh: conf.mesh.clone(),
            charts: conf.charts.clone(),
            app: conf.app.clone(),
            fleet: conf.fleet.clone(),
        }
    }

    pub fn with_domain(mut self, domain: Option<String>) -> Self {
        self.domain = normalize_domain(domain);
        self
    }

    pub fn with_enabled_regions(mut self, regions: Vec<String>) -> Self {
        self.enabled_regions = Some(regions);
        self
    }

    pub fn has_domain(&self) -> bool {
        self.domain.is_some()
    }

    /// Configured APIs, followed by the fleet APIs not already listed when
    /// fleet features are on.
    pub fn required_services(&self) -> Vec<String> {
        let mut services = self.services.clone();
        if self.fleet.enabled {
            for service in FLEET_SERVICES {
                if !services.iter().any(|s| s == service) {
                    services.push(service.to_string());
                }
            }
        }
        services
    }

    /// The built-in catalog with the configured enabled set applied.
    pub fn catalog(&self) -> Result<RegionCatalog, PlanError> {
        let catalog = RegionCatalog::default();
        match &self.enabled_regions {
            Some(names) => catalog.with_enabled(names),
            None => Ok(catalog),
        }
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.project.trim().is_empty() {
            return Err(PlanError::config_error(
                "[project] - No GCP project set; a project id is mandatory".to_string(),
            ));
        }

        if self.prefix.is_empty() {
            return Err(PlanError::config_error(
                "[prefix] - No prefix has been provided; please set a prefix (3-5 characters long), it is mandatory"
                    .to_string(),
            ));
        }

        if self.prefix.chars().count() > MAX_PREFIX_LEN {
            return Err(PlanError::config_error(format!(
                "[prefix] - Prefix '{}' must be at most {} characters in length",
                self.prefix, MAX_PREFIX_LEN
            )));
        }

        if !matches_pattern(PREFIX_PATTERN, &self.prefix)? {
            return Err(PlanError::config_error(format!(
                "[prefix] - Prefix '{}' must start with a lowercase letter and contain only lowercase letters, digits or hyphens",
                self.prefix
            )));
        }

        // Workload identity pool ids may not start with "gcp-".
        if format!("{}-", self.prefix).starts_with(RESERVED_POOL_PREFIX) {
            return Err(PlanError::config_error(format!(
                "[prefix] - Prefix '{}' would produce a workload identity pool id starting with the reserved '{}'",
                self.prefix, RESERVED_POOL_PREFIX
            )));
        }

        if let Some(domain) = &self.domain {
            if !matches_pattern(DOMAIN_PATTERN, domain)? {
                return Err(PlanError::config_error(format!(
                    "[domain] - '{}' is not a valid DNS name",
                    domain
                )));
            }
        }

        if self.services.is_empty() || self.services.iter().any(|s| s.trim().is_empty()) {
            return Err(PlanError::config_error(
                "[services] - At least one API must be enabled and names must not be empty"
                    .to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = self.services.iter().find(|s| !seen.insert(s.trim())) {
            return Err(PlanError::config_error(format!(
                "[services] - API '{}' is listed more than once",
                duplicate
            )));
        }

        if self.node_pool.min_nodes == 0 {
            return Err(PlanError::config_error(
                "[node_pool.min_nodes] - must be > 0".to_string(),
            ));
        }

        if self.node_pool.min_nodes > self.node_pool.max_nodes {
            return Err(PlanError::config_error(format!(
                "[node_pool] - min_nodes ({}) must not exceed max_nodes ({})",
                self.node_pool.min_nodes, self.node_pool.max_nodes
            )));
        }

        if self.node_pool.machine_type.trim().is_empty() {
            return Err(PlanError::config_error(
                "[node_pool.machine_type] - must not be empty".to_string(),
            ));
        }

        if !is_valid_k8s_name(&self.app.namespace) {
            return Err(PlanError::config_error(format!(
                "[app.namespace] - Invalid namespace: {}",
                self.app.namespace
            )));
        }

        if !is_valid_k8s_name(&self.mesh.namespace) {
            return Err(PlanError::config_error(format!(
                "[mesh.namespace] - Invalid namespace: {}",
                self.mesh.namespace
            )));
        }

        if self.charts.version.trim().is_empty() {
            return Err(PlanError::config_error(
                "[charts.version] - must not be empty".to_string(),
            ));
        }

        if self.fleet.enabled {
            if !is_valid_k8s_name(&self.fleet.registry_id) {
                return Err(PlanError::config_error(format!(
                    "[fleet.registry_id] - Invalid repository id: {}",
                    self.fleet.registry_id
                )));
            }
            if self.fleet.registry_location.trim().is_empty() {
                return Err(PlanError::config_error(
                    "[fleet.registry_location] - must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Logs the decisions derived from the configuration.
    pub fn log_summary(&self) {
        info!(
            "[CONFIGURATION] - Prefix: {} has been provided; all Google Cloud resource names will be prefixed",
            self.prefix
        );
        match &self.domain {
            Some(domain) => {
                info!(
                    "[CONFIGURATION] - Domain: '{}' has been provided; SSL certificates will be configured for this domain",
                    domain
                );
                info!(
                    "[CONFIGURATION] - DNS: the domain '{}' must point to the IP address of the global load balancer",
                    domain
                );
            }
            None => info!(
                "[CONFIGURATION] - No domain has been provided; HTTPS will not be enabled for this deployment"
            ),
        }
        if self.fleet.enabled {
            info!(
                "[CONFIGURATION] - Fleet: mesh feature, Artifact Registry '{}' and per-cluster setup will be declared",
                self.fleet.registry_id
            );
        }
    }
}

fn normalize_domain(domain: Option<String>) -> Option<String> {
    domain
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn matches_pattern(pattern: &str, value: &str) -> Result<bool, PlanError> {
    let re = Regex::new(pattern)
        .map_err(|e| PlanError::config_error(format!("Invalid pattern {}: {}", pattern, e)))?;
    Ok(re.is_match(value))
}

pub(crate) fn is_valid_k8s_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 63 {
        return false;
    }

    if !name.chars().next().unwrap_or(' ').is_ascii_alphanumeric() {
        return false;
    }
    if !name.chars().last().unwrap_or(' ').is_ascii_alphanumeric() {
        return false;
    }

    name.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PlannerConfig {
        PlannerConfig::new("demo-project", "gas", None)
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
        assert!(valid()
            .with_domain(Some("app.example.com".to_string()))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_missing_project() {
        let err = PlannerConfig::new("", "gas", None).validate().unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("project"));
    }

    #[test]
    fn test_prefix_rules() {
        let err = PlannerConfig::new("p", "", None).validate().unwrap_err();
        assert!(err.to_string().contains("prefix"));

        let err = PlannerConfig::new("p", "toolong", None).validate().unwrap_err();
        assert!(err.to_string().contains("at most 5"));

        assert!(PlannerConfig::new("p", "abcde", None).validate().is_ok());
        assert!(PlannerConfig::new("p", "Gas", None).validate().is_err());
        assert!(PlannerConfig::new("p", "1gas", None).validate().is_err());
    }

    #[test]
    fn test_reserved_pool_prefix() {
        let err = PlannerConfig::new("p", "gcp", None).validate().unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("reserved"));

        let err = PlannerConfig::new("p", "gcp-a", None).validate().unwrap_err();
        assert!(err.is_config_error());

        assert!(PlannerConfig::new("p", "gcpx", None).validate().is_ok());
    }

    #[test]
    fn test_duplicate_services() {
        let mut config = valid();
        config.services = vec![
            "compute.googleapis.com".to_string(),
            "container.googleapis.com".to_string(),
            " compute.googleapis.com".to_string(),
        ];
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("[services]"));
    }

    #[test]
    fn test_required_services_with_fleet() {
        let mut config = valid();
        assert_eq!(config.required_services(), config.services);

        config.services.push("mesh.googleapis.com".to_string());
        config.fleet.enabled = true;
        let services = config.required_services();
        assert_eq!(
            services.iter().filter(|s| *s == "mesh.googleapis.com").count(),
            1
        );
        assert!(services.contains(&"gkehub.googleapis.com".to_string()));
        assert!(config.validate().is_ok());

        config.fleet.registry_id = "Bad_Id".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("[fleet.registry_id]"));
    }

    #[test]
    fn test_blank_domain_is_absent() {
        let config = valid().with_domain(Some("   ".to_string()));
        assert!(!config.has_domain());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_domain() {
        let err = valid()
            .with_domain(Some("not a domain".to_string()))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("[domain]"));
    }

    #[test]
    fn test_node_pool_bounds() {
        let mut config = valid();
        config.node_pool.min_nodes = 6;
        assert!(config.validate().is_err());

        config.node_pool.min_nodes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_stack() {
        let mut conf = StackConf::default();
        conf.project = Some("demo".to_string());
        conf.prefix = Some("gas".to_string());
        conf.domain = Some(String::new());
        conf.regions.enabled = Some(vec!["us-east4".to_string()]);

        let config = PlannerConfig::from_stack(&conf);
        assert_eq!(config.project, "demo");
        assert!(config.domain.is_none());

        let catalog = config.catalog().unwrap();
        let enabled: Vec<_> = catalog.enabled().iter().map(|r| r.region.clone()).collect();
        assert_eq!(enabled, vec!["us-east4".to_string()]);
    }

    #[test]
    fn test_k8s_names() {
        assert!(is_valid_k8s_name("app-team"));
        assert!(!is_valid_k8s_name("App-Team"));
        assert!(!is_valid_k8s_name("-app"));
        assert!(!is_valid_k8s_name(""));
    }
}
