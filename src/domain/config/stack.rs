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

//! Stack configuration file model (`gke-at-scale.toml`)

use crate::infrastructure::constants::*;
use crate::shared::error::PlanError;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

// ============================================================================
// Stack configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConf {
    pub project: Option<String>,
    pub prefix: Option<String>,
    pub domain: Option<String>,
    pub services: Vec<String>,
    pub identity_pool_revision: u32,
    pub regions: RegionsConf,
    pub node_pool: NodePoolConf,
    pub mesh: MeshConf,
    pub charts: ChartsConf,
    pub app: AppConf,
    pub fleet: FleetConf,
}

impl Default for StackConf {
    fn default() -> Self {
        Self {
            project: None,
            prefix: None,
            domain: None,
            services: DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect(),
            identity_pool_revision: 0,
            regions: RegionsConf::default(),
            node_pool: NodePoolConf::default(),
            mesh: MeshConf::default(),
            charts: ChartsConf::default(),
            app: AppConf::default(),
            fleet: FleetConf::default(),
        }
    }
}

impl StackConf {
    /// Load configuration from TOML file
    pub fn from<P: AsRef<Path>>(path: P) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|e| {
            PlanError::config_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, PlanError> {
        let conf: Self = toml::from_str(content)?;
        Ok(conf)
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Overrides the catalog's enabled flags when `enabled` is set
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RegionsConf {
    pub enabled: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodePoolConf {
    pub machine_type: String,
    pub min_nodes: u32,
    pub max_nodes: u32,
    pub location_policy: String,
    pub preemptible: bool,
}

impl Default for NodePoolConf {
    fn default() -> Self {
        Self {
            machine_type: DEFAULT_MACHINE_TYPE.to_string(),
            min_nodes: DEFAULT_MIN_NODES,
            max_nodes: DEFAULT_MAX_NODES,
            location_policy: DEFAULT_LOCATION_POLICY.to_string(),
            preemptible: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MeshConf {
    pub repository: String,
    pub namespace: String,
    pub revision: String,
}

impl Default for MeshConf {
    fn default() -> Self {
        Self {
            repository: ISTIO_REPOSITORY.to_string(),
            namespace: ISTIO_NAMESPACE.to_string(),
            revision: ISTIO_DEFAULT_REVISION.to_string(),
        }
    }
}

/// Local charts shipped with the application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChartsConf {
    pub path: String,
    pub version: String,
}

impl Default for ChartsConf {
    fn default() -> Self {
        Self {
            path: DEFAULT_CHART_PATH.to_string(),
            version: DEFAULT_CHART_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConf {
    pub namespace: String,
    pub customer: String,
    pub color_primary: String,
    pub color_secondary: String,
    pub color_background: String,
    pub platform: String,
}

impl Default for AppConf {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_APP_NAMESPACE.to_string(),
            customer: DEFAULT_CUSTOMER.to_string(),
            color_primary: DEFAULT_COLOR_PRIMARY.to_string(),
            color_secondary: DEFAULT_COLOR_SECONDARY.to_string(),
            color_background: DEFAULT_COLOR_BACKGROUND.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }
}

/// Fleet mesh feature, Artifact Registry repository and per-cluster setup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FleetConf {
    pub enabled: bool,
    pub registry_location: String,
    pub registry_id: String,
    pub setup_script: String,
    pub teardown_script: String,
}

impl Default for FleetConf {
    fn default() -> Self {
        Self {
            enabled: false,
            registry_location: DEFAULT_REGISTRY_LOCATION.to_string(),
            registry_id: DEFAULT_REGISTRY_ID.to_string(),
            setup_script: DEFAULT_SETUP_SCRIPT.to_string(),
            teardown_script: DEFAULT_TEARDOWN_SCRIPT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let conf = StackConf::from_toml("").unwrap();
        assert!(conf.project.is_none());
        assert_eq!(conf.services, vec!["compute.googleapis.com", "container.googleapis.com"]);
        assert_eq!(conf.node_pool, NodePoolConf::default());
        assert_eq!(conf.app.namespace, "app-team");
    }

    #[test]
    fn test_partial_sections() {
        let conf = StackConf::from_toml(
            r#"
            project = "demo-project"
            prefix = "gas"
            domain = "example.com"

            [regions]
            enabled = ["us-central1"]

            [node_pool]
            max_nodes = 3
            "#,
        )
        .unwrap();

        assert_eq!(conf.project.as_deref(), Some("demo-project"));
        assert_eq!(conf.domain.as_deref(), Some("example.com"));
        assert_eq!(conf.regions.enabled, Some(vec!["us-central1".to_string()]));
        assert_eq!(conf.node_pool.max_nodes, 3);
        assert_eq!(conf.node_pool.min_nodes, 1);
        assert_eq!(conf.node_pool.machine_type, "e2-medium");
        assert!(!conf.fleet.enabled);
    }

    #[test]
    fn test_fleet_section() {
        let conf = StackConf::from_toml(
            r#"
            [fleet]
            enabled = true
            registry_location = "us"
            "#,
        )
        .unwrap();

        assert!(conf.fleet.enabled);
        assert_eq!(conf.fleet.registry_location, "us");
        assert_eq!(conf.fleet.registry_id, "gke-at-scale");
        assert_eq!(conf.fleet.setup_script, "./gke-config/setup.sh");
    }

    #[test]
    fn test_invalid_toml() {
        let err = StackConf::from_toml("project = ").unwrap_err();
        assert!(matches!(err, PlanError::TomlParse(_)));
    }
}
