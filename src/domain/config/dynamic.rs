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

use crate::domain::config::platform::PlannerConfig;
use crate::shared::error::PlanError;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

/// Keys understood by `-D key=value`
pub const DYNAMIC_KEYS: &[&str] = &[
    "gcp.project",
    "stack.prefix",
    "stack.domain",
    "services",
    "regions.enabled",
    "identity-pool.revision",
    "node-pool.machine-type",
    "node-pool.min-nodes",
    "node-pool.max-nodes",
    "node-pool.location-policy",
    "node-pool.preemptible",
    "mesh.repository",
    "mesh.namespace",
    "mesh.revision",
    "charts.path",
    "charts.version",
    "app.namespace",
    "app.customer",
    "app.color-primary",
    "app.color-secondary",
    "app.color-background",
    "app.platform",
    "fleet.enabled",
    "fleet.registry-location",
    "fleet.registry-id",
    "fleet.setup-script",
    "fleet.teardown-script",
];

pub fn apply_to_planner_config(
    configs: &HashMap<String, String>,
    config: &mut PlannerConfig,
) -> Result<(), PlanError> {
    for key in configs.keys() {
        if !DYNAMIC_KEYS.contains(&key.as_str()) {
            warn!("Ignoring unknown dynamic config key: {}", key);
        }
    }

    if let Some(project) = configs.get("gcp.project") {
        config.project = project.clone();
    }

    if let Some(prefix) = configs.get("stack.prefix") {
        config.prefix = prefix.clone();
    }

    if let Some(domain) = configs.get("stack.domain") {
        *config = config.clone().with_domain(Some(domain.clone()));
    }

    if let Some(services) = configs.get("services") {
        config.services = split_list(services);
    }

    if let Some(regions) = configs.get("regions.enabled") {
        config.enabled_regions = Some(split_list(regions));
    }

    if let Some(revision) = configs.get("identity-pool.revision") {
        config.identity_pool_revision = parse_value("identity-pool.revision", revision)?;
    }

    if let Some(machine_type) = configs.get("node-pool.machine-type") {
        config.node_pool.machine_type = machine_type.clone();
    }

    if let Some(min) = configs.get("node-pool.min-nodes") {
        config.node_pool.min_nodes = parse_value("node-pool.min-nodes", min)?;
    }

    if let Some(max) = configs.get("node-pool.max-nodes") {
        config.node_pool.max_nodes = parse_value("node-pool.max-nodes", max)?;
    }

    if let Some(policy) = configs.get("node-pool.location-policy") {
        config.node_pool.location_policy = policy.clone();
    }

    if let Some(preemptible) = configs.get("node-pool.preemptible") {
        config.node_pool.preemptible = parse_value("node-pool.preemptible", preemptible)?;
    }

    if let Some(repository) = configs.get("mesh.repository") {
        config.mesh.repository = repository.clone();
    }

    if let Some(namespace) = configs.get("mesh.namespace") {
        config.mesh.namespace = namespace.clone();
    }

    if let Some(revision) = configs.get("mesh.revision") {
        config.mesh.revision = revision.clone();
    }

    if let Some(path) = configs.get("charts.path") {
        config.charts.path = path.clone();
    }

    if let Some(version) = configs.get("charts.version") {
        config.charts.version = version.clone();
    }

    if let Some(namespace) = configs.get("app.namespace") {
        config.app.namespace = namespace.clone();
    }

    if let Some(customer) = configs.get("app.customer") {
        config.app.customer = customer.clone();
    }

    if let Some(color) = configs.get("app.color-primary") {
        config.app.color_primary = color.clone();
    }

    if let Some(color) = configs.get("app.color-secondary") {
        config.app.color_secondary = color.clone();
    }

    if let Some(color) = configs.get("app.color-background") {
        config.app.color_background = color.clone();
    }

    if let Some(platform) = configs.get("app.platform") {
        config.app.platform = platform.clone();
    }

    if let Some(enabled) = configs.get("fleet.enabled") {
        config.fleet.enabled = parse_value("fleet.enabled", enabled)?;
    }

    if let Some(location) = configs.get("fleet.registry-location") {
        config.fleet.registry_location = location.clone();
    }

    if let Some(id) = configs.get("fleet.registry-id") {
        config.fleet.registry_id = id.clone();
    }

    if let Some(script) = configs.get("fleet.setup-script") {
        config.fleet.setup_script = script.clone();
    }

    if let Some(script) = configs.get("fleet.teardown-script") {
        config.fleet.teardown_script = script.clone();
    }

    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, PlanError> {
    value.trim().parse::<T>().map_err(|_| {
        PlanError::config_error(format!("Invalid value '{}' for dynamic config {}", value, key))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = PlannerConfig::new("demo", "gas", None);
        apply_to_planner_config(
            &configs(&[
                ("stack.domain", "shop.example.com"),
                ("regions.enabled", "us-central1, us-east4"),
                ("node-pool.max-nodes", "9"),
                ("app.customer", "Acme"),
            ]),
            &mut config,
        )
        .unwrap();

        assert_eq!(config.domain.as_deref(), Some("shop.example.com"));
        assert_eq!(
            config.enabled_regions,
            Some(vec!["us-central1".to_string(), "us-east4".to_string()])
        );
        assert_eq!(config.node_pool.max_nodes, 9);
        assert_eq!(config.app.customer, "Acme");
    }

    #[test]
    fn test_blank_domain_override_clears_domain() {
        let mut config = PlannerConfig::new("demo", "gas", Some("example.com".to_string()));
        apply_to_planner_config(&configs(&[("stack.domain", "")]), &mut config).unwrap();
        assert!(config.domain.is_none());
    }

    #[test]
    fn test_fleet_overrides() {
        let mut config = PlannerConfig::new("demo", "gas", None);
        let configs: HashMap<String, String> = [
            ("fleet.enabled", "true"),
            ("fleet.registry-location", "us"),
            ("fleet.registry-id", "images"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        apply_to_planner_config(&configs, &mut config).unwrap();
        assert!(config.fleet.enabled);
        assert_eq!(config.fleet.registry_location, "us");
        assert_eq!(config.fleet.registry_id, "images");
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let mut config = PlannerConfig::new("demo", "gas", None);
        let err = apply_to_planner_config(&configs(&[("node-pool.min-nodes", "many")]), &mut config)
            .unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("node-pool.min-nodes"));
    }
}
