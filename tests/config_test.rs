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
use gke_at_scale::domain::config::apply_to_planner_config;
use gke_at_scale::domain::plan::PlanFormat;
use gke_at_scale::*;
use std::collections::HashMap;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn write_stack(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_stack_file_to_planner_config() {
    let file = write_stack(
        r#"
project = "demo-project"
prefix = "gas"
domain = "app.example.com"
identity_pool_revision = 2

[regions]
enabled = ["us-central1", "me-west1"]

[node_pool]
machine_type = "e2-standard-4"
max_nodes = 4

[app]
customer = "Acme"
"#,
    );

    let conf = StackConf::from(file.path()).unwrap();
    let config = PlannerConfig::from_stack(&conf);
    assert!(config.validate().is_ok());
    assert_eq!(config.domain.as_deref(), Some("app.example.com"));
    assert_eq!(config.identity_pool_revision, 2);
    assert_eq!(config.node_pool.machine_type, "e2-standard-4");
    assert_eq!(config.app.customer, "Acme");

    let catalog = config.catalog().unwrap();
    let enabled: Vec<&str> = catalog.enabled().iter().map(|r| r.region.as_str()).collect();
    assert_eq!(enabled, vec!["us-central1", "me-west1"]);
    assert!(RegionValidator::validate(&catalog).is_ok());
}

#[test]
fn test_missing_stack_file() {
    let dir = TempDir::new().unwrap();
    let err = StackConf::from(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.is_config_error());
}

#[test]
fn test_malformed_stack_file() {
    let file = write_stack("project = [unclosed");
    let err = StackConf::from(file.path()).unwrap_err();
    assert!(matches!(err, PlanError::TomlParse(_)));
}

#[test]
fn test_unknown_enabled_region_rejected() {
    let config =
        PlannerConfig::new("demo-project", "gas", None).with_enabled_regions(vec!["mars-north1".to_string()]);
    let err = config.catalog().unwrap_err();
    assert!(err.is_config_error());
    assert!(err.to_string().contains("mars-north1"));
}

#[test]
fn test_dynamic_overrides_on_file_config() {
    let file = write_stack("project = \"demo-project\"\nprefix = \"gas\"\n");
    let mut config = PlannerConfig::from_stack(&StackConf::from(file.path()).unwrap());

    let overrides: HashMap<String, String> = [
        ("stack.domain", "shop.example.com"),
        ("regions.enabled", "asia-east1"),
        ("node-pool.preemptible", "true"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    apply_to_planner_config(&overrides, &mut config).unwrap();

    assert!(config.has_domain());
    assert!(config.node_pool.preemptible);
    assert_eq!(config.enabled_regions, Some(vec!["asia-east1".to_string()]));
}

#[test]
fn test_no_enabled_region_is_config_error() {
    let catalog = RegionCatalog::new(vec![RegionDescriptor::new(
        "001",
        "us-central1",
        false,
        "10.128.50.0/24",
    )]);
    let err = RegionValidator::validate(&catalog).unwrap_err();
    assert!(err.is_config_error());
}

#[tokio::test]
async fn test_plan_document_written_to_disk() {
    let config = PlannerConfig::new("demo-project", "gas", Some("app.example.com".to_string()));
    let catalog = config.catalog().unwrap();
    let (planner, recorder) = InfrastructurePlanner::recording();
    planner.plan(&config, &catalog).await.unwrap();

    let graph = recorder.graph().unwrap();
    let document = PlanDocument::new(&config, &catalog, &graph, recorder.exports().unwrap());

    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("plan.json");
    let yaml_path = dir.path().join("plan.yaml");
    document.write_to(&json_path).unwrap();
    document.write_to(&yaml_path).unwrap();
    assert_eq!(PlanFormat::from_path(&yaml_path), PlanFormat::Yaml);

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed["project"], "demo-project");
    assert_eq!(parsed["fingerprint"], graph.fingerprint());
    assert_eq!(parsed["resources"].as_array().unwrap().len(), graph.len());
    assert_eq!(parsed["regions"].as_array().unwrap().len(), 15);

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(&yaml_path).unwrap()).unwrap();
    assert_eq!(yaml["domain"].as_str(), Some("app.example.com"));
}
