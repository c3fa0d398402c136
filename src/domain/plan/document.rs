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

//! Serialized plan handed to operators or a downstream apply step

use crate::domain::config::PlannerConfig;
use crate::domain::plan::graph::{ResourceGraph, ResourceNode};
use crate::domain::region::RegionCatalog;
use crate::shared::error::PlanError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Json,
    Yaml,
}

impl PlanFormat {
    /// `.yaml`/`.yml` select YAML, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => PlanFormat::Yaml,
            _ => PlanFormat::Json,
        }
    }
}

impl FromStr for PlanFormat {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(PlanFormat::Json),
            "yaml" | "yml" => Ok(PlanFormat::Yaml),
            _ => Err(PlanError::config_error(format!(
                "Unknown plan format '{}' (expected json or yaml)",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub id: String,
    pub region: String,
    pub enabled: bool,
    pub subnet_cidr: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDocument {
    pub project: String,
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub fingerprint: String,
    pub regions: Vec<RegionSummary>,
    pub resources: Vec<ResourceNode>,
    pub waves: Vec<Vec<String>>,
    pub exports: BTreeMap<String, Value>,
}

impl PlanDocument {
    pub fn new(
        config: &PlannerConfig,
        catalog: &RegionCatalog,
        graph: &ResourceGraph,
        exports: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            project: config.project.clone(),
            prefix: config.prefix.clone(),
            domain: config.domain.clone(),
            generated_at: Utc::now(),
            fingerprint: graph.fingerprint(),
            regions: catalog
                .regions()
                .iter()
                .map(|r| RegionSummary {
                    id: r.id.clone(),
                    region: r.region.clone(),
                    enabled: r.enabled,
                    subnet_cidr: r.subnet_cidr.clone(),
                })
                .collect(),
            resources: graph.topological_order().into_iter().cloned().collect(),
            waves: graph
                .waves()
                .iter()
                .map(|w| w.iter().map(|n| n.name.clone()).collect())
                .collect(),
            exports,
        }
    }

    pub fn render(&self, format: PlanFormat) -> Result<String, PlanError> {
        match format {
            PlanFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            PlanFormat::Yaml => Ok(serde_yaml::to_string(self)?),
        }
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), PlanError> {
        let path = path.as_ref();
        let content = self.render(PlanFormat::from_path(path))?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::graph::{ResourceKind, ResourceRequest};

    fn document() -> PlanDocument {
        let mut graph = ResourceGraph::new();
        graph
            .insert(ResourceRequest::new(ResourceKind::Network, "gas-vpc").into())
            .unwrap();
        let config = PlannerConfig::new("demo", "gas", None);
        PlanDocument::new(&config, &RegionCatalog::default(), &graph, BTreeMap::new())
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(PlanFormat::from_path(Path::new("plan.yaml")), PlanFormat::Yaml);
        assert_eq!(PlanFormat::from_path(Path::new("plan.yml")), PlanFormat::Yaml);
        assert_eq!(PlanFormat::from_path(Path::new("plan.json")), PlanFormat::Json);
        assert_eq!(PlanFormat::from_path(Path::new("plan")), PlanFormat::Json);
        assert!("toml".parse::<PlanFormat>().is_err());
    }

    #[test]
    fn test_render_json() {
        let json = document().render(PlanFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["project"], "demo");
        assert_eq!(value["resources"][0]["kind"], "gcp:compute/network");
        assert_eq!(value["regions"].as_array().unwrap().len(), 15);
        assert!(value.get("domain").is_none());
    }

    #[test]
    fn test_write_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        document().write_to(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("prefix: gas"));
        assert!(content.contains("gcp:compute/network"));
    }
}
