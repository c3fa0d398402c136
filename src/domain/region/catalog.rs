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

use crate::shared::error::PlanError;
use serde::{Deserialize, Serialize};

/// (id, region, enabled, subnet CIDR)
const CATALOG: &[(&str, &str, bool, &str)] = &[
    ("001", "us-central1", true, "10.128.50.0/24"),
    ("002", "europe-west6", true, "10.128.100.0/24"),
    ("003", "asia-east1", true, "10.128.150.0/24"),
    ("004", "australia-southeast1", false, "10.128.200.0/24"),
    ("005", "me-west1", false, "10.128.250.0/24"),
    ("006", "southamerica-west1", false, "10.129.50.0/24"),
    ("007", "europe-north1", false, "10.129.100.0/24"),
    ("008", "northamerica-northeast1", false, "10.129.150.0/24"),
    ("009", "us-east4", false, "10.129.200.0/24"),
    ("010", "us-east5", false, "10.129.250.0/24"),
    ("011", "us-south1", false, "10.130.50.0/24"),
    ("012", "europe-west8", false, "10.130.100.0/24"),
    ("013", "europe-west9", false, "10.130.150.0/24"),
    ("014", "europe-west3", false, "10.130.200.0/24"),
    ("015", "europe-central2", false, "10.130.250.0/24"),
];

/// A candidate deployment region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    pub id: String,
    pub region: String,
    pub enabled: bool,
    pub subnet_cidr: String,
}

impl RegionDescriptor {
    pub fn new(
        id: impl Into<String>,
        region: impl Into<String>,
        enabled: bool,
        subnet_cidr: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            enabled,
            subnet_cidr: subnet_cidr.into(),
        }
    }
}

/// The built-in region catalog, in catalog order.
pub fn regions() -> Vec<RegionDescriptor> {
    CATALOG
        .iter()
        .map(|(id, region, enabled, cidr)| RegionDescriptor::new(*id, *region, *enabled, *cidr))
        .collect()
}

/// Ordered list of candidate regions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionCatalog {
    regions: Vec<RegionDescriptor>,
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self::new(regions())
    }
}

impl RegionCatalog {
    pub fn new(regions: Vec<RegionDescriptor>) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &[RegionDescriptor] {
        &self.regions
    }

    /// Enabled-only subsequence, catalog order preserved.
    pub fn enabled(&self) -> Vec<&RegionDescriptor> {
        self.regions.iter().filter(|r| r.enabled).collect()
    }

    pub fn disabled(&self) -> Vec<&RegionDescriptor> {
        self.regions.iter().filter(|r| !r.enabled).collect()
    }

    pub fn get(&self, region: &str) -> Option<&RegionDescriptor> {
        self.regions.iter().find(|r| r.region == region)
    }

    /// Returns a catalog whose enabled set is exactly `names`.
    pub fn with_enabled<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, PlanError> {
        for name in names {
            if self.get(name.as_ref()).is_none() {
                return Err(PlanError::config_error(format!(
                    "Unknown region '{}' (available: {})",
                    name.as_ref(),
                    self.regions
                        .iter()
                        .map(|r| r.region.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
        }

        let regions = self
            .regions
            .iter()
            .map(|r| RegionDescriptor {
                enabled: names.iter().any(|n| n.as_ref() == r.region),
                ..r.clone()
            })
            .collect();

        Ok(Self { regions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = RegionCatalog::default();
        assert_eq!(catalog.regions().len(), 15);

        let enabled: Vec<_> = catalog.enabled().iter().map(|r| r.region.as_str()).collect();
        assert_eq!(enabled, vec!["us-central1", "europe-west6", "asia-east1"]);
        assert!(!catalog.get("australia-southeast1").unwrap().enabled);
    }

    #[test]
    fn test_with_enabled_overrides_flags() {
        let catalog = RegionCatalog::default()
            .with_enabled(&["asia-east1", "us-east4"])
            .unwrap();

        let enabled: Vec<_> = catalog.enabled().iter().map(|r| r.region.as_str()).collect();
        // catalog order wins over argument order
        assert_eq!(enabled, vec!["asia-east1", "us-east4"]);
        assert_eq!(catalog.regions().len(), 15);
    }

    #[test]
    fn test_with_enabled_rejects_unknown_region() {
        let err = RegionCatalog::default()
            .with_enabled(&["mars-north1"])
            .unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("mars-north1"));
    }
}
