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

use crate::domain::region::catalog::{RegionCatalog, RegionDescriptor};
use crate::shared::error::PlanError;
use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 network in CIDR notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    fn mask(&self) -> u32 {
        if self.prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix_len))
        }
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        (u32::from(addr) & self.mask()) == u32::from(self.network)
    }

    /// Two aligned blocks overlap iff one contains the other's network address.
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other.network) || other.contains(self.network)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = s
            .split_once('/')
            .ok_or_else(|| PlanError::config_error(format!("Invalid CIDR '{}': missing prefix length", s)))?;

        let network = Ipv4Addr::from_str(addr.trim())
            .map_err(|e| PlanError::config_error(format!("Invalid CIDR '{}': {}", s, e)))?;
        let prefix_len = len
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|l| *l <= 32)
            .ok_or_else(|| PlanError::config_error(format!("Invalid CIDR '{}': bad prefix length", s)))?;

        let cidr = Self {
            network,
            prefix_len,
        };
        if u32::from(network) & !cidr.mask() != 0 {
            return Err(PlanError::config_error(format!(
                "Invalid CIDR '{}': host bits must be zero",
                s
            )));
        }

        Ok(cidr)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// Checks the enabled part of a region catalog before anything is declared.
pub struct RegionValidator;

impl RegionValidator {
    pub fn validate(catalog: &RegionCatalog) -> Result<(), PlanError> {
        let enabled = catalog.enabled();
        if enabled.is_empty() {
            return Err(PlanError::config_error(
                "No regions enabled; enable at least one region".to_string(),
            ));
        }

        Self::validate_unique(catalog.regions())?;

        let mut parsed: Vec<(&RegionDescriptor, Ipv4Cidr)> = Vec::with_capacity(enabled.len());
        for region in enabled {
            let cidr = Ipv4Cidr::from_str(&region.subnet_cidr).map_err(|e| {
                PlanError::config_error(format!("Region '{}': {}", region.region, e))
            })?;

            if let Some((other, _)) = parsed.iter().find(|(_, c)| c.overlaps(&cidr)) {
                return Err(PlanError::config_error(format!(
                    "Subnet CIDR {} of region '{}' overlaps {} of region '{}'",
                    region.subnet_cidr, region.region, other.subnet_cidr, other.region
                )));
            }
            parsed.push((region, cidr));
        }

        Ok(())
    }

    fn validate_unique(regions: &[RegionDescriptor]) -> Result<(), PlanError> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for region in regions {
            if !ids.insert(region.id.as_str()) {
                return Err(PlanError::config_error(format!(
                    "Duplicate region id '{}'",
                    region.id
                )));
            }
            if !names.insert(region.region.as_str()) {
                return Err(PlanError::config_error(format!(
                    "Duplicate region '{}'",
                    region.region
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cidr() {
        let cidr: Ipv4Cidr = "10.128.50.0/24".parse().unwrap();
        assert_eq!(cidr.prefix_len(), 24);
        assert_eq!(cidr.to_string(), "10.128.50.0/24");
        assert!(cidr.contains(Ipv4Addr::new(10, 128, 50, 17)));
        assert!(!cidr.contains(Ipv4Addr::new(10, 128, 51, 0)));

        assert!("10.128.50.0".parse::<Ipv4Cidr>().is_err());
        assert!("10.128.50.0/33".parse::<Ipv4Cidr>().is_err());
        assert!("10.128.50.1/24".parse::<Ipv4Cidr>().is_err());
        assert!("not-an-ip/24".parse::<Ipv4Cidr>().is_err());
    }

    #[test]
    fn test_overlap() {
        let wide: Ipv4Cidr = "10.128.0.0/16".parse().unwrap();
        let narrow: Ipv4Cidr = "10.128.50.0/24".parse().unwrap();
        let apart: Ipv4Cidr = "10.129.50.0/24".parse().unwrap();
        assert!(wide.overlaps(&narrow));
        assert!(narrow.overlaps(&wide));
        assert!(!narrow.overlaps(&apart));
    }

    #[test]
    fn test_default_catalog_is_valid() {
        assert!(RegionValidator::validate(&RegionCatalog::default()).is_ok());
    }

    #[test]
    fn test_overlapping_enabled_regions_rejected() {
        let catalog = RegionCatalog::new(vec![
            RegionDescriptor::new("001", "us-central1", true, "10.128.0.0/16"),
            RegionDescriptor::new("002", "europe-west6", true, "10.128.100.0/24"),
        ]);
        let err = RegionValidator::validate(&catalog).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("overlaps"));
    }

    #[test]
    fn test_overlap_with_disabled_region_ignored() {
        let catalog = RegionCatalog::new(vec![
            RegionDescriptor::new("001", "us-central1", true, "10.128.0.0/16"),
            RegionDescriptor::new("002", "europe-west6", false, "10.128.100.0/24"),
        ]);
        assert!(RegionValidator::validate(&catalog).is_ok());
    }

    #[test]
    fn test_no_enabled_regions_rejected() {
        let catalog = RegionCatalog::default().with_enabled::<&str>(&[]).unwrap();
        assert!(RegionValidator::validate(&catalog).is_err());
    }
}
