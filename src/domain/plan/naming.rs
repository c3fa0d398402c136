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

//! Resource names. Every name is derived from the prefix, the region and
//! the role of the resource, never from random input.

use crate::infrastructure::constants::{
    NODE_POOL_SUFFIX, WORKLOAD_IDENTITY_HASH_LEN, WORKLOAD_IDENTITY_PURPOSE,
};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    prefix: String,
}

impl ResourceNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn scoped(&self, role: &str) -> String {
        format!("{}-{}", self.prefix, role)
    }

    // Global

    pub fn project_service(&self, service: &str) -> String {
        self.scoped(&format!("project-service-{}", service))
    }

    pub fn network(&self) -> String {
        self.scoped("vpc")
    }

    pub fn firewall_health_checks(&self) -> String {
        self.scoped("fw-in-allow-health-checks")
    }

    pub fn firewall_cluster_app(&self) -> String {
        self.scoped("fw-in-allow-cluster-app")
    }

    pub fn admin_service_account(&self) -> String {
        self.scoped("service-account")
    }

    pub fn autoneg_service_account(&self) -> String {
        self.scoped("service-account-autoneg")
    }

    pub fn autoneg_role(&self) -> String {
        self.scoped("iam-custom-role-autoneg")
    }

    /// Role ids only allow letters, digits, dots and underscores.
    pub fn autoneg_role_id(&self) -> String {
        format!("{}_iam_role_autoneg_system", self.prefix.replace('-', "_"))
    }

    pub fn autoneg_role_binding(&self) -> String {
        self.scoped("iam-role-binding-autoneg")
    }

    pub fn identity_pool(&self) -> String {
        self.scoped("wip-gke-cluster")
    }

    pub fn global_address(&self) -> String {
        self.scoped("glb-ip-address")
    }

    pub fn health_check(&self) -> String {
        self.scoped("glb-tcp-hc")
    }

    pub fn backend_service(&self) -> String {
        self.scoped("glb-bes")
    }

    pub fn backend_service_name(&self) -> String {
        self.scoped("bes")
    }

    pub fn ssl_certificate(&self) -> String {
        self.scoped("glb-ssl-cert")
    }

    pub fn https_url_map(&self) -> String {
        self.scoped("glb-url-map-https-domain")
    }

    pub fn https_url_map_name(&self) -> String {
        self.scoped("glb-urlmap-https")
    }

    pub fn https_proxy(&self) -> String {
        self.scoped("glb-https-proxy")
    }

    pub fn https_forwarding_rule(&self) -> String {
        self.scoped("glb-https-fwd-rule")
    }

    pub fn http_url_map(&self, redirect: bool) -> String {
        if redirect {
            self.scoped("glb-url-map-http-domain")
        } else {
            self.scoped("glb-url-map-http-no-domain")
        }
    }

    pub fn http_url_map_name(&self) -> String {
        self.scoped("glb-urlmap-http")
    }

    pub fn http_proxy(&self) -> String {
        self.scoped("glb-http-proxy")
    }

    pub fn http_forwarding_rule(&self) -> String {
        self.scoped("glb-http-fwd-rule")
    }

    // Fleet

    pub fn project_lookup(&self) -> String {
        self.scoped("project")
    }

    pub fn fleet_mesh_feature(&self) -> String {
        self.scoped("local-cmd-gcloud-enable-fleets")
    }

    pub fn artifact_registry(&self) -> String {
        self.scoped("artifact-registry-repository")
    }

    pub fn fleet(&self) -> String {
        self.scoped("gke-fleet")
    }

    pub fn fleet_display_name(&self) -> String {
        self.scoped("gke-cluster")
    }

    pub fn mesh_command(&self) -> String {
        self.scoped("local-cmd-asm-multicluster-mesh")
    }

    // Regional

    pub fn subnet(&self, region: &str) -> String {
        self.scoped(&format!("vpc-subnet-{}", region))
    }

    pub fn cluster(&self, region: &str) -> String {
        self.scoped(&format!("gke-{}", region))
    }

    pub fn node_pool(&self, region: &str) -> String {
        format!("{}-{}", self.cluster(region), NODE_POOL_SUFFIX)
    }

    pub fn cluster_context(&self, region: &str) -> String {
        format!("{}-kubeconfig", self.cluster(region))
    }

    pub fn istio_base(&self, region: &str) -> String {
        self.scoped(&format!("istio-base-{}", region))
    }

    pub fn istiod(&self, region: &str) -> String {
        self.scoped(&format!("istio-istiod-{}", region))
    }

    pub fn app_namespace(&self, region: &str) -> String {
        self.scoped(&format!("k8s-ns-app-{}", region))
    }

    pub fn ingress_gateway(&self, region: &str) -> String {
        self.scoped(&format!("istio-igw-{}", region))
    }

    pub fn cluster_ops(&self, region: &str) -> String {
        self.scoped(&format!("cluster-ops-{}", region))
    }

    pub fn workload_identity_binding(&self, region: &str) -> String {
        self.scoped(&format!("iam-svc-k8s-{}", region))
    }

    pub fn app(&self, region: &str) -> String {
        self.scoped(&format!("app-{}", region))
    }

    pub fn cluster_setup(&self, region: &str) -> String {
        self.scoped(&format!("local-cmd-gke-setup-{}", region))
    }

    // Exports

    pub fn export_kubeconfig(&self, region: &str) -> String {
        self.scoped(&format!("gke-cluster-kubeconfig-{}", region))
    }

    pub fn export_cluster_name(&self, region: &str) -> String {
        self.scoped(&format!("gke-cluster-name-{}", region))
    }

    pub fn export_mesh_command(&self) -> String {
        self.scoped("asm-create-mesh-command")
    }
}

/// Workload identity pool id: `<prefix>-wip-gke-<hash>`.
///
/// Pool ids stay reserved for 30 days after deletion, so recreating a stack
/// needs a fresh id; bumping `revision` produces one.
pub fn identity_pool_id(project: &str, prefix: &str, revision: u32) -> String {
    let digest = Sha256::digest(
        format!(
            "{}/{}/{}/{}",
            project, prefix, WORKLOAD_IDENTITY_PURPOSE, revision
        )
        .as_bytes(),
    );
    let hash = hex::encode(digest);
    format!(
        "{}-wip-{}-{}",
        prefix,
        WORKLOAD_IDENTITY_PURPOSE,
        &hash[..WORKLOAD_IDENTITY_HASH_LEN]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let names = ResourceNames::new("gas");
        assert_eq!(names.network(), "gas-vpc");
        assert_eq!(
            names.project_service("compute.googleapis.com"),
            "gas-project-service-compute.googleapis.com"
        );
        assert_eq!(names.node_pool("us-central1"), "gas-gke-us-central1-np-01");
        assert_eq!(names.cluster_context("us-central1"), "gas-gke-us-central1-kubeconfig");
        assert_eq!(names.http_url_map(true), "gas-glb-url-map-http-domain");
        assert_eq!(names.http_url_map(false), "gas-glb-url-map-http-no-domain");
        assert_eq!(names.autoneg_role_id(), "gas_iam_role_autoneg_system");
        assert_eq!(ResourceNames::new("g-a").autoneg_role_id(), "g_a_iam_role_autoneg_system");
        assert_eq!(names.fleet_display_name(), "gas-gke-cluster");
        assert_eq!(names.cluster_setup("us-east1"), "gas-local-cmd-gke-setup-us-east1");
        assert_eq!(names.mesh_command(), "gas-local-cmd-asm-multicluster-mesh");
    }

    #[test]
    fn test_identity_pool_id_is_deterministic() {
        let first = identity_pool_id("demo", "gas", 0);
        let second = identity_pool_id("demo", "gas", 0);
        assert_eq!(first, second);
        assert!(first.starts_with("gas-wip-gke-"));
        assert_eq!(first.len(), "gas-wip-gke-".len() + 6);
        assert!(first.len() <= 32);
    }

    #[test]
    fn test_identity_pool_revision_rotates_id() {
        assert_ne!(identity_pool_id("demo", "gas", 0), identity_pool_id("demo", "gas", 1));
        assert_ne!(identity_pool_id("demo", "gas", 0), identity_pool_id("other", "gas", 0));
    }
}
