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

//! Global prerequisite stage: project-wide resources every region needs

use crate::domain::config::PlannerConfig;
use crate::domain::plan::graph::{DependencySet, ResourceHandle, ResourceKind, ResourceRequest};
use crate::domain::plan::load_balancer::{LoadBalancerMode, LoadBalancerOutputs, LoadBalancerWiring};
use crate::domain::plan::naming::{identity_pool_id, ResourceNames};
use crate::infrastructure::constants::*;
use crate::infrastructure::provider::ResourceProvider;
use crate::shared::error::PlanError;
use serde_json::json;
use tracing::{debug, info};

/// Result of the global stage, handed by value to every region
#[derive(Debug, Clone)]
pub struct GlobalOutputs {
    /// Every node declared by the stage
    pub dependencies: DependencySet,
    pub services: DependencySet,
    pub network: ResourceHandle,
    pub admin_service_account: ResourceHandle,
    pub autoneg_service_account: ResourceHandle,
    pub identity_pool: ResourceHandle,
    pub identity_pool_id: String,
    pub global_address: ResourceHandle,
    pub backend_service: ResourceHandle,
    pub load_balancer: LoadBalancerOutputs,
    pub fleet: Option<FleetOutputs>,
}

/// Fleet registration resources, present when `fleet.enabled` is set
#[derive(Debug, Clone)]
pub struct FleetOutputs {
    pub project: ResourceHandle,
    pub mesh_feature: ResourceHandle,
    pub registry: ResourceHandle,
    pub fleet: ResourceHandle,
}

pub struct GlobalStage<'a> {
    provider: &'a dyn ResourceProvider,
    config: &'a PlannerConfig,
    names: ResourceNames,
}

impl<'a> GlobalStage<'a> {
    pub fn new(provider: &'a dyn ResourceProvider, config: &'a PlannerConfig) -> Self {
        Self {
            provider,
            config,
            names: ResourceNames::new(config.prefix.clone()),
        }
    }

    fn project(&self) -> &str {
        &self.config.project
    }

    pub async fn declare(&self) -> Result<GlobalOutputs, PlanError> {
        let services = self.enable_services().await?;
        let mut deps = services.clone();

        let network = self.declare_network(&services).await?;
        deps = deps.with(&network);
        for firewall in self.declare_firewalls(&services, &network).await? {
            deps = deps.with(&firewall);
        }

        let fleet = if self.config.fleet.enabled {
            let fleet = self.declare_fleet(&services).await?;
            deps = deps
                .with(&fleet.project)
                .with(&fleet.mesh_feature)
                .with(&fleet.registry)
                .with(&fleet.fleet);
            Some(fleet)
        } else {
            None
        };

        let (admin, autoneg, iam) = self.declare_iam(&services).await?;
        deps = deps.with(&admin).with(&autoneg).with_all(&iam);

        let pool_id = identity_pool_id(
            self.project(),
            &self.config.prefix,
            self.config.identity_pool_revision,
        );
        let identity_pool = self.declare_identity_pool(&services, &pool_id).await?;
        deps = deps.with(&identity_pool);

        let global_address = self.declare_global_address(&services).await?;
        let health_check = self.declare_health_check(&services).await?;
        let backend_service = self
            .declare_backend_service(&services, &health_check)
            .await?;
        deps = deps
            .with(&global_address)
            .with(&health_check)
            .with(&backend_service);

        let mode = LoadBalancerMode::from_domain(self.config.domain.as_deref());
        let load_balancer = LoadBalancerWiring::new(
            self.provider,
            self.config,
            &services,
            &global_address,
            &backend_service,
        )
        .declare(mode)
        .await?;
        deps = deps.with_all(&load_balancer.declared);

        info!("Global stage declared {} resources", deps.len());

        Ok(GlobalOutputs {
            dependencies: deps,
            services,
            network,
            admin_service_account: admin,
            autoneg_service_account: autoneg,
            identity_pool,
            identity_pool_id: pool_id,
            global_address,
            backend_service,
            load_balancer,
            fleet,
        })
    }

    async fn enable_services(&self) -> Result<DependencySet, PlanError> {
        let mut set = DependencySet::new();
        for service in &self.config.required_services() {
            debug!("Enabling API {}", service);
            let handle = self
                .provider
                .declare(
                    ResourceRequest::new(
                        ResourceKind::ProjectService,
                        self.names.project_service(service),
                    )
                    .attr("project", self.project())
                    .attr("service", service.as_str())
                    .attr("disableDependentServices", true)
                    .attr("disableOnDestroy", false),
                )
                .await?;
            set = set.with(&handle);
        }
        Ok(set)
    }

    async fn declare_network(&self, services: &DependencySet) -> Result<ResourceHandle, PlanError> {
        self.provider
            .declare(
                ResourceRequest::new(ResourceKind::Network, self.names.network())
                    .attr("project", self.project())
                    .attr("name", self.names.network())
                    .attr(
                        "description",
                        format!("{} - Global VPC Network", DESCRIPTION_PREFIX),
                    )
                    .attr("autoCreateSubnetworks", false)
                    .depends_on(services),
            )
            .await
    }

    async fn declare_firewalls(
        &self,
        services: &DependencySet,
        network: &ResourceHandle,
    ) -> Result<Vec<ResourceHandle>, PlanError> {
        let allow = json!([{ "protocol": "tcp", "ports": FIREWALL_PORTS }]);

        let health_checks = self
            .provider
            .declare(
                ResourceRequest::new(ResourceKind::Firewall, self.names.firewall_health_checks())
                    .attr("project", self.project())
                    .attr("name", self.names.firewall_health_checks())
                    .attr(
                        "description",
                        format!("{} - FW - Allow - Ingress - TCP Health Checks", DESCRIPTION_PREFIX),
                    )
                    .input("network", network, "name")
                    .attr("allows", allow.clone())
                    .attr("sourceRanges", json!(HEALTH_CHECK_SOURCE_RANGES))
                    .depends_on(services),
            )
            .await?;

        let cluster_app = self
            .provider
            .declare(
                ResourceRequest::new(ResourceKind::Firewall, self.names.firewall_cluster_app())
                    .attr("project", self.project())
                    .attr("name", self.names.firewall_cluster_app())
                    .attr(
                        "description",
                        format!(
                            "{} - FW - Allow - Ingress - Load Balancer to Application",
                            DESCRIPTION_PREFIX
                        ),
                    )
                    .input("network", network, "name")
                    .attr("allows", allow)
                    .attr("sourceRanges", json!(APP_INGRESS_SOURCE_RANGES))
                    .attr("targetTags", json!([APP_ACCESS_TARGET_TAG]))
                    .depends_on(services),
            )
            .await?;

        Ok(vec![health_checks, cluster_app])
    }

    /// Project lookup, mesh feature, image repository and fleet.
    async fn declare_fleet(&self, services: &DependencySet) -> Result<FleetOutputs, PlanError> {
        let conf = &self.config.fleet;
        info!("Declaring fleet resources for project {}", self.project());

        let project = self
            .provider
            .declare(
                ResourceRequest::new(ResourceKind::ProjectLookup, self.names.project_lookup())
                    .attr("projectId", self.project()),
            )
            .await?;

        let mesh_feature = self
            .provider
            .declare(
                ResourceRequest::new(ResourceKind::LocalCommand, self.names.fleet_mesh_feature())
                    .attr("create", fleet_mesh_command("enable", self.project()))
                    .attr("update", fleet_mesh_command("enable", self.project()))
                    .attr("delete", fleet_mesh_command("disable", self.project()))
                    .depends_on(services),
            )
            .await?;

        let after_mesh = services.with(&mesh_feature);

        let registry = self
            .provider
            .declare(
                ResourceRequest::new(
                    ResourceKind::ArtifactRegistryRepository,
                    self.names.artifact_registry(),
                )
                .attr("project", self.project())
                .attr("description", DESCRIPTION_PREFIX)
                .attr("format", ARTIFACT_REGISTRY_FORMAT)
                .attr("location", conf.registry_location.as_str())
                .attr("repositoryId", conf.registry_id.as_str())
                .depends_on(&after_mesh),
            )
            .await?;

        let fleet = self
            .provider
            .declare(
                ResourceRequest::new(ResourceKind::GkeHubFleet, self.names.fleet())
                    .attr("project", self.project())
                    .attr("displayName", self.names.fleet_display_name())
                    .attr("location", FLEET_LOCATION)
                    .depends_on(&after_mesh.with(&registry)),
            )
            .await?;

        Ok(FleetOutputs {
            project,
            mesh_feature,
            registry,
            fleet,
        })
    }

    /// Admin account, AutoNeg account, AutoNeg role and its binding.
    async fn declare_iam(
        &self,
        services: &DependencySet,
    ) -> Result<(ResourceHandle, ResourceHandle, Vec<ResourceHandle>), PlanError> {
        let role = self
            .provider
            .declare(
                ResourceRequest::new(ResourceKind::IamCustomRole, self.names.autoneg_role())
                    .attr("project", self.project())
                    .attr("roleId", self.names.autoneg_role_id())
                    .attr("title", format!("{} - AutoNEG", DESCRIPTION_PREFIX))
                    .attr("description", "Custom IAM Role - GKE AutoNeg")
                    .attr("permissions", json!(AUTONEG_PERMISSIONS))
                    .depends_on(services),
            )
            .await?;

        let admin = self
            .provider
            .declare(
                ResourceRequest::new(ResourceKind::ServiceAccount, self.names.admin_service_account())
                    .attr("project", self.project())
                    .attr("accountId", ADMIN_SERVICE_ACCOUNT_ID)
                    .attr(
                        "displayName",
                        format!("{} - Admin Service Account", DESCRIPTION_PREFIX),
                    )
                    .depends_on(services),
            )
            .await?;

        let autoneg = self
            .provider
            .declare(
                ResourceRequest::new(
                    ResourceKind::ServiceAccount,
                    self.names.autoneg_service_account(),
                )
                .attr("project", self.project())
                .attr("accountId", AUTONEG_SERVICE_ACCOUNT_ID)
                .attr(
                    "displayName",
                    format!("{} - AutoNEG Service Account", DESCRIPTION_PREFIX),
                )
                .depends_on(services),
            )
            .await?;

        let binding = self
            .provider
            .declare(
                ResourceRequest::new(
                    ResourceKind::ProjectIamBinding,
                    self.names.autoneg_role_binding(),
                )
                .attr("project", self.project())
                .input("role", &role, "id")
                .attr(
                    "members",
                    json!([format!(
                        "serviceAccount:{}",
                        service_account_email(AUTONEG_SERVICE_ACCOUNT_ID, self.project())
                    )]),
                )
                .after(&autoneg)
                .depends_on(services),
            )
            .await?;

        Ok((admin, autoneg, vec![role, binding]))
    }

    async fn declare_identity_pool(
        &self,
        services: &DependencySet,
        pool_id: &str,
    ) -> Result<ResourceHandle, PlanError> {
        self.provider
            .declare(
                ResourceRequest::new(ResourceKind::WorkloadIdentityPool, self.names.identity_pool())
                    .attr("project", self.project())
                    .attr("workloadIdentityPoolId", pool_id)
                    .attr("displayName", self.names.identity_pool())
                    .attr(
                        "description",
                        format!(
                            "{} - Workload Identity Pool for GKE Cluster",
                            DESCRIPTION_PREFIX
                        ),
                    )
                    .attr("disabled", false)
                    .depends_on(services),
            )
            .await
    }

    async fn declare_global_address(
        &self,
        services: &DependencySet,
    ) -> Result<ResourceHandle, PlanError> {
        self.provider
            .declare(
                ResourceRequest::new(ResourceKind::GlobalAddress, self.names.global_address())
                    .attr("project", self.project())
                    .attr("name", self.names.global_address())
                    .attr("addressType", LOAD_BALANCING_SCHEME)
                    .attr("ipVersion", "IPV4")
                    .attr(
                        "description",
                        format!(
                            "{} - Global Load Balancer - Static IP Address",
                            DESCRIPTION_PREFIX
                        ),
                    )
                    .depends_on(services),
            )
            .await
    }

    async fn declare_health_check(
        &self,
        services: &DependencySet,
    ) -> Result<ResourceHandle, PlanError> {
        self.provider
            .declare(
                ResourceRequest::new(ResourceKind::HealthCheck, self.names.health_check())
                    .attr("project", self.project())
                    .attr("description", "TCP Health Check")
                    .attr("checkIntervalSec", HEALTH_CHECK_INTERVAL_SEC)
                    .attr("timeoutSec", HEALTH_CHECK_TIMEOUT_SEC)
                    .attr("healthyThreshold", HEALTH_CHECK_HEALTHY_THRESHOLD)
                    .attr("unhealthyThreshold", HEALTH_CHECK_UNHEALTHY_THRESHOLD)
                    .attr(
                        "tcpHealthCheck",
                        json!({ "port": HEALTH_CHECK_PORT, "proxyHeader": "NONE" }),
                    )
                    .depends_on(services),
            )
            .await
    }

    /// Starts with no backends; AutoNeg attaches each region's gateway NEG
    /// once the gateway service exists.
    async fn declare_backend_service(
        &self,
        services: &DependencySet,
        health_check: &ResourceHandle,
    ) -> Result<ResourceHandle, PlanError> {
        self.provider
            .declare(
                ResourceRequest::new(ResourceKind::BackendService, self.names.backend_service())
                    .attr("project", self.project())
                    .attr("name", self.names.backend_service_name())
                    .attr(
                        "description",
                        format!(
                            "{} - Global Load Balancer - Backend Service",
                            DESCRIPTION_PREFIX
                        ),
                    )
                    .attr(
                        "cdnPolicy",
                        json!({
                            "clientTtl": BACKEND_CDN_TTL_SEC,
                            "defaultTtl": BACKEND_CDN_TTL_SEC,
                            "maxTtl": BACKEND_CDN_TTL_SEC,
                        }),
                    )
                    .attr("connectionDrainingTimeoutSec", BACKEND_CONNECTION_DRAINING_SEC)
                    .attr("backends", json!([]))
                    .input("healthChecks", health_check, "id")
                    .depends_on(services),
            )
            .await
    }
}

fn fleet_mesh_command(action: &str, project: &str) -> String {
    format!("gcloud container fleet mesh {} --project {}", action, project)
}

pub fn service_account_email(account_id: &str, project: &str) -> String {
    format!("{}@{}.iam.gserviceaccount.com", account_id, project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::graph::ResourceGraph;
    use crate::infrastructure::provider::GraphRecorder;

    async fn declare(config: &PlannerConfig) -> (GlobalOutputs, ResourceGraph) {
        let recorder = GraphRecorder::new();
        let outputs = GlobalStage::new(&recorder, config).declare().await.unwrap();
        (outputs, recorder.graph().unwrap())
    }

    #[tokio::test]
    async fn test_two_firewalls_on_network() {
        let config = PlannerConfig::new("demo", "gas", None);
        let (outputs, graph) = declare(&config).await;

        let firewalls = graph.nodes_of_kind(ResourceKind::Firewall);
        assert_eq!(firewalls.len(), 2);
        for firewall in firewalls {
            assert!(firewall.depends_on.contains(&outputs.network.name));
            assert_eq!(firewall.attributes["network"], json!("${gas-vpc.name}"));
            assert_eq!(firewall.attributes["allows"][0]["protocol"], json!("tcp"));
        }
        assert_eq!(
            graph.get("gas-fw-in-allow-cluster-app").unwrap().attributes["targetTags"],
            json!([APP_ACCESS_TARGET_TAG])
        );
    }

    #[tokio::test]
    async fn test_backend_service_starts_empty() {
        let config = PlannerConfig::new("demo", "gas", None);
        let (outputs, graph) = declare(&config).await;

        let backend = graph.get(&outputs.backend_service.name).unwrap();
        assert_eq!(backend.attributes["backends"], json!([]));
        assert_eq!(backend.attributes["name"], json!("gas-bes"));
        assert_eq!(backend.attributes["healthChecks"], json!("${gas-glb-tcp-hc.id}"));
        assert!(backend.depends_on.contains("gas-glb-tcp-hc"));
    }

    #[tokio::test]
    async fn test_autoneg_role_binding() {
        let config = PlannerConfig::new("demo", "gas", None);
        let (outputs, graph) = declare(&config).await;

        let binding = graph.get("gas-iam-role-binding-autoneg").unwrap();
        assert_eq!(binding.kind, ResourceKind::ProjectIamBinding);
        assert_eq!(binding.attributes["role"], json!("${gas-iam-custom-role-autoneg.id}"));
        assert_eq!(
            binding.attributes["members"],
            json!(["serviceAccount:autoneg-system@demo.iam.gserviceaccount.com"])
        );
        assert!(binding.depends_on.contains("gas-iam-custom-role-autoneg"));
        assert!(binding.depends_on.contains(&outputs.autoneg_service_account.name));
        assert!(outputs.dependencies.contains("gas-iam-role-binding-autoneg"));
    }

    #[tokio::test]
    async fn test_fleet_disabled_by_default() {
        let config = PlannerConfig::new("demo", "gas", None);
        let (outputs, graph) = declare(&config).await;

        assert!(outputs.fleet.is_none());
        assert!(graph.nodes_of_kind(ResourceKind::GkeHubFleet).is_empty());
        assert!(graph.nodes_of_kind(ResourceKind::LocalCommand).is_empty());
        assert_eq!(graph.nodes_of_kind(ResourceKind::ProjectService).len(), 2);
    }

    #[tokio::test]
    async fn test_fleet_resources() {
        let mut config = PlannerConfig::new("demo", "gas", None);
        config.fleet.enabled = true;
        let (outputs, graph) = declare(&config).await;

        let fleet = outputs.fleet.unwrap();
        assert_eq!(graph.nodes_of_kind(ResourceKind::ProjectService).len(), 6);
        assert!(graph.contains("gas-project-service-gkehub.googleapis.com"));

        let mesh = graph.get(&fleet.mesh_feature.name).unwrap();
        assert_eq!(
            mesh.attributes["create"],
            json!("gcloud container fleet mesh enable --project demo")
        );
        assert_eq!(
            mesh.attributes["delete"],
            json!("gcloud container fleet mesh disable --project demo")
        );
        assert!(mesh.depends_on.contains("gas-project-service-mesh.googleapis.com"));

        let registry = graph.get("gas-artifact-registry-repository").unwrap();
        assert_eq!(registry.attributes["format"], json!("DOCKER"));
        assert_eq!(registry.attributes["location"], json!("europe"));
        assert_eq!(registry.attributes["repositoryId"], json!("gke-at-scale"));
        assert!(registry.depends_on.contains(&fleet.mesh_feature.name));

        let hub = graph.get("gas-gke-fleet").unwrap();
        assert_eq!(hub.attributes["location"], json!("global"));
        assert_eq!(hub.attributes["displayName"], json!("gas-gke-cluster"));
        assert!(hub.depends_on.contains(&fleet.registry.name));

        assert!(outputs.dependencies.contains(&fleet.project.name));
        assert!(outputs.dependencies.contains("gas-gke-fleet"));
    }
}
