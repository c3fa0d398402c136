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

//! Per-region stage: network slice, cluster, node pool and in-cluster charts

use crate::domain::config::PlannerConfig;
use crate::domain::plan::global::{service_account_email, FleetOutputs, GlobalOutputs};
use crate::domain::plan::graph::{ResourceHandle, ResourceKind, ResourceRequest};
use crate::domain::plan::naming::ResourceNames;
use crate::domain::region::RegionDescriptor;
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::{KubeconfigBuilder, NamespaceBuilder};
use crate::infrastructure::provider::{
    ChartInstaller, ChartRelease, ChartSource, ClusterContext, NamespaceRequest, ResourceProvider,
};
use crate::shared::error::PlanError;
use serde_json::json;
use tracing::info;

/// Everything declared for one region
#[derive(Debug, Clone)]
pub struct RegionOutputs {
    pub region: RegionDescriptor,
    pub cluster_name: String,
    pub kubeconfig: String,
    pub subnet: ResourceHandle,
    pub cluster: ResourceHandle,
    pub node_pool: ResourceHandle,
    pub context: ClusterContext,
    pub istio_base: ResourceHandle,
    pub istiod: ResourceHandle,
    pub app_namespace: ResourceHandle,
    pub ingress_gateway: ResourceHandle,
    pub cluster_ops: ResourceHandle,
    pub workload_identity_binding: ResourceHandle,
    pub app: ResourceHandle,
    pub cluster_setup: Option<ResourceHandle>,
}

impl RegionOutputs {
    /// Declared handles in declaration order
    pub fn handles(&self) -> Vec<&ResourceHandle> {
        vec![
            &self.subnet,
            &self.cluster,
            &self.node_pool,
            &self.context.provider,
            &self.istio_base,
            &self.istiod,
            &self.app_namespace,
            &self.ingress_gateway,
            &self.cluster_ops,
            &self.workload_identity_binding,
            &self.app,
        ]
        .into_iter()
        .chain(self.cluster_setup.as_ref())
        .collect()
    }
}

pub struct RegionalStage<'a> {
    provider: &'a dyn ResourceProvider,
    installer: &'a dyn ChartInstaller,
    config: &'a PlannerConfig,
    names: ResourceNames,
}

impl<'a> RegionalStage<'a> {
    pub fn new(
        provider: &'a dyn ResourceProvider,
        installer: &'a dyn ChartInstaller,
        config: &'a PlannerConfig,
    ) -> Self {
        Self {
            provider,
            installer,
            config,
            names: ResourceNames::new(config.prefix.clone()),
        }
    }

    fn project(&self) -> &str {
        &self.config.project
    }

    /// Reads `global` and `region`, mutates neither.
    pub async fn declare(
        &self,
        global: &GlobalOutputs,
        region: &RegionDescriptor,
    ) -> Result<RegionOutputs, PlanError> {
        let name = region.region.as_str();
        info!("[{}] Declaring cluster infrastructure", name);

        let subnet = self.declare_subnet(global, region).await?;
        let cluster_name = self.names.cluster(name);
        let cluster = self.declare_cluster(global, region, &subnet).await?;
        let node_pool = self.declare_node_pool(global, region, &cluster).await?;

        let kubeconfig = KubeconfigBuilder::new(
            cluster_name.clone(),
            cluster.output("endpoint"),
            cluster.output("masterAuth.clusterCaCertificate"),
        )
        .to_yaml()?;

        let provider = self
            .provider
            .declare(
                ResourceRequest::new(
                    ResourceKind::KubernetesProvider,
                    self.names.cluster_context(name),
                )
                .attr("kubeconfig", kubeconfig.as_str())
                .after(&cluster)
                .after(&node_pool),
            )
            .await?;
        let context = ClusterContext {
            region: name.to_string(),
            cluster: cluster_name.clone(),
            provider,
        };

        info!("[{}] Installing service mesh and workloads", name);
        let istio_base = self.install_istio_base(&context).await?;
        let istiod = self.install_istiod(&context, &istio_base).await?;
        let app_namespace = self.create_app_namespace(&context, &istiod).await?;
        let ingress_gateway = self
            .install_ingress_gateway(global, &context, &istio_base, &istiod, &app_namespace)
            .await?;
        let cluster_ops = self
            .install_cluster_ops(&context, region, &istio_base, &istiod)
            .await?;
        let workload_identity_binding = self
            .bind_autoneg_identity(global, &context, &node_pool, &cluster_ops)
            .await?;
        let app = self
            .install_app(&context, region, &istio_base, &istiod, &app_namespace)
            .await?;

        let cluster_setup = match &global.fleet {
            Some(fleet) => Some(
                self.declare_cluster_setup(global, fleet, region, &cluster, &node_pool, &app)
                    .await?,
            ),
            None => None,
        };

        Ok(RegionOutputs {
            region: region.clone(),
            cluster_name,
            kubeconfig,
            subnet,
            cluster,
            node_pool,
            context,
            istio_base,
            istiod,
            app_namespace,
            ingress_gateway,
            cluster_ops,
            workload_identity_binding,
            app,
            cluster_setup,
        })
    }

    /// Registers the cluster with the fleet once its workloads are installed.
    async fn declare_cluster_setup(
        &self,
        global: &GlobalOutputs,
        fleet: &FleetOutputs,
        region: &RegionDescriptor,
        cluster: &ResourceHandle,
        node_pool: &ResourceHandle,
        app: &ResourceHandle,
    ) -> Result<ResourceHandle, PlanError> {
        let conf = &self.config.fleet;
        let args = format!(
            "-c {} -r {} -p {} -n {} -l {}",
            self.names.cluster(&region.region),
            region.region,
            self.project(),
            fleet.project.output("number"),
            region.id
        );

        self.provider
            .declare(
                ResourceRequest::new(
                    ResourceKind::LocalCommand,
                    self.names.cluster_setup(&region.region),
                )
                .attr("create", format!("{} {}", conf.setup_script, args))
                .attr("update", format!("{} {}", conf.setup_script, args))
                .attr("delete", format!("{} {}", conf.teardown_script, args))
                .after(&fleet.project)
                .after(cluster)
                .after(node_pool)
                .after(app)
                .depends_on(&global.dependencies),
            )
            .await
    }

    async fn declare_subnet(
        &self,
        global: &GlobalOutputs,
        region: &RegionDescriptor,
    ) -> Result<ResourceHandle, PlanError> {
        let name = self.names.subnet(&region.region);
        self.provider
            .declare(
                ResourceRequest::new(ResourceKind::Subnetwork, name.clone())
                    .attr("project", self.project())
                    .attr("name", name)
                    .attr(
                        "description",
                        format!("{} - VPC Subnet - {}", DESCRIPTION_PREFIX, region.region),
                    )
                    .attr("ipCidrRange", region.subnet_cidr.as_str())
                    .attr("region", region.region.as_str())
                    .input("network", &global.network, "id")
                    .attr("privateIpGoogleAccess", true)
                    .depends_on(&global.dependencies),
            )
            .await
    }

    async fn declare_cluster(
        &self,
        global: &GlobalOutputs,
        region: &RegionDescriptor,
        subnet: &ResourceHandle,
    ) -> Result<ResourceHandle, PlanError> {
        let name = self.names.cluster(&region.region);
        self.provider
            .declare(
                ResourceRequest::new(ResourceKind::Cluster, name.clone())
                    .attr("project", self.project())
                    .attr("name", name)
                    .attr("location", region.region.as_str())
                    .input("network", &global.network, "id")
                    .input("subnetwork", subnet, "id")
                    .attr("removeDefaultNodePool", true)
                    .attr("initialNodeCount", 1)
                    .attr("verticalPodAutoscaling", json!({ "enabled": true }))
                    .attr("ipAllocationPolicy", json!({}))
                    .attr(
                        "masterAuthorizedNetworksConfig",
                        json!({
                            "cidrBlocks": [{
                                "cidrBlock": MASTER_AUTHORIZED_CIDR,
                                "displayName": "Global Public Access",
                            }],
                        }),
                    )
                    .attr(
                        "workloadIdentityConfig",
                        json!({ "workloadPool": format!("{}.svc.id.goog", self.project()) }),
                    )
                    .depends_on(&global.dependencies),
            )
            .await
    }

    async fn declare_node_pool(
        &self,
        global: &GlobalOutputs,
        region: &RegionDescriptor,
        cluster: &ResourceHandle,
    ) -> Result<ResourceHandle, PlanError> {
        let name = self.names.node_pool(&region.region);
        let pool = &self.config.node_pool;
        self.provider
            .declare(
                ResourceRequest::new(ResourceKind::NodePool, name.clone())
                    .attr("name", name)
                    .input("cluster", cluster, "id")
                    .attr("nodeCount", pool.min_nodes)
                    .attr(
                        "nodeConfig",
                        json!({
                            "preemptible": pool.preemptible,
                            "machineType": pool.machine_type,
                            "serviceAccount": global.admin_service_account.output("email"),
                            "oauthScopes": [CLOUD_PLATFORM_SCOPE],
                        }),
                    )
                    .after(&global.admin_service_account)
                    .attr(
                        "autoscaling",
                        json!({
                            "locationPolicy": pool.location_policy,
                            "minNodeCount": pool.min_nodes,
                            "maxNodeCount": pool.max_nodes,
                        }),
                    ),
            )
            .await
    }

    fn istio_source(&self) -> ChartSource {
        ChartSource::Repository {
            url: self.config.mesh.repository.clone(),
        }
    }

    fn local_source(&self) -> ChartSource {
        ChartSource::Local {
            path: self.config.charts.path.clone(),
            version: self.config.charts.version.clone(),
        }
    }

    async fn install_istio_base(
        &self,
        context: &ClusterContext,
    ) -> Result<ResourceHandle, PlanError> {
        let release = ChartRelease::new(
            self.names.istio_base(&context.region),
            CHART_ISTIO_BASE,
            self.config.mesh.namespace.clone(),
            self.istio_source(),
        )
        .description("Istio Service Mesh - Install IstioBase")
        .create_namespace(true)
        .values(json!({ "defaultRevision": self.config.mesh.revision }));

        self.installer.install(context, release).await
    }

    async fn install_istiod(
        &self,
        context: &ClusterContext,
        base: &ResourceHandle,
    ) -> Result<ResourceHandle, PlanError> {
        let release = ChartRelease::new(
            self.names.istiod(&context.region),
            CHART_ISTIOD,
            self.config.mesh.namespace.clone(),
            self.istio_source(),
        )
        .description("Istio Service Mesh - Install Istiod")
        .create_namespace(true)
        .after(base);

        self.installer.install(context, release).await
    }

    async fn create_app_namespace(
        &self,
        context: &ClusterContext,
        istiod: &ResourceHandle,
    ) -> Result<ResourceHandle, PlanError> {
        let manifest = NamespaceBuilder::new(self.config.app.namespace.clone())
            .mesh_injection(true)
            .build();
        let request =
            NamespaceRequest::new(self.names.app_namespace(&context.region), manifest).after(istiod);

        self.installer.create_namespace(context, request).await
    }

    /// ClusterIP gateway exposed through a standalone NEG that AutoNeg
    /// attaches to the global backend service.
    async fn install_ingress_gateway(
        &self,
        global: &GlobalOutputs,
        context: &ClusterContext,
        base: &ResourceHandle,
        istiod: &ResourceHandle,
        namespace: &ResourceHandle,
    ) -> Result<ResourceHandle, PlanError> {
        let neg = json!({ "exposed_ports": { HTTP_PORT.to_string(): {} } });
        let autoneg = json!({
            "backend_services": {
                HTTP_PORT.to_string(): [{
                    "name": global.backend_service.output("name"),
                    "max_rate_per_endpoint": AUTONEG_MAX_RATE_PER_ENDPOINT,
                }],
            },
        });

        let mut annotations = serde_json::Map::new();
        annotations.insert(ANNOTATION_GKE_NEG.to_string(), neg.to_string().into());
        annotations.insert(ANNOTATION_AUTONEG.to_string(), autoneg.to_string().into());
        annotations.insert(ANNOTATION_LB_TYPE.to_string(), "Internal".into());

        let release = ChartRelease::new(
            self.names.ingress_gateway(&context.region),
            CHART_ISTIO_GATEWAY,
            self.config.app.namespace.clone(),
            self.istio_source(),
        )
        .release_name(INGRESS_GATEWAY_RELEASE)
        .description("Istio Service Mesh - Install Ingress Gateway")
        .values(json!({
            "service": {
                "type": "ClusterIP",
                "annotations": annotations,
            },
        }))
        .after(base)
        .after(istiod)
        .after(namespace)
        .after(&global.backend_service);

        self.installer.install(context, release).await
    }

    async fn install_cluster_ops(
        &self,
        context: &ClusterContext,
        region: &RegionDescriptor,
        base: &ResourceHandle,
        istiod: &ResourceHandle,
    ) -> Result<ResourceHandle, PlanError> {
        let release = ChartRelease::new(
            self.names.cluster_ops(&region.region),
            CHART_CLUSTER_OPS,
            AUTONEG_K8S_NAMESPACE,
            self.local_source(),
        )
        .resource_prefix(region.id.clone())
        .values(json!({
            "global": { "labels": { "region": region.region } },
            "app": { "region": region.region },
            "autoneg": {
                "serviceAccount": {
                    "annotations": {
                        ANNOTATION_GCP_SERVICE_ACCOUNT:
                            service_account_email(AUTONEG_SERVICE_ACCOUNT_ID, self.project()),
                    },
                },
            },
        }))
        .after(base)
        .after(istiod);

        self.installer.install(context, release).await
    }

    /// Lets the AutoNeg controller's Kubernetes service account act as the
    /// AutoNeg GCP service account.
    async fn bind_autoneg_identity(
        &self,
        global: &GlobalOutputs,
        context: &ClusterContext,
        node_pool: &ResourceHandle,
        cluster_ops: &ResourceHandle,
    ) -> Result<ResourceHandle, PlanError> {
        let member = format!(
            "serviceAccount:{}.svc.id.goog[{}/{}]",
            self.project(),
            AUTONEG_K8S_NAMESPACE,
            AUTONEG_K8S_SERVICE_ACCOUNT
        );

        self.provider
            .declare(
                ResourceRequest::new(
                    ResourceKind::ServiceAccountIamBinding,
                    self.names.workload_identity_binding(&context.region),
                )
                .input("serviceAccountId", &global.autoneg_service_account, "name")
                .attr("role", WORKLOAD_IDENTITY_USER_ROLE)
                .attr("members", json!([member]))
                .after(node_pool)
                .after(cluster_ops),
            )
            .await
    }

    async fn install_app(
        &self,
        context: &ClusterContext,
        region: &RegionDescriptor,
        base: &ResourceHandle,
        istiod: &ResourceHandle,
        namespace: &ResourceHandle,
    ) -> Result<ResourceHandle, PlanError> {
        let app = &self.config.app;
        let release = ChartRelease::new(
            self.names.app(&region.region),
            CHART_APP_TEAM,
            app.namespace.clone(),
            self.local_source(),
        )
        .resource_prefix(region.id.clone())
        .values(json!({
            "global": {
                "labels": {
                    "region": region.region,
                    "project": self.project(),
                    "prefix": self.config.prefix,
                },
            },
            "deployment": {
                "env": {
                    "customer": app.customer,
                    "color_primary": app.color_primary,
                    "color_secondary": app.color_secondary,
                    "color_background": app.color_background,
                    "location": region.region,
                    "platform": app.platform,
                },
            },
        }))
        .after(base)
        .after(istiod)
        .after(namespace);

        self.installer.install(context, release).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::global::GlobalStage;
    use crate::domain::plan::graph::ResourceGraph;
    use crate::domain::region::regions;
    use crate::infrastructure::provider::GraphRecorder;
    use std::collections::BTreeSet;

    async fn declare(config: &PlannerConfig) -> (RegionOutputs, ResourceGraph) {
        let recorder = GraphRecorder::new();
        let global = GlobalStage::new(&recorder, config).declare().await.unwrap();
        let region = regions().into_iter().next().unwrap();
        let outputs = RegionalStage::new(&recorder, &recorder, config)
            .declare(&global, &region)
            .await
            .unwrap();
        (outputs, recorder.graph().unwrap())
    }

    fn deps(graph: &ResourceGraph, name: &str) -> BTreeSet<String> {
        graph.get(name).unwrap().depends_on.clone()
    }

    #[tokio::test]
    async fn test_chart_install_order() {
        let config = PlannerConfig::new("demo", "gas", None);
        let (outputs, graph) = declare(&config).await;
        let context = "gas-gke-us-central1-kubeconfig";

        let chain = [
            "gas-istio-base-us-central1",
            "gas-istio-istiod-us-central1",
            "gas-k8s-ns-app-us-central1",
            "gas-istio-igw-us-central1",
            "gas-cluster-ops-us-central1",
            "gas-app-us-central1",
        ];
        for name in chain {
            let node = graph.get(name).unwrap();
            assert_eq!(node.provider.as_deref(), Some(context), "{}", name);
            assert!(node.depends_on.contains(context), "{}", name);
        }

        let position = |name: &str| {
            graph
                .topological_order()
                .iter()
                .position(|n| n.name == name)
                .unwrap()
        };
        for pair in chain.windows(2) {
            assert!(position(pair[0]) < position(pair[1]), "{} before {}", pair[0], pair[1]);
        }

        assert!(deps(&graph, "gas-istio-istiod-us-central1").contains("gas-istio-base-us-central1"));
        assert!(deps(&graph, "gas-k8s-ns-app-us-central1").contains("gas-istio-istiod-us-central1"));

        let gateway = deps(&graph, "gas-istio-igw-us-central1");
        for upstream in [
            "gas-istio-base-us-central1",
            "gas-istio-istiod-us-central1",
            "gas-k8s-ns-app-us-central1",
            "gas-glb-bes",
        ] {
            assert!(gateway.contains(upstream), "gateway after {}", upstream);
        }

        let cluster_ops = deps(&graph, "gas-cluster-ops-us-central1");
        assert!(cluster_ops.contains("gas-istio-base-us-central1"));
        assert!(cluster_ops.contains("gas-istio-istiod-us-central1"));

        let app = deps(&graph, "gas-app-us-central1");
        assert!(app.contains("gas-istio-base-us-central1"));
        assert!(app.contains("gas-istio-istiod-us-central1"));
        assert!(app.contains("gas-k8s-ns-app-us-central1"));

        assert_eq!(outputs.app.name, "gas-app-us-central1");
        assert!(outputs.cluster_setup.is_none());
    }

    #[tokio::test]
    async fn test_gateway_annotations_reference_backend_service() {
        let config = PlannerConfig::new("demo", "gas", None);
        let (outputs, graph) = declare(&config).await;

        let gateway = graph.get(&outputs.ingress_gateway.name).unwrap();
        assert_eq!(gateway.kind, ResourceKind::HelmRelease);
        assert_eq!(gateway.attributes["releaseName"], json!("istio-ingressgateway"));

        let service = &gateway.attributes["values"]["service"];
        assert_eq!(service["type"], json!("ClusterIP"));

        let neg: serde_json::Value =
            serde_json::from_str(service["annotations"][ANNOTATION_GKE_NEG].as_str().unwrap())
                .unwrap();
        assert_eq!(neg, json!({ "exposed_ports": { "80": {} } }));

        let autoneg: serde_json::Value =
            serde_json::from_str(service["annotations"][ANNOTATION_AUTONEG].as_str().unwrap())
                .unwrap();
        assert_eq!(
            autoneg["backend_services"]["80"][0]["name"],
            json!("${gas-glb-bes.name}")
        );
    }

    #[tokio::test]
    async fn test_node_pool_autoscaling() {
        let config = PlannerConfig::new("demo", "gas", None);
        let (outputs, graph) = declare(&config).await;

        let pool = graph.get(&outputs.node_pool.name).unwrap();
        assert_eq!(
            pool.attributes["autoscaling"],
            json!({ "locationPolicy": "BALANCED", "minNodeCount": 1, "maxNodeCount": 5 })
        );
        assert!(pool.depends_on.contains("gas-gke-us-central1"));
        assert!(pool.depends_on.contains("gas-service-account"));
    }

    #[tokio::test]
    async fn test_workload_identity_binding_edges() {
        let config = PlannerConfig::new("demo", "gas", None);
        let (outputs, graph) = declare(&config).await;

        let binding = graph.get(&outputs.workload_identity_binding.name).unwrap();
        assert_eq!(binding.name, "gas-iam-svc-k8s-us-central1");
        assert!(binding.depends_on.contains(&outputs.node_pool.name));
        assert!(binding.depends_on.contains(&outputs.cluster_ops.name));
        assert!(binding.depends_on.contains("gas-service-account-autoneg"));
        assert_eq!(
            binding.attributes["members"],
            json!(["serviceAccount:demo.svc.id.goog[autoneg-system/autoneg-controller-manager]"])
        );
    }

    #[tokio::test]
    async fn test_cluster_setup_with_fleet() {
        let mut config = PlannerConfig::new("demo", "gas", None);
        config.fleet.enabled = true;
        let (outputs, graph) = declare(&config).await;

        let setup = outputs.cluster_setup.clone().unwrap();
        assert!(outputs.handles().contains(&&setup));

        let node = graph.get(&setup.name).unwrap();
        assert_eq!(node.name, "gas-local-cmd-gke-setup-us-central1");
        assert_eq!(
            node.attributes["create"],
            json!("./gke-config/setup.sh -c gas-gke-us-central1 -r us-central1 -p demo -n ${gas-project.number} -l 001")
        );
        assert_eq!(
            node.attributes["delete"],
            json!("./gke-config/delete.sh -c gas-gke-us-central1 -r us-central1 -p demo -n ${gas-project.number} -l 001")
        );
        for upstream in ["gas-project", "gas-gke-us-central1", "gas-app-us-central1", "gas-gke-fleet"] {
            assert!(node.depends_on.contains(upstream), "setup after {}", upstream);
        }
    }
}
