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

use crate::domain::plan::graph::{ResourceGraph, ResourceHandle, ResourceKind, ResourceRequest};
use crate::infrastructure::provider::{
    ChartInstaller, ChartRelease, ChartSource, ClusterContext, NamespaceRequest, ResourceProvider,
};
use crate::shared::error::PlanError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct RecorderState {
    graph: ResourceGraph,
    exports: BTreeMap<String, Value>,
}

/// In-process provider and installer that records every declaration.
///
/// Used for dry runs: the resulting graph is what a real engine would be
/// asked to apply.
#[derive(Debug, Default)]
pub struct GraphRecorder {
    state: Mutex<RecorderState>,
}

impl GraphRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, RecorderState>, PlanError> {
        self.state.lock().map_err(|e| {
            PlanError::resource_creation("recorder", "graph", format!("state lock poisoned: {}", e))
        })
    }

    pub fn graph(&self) -> Result<ResourceGraph, PlanError> {
        Ok(self.lock()?.graph.clone())
    }

    pub fn exports(&self) -> Result<BTreeMap<String, Value>, PlanError> {
        Ok(self.lock()?.exports.clone())
    }

    fn record(&self, request: ResourceRequest) -> Result<ResourceHandle, PlanError> {
        let name = request.name.clone();
        let kind = request.kind;
        debug!("Declaring {} '{}'", kind, name);

        let mut state = self.lock()?;
        state
            .graph
            .insert(request.into())
            .map_err(|e| PlanError::resource_creation(kind.type_token(), name, e.to_string()))
    }
}

#[async_trait::async_trait]
impl ResourceProvider for GraphRecorder {
    async fn declare(&self, request: ResourceRequest) -> Result<ResourceHandle, PlanError> {
        self.record(request)
    }

    async fn export(&self, key: &str, value: Value) -> Result<(), PlanError> {
        let mut state = self.lock()?;
        if state.exports.contains_key(key) {
            return Err(PlanError::DuplicateResource(format!("export {}", key)));
        }
        state.exports.insert(key.to_string(), value);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChartInstaller for GraphRecorder {
    async fn install(
        &self,
        context: &ClusterContext,
        release: ChartRelease,
    ) -> Result<ResourceHandle, PlanError> {
        let kind = match release.source {
            ChartSource::Repository { .. } => ResourceKind::HelmRelease,
            ChartSource::Local { .. } => ResourceKind::HelmChart,
        };

        let source = serde_json::to_value(&release.source)?;
        let mut request = ResourceRequest::new(kind, release.resource_name.clone())
            .attr("chart", release.chart.as_str())
            .attr("namespace", release.namespace.as_str())
            .attr("source", source)
            .attr("values", release.values)
            .attr("cluster", context.cluster.as_str())
            .attr("region", context.region.as_str())
            .via(&context.provider);

        if let Some(name) = release.release_name {
            request = request.attr("releaseName", name);
        }
        if let Some(description) = release.description {
            request = request.attr("description", description);
        }
        if release.create_namespace {
            request = request.attr("createNamespace", true);
        }
        if let Some(prefix) = release.resource_prefix {
            request = request.attr("resourcePrefix", prefix);
        }
        request.depends_on.extend(release.depends_on);

        self.record(request).map_err(|e| {
            PlanError::chart_install(release.resource_name, release.namespace, e.to_string())
        })
    }

    async fn create_namespace(
        &self,
        context: &ClusterContext,
        request: NamespaceRequest,
    ) -> Result<ResourceHandle, PlanError> {
        let namespace = request.namespace_name().unwrap_or_default().to_string();
        let manifest = serde_json::to_value(&request.manifest)?;

        let mut declared = ResourceRequest::new(ResourceKind::Namespace, request.resource_name)
            .attr("manifest", manifest)
            .attr("cluster", context.cluster.as_str())
            .attr("region", context.region.as_str())
            .via(&context.provider);
        declared.depends_on.extend(request.depends_on);

        self.record(declared)
            .map_err(|e| PlanError::chart_install("namespace", namespace, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::NamespaceBuilder;

    fn context(recorder: &GraphRecorder) -> ClusterContext {
        let provider = recorder
            .record(ResourceRequest::new(
                ResourceKind::KubernetesProvider,
                "gas-gke-us-central1-kubeconfig",
            ))
            .unwrap();
        ClusterContext {
            region: "us-central1".to_string(),
            cluster: "gas-gke-us-central1".to_string(),
            provider,
        }
    }

    #[tokio::test]
    async fn test_declare_and_export() {
        let recorder = GraphRecorder::new();
        let handle = recorder
            .declare(ResourceRequest::new(ResourceKind::Network, "gas-vpc"))
            .await
            .unwrap();
        assert_eq!(handle.kind, ResourceKind::Network);

        recorder
            .export("gas-glb-ip-address", Value::String("${gas-glb-ip-address.address}".into()))
            .await
            .unwrap();
        assert!(recorder.export("gas-glb-ip-address", Value::Null).await.is_err());

        assert_eq!(recorder.graph().unwrap().len(), 1);
        assert_eq!(recorder.exports().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_declaration_is_resource_creation_error() {
        let recorder = GraphRecorder::new();
        let req = ResourceRequest::new(ResourceKind::Network, "gas-vpc");
        recorder.declare(req.clone()).await.unwrap();

        let err = recorder.declare(req).await.unwrap_err();
        assert!(matches!(err, PlanError::ResourceCreation { .. }));
    }

    #[tokio::test]
    async fn test_install_routes_through_cluster_context() {
        let recorder = GraphRecorder::new();
        let ctx = context(&recorder);

        let release = ChartRelease::new(
            "gas-istio-base-us-central1",
            "base",
            "istio-system",
            ChartSource::Repository {
                url: "https://istio-release.storage.googleapis.com/charts".to_string(),
            },
        )
        .create_namespace(true);
        let handle = recorder.install(&ctx, release).await.unwrap();
        assert_eq!(handle.kind, ResourceKind::HelmRelease);

        let graph = recorder.graph().unwrap();
        let node = graph.get("gas-istio-base-us-central1").unwrap();
        assert_eq!(node.provider.as_deref(), Some("gas-gke-us-central1-kubeconfig"));
        assert!(node.depends_on.contains("gas-gke-us-central1-kubeconfig"));
        assert_eq!(node.attributes["source"]["type"], "repository");
    }

    #[tokio::test]
    async fn test_install_unknown_dependency_is_chart_install_error() {
        let recorder = GraphRecorder::new();
        let ctx = context(&recorder);
        let missing = ResourceHandle::new("gas-istio-istiod-us-central1", ResourceKind::HelmRelease);

        let release = ChartRelease::new(
            "gas-app-us-central1",
            "app-team",
            "app-team",
            ChartSource::Local {
                path: "../apps/helm".to_string(),
                version: "0.1.0".to_string(),
            },
        )
        .after(&missing);

        let err = recorder.install(&ctx, release).await.unwrap_err();
        assert!(matches!(err, PlanError::ChartInstall { .. }));
    }

    #[tokio::test]
    async fn test_create_namespace_records_manifest() {
        let recorder = GraphRecorder::new();
        let ctx = context(&recorder);
        let manifest = NamespaceBuilder::new("app-team").mesh_injection(true).build();

        recorder
            .create_namespace(&ctx, NamespaceRequest::new("gas-k8s-ns-app-us-central1", manifest))
            .await
            .unwrap();

        let graph = recorder.graph().unwrap();
        let node = graph.get("gas-k8s-ns-app-us-central1").unwrap();
        assert_eq!(node.kind, ResourceKind::Namespace);
        assert_eq!(
            node.attributes["manifest"]["metadata"]["labels"]["istio-injection"],
            "enabled"
        );
    }
}
