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

//! Collaborators the planner declares resources through

pub mod recorder;

use crate::domain::plan::graph::{ResourceHandle, ResourceRequest};
use crate::shared::error::PlanError;
use k8s_openapi::api::core::v1::Namespace;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

pub use self::recorder::GraphRecorder;

/// Cloud resource orchestration engine.
///
/// Returns a placeholder handle immediately; creation, ordering along the
/// declared edges and retries are the engine's own business.
#[async_trait::async_trait]
pub trait ResourceProvider: Send + Sync {
    async fn declare(&self, request: ResourceRequest) -> Result<ResourceHandle, PlanError>;

    async fn export(&self, key: &str, value: Value) -> Result<(), PlanError>;
}

/// Package manager deploying workloads into one cluster
#[async_trait::async_trait]
pub trait ChartInstaller: Send + Sync {
    async fn install(
        &self,
        context: &ClusterContext,
        release: ChartRelease,
    ) -> Result<ResourceHandle, PlanError>;

    async fn create_namespace(
        &self,
        context: &ClusterContext,
        request: NamespaceRequest,
    ) -> Result<ResourceHandle, PlanError>;
}

/// Cluster-scoped deployment context for one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterContext {
    pub region: String,
    pub cluster: String,
    pub provider: ResourceHandle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChartSource {
    Repository { url: String },
    Local { path: String, version: String },
}

/// One chart installation
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRelease {
    pub resource_name: String,
    pub chart: String,
    pub release_name: Option<String>,
    pub namespace: String,
    pub source: ChartSource,
    pub values: Value,
    pub description: Option<String>,
    pub create_namespace: bool,
    pub resource_prefix: Option<String>,
    pub depends_on: BTreeSet<String>,
}

impl ChartRelease {
    pub fn new(
        resource_name: impl Into<String>,
        chart: impl Into<String>,
        namespace: impl Into<String>,
        source: ChartSource,
    ) -> Self {
        Self {
            resource_name: resource_name.into(),
            chart: chart.into(),
            release_name: None,
            namespace: namespace.into(),
            source,
            values: Value::Object(Default::default()),
            description: None,
            create_namespace: false,
            resource_prefix: None,
            depends_on: BTreeSet::new(),
        }
    }

    pub fn release_name(mut self, name: impl Into<String>) -> Self {
        self.release_name = Some(name.into());
        self
    }

    pub fn values(mut self, values: Value) -> Self {
        self.values = values;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn create_namespace(mut self, create: bool) -> Self {
        self.create_namespace = create;
        self
    }

    pub fn resource_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.resource_prefix = Some(prefix.into());
        self
    }

    pub fn after(mut self, upstream: &ResourceHandle) -> Self {
        self.depends_on.insert(upstream.name.clone());
        self
    }
}

/// Namespace manifest to create in a cluster
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceRequest {
    pub resource_name: String,
    pub manifest: Namespace,
    pub depends_on: BTreeSet<String>,
}

impl NamespaceRequest {
    pub fn new(resource_name: impl Into<String>, manifest: Namespace) -> Self {
        Self {
            resource_name: resource_name.into(),
            manifest,
            depends_on: BTreeSet::new(),
        }
    }

    pub fn after(mut self, upstream: &ResourceHandle) -> Self {
        self.depends_on.insert(upstream.name.clone());
        self
    }

    pub fn namespace_name(&self) -> Option<&str> {
        self.manifest.metadata.name.as_deref()
    }
}
