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

//! Resource graph
//!
//! Nodes are named, typed resource declarations. Edges point from a node to
//! the upstream nodes it needs before it can be created. A node may only be
//! inserted once all of its dependencies are present, so insertion order is
//! always a valid creation order and the graph can never contain a cycle.

use crate::shared::error::PlanError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Type tag of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "gcp:projects/service")]
    ProjectService,
    #[serde(rename = "gcp:compute/network")]
    Network,
    #[serde(rename = "gcp:compute/firewall")]
    Firewall,
    #[serde(rename = "gcp:compute/subnetwork")]
    Subnetwork,
    #[serde(rename = "gcp:container/cluster")]
    Cluster,
    #[serde(rename = "gcp:container/nodePool")]
    NodePool,
    #[serde(rename = "gcp:serviceaccount/account")]
    ServiceAccount,
    #[serde(rename = "gcp:projects/iamCustomRole")]
    IamCustomRole,
    #[serde(rename = "gcp:projects/iamBinding")]
    ProjectIamBinding,
    #[serde(rename = "gcp:serviceaccount/iamBinding")]
    ServiceAccountIamBinding,
    #[serde(rename = "gcp:iam/workloadIdentityPool")]
    WorkloadIdentityPool,
    #[serde(rename = "gcp:compute/globalAddress")]
    GlobalAddress,
    #[serde(rename = "gcp:compute/healthCheck")]
    HealthCheck,
    #[serde(rename = "gcp:compute/backendService")]
    BackendService,
    #[serde(rename = "gcp:compute/managedSslCertificate")]
    ManagedSslCertificate,
    #[serde(rename = "gcp:compute/urlMap")]
    UrlMap,
    #[serde(rename = "gcp:compute/targetHttpProxy")]
    TargetHttpProxy,
    #[serde(rename = "gcp:compute/targetHttpsProxy")]
    TargetHttpsProxy,
    #[serde(rename = "gcp:compute/globalForwardingRule")]
    GlobalForwardingRule,
    #[serde(rename = "kubernetes:provider")]
    KubernetesProvider,
    #[serde(rename = "kubernetes:core/v1:Namespace")]
    Namespace,
    #[serde(rename = "kubernetes:helm.sh/v3:Release")]
    HelmRelease,
    #[serde(rename = "kubernetes:helm.sh/v3:Chart")]
    HelmChart,
    #[serde(rename = "gcp:organizations/getProject")]
    ProjectLookup,
    #[serde(rename = "gcp:artifactregistry/repository")]
    ArtifactRegistryRepository,
    #[serde(rename = "gcp:gkehub/fleet")]
    GkeHubFleet,
    #[serde(rename = "command:local:Command")]
    LocalCommand,
}

impl ResourceKind {
    pub fn type_token(&self) -> &'static str {
        match self {
            ResourceKind::ProjectService => "gcp:projects/service",
            ResourceKind::Network => "gcp:compute/network",
            ResourceKind::Firewall => "gcp:compute/firewall",
            ResourceKind::Subnetwork => "gcp:compute/subnetwork",
            ResourceKind::Cluster => "gcp:container/cluster",
            ResourceKind::NodePool => "gcp:container/nodePool",
            ResourceKind::ServiceAccount => "gcp:serviceaccount/account",
            ResourceKind::IamCustomRole => "gcp:projects/iamCustomRole",
            ResourceKind::ProjectIamBinding => "gcp:projects/iamBinding",
            ResourceKind::ServiceAccountIamBinding => "gcp:serviceaccount/iamBinding",
            ResourceKind::WorkloadIdentityPool => "gcp:iam/workloadIdentityPool",
            ResourceKind::GlobalAddress => "gcp:compute/globalAddress",
            ResourceKind::HealthCheck => "gcp:compute/healthCheck",
            ResourceKind::BackendService => "gcp:compute/backendService",
            ResourceKind::ManagedSslCertificate => "gcp:compute/managedSslCertificate",
            ResourceKind::UrlMap => "gcp:compute/urlMap",
            ResourceKind::TargetHttpProxy => "gcp:compute/targetHttpProxy",
            ResourceKind::TargetHttpsProxy => "gcp:compute/targetHttpsProxy",
            ResourceKind::GlobalForwardingRule => "gcp:compute/globalForwardingRule",
            ResourceKind::KubernetesProvider => "kubernetes:provider",
            ResourceKind::Namespace => "kubernetes:core/v1:Namespace",
            ResourceKind::HelmRelease => "kubernetes:helm.sh/v3:Release",
            ResourceKind::HelmChart => "kubernetes:helm.sh/v3:Chart",
            ResourceKind::ProjectLookup => "gcp:organizations/getProject",
            ResourceKind::ArtifactRegistryRepository => "gcp:artifactregistry/repository",
            ResourceKind::GkeHubFleet => "gcp:gkehub/fleet",
            ResourceKind::LocalCommand => "command:local:Command",
        }
    }

    /// Installed inside a cluster rather than against the cloud project
    pub fn is_in_cluster(&self) -> bool {
        matches!(
            self,
            ResourceKind::Namespace | ResourceKind::HelmRelease | ResourceKind::HelmChart
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_token())
    }
}

/// Placeholder reference to a declared resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub name: String,
    pub kind: ResourceKind,
}

impl ResourceHandle {
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Deferred output attribute, resolved by the provider at apply time.
    pub fn output(&self, attr: &str) -> String {
        format!("${{{}.{}}}", self.name, attr)
    }

    pub fn id(&self) -> String {
        self.output("id")
    }

    pub fn self_link(&self) -> String {
        self.output("selfLink")
    }
}

/// Ordered, de-duplicated set of handles used as a creation barrier.
///
/// The set is a value: `with` returns a new set and leaves `self` untouched,
/// so a stage can hand its set to the next stage without aliasing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencySet {
    members: Vec<ResourceHandle>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(&self, handle: &ResourceHandle) -> Self {
        let mut members = self.members.clone();
        if !self.contains(&handle.name) {
            members.push(handle.clone());
        }
        Self { members }
    }

    pub fn with_all<'a, I>(&self, handles: I) -> Self
    where
        I: IntoIterator<Item = &'a ResourceHandle>,
    {
        handles.into_iter().fold(self.clone(), |set, h| set.with(h))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|h| h.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceHandle> {
        self.members.iter()
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.members.iter().map(|h| h.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Declaration handed to a resource provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceRequest {
    pub name: String,
    pub kind: ResourceKind,
    pub attributes: BTreeMap<String, Value>,
    pub depends_on: BTreeSet<String>,
    pub provider: Option<String>,
}

impl ResourceRequest {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: BTreeMap::new(),
            depends_on: BTreeSet::new(),
            provider: None,
        }
    }

    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Feeds another resource's output into `key`, recording the edge.
    pub fn input(mut self, key: &str, upstream: &ResourceHandle, attr: &str) -> Self {
        self.attributes
            .insert(key.to_string(), Value::String(upstream.output(attr)));
        self.depends_on.insert(upstream.name.clone());
        self
    }

    pub fn after(mut self, upstream: &ResourceHandle) -> Self {
        self.depends_on.insert(upstream.name.clone());
        self
    }

    pub fn depends_on(mut self, deps: &DependencySet) -> Self {
        self.depends_on.extend(deps.iter().map(|h| h.name.clone()));
        self
    }

    /// Routes the resource through a cluster-scoped deployment context.
    pub fn via(mut self, context: &ResourceHandle) -> Self {
        self.provider = Some(context.name.clone());
        self.depends_on.insert(context.name.clone());
        self
    }

    pub fn handle(&self) -> ResourceHandle {
        ResourceHandle::new(self.name.clone(), self.kind)
    }
}

/// A declared resource as recorded in the graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceNode {
    pub name: String,
    pub kind: ResourceKind,
    pub attributes: BTreeMap<String, Value>,
    pub depends_on: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl From<ResourceRequest> for ResourceNode {
    fn from(req: ResourceRequest) -> Self {
        Self {
            name: req.name,
            kind: req.kind,
            attributes: req.attributes,
            depends_on: req.depends_on,
            provider: req.provider,
        }
    }
}

impl ResourceNode {
    pub fn handle(&self) -> ResourceHandle {
        ResourceHandle::new(self.name.clone(), self.kind)
    }

    /// True when the name or any attribute value mentions `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.name.contains(needle) || self.attributes.values().any(|v| value_mentions(v, needle))
    }
}

fn value_mentions(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.contains(needle),
        Value::Array(items) => items.iter().any(|v| value_mentions(v, needle)),
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k.contains(needle) || value_mentions(v, needle)),
        _ => false,
    }
}

/// Ordered collection of resource nodes keyed by name
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceGraph {
    nodes: Vec<ResourceNode>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: ResourceNode) -> Result<ResourceHandle, PlanError> {
        if self.index.contains_key(&node.name) {
            return Err(PlanError::DuplicateResource(node.name));
        }

        if let Some(missing) = node.depends_on.iter().find(|d| !self.index.contains_key(*d)) {
            return Err(PlanError::UnknownDependency {
                name: node.name.clone(),
                dependency: missing.clone(),
            });
        }

        let handle = node.handle();
        self.index.insert(node.name.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(handle)
    }

    pub fn get(&self, name: &str) -> Option<&ResourceNode> {
        self.index.get(name).map(|i| &self.nodes[*i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.depends_on.len()).sum()
    }

    pub fn nodes_of_kind(&self, kind: ResourceKind) -> Vec<&ResourceNode> {
        self.nodes.iter().filter(|n| n.kind == kind).collect()
    }

    pub fn nodes_mentioning(&self, needle: &str) -> Vec<&ResourceNode> {
        self.nodes.iter().filter(|n| n.mentions(needle)).collect()
    }

    /// Kahn's algorithm; ties broken by insertion order.
    pub fn topological_order(&self) -> Vec<&ResourceNode> {
        let mut remaining: Vec<usize> = self.nodes.iter().map(|n| n.depends_on.len()).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            for dep in &node.depends_on {
                if let Some(d) = self.index.get(dep) {
                    dependents[*d].push(i);
                }
            }
        }

        let mut ready: BTreeSet<usize> = remaining
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(i) = ready.pop_first() {
            order.push(&self.nodes[i]);
            for &next in &dependents[i] {
                remaining[next] -= 1;
                if remaining[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        order
    }

    /// Groups nodes into waves; every node in a wave only depends on
    /// nodes from earlier waves.
    pub fn waves(&self) -> Vec<Vec<&ResourceNode>> {
        let mut level: Vec<usize> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let depth = node
                .depends_on
                .iter()
                .filter_map(|d| self.index.get(d))
                .map(|d| level[*d] + 1)
                .max()
                .unwrap_or(0);
            level.push(depth);
        }

        let depth = level.iter().max().map(|m| m + 1).unwrap_or(0);
        let mut waves: Vec<Vec<&ResourceNode>> = vec![Vec::new(); depth];
        for (i, node) in self.nodes.iter().enumerate() {
            waves[level[i]].push(node);
        }
        waves
    }

    pub fn transitive_dependencies(&self, name: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&str> = match self.get(name) {
            Some(node) => node.depends_on.iter().map(|d| d.as_str()).collect(),
            None => return seen,
        };

        while let Some(current) = stack.pop() {
            if !seen.insert(current.to_string()) {
                continue;
            }
            if let Some(node) = self.get(current) {
                stack.extend(node.depends_on.iter().map(|d| d.as_str()));
            }
        }

        seen
    }

    /// Digest over names, kinds and edges. Equal fingerprints mean
    /// isomorphic graphs; attribute values are not part of it.
    pub fn fingerprint(&self) -> String {
        let mut entries: Vec<String> = self
            .nodes
            .iter()
            .map(|n| {
                let deps: Vec<&str> = n.depends_on.iter().map(|d| d.as_str()).collect();
                format!("{}|{}|{}", n.name, n.kind.type_token(), deps.join(","))
            })
            .collect();
        entries.sort();

        let mut hasher = Sha256::new();
        for entry in &entries {
            hasher.update(entry.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}
