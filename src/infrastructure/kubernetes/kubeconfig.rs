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

//! Cluster-access credential bundle in kubeconfig format.
//!
//! Authentication goes through the `gke-gcloud-auth-plugin` exec plugin, so
//! the file itself carries no secret beyond the cluster CA.

use crate::infrastructure::constants::*;
use crate::shared::error::PlanError;
use kube::config::Kubeconfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KubeconfigDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    pub current_context: String,
    pub kind: String,
    pub preferences: BTreeMap<String, String>,
    pub users: Vec<NamedUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub cluster: ClusterEntry,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterEntry {
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: String,
    pub server: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    pub context: ContextEntry,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    pub exec: ExecEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecEntry {
    pub api_version: String,
    pub command: String,
    pub install_hint: String,
    pub provide_cluster_info: bool,
}

/// Builds the kubeconfig for one cluster. Cluster, context and user all
/// share the cluster name.
pub struct KubeconfigBuilder {
    cluster_name: String,
    endpoint: String,
    ca_data: String,
}

impl KubeconfigBuilder {
    pub fn new(
        cluster_name: impl Into<String>,
        endpoint: impl Into<String>,
        ca_data: impl Into<String>,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            endpoint: endpoint.into(),
            ca_data: ca_data.into(),
        }
    }

    pub fn build(&self) -> KubeconfigDocument {
        let name = self.cluster_name.clone();
        let server = if self.endpoint.starts_with("https://") {
            self.endpoint.clone()
        } else {
            format!("https://{}", self.endpoint)
        };

        KubeconfigDocument {
            api_version: KUBECONFIG_API_VERSION.to_string(),
            clusters: vec![NamedCluster {
                cluster: ClusterEntry {
                    certificate_authority_data: self.ca_data.clone(),
                    server,
                },
                name: name.clone(),
            }],
            contexts: vec![NamedContext {
                context: ContextEntry {
                    cluster: name.clone(),
                    user: name.clone(),
                },
                name: name.clone(),
            }],
            current_context: name.clone(),
            kind: KUBECONFIG_KIND.to_string(),
            preferences: BTreeMap::new(),
            users: vec![NamedUser {
                name,
                user: UserEntry {
                    exec: ExecEntry {
                        api_version: EXEC_API_VERSION.to_string(),
                        command: EXEC_COMMAND.to_string(),
                        install_hint: EXEC_INSTALL_HINT.to_string(),
                        provide_cluster_info: true,
                    },
                },
            }],
        }
    }

    /// Renders the YAML and checks that kube can load it back.
    pub fn to_yaml(&self) -> Result<String, PlanError> {
        let yaml = serde_yaml::to_string(&self.build())?;
        validate_kubeconfig(&yaml)?;
        Ok(yaml)
    }
}

pub fn validate_kubeconfig(yaml: &str) -> Result<Kubeconfig, PlanError> {
    let kubeconfig = Kubeconfig::from_yaml(yaml)?;

    if kubeconfig.current_context.is_none() {
        return Err(PlanError::Kubeconfig(
            "kubeconfig has no current-context".to_string(),
        ));
    }
    if kubeconfig.clusters.is_empty() || kubeconfig.auth_infos.is_empty() {
        return Err(PlanError::Kubeconfig(
            "kubeconfig must define a cluster and a user".to_string(),
        ));
    }

    Ok(kubeconfig)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> KubeconfigBuilder {
        KubeconfigBuilder::new("gas-gke-us-central1", "34.1.2.3", "LS0tLS1CRUdJTi1DRVJU")
    }

    #[test]
    fn test_document_shape() {
        let doc = builder().build();
        assert_eq!(doc.api_version, "v1");
        assert_eq!(doc.kind, "Config");
        assert_eq!(doc.current_context, "gas-gke-us-central1");
        assert_eq!(doc.clusters[0].cluster.server, "https://34.1.2.3");
        assert_eq!(doc.contexts[0].context.user, "gas-gke-us-central1");
        assert!(doc.users[0].user.exec.provide_cluster_info);
    }

    #[test]
    fn test_yaml_keys() {
        let yaml = builder().to_yaml().unwrap();
        assert!(yaml.starts_with("apiVersion: v1\n"));
        assert!(yaml.contains("certificate-authority-data: LS0tLS1CRUdJTi1DRVJU"));
        assert!(yaml.contains("current-context: gas-gke-us-central1"));
        assert!(yaml.contains("preferences: {}"));
        assert!(yaml.contains("command: gke-gcloud-auth-plugin"));
        assert!(yaml.contains("provideClusterInfo: true"));
        assert!(yaml.contains("apiVersion: client.authentication.k8s.io/v1beta1"));
    }

    #[test]
    fn test_kube_reads_generated_file() {
        let yaml = builder().to_yaml().unwrap();
        let kubeconfig = validate_kubeconfig(&yaml).unwrap();

        assert_eq!(kubeconfig.current_context.as_deref(), Some("gas-gke-us-central1"));
        let cluster = kubeconfig.clusters[0].cluster.as_ref().unwrap();
        assert_eq!(cluster.server.as_deref(), Some("https://34.1.2.3"));

        let auth = kubeconfig.auth_infos[0].auth_info.as_ref().unwrap();
        assert!(auth.exec.is_some());
    }

    #[test]
    fn test_placeholder_values_round_trip() {
        let yaml = KubeconfigBuilder::new(
            "gas-gke-asia-east1",
            "${gas-gke-asia-east1.endpoint}",
            "${gas-gke-asia-east1.masterAuth.clusterCaCertificate}",
        )
        .to_yaml()
        .unwrap();

        let doc: KubeconfigDocument = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(doc.clusters[0].cluster.server, "https://${gas-gke-asia-east1.endpoint}");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(validate_kubeconfig("not: [valid").is_err());
    }
}
