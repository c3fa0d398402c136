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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, PlanError>;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to create {resource_type} '{name}': {reason}")]
    ResourceCreation {
        resource_type: String,
        name: String,
        reason: String,
    },

    #[error("Failed to install chart '{release}' into namespace '{namespace}': {reason}")]
    ChartInstall {
        release: String,
        namespace: String,
        reason: String,
    },

    #[error("Resource already declared: {0}")]
    DuplicateResource(String),

    #[error("Resource '{name}' depends on undeclared resource '{dependency}'")]
    UnknownDependency { name: String, dependency: String },

    #[error("Kubeconfig error: {0}")]
    Kubeconfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<kube::config::KubeconfigError> for PlanError {
    fn from(err: kube::config::KubeconfigError) -> Self {
        PlanError::Kubeconfig(err.to_string())
    }
}

impl PlanError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn resource_creation(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ResourceCreation {
            resource_type: resource_type.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn chart_install(
        release: impl Into<String>,
        namespace: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ChartInstall {
            release: release.into(),
            namespace: namespace.into(),
            reason: reason.into(),
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError(_))
    }
}
