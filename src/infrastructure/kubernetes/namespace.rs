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

use crate::infrastructure::constants::{LABEL_ISTIO_INJECTION, LABEL_ISTIO_INJECTION_VALUE};
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

pub struct NamespaceBuilder {
    name: String,
    labels: BTreeMap<String, String>,
}

impl NamespaceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
        }
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Sidecar injection for every pod in the namespace
    pub fn mesh_injection(self, enabled: bool) -> Self {
        if enabled {
            self.label(LABEL_ISTIO_INJECTION, LABEL_ISTIO_INJECTION_VALUE)
        } else {
            self
        }
    }

    pub fn build(&self) -> Namespace {
        let metadata = ObjectMeta {
            name: Some(self.name.clone()),
            labels: if self.labels.is_empty() {
                None
            } else {
                Some(self.labels.clone())
            },
            ..Default::default()
        };

        Namespace {
            metadata,
            ..Default::default()
        }
    }
}
