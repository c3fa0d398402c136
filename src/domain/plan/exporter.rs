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

use crate::domain::config::PlannerConfig;
use crate::domain::plan::global::GlobalOutputs;
use crate::domain::plan::graph::{ResourceHandle, ResourceKind, ResourceRequest};
use crate::domain::plan::naming::ResourceNames;
use crate::domain::plan::regional::RegionOutputs;
use crate::infrastructure::constants::ASMCLI_COMMAND;
use crate::infrastructure::provider::ResourceProvider;
use crate::shared::error::PlanError;
use serde_json::Value;
use tracing::{debug, info};

/// Declares the command that joins every regional cluster into one mesh.
///
/// Runs after every cluster is up, and after fleet registration when the
/// fleet is enabled. Nothing is declared without regions.
pub async fn declare_mesh_command(
    provider: &dyn ResourceProvider,
    config: &PlannerConfig,
    global: &GlobalOutputs,
    regions: &[RegionOutputs],
) -> Result<Option<ResourceHandle>, PlanError> {
    if regions.is_empty() {
        return Ok(None);
    }

    let names = ResourceNames::new(config.prefix.clone());
    let command = create_mesh_command(&config.project, regions);
    info!("Declaring mesh across {} clusters", regions.len());

    let mut request = ResourceRequest::new(ResourceKind::LocalCommand, names.mesh_command())
        .attr("create", command.as_str())
        .attr("update", command.as_str());
    if let Some(fleet) = &global.fleet {
        request = request.after(&fleet.mesh_feature).after(&fleet.fleet);
    }
    for region in regions {
        request = request.after(&region.cluster).after(&region.node_pool);
        if let Some(setup) = &region.cluster_setup {
            request = request.after(setup);
        }
    }

    provider.declare(request).await.map(Some)
}

/// Publishes stack outputs and returns the keys in publication order.
pub async fn export_outputs(
    provider: &dyn ResourceProvider,
    config: &PlannerConfig,
    global: &GlobalOutputs,
    regions: &[RegionOutputs],
) -> Result<Vec<String>, PlanError> {
    let names = ResourceNames::new(config.prefix.clone());
    let mut outputs: Vec<(String, Value)> = vec![
        (
            names.global_address(),
            Value::String(global.global_address.output("address")),
        ),
        (
            names.identity_pool(),
            Value::String(global.identity_pool.output("name")),
        ),
    ];

    for region in regions {
        let name = region.region.region.as_str();
        outputs.push((
            names.export_kubeconfig(name),
            Value::String(region.kubeconfig.clone()),
        ));
        outputs.push((
            names.export_cluster_name(name),
            Value::String(region.cluster_name.clone()),
        ));
    }

    if !regions.is_empty() {
        outputs.push((
            names.export_mesh_command(),
            Value::String(create_mesh_command(&config.project, regions)),
        ));
    }

    let mut keys = Vec::with_capacity(outputs.len());
    for (key, value) in outputs {
        debug!("Exporting {}", key);
        provider.export(&key, value).await?;
        keys.push(key);
    }
    Ok(keys)
}

/// `asmcli create-mesh` joining every regional cluster into one mesh.
pub fn create_mesh_command(project: &str, regions: &[RegionOutputs]) -> String {
    let clusters: Vec<String> = regions
        .iter()
        .map(|r| format!("{}/{}/{}", project, r.region.region, r.cluster_name))
        .collect();
    format!("{} create-mesh {} {}", ASMCLI_COMMAND, project, clusters.join(" "))
}
