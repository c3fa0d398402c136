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
use crate::domain::plan::exporter::{declare_mesh_command, export_outputs};
use crate::domain::plan::global::{GlobalOutputs, GlobalStage};
use crate::domain::plan::graph::ResourceHandle;
use crate::domain::plan::regional::{RegionOutputs, RegionalStage};
use crate::domain::region::{RegionCatalog, RegionValidator};
use crate::infrastructure::provider::{ChartInstaller, GraphRecorder, ResourceProvider};
use crate::shared::error::PlanError;
use std::sync::Arc;
use tracing::info;

/// Result of one planning pass
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub global: GlobalOutputs,
    pub regions: Vec<RegionOutputs>,
    pub skipped: Vec<String>,
    /// Mesh join command, absent when no region is enabled
    pub mesh: Option<ResourceHandle>,
    pub exports: Vec<String>,
}

/// Builds the resource graph for a configuration and region catalog.
///
/// Stages run one after another and the first error ends the pass. Nothing
/// already declared is rolled back; that is the provider's call.
pub struct InfrastructurePlanner {
    provider: Arc<dyn ResourceProvider>,
    installer: Arc<dyn ChartInstaller>,
}

impl InfrastructurePlanner {
    pub fn new(provider: Arc<dyn ResourceProvider>, installer: Arc<dyn ChartInstaller>) -> Self {
        Self {
            provider,
            installer,
        }
    }

    /// Planner wired to a fresh in-process recorder.
    pub fn recording() -> (Self, Arc<GraphRecorder>) {
        let recorder = Arc::new(GraphRecorder::new());
        let planner = Self::new(recorder.clone(), recorder.clone());
        (planner, recorder)
    }

    pub async fn plan(
        &self,
        config: &PlannerConfig,
        catalog: &RegionCatalog,
    ) -> Result<PlanOutcome, PlanError> {
        config.validate()?;
        RegionValidator::validate(catalog)?;
        config.log_summary();

        let global = GlobalStage::new(self.provider.as_ref(), config)
            .declare()
            .await?;

        let stage = RegionalStage::new(self.provider.as_ref(), self.installer.as_ref(), config);
        let mut regions = Vec::new();
        let mut skipped = Vec::new();
        for region in catalog.regions() {
            if !region.enabled {
                info!("[INFORMATION] - Cloud Region: {} - SKIPPING", region.region);
                skipped.push(region.region.clone());
                continue;
            }

            info!("[INFORMATION] - Cloud Region: {} - PROCESSING", region.region);
            regions.push(stage.declare(&global, region).await?);
        }

        let mesh =
            declare_mesh_command(self.provider.as_ref(), config, &global, &regions).await?;
        let exports = export_outputs(self.provider.as_ref(), config, &global, &regions).await?;

        Ok(PlanOutcome {
            global,
            regions,
            skipped,
            mesh,
            exports,
        })
    }
}
