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

//! Planning domain

pub mod document;
pub mod exporter;
pub mod global;
pub mod graph;
pub mod load_balancer;
pub mod naming;
pub mod planner;
pub mod regional;

pub use self::document::{PlanDocument, PlanFormat, RegionSummary};
pub use self::exporter::{create_mesh_command, export_outputs};
pub use self::global::{GlobalOutputs, GlobalStage};
pub use self::graph::{
    DependencySet, ResourceGraph, ResourceHandle, ResourceKind, ResourceNode, ResourceRequest,
};
pub use self::load_balancer::{LoadBalancerMode, LoadBalancerOutputs};
pub use self::naming::{identity_pool_id, ResourceNames};
pub use self::planner::{InfrastructurePlanner, PlanOutcome};
pub use self::regional::{RegionOutputs, RegionalStage};
