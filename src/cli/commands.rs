// CLI command definitions

use super::plan::{KubeconfigCommand, PlanCommand, RegionsCommand, ValidateCommand};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "gke-at-scale",
    version,
    about = "Multi-region GKE infrastructure planner",
    long_about = "Plans the global network, load balancer, regional GKE clusters and mesh charts of a GKE at Scale stack as one dependency graph"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build the resource graph for a stack and print or save it
    Plan(PlanCommand),

    /// Check a stack configuration without declaring anything
    Validate(ValidateCommand),

    /// List the region catalog and which regions are enabled
    Regions(RegionsCommand),

    /// Generate the exec-plugin kubeconfig for one regional cluster
    Kubeconfig(KubeconfigCommand),
}
