//! Planning commands

use crate::cli::display::{PlanSummary, TableRenderer};
use crate::domain::config::{apply_to_planner_config, PlannerConfig, StackConf};
use crate::domain::plan::{InfrastructurePlanner, PlanDocument, PlanFormat, ResourceNames};
use crate::domain::region::RegionValidator;
use crate::infrastructure::constants::CONF_FILE_ENV;
use crate::infrastructure::kubernetes::KubeconfigBuilder;
use clap::{Args, Parser};
use std::collections::HashMap;
use std::path::PathBuf;

/// Stack selection flags shared by every planning command
#[derive(Args, Debug, Clone, Default)]
pub struct StackArgs {
    /// Path to the stack configuration file (gke-at-scale.toml)
    /// If not provided, GKE_AT_SCALE_CONF_FILE is used, then built-in defaults
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<String>,

    /// GCP project id
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// Resource name prefix (at most 5 characters)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Domain for the managed certificate; enables HTTPS on the load balancer
    #[arg(long)]
    pub domain: Option<String>,

    /// Region to enable (repeatable); replaces the catalog's enabled set
    #[arg(long = "enable-region", value_name = "REGION")]
    pub enable_regions: Vec<String>,

    /// Dynamic configuration properties to override file settings (-D key=value)
    ///
    /// Stack: gcp.project, stack.prefix, stack.domain, services (comma-separated)
    /// Regions: regions.enabled (comma-separated), identity-pool.revision
    /// Node pool: node-pool.machine-type, node-pool.min-nodes, node-pool.max-nodes,
    ///            node-pool.location-policy, node-pool.preemptible
    /// Mesh: mesh.repository, mesh.namespace, mesh.revision
    /// Charts: charts.path, charts.version
    /// App: app.namespace, app.customer, app.color-primary, app.color-secondary,
    ///      app.color-background, app.platform
    ///
    /// Example: -Dnode-pool.max-nodes=5 -Dregions.enabled=us-central1,europe-west6
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

impl StackArgs {
    /// Resolve the planner configuration.
    /// Priority: command line > -D > config file > defaults
    pub fn resolve(&self) -> anyhow::Result<PlannerConfig> {
        let stack_conf = if let Some(ref config_path) = self.config_file {
            StackConf::from(config_path)?
        } else if let Ok(env_path) = std::env::var(CONF_FILE_ENV) {
            StackConf::from(&env_path)?
        } else {
            println!("ℹ️  No configuration file specified, using default settings");
            StackConf::default()
        };

        let mut config = PlannerConfig::from_stack(&stack_conf);

        if !self.properties.is_empty() {
            let dynamic_configs = parse_dynamic_configs(&self.properties)
                .map_err(|e| anyhow::anyhow!("Failed to parse dynamic configs: {}", e))?;
            apply_to_planner_config(&dynamic_configs, &mut config)
                .map_err(|e| anyhow::anyhow!("Invalid dynamic config: {}", e))?;
        }

        if let Some(ref project) = self.project {
            config.project = project.clone();
        }
        if let Some(ref prefix) = self.prefix {
            config.prefix = prefix.clone();
        }
        if self.domain.is_some() {
            config = config.with_domain(self.domain.clone());
        }
        if !self.enable_regions.is_empty() {
            config = config.with_enabled_regions(self.enable_regions.clone());
        }

        Ok(config)
    }
}

#[derive(Parser, Debug, Clone)]
pub struct PlanCommand {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Write the plan document to this path (.json, .yaml or .yml)
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format for stdout: table, json or yaml
    #[arg(long, default_value = "table")]
    pub format: String,

    /// Also print the parallel creation waves
    #[arg(long)]
    pub waves: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub stack: StackArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct RegionsCommand {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Only list enabled regions
    #[arg(long)]
    pub enabled: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct KubeconfigCommand {
    /// Resource name prefix used to name the cluster
    #[arg(long)]
    pub prefix: String,

    /// Cloud region of the cluster
    #[arg(long, short = 'r')]
    pub region: String,

    /// Cluster API endpoint (host or https URL)
    #[arg(long)]
    pub endpoint: String,

    /// Base64 cluster CA certificate
    #[arg(long)]
    pub ca_data: String,

    /// Write the kubeconfig to this path instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl PlanCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let config = self.stack.resolve()?;
        let catalog = config
            .catalog()
            .map_err(|e| anyhow::anyhow!("Invalid region selection: {}", e))?;

        let (planner, recorder) = InfrastructurePlanner::recording();
        let outcome = planner
            .plan(&config, &catalog)
            .await
            .map_err(|e| anyhow::anyhow!("Planning failed: {}", e))?;

        let graph = recorder
            .graph()
            .map_err(|e| anyhow::anyhow!("Failed to read planned graph: {}", e))?;
        let exports = recorder
            .exports()
            .map_err(|e| anyhow::anyhow!("Failed to read planned outputs: {}", e))?;
        let document = PlanDocument::new(&config, &catalog, &graph, exports.clone());

        if let Some(ref path) = self.output {
            document
                .write_to(path)
                .map_err(|e| anyhow::anyhow!("Failed to write plan to {}: {}", path.display(), e))?;
            println!("Plan written to {}", path.display());
        }

        match self.format.to_lowercase().as_str() {
            "table" => {
                let renderer = TableRenderer::new();
                let summary = PlanSummary {
                    project: config.project.clone(),
                    prefix: config.prefix.clone(),
                    domain: config.domain.clone(),
                    resources: graph.len(),
                    edges: graph.edge_count(),
                    waves: document.waves.len(),
                    enabled_regions: outcome
                        .regions
                        .iter()
                        .map(|r| r.region.region.clone())
                        .collect(),
                    skipped_regions: outcome.skipped.len(),
                    fingerprint: document.fingerprint.clone(),
                };
                println!("{}", renderer.render_plan_summary(&summary));
                println!("{}", renderer.render_resources(&graph.topological_order()));
                if self.waves {
                    println!("{}", renderer.render_waves(&graph));
                }
                println!("{}", renderer.render_exports(&exports));
            }
            other => {
                let format = other
                    .parse::<PlanFormat>()
                    .map_err(|e| anyhow::anyhow!("Invalid output format: {}", e))?;
                let rendered = document
                    .render(format)
                    .map_err(|e| anyhow::anyhow!("Failed to render plan: {}", e))?;
                println!("{}", rendered);
            }
        }

        Ok(())
    }
}

impl ValidateCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let config = self.stack.resolve()?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration is invalid: {}", e))?;
        let catalog = config
            .catalog()
            .map_err(|e| anyhow::anyhow!("Invalid region selection: {}", e))?;
        RegionValidator::validate(&catalog)
            .map_err(|e| anyhow::anyhow!("Region catalog is invalid: {}", e))?;

        config.log_summary();
        println!(
            "Configuration for project {} (prefix {}) is valid: {} region(s) enabled",
            config.project,
            config.prefix,
            catalog.enabled().len()
        );
        Ok(())
    }
}

impl RegionsCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let config = self.stack.resolve()?;
        let catalog = config
            .catalog()
            .map_err(|e| anyhow::anyhow!("Invalid region selection: {}", e))?;

        let regions: Vec<_> = catalog
            .regions()
            .iter()
            .filter(|r| !self.enabled || r.enabled)
            .cloned()
            .collect();

        let renderer = TableRenderer::new();
        println!("{}", renderer.render_regions(&regions));
        Ok(())
    }
}

impl KubeconfigCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let cluster_name = ResourceNames::new(&self.prefix).cluster(&self.region);
        let yaml = KubeconfigBuilder::new(cluster_name, &self.endpoint, &self.ca_data)
            .to_yaml()
            .map_err(|e| anyhow::anyhow!("Failed to generate kubeconfig: {}", e))?;

        match self.output {
            Some(ref path) => {
                std::fs::write(path, &yaml).map_err(|e| {
                    anyhow::anyhow!("Failed to write kubeconfig to {}: {}", path.display(), e)
                })?;
                println!("Kubeconfig written to {}", path.display());
            }
            None => println!("{}", yaml),
        }
        Ok(())
    }
}

/// Parse dynamic configuration properties from -D key=value format
fn parse_dynamic_configs(configs: &[String]) -> Result<HashMap<String, String>, String> {
    let mut map = HashMap::new();

    for config in configs {
        let (key, value) = config.split_once('=').ok_or_else(|| {
            format!("Invalid config format: '{}'. Expected 'key=value'", config)
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Empty key in config: '{}'", config));
        }

        map.insert(key.to_string(), value.trim().to_string());
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_dynamic_configs() {
        let configs = vec![
            "node-pool.max-nodes=5".to_string(),
            " stack.domain = example.com ".to_string(),
            "app.customer=a=b".to_string(),
        ];
        let map = parse_dynamic_configs(&configs).unwrap();
        assert_eq!(map.get("node-pool.max-nodes").unwrap(), "5");
        assert_eq!(map.get("stack.domain").unwrap(), "example.com");
        assert_eq!(map.get("app.customer").unwrap(), "a=b");
    }

    #[test]
    fn test_parse_dynamic_configs_rejects_bad_input() {
        assert!(parse_dynamic_configs(&["novalue".to_string()]).is_err());
        assert!(parse_dynamic_configs(&["=value".to_string()]).is_err());
    }

    #[test]
    fn test_resolve_priority() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
project = "file-project"
prefix = "file"
domain = "file.example.com"

[node_pool]
max_nodes = 2
"#
        )
        .unwrap();

        let args = StackArgs {
            config_file: Some(file.path().to_string_lossy().to_string()),
            project: Some("cli-project".to_string()),
            properties: vec![
                "gcp.project=dyn-project".to_string(),
                "stack.prefix=dyn".to_string(),
                "node-pool.max-nodes=7".to_string(),
            ],
            ..Default::default()
        };

        let config = args.resolve().unwrap();
        assert_eq!(config.project, "cli-project");
        assert_eq!(config.prefix, "dyn");
        assert_eq!(config.domain.as_deref(), Some("file.example.com"));
        assert_eq!(config.node_pool.max_nodes, 7);
    }

    #[test]
    fn test_resolve_enable_regions_flag() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "project = \"demo\"\nprefix = \"gas\"").unwrap();

        let args = StackArgs {
            config_file: Some(file.path().to_string_lossy().to_string()),
            enable_regions: vec!["me-west1".to_string()],
            ..Default::default()
        };

        let config = args.resolve().unwrap();
        let catalog = config.catalog().unwrap();
        let enabled: Vec<_> = catalog.enabled().iter().map(|r| r.region.clone()).collect();
        assert_eq!(enabled, vec!["me-west1".to_string()]);
    }
}
