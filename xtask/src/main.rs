//! Build automation for gke-at-scale
//!
//! Usage: cargo xtask <command>
//!
//! Available commands:
//! - build: Build the planner binary
//! - test: Run unit and integration tests
//! - plan: Produce a sample plan document from a stack file
//! - dist: Package the release binary
//! - ci: Run format, clippy and tests

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use xshell::{cmd, Shell};

const BIN_NAME: &str = "gke-at-scale";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for gke-at-scale")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        /// Run only integration tests under tests/
        #[arg(long)]
        integration: bool,
    },
    /// Write a plan document for a stack file into target/plans/
    Plan {
        /// Stack configuration file
        #[arg(long, default_value = "gke-at-scale.toml")]
        config_file: String,

        /// Output format: json or yaml
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Create a release tarball under dist/
    Dist {
        /// Target triple (e.g., x86_64-unknown-linux-gnu)
        #[arg(long)]
        target: Option<String>,
    },
    /// Run CI checks (format, clippy, test)
    Ci,
    /// Format code
    Format {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    let root = project_root()?;

    sh.change_dir(&root);

    match cli.command {
        Commands::Build { release } => build(&sh, release),
        Commands::Test { integration } => test(&sh, integration),
        Commands::Plan {
            config_file,
            format,
        } => plan(&sh, &root, &config_file, &format),
        Commands::Dist { target } => dist(&sh, &root, target),
        Commands::Ci => ci(&sh),
        Commands::Format { check } => format(&sh, check),
        Commands::Clippy => clippy(&sh),
    }
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("🔨 Building {}...", BIN_NAME);

    if release {
        cmd!(sh, "cargo build --release").run()?;
        println!("✅ Release build completed: target/release/{}", BIN_NAME);
    } else {
        cmd!(sh, "cargo build").run()?;
        println!("✅ Debug build completed: target/debug/{}", BIN_NAME);
    }

    Ok(())
}

fn test(sh: &Shell, integration: bool) -> Result<()> {
    println!("🧪 Running tests...");

    if integration {
        cmd!(sh, "cargo test --test '*'").run()?;
    } else {
        cmd!(sh, "cargo test --all").run()?;
    }

    println!("✅ All tests passed");
    Ok(())
}

fn plan(sh: &Shell, root: &Path, config_file: &str, format: &str) -> Result<()> {
    let extension = match format {
        "yaml" | "yml" => "yaml",
        "json" => "json",
        other => anyhow::bail!("Unsupported plan format: {}", other),
    };

    let plans_dir = root.join("target/plans");
    sh.create_dir(&plans_dir)?;
    let output = plans_dir.join(format!("plan.{}", extension));

    println!("🗺️  Planning stack from {}...", config_file);
    cmd!(
        sh,
        "cargo run --quiet -- plan --config-file {config_file} --output {output}"
    )
    .run()
    .context("Planner run failed")?;

    println!("✅ Plan document written: {}", output.display());
    Ok(())
}

fn dist(sh: &Shell, root: &Path, target: Option<String>) -> Result<()> {
    println!("📦 Creating distribution package...");

    let binary_src = if let Some(ref target_triple) = target {
        cmd!(sh, "cargo build --release --target {target_triple}").run()?;
        root.join(format!("target/{}/release/{}", target_triple, BIN_NAME))
    } else {
        cmd!(sh, "cargo build --release").run()?;
        root.join(format!("target/release/{}", BIN_NAME))
    };

    let dist_dir = root.join("dist");
    sh.create_dir(&dist_dir)?;
    sh.copy_file(&binary_src, dist_dir.join(BIN_NAME))?;

    let version = env!("CARGO_PKG_VERSION");
    let archive_name = format!("{}-{}.tar.gz", BIN_NAME, version);

    cmd!(sh, "tar -czf {archive_name} -C dist {BIN_NAME}")
        .run()
        .context("Failed to create tarball")?;

    println!("✅ Distribution package created: {}", archive_name);
    Ok(())
}

fn ci(sh: &Shell) -> Result<()> {
    println!("🔍 Running CI checks...");

    println!("\n📝 Checking formatting...");
    format(sh, true)?;

    println!("\n🔧 Running clippy...");
    clippy(sh)?;

    println!("\n🧪 Running tests...");
    test(sh, false)?;

    println!("\n✅ All CI checks passed!");
    Ok(())
}

fn format(sh: &Shell, check: bool) -> Result<()> {
    if check {
        cmd!(sh, "cargo fmt --all -- --check").run()?;
        println!("✅ Code formatting is correct");
    } else {
        cmd!(sh, "cargo fmt --all").run()?;
        println!("✅ Code formatted");
    }
    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo clippy --all-targets --all-features -- -D warnings").run()?;
    println!("✅ Clippy checks passed");
    Ok(())
}

fn project_root() -> Result<PathBuf> {
    Path::new(&env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask must live one level below the workspace root")
}
