//! kubekit CLI
//!
//! ```text
//! kubekit synth --config stack.yaml [--output DIR] [--per-resource]
//! kubekit validate DIR_OR_FILE
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kubekit::{build_app, manifest, StackConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Generate Kubernetes manifests from a stack file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "KUBEKIT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true, env = "KUBEKIT_LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build every chart in a stack file and write the manifests
    Synth {
        /// Stack file
        #[arg(long, short, env = "KUBEKIT_CONFIG", default_value = "stack.yaml")]
        config: PathBuf,

        /// Output directory, overrides the stack file's outdir
        #[arg(long, short, env = "KUBEKIT_OUTPUT")]
        output: Option<PathBuf>,

        /// Write one file per object
        #[arg(long, env = "KUBEKIT_PER_RESOURCE")]
        per_resource: bool,
    },

    /// Check that every YAML document is a named Kubernetes object
    Validate {
        /// Manifest file or directory
        path: PathBuf,
    },
}

// =============================================================================
// Main
// =============================================================================

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    match args.command {
        Command::Synth {
            config,
            output,
            per_resource,
        } => synth(&config, output, per_resource),
        Command::Validate { path } => validate(&path),
    }
}

fn synth(config_path: &Path, output: Option<PathBuf>, per_resource: bool) -> anyhow::Result<()> {
    let mut config = StackConfig::load(config_path)
        .with_context(|| format!("loading stack file {}", config_path.display()))?;
    if output.is_some() {
        config.outdir = output;
    }
    if per_resource {
        config.file_per_resource = true;
    }

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let app = build_app(&config, base_dir).context("building charts")?;

    info!(outdir = %app.outdir().display(), charts = app.charts().len(), "synthesizing");
    let written = app.synth().context("writing manifests")?;
    info!(files = written.len(), "done");
    Ok(())
}

fn validate(path: &Path) -> anyhow::Result<()> {
    let counts = manifest::validate_path(path)
        .with_context(|| format!("validating {}", path.display()))?;

    let total: usize = counts.values().sum();
    for (kind, count) in &counts {
        println!("{:<24} {}", kind, count);
    }
    println!("{:<24} {}", "total", total);
    Ok(())
}

// =============================================================================
// Logging
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
