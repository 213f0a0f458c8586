//! Deployment-manifest synthesizer.
//!
//! Reads a YAML deployment config, registers the database server and the
//! bootstrap construct, and writes the resulting manifest JSON to stdout
//! or a file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{init_logging, ConfigExt};
use db_bootstrap::config::SynthConfig;
use db_bootstrap::{create_database_server, BootstrappedDb};
use std::fs;
use std::path::{Path, PathBuf};
use synth::secret::{generate_password, GenerationPolicy};
use synth::{Deployment, DeploymentContext, Handler};
use tracing::info;

/// Synthesize database bootstrap deployment manifests
#[derive(Debug, Parser)]
#[command(name = "db-synth")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Synthesize the manifest from a deployment config
    Synth {
        /// Path to the deployment config file
        config: PathBuf,

        /// Write the manifest here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generate a password the way the deploy-time secret service does
    GenPassword {
        /// Password length
        #[arg(short, long, default_value_t = 32)]
        length: usize,

        /// Allow punctuation characters
        #[arg(long)]
        punctuation: bool,
    },
}

fn main() -> Result<()> {
    let _guard = init_logging("db-synth");
    let cli = Cli::parse();

    match cli.command {
        Command::Synth { config, out } => synthesize(&config, out.as_deref()),
        Command::GenPassword { length, punctuation } => {
            let policy = GenerationPolicy {
                length,
                exclude_punctuation: !punctuation,
                ..GenerationPolicy::default()
            };
            println!("{}", generate_password(&policy));
            Ok(())
        }
    }
}

fn synthesize(config_path: &Path, out: Option<&Path>) -> Result<()> {
    let config = SynthConfig::from_path(config_path)?;

    let context = match &config.deployment {
        Some(name) => DeploymentContext::new(name.clone())
            .with_environment(String::env_or("DEPLOYMENT_ENV", "production")),
        None => DeploymentContext::from_env()
            .context("Set `deployment` in the config or DEPLOYMENT_NAME in the environment")?,
    };

    info!(deployment = %context.name, environment = %context.environment, "Synthesizing deployment");

    let mut deployment = Deployment::new(context);

    let server = create_database_server(&mut deployment, "db", config.server.to_options())?;
    let handler = Handler::new(&config.bootstrap.handler.name, &config.bootstrap.handler.version);
    let bootstrap = BootstrappedDb::new(
        &mut deployment,
        &config.bootstrap.id,
        server.as_ref(),
        &handler,
        config.bootstrap.to_options(),
    )?;

    info!(
        secret = %bootstrap.credentials().main().arn,
        read_only = bootstrap.credentials().read_only().is_some(),
        "Credential secrets materialized"
    );

    let manifest = deployment.to_json().context("Failed to serialize manifest")?;

    match out {
        Some(path) => {
            fs::write(path, &manifest)
                .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
            info!(path = %path.display(), "Manifest written");
        }
        None => println!("{manifest}"),
    }

    Ok(())
}
