mod check;
mod migrate;
mod status;

pub use check::CheckCommand;
pub use migrate::MigrateCommand;
pub use status::StatusCommand;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use signet::assets::embedded_fs;
use signet::{Signet, SignetConfig};
use signet_core::fs::{DirFs, ReadDirAndFileFs};
use signet_runtime::observability::init_tracing;

/// SIGNET - persistence tooling for the signing service
#[derive(Parser)]
#[command(name = "signet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, default_value = "signet.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Apply schema migrations up or down to a target version.
    Migrate(MigrateCommand),

    /// Show the recorded migration version.
    Status(StatusCommand),

    /// Load the statement mappers of the configured dialect.
    Check(CheckCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Migrate(cmd) => cmd.execute(&self.config).await,
            Commands::Status(cmd) => cmd.execute(&self.config).await,
            Commands::Check(cmd) => cmd.execute(&self.config).await,
        }
    }
}

/// Load `.env` and the configuration file, install tracing and connect.
async fn connect(config_path: &str) -> Result<Signet> {
    dotenvy::dotenv().ok();

    if !Path::new(config_path).exists() {
        anyhow::bail!("Configuration file not found: {}", config_path);
    }

    let config = SignetConfig::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path))?;
    init_tracing(&config.logging);

    let signet = Signet::connect(config).await?;
    Ok(signet)
}

/// Assets under `dir` on disk, or the embedded ones under `embedded_path`.
///
/// Returns the file system and the path to read from inside it. A relative
/// `dir` is read from the working directory, so manifest script paths are
/// relative to it as well.
fn asset_fs(dir: Option<&str>, embedded_path: &str) -> (Box<dyn ReadDirAndFileFs>, String) {
    match dir {
        Some(dir) if Path::new(dir).is_absolute() => (Box::new(DirFs::new("/")), dir.to_string()),
        Some(dir) => (Box::new(DirFs::new(".")), dir.to_string()),
        None => (Box::new(embedded_fs()), embedded_path.to_string()),
    }
}
