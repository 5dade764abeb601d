use anyhow::Result;
use clap::Parser;
use console::style;

use signet_core::storage::{StorageConfig, StorageConfigOptions};

use super::{asset_fs, connect};

/// Load the statement mappers of the configured dialect and report them.
#[derive(Parser)]
pub struct CheckCommand {
    /// Directory holding the per-dialect mapper folders, instead of the
    /// embedded mappers.
    #[arg(short, long)]
    pub mappers_dir: Option<String>,

    /// List every statement id.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CheckCommand {
    pub async fn execute(self, config_path: &str) -> Result<()> {
        let signet = connect(config_path).await?;
        let dialect = signet.connection().dialect_name();

        signet.connection().health_check().await?;

        let (fs, mappers_path) = asset_fs(
            self.mappers_dir.as_deref(),
            &signet.config().migrations.mappers_path,
        );
        let statements = StorageConfig::new(StorageConfigOptions {
            fs: fs.as_ref(),
            mappers_path: Some(mappers_path.as_str()),
            driver: dialect,
        })?;

        println!();
        println!(
            "  {}  {} Check ({})",
            style("⚒️").bold(),
            style("SIGNET").bold().cyan(),
            dialect
        );
        println!();
        println!("  {} Database reachable", style("✓").green());
        println!(
            "  {} {} statements loaded",
            style("✓").green(),
            statements.len()
        );

        if self.verbose {
            for id in statements.statement_ids() {
                println!("    {} {}", style("→").dim(), id);
            }
        }
        println!();

        signet.close().await;
        Ok(())
    }
}
