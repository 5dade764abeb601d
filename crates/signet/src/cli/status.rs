use anyhow::Result;
use clap::Parser;
use console::style;

use signet_runtime::migrations::load_steps;

use super::{asset_fs, connect};

/// Show the recorded migration version.
#[derive(Parser)]
pub struct StatusCommand {
    /// Directory holding the per-dialect migration folders, instead of the
    /// embedded schemas.
    #[arg(short, long)]
    pub schemas_dir: Option<String>,

    /// Prefix of the migrations table.
    #[arg(short, long)]
    pub prefix: Option<String>,
}

impl StatusCommand {
    pub async fn execute(self, config_path: &str) -> Result<()> {
        let signet = connect(config_path).await?;
        let migrations = &signet.config().migrations;
        let dialect = signet.connection().dialect_name();

        let (fs, schemas_path) = asset_fs(self.schemas_dir.as_deref(), &migrations.schemas_path);
        let steps = load_steps(fs.as_ref(), &schemas_path, dialect)?;
        let prefix = self.prefix.or_else(|| migrations.table_prefix.clone());
        let version = signet.migrator().current_version(prefix.as_deref()).await?;

        println!();
        println!(
            "  {}  {} Migration Status ({})",
            style("⚒️").bold(),
            style("SIGNET").bold().cyan(),
            dialect
        );
        println!();

        for (index, step) in steps.iter().enumerate() {
            let step_version = index as i64 + 1;
            let marker = if step_version < version.version
                || (step_version == version.version && !version.dirty)
            {
                style("✓").green()
            } else if step_version == version.version {
                style("✗").red()
            } else {
                style("○").yellow()
            };
            println!(
                "    {} {} {}",
                marker,
                style(step_version).cyan(),
                step.version_description
            );
        }

        println!();
        if version.dirty {
            println!(
                "  {} Version {} is dirty ({}), repair the database before migrating",
                style("✗").red(),
                version.version,
                version.description
            );
        } else {
            println!(
                "  {} At version {} of {}",
                style("ℹ").blue(),
                version.version,
                steps.len()
            );
        }
        println!();

        signet.close().await;
        Ok(())
    }
}
