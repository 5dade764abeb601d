use anyhow::Result;
use clap::Parser;
use console::style;

use signet_runtime::migrations::MigrateFromFilesInput;

use super::{asset_fs, connect};

/// Apply schema migrations.
#[derive(Parser)]
pub struct MigrateCommand {
    /// Version to reach (defaults to the configured target, then the latest step).
    #[arg(short, long)]
    pub target: Option<i64>,

    /// Directory holding the per-dialect migration folders, instead of the
    /// embedded schemas.
    #[arg(short, long)]
    pub schemas_dir: Option<String>,

    /// Prefix of the migrations table.
    #[arg(short, long)]
    pub prefix: Option<String>,
}

impl MigrateCommand {
    pub async fn execute(self, config_path: &str) -> Result<()> {
        let signet = connect(config_path).await?;
        let migrations = &signet.config().migrations;

        let (fs, schemas_path) = asset_fs(self.schemas_dir.as_deref(), &migrations.schemas_path);
        let prefix = self.prefix.or_else(|| migrations.table_prefix.clone());

        println!();
        println!(
            "  {}  {} Migrations ({})",
            style("⚒️").bold(),
            style("SIGNET").bold().cyan(),
            signet.connection().dialect_name()
        );
        println!();

        let before = signet.migrator().current_version(prefix.as_deref()).await?;
        if before.dirty {
            println!(
                "  {} Version {} is dirty, repair the database before migrating",
                style("✗").red(),
                before.version
            );
        }

        println!("  {} Running migrations...", style("→").dim());
        let result = signet
            .migrator()
            .migrate_from_files(MigrateFromFilesInput {
                fs: fs.as_ref(),
                target_version: self.target.or(migrations.target_version),
                migrations_table_prefix: prefix.clone(),
                schemas_path: Some(schemas_path),
            })
            .await;

        if let Err(e) = result {
            signet.close().await;
            return Err(e.into());
        }

        let after = signet.migrator().current_version(prefix.as_deref()).await?;
        if after.version == before.version {
            println!(
                "  {} Already at version {}",
                style("ℹ").blue(),
                after.version
            );
        } else {
            println!(
                "  {} Migrated from version {} to {}",
                style("✓").green(),
                before.version,
                after.version
            );
        }
        println!();

        signet.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};

    #[test]
    fn test_parse_migrate_options() {
        let cli = Cli::try_parse_from([
            "signet",
            "migrate",
            "--target",
            "1",
            "--schemas-dir",
            "db/schemas",
            "--prefix",
            "tenant",
        ])
        .unwrap();

        let Commands::Migrate(cmd) = cli.command else {
            panic!("expected migrate command");
        };
        assert_eq!(cmd.target, Some(1));
        assert_eq!(cmd.schemas_dir.as_deref(), Some("db/schemas"));
        assert_eq!(cmd.prefix.as_deref(), Some("tenant"));
    }

    #[test]
    fn test_parse_migrate_defaults() {
        let cli = Cli::try_parse_from(["signet", "migrate"]).unwrap();
        let Commands::Migrate(cmd) = cli.command else {
            panic!("expected migrate command");
        };
        assert_eq!(cmd.target, None);
        assert!(cmd.schemas_dir.is_none());
        assert!(cmd.prefix.is_none());
    }
}
