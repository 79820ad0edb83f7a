// ABOUTME: CLI entry point for the Terraform Cloud to S3 state migrator
// ABOUTME: Parses arguments, loads config, sets up logging, and dispatches commands

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tfc_state_migrator::commands;
use tfc_state_migrator::config::Config;
use tfc_state_migrator::logging;
use tfc_state_migrator::migrator::MigrationOptions;

/// Migrate Terraform Cloud workspace state into S3 in controlled batches
#[derive(Parser, Debug)]
#[command(name = "tfc-state-migrator", version, about, long_about = None)]
struct Cli {
    /// Config file (default: migrator.toml, config/migrator.toml, ~/.terraform-migrator/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every workspace in the organization and whether it has state
    List,

    /// Migrate workspace state from Terraform Cloud to S3
    ///
    /// Workspaces without state are ignored and workspaces already present in
    /// the bucket are skipped.
    Migrate(MigrateArgs),
}

#[derive(Args, Debug)]
struct MigrateArgs {
    /// Fetch state but write nothing to S3
    #[arg(long)]
    dry_run: bool,

    /// Number of workspaces per batch (overrides migration.batch_size)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Comma separated workspace names to migrate instead of all of them
    #[arg(long)]
    projects: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Commands::Migrate(MigrateArgs {
        batch_size: Some(batch_size),
        ..
    }) = &cli.command
    {
        config.migration.batch_size = *batch_size;
        config.validate()?;
    }

    logging::init(&config.logging.level, config.logging.log_file())?;

    match cli.command {
        Commands::List => commands::list(&config).await,
        Commands::Migrate(args) => {
            let options = MigrationOptions {
                dry_run: args.dry_run,
                workspaces: args
                    .projects
                    .as_deref()
                    .map(commands::parse_projects)
                    .unwrap_or_default(),
            };
            commands::migrate(&config, options, args.yes).await
        }
    }
}
