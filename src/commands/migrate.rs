// ABOUTME: `migrate` command: confirms, runs the migration, and reports the outcome
// ABOUTME: Parses the --projects filter and drives the progress bar

use anyhow::{Context, Result};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::build_migrator;
use crate::config::Config;
use crate::migrator::MigrationOptions;

pub async fn migrate(config: &Config, options: MigrationOptions, assume_yes: bool) -> Result<()> {
    if options.dry_run {
        info!("DRY-RUN mode enabled - no changes will be made");
    }

    if !options.workspaces.is_empty() {
        info!(projects = ?options.workspaces, "Specific workspaces selected for migration");
    }

    if !options.dry_run && !assume_yes {
        let scope = if options.workspaces.is_empty() {
            "ALL workspaces".to_string()
        } else {
            format!("{} selected workspaces", options.workspaces.len())
        };
        let proceed = Confirm::new()
            .with_prompt(format!(
                "Migrate {} of '{}' to s3://{}/{}?",
                scope,
                config.terraform_cloud.organization,
                config.aws.bucket,
                config.aws.prefix.trim_matches('/')
            ))
            .default(false)
            .interact()
            .context("Failed to read confirmation. Pass --yes to skip the prompt")?;

        if !proceed {
            info!("Migration cancelled");
            return Ok(());
        }
    }

    info!(
        batch_size = config.migration.batch_size,
        concurrent_uploads = config.migration.concurrent_uploads,
        target_bucket = %config.aws.bucket,
        organization = %config.terraform_cloud.organization,
        "Starting migration"
    );

    let progress = progress_bar(config.logging.log_file().is_none())?;
    let migrator = build_migrator(config).await?.with_progress(progress);
    let stats = migrator
        .migrate(&options)
        .await
        .context("Migration did not complete cleanly")?;

    if options.dry_run {
        info!(total = stats.total, "Dry run complete");
    } else {
        info!(total = stats.total, "Migration completed successfully");
    }
    Ok(())
}

/// The bar and the log writer share stderr, so the bar stays hidden when
/// logs are not going to a file.
fn progress_bar(logs_to_stderr: bool) -> Result<ProgressBar> {
    if logs_to_stderr {
        return Ok(ProgressBar::hidden());
    }
    Ok(ProgressBar::new(0).with_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} workspaces",
        )?
        .progress_chars("=> "),
    ))
}

/// Splits a comma separated `--projects` value, dropping blanks.
pub fn parse_projects(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
