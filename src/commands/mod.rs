// ABOUTME: CLI command implementations
// ABOUTME: Builds the migrator from config and runs the list and migrate commands

pub mod list;
pub mod migrate;

pub use list::list;
pub use migrate::{migrate, parse_projects};

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::migrator::Migrator;
use crate::source::TerraformCloudClient;
use crate::store::S3StateStore;

pub async fn build_migrator(config: &Config) -> Result<Migrator> {
    let source = TerraformCloudClient::new(
        &config.terraform_cloud.address,
        config.terraform_cloud.token.clone(),
        config.terraform_cloud.organization.clone(),
    )
    .context("Failed to create Terraform Cloud client")?;

    let store = S3StateStore::from_config(&config.aws)
        .await
        .context("Failed to create S3 client")?;

    Ok(Migrator::new(
        Arc::new(source),
        Arc::new(store),
        config.terraform_cloud.organization.clone(),
        config.migration_settings(),
    ))
}
