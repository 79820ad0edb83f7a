// ABOUTME: Configuration loading from a TOML file with environment overrides
// ABOUTME: Validates required settings and exposes the migrator's run settings

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::MigratorError;
use crate::migrator::MigrationSettings;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub terraform_cloud: TerraformCloudConfig,
    pub aws: AwsConfig,
    pub migration: MigrationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TerraformCloudConfig {
    pub token: String,
    pub organization: String,
    pub address: String,
}

impl Default for TerraformCloudConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            organization: String::new(),
            address: "https://app.terraform.io".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub region: String,
    pub bucket: String,
    pub prefix: String,
    /// Shared-config profile; unset uses the default credential chain.
    pub profile: Option<String>,
    pub endpoint: Option<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            bucket: String::new(),
            prefix: "terraform-states/".to_string(),
            profile: None,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub batch_size: usize,
    pub concurrent_uploads: usize,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
    pub batch_pause_secs: u64,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            concurrent_uploads: 3,
            retry_attempts: 3,
            retry_delay_secs: 1,
            batch_pause_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from("migration.log")),
        }
    }
}

impl LoggingConfig {
    /// Log file to append to. An empty `file` sends logs to stderr.
    pub fn log_file(&self) -> Option<&Path> {
        self.file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

impl Config {
    /// Loads the config file (explicit path or the first one found in the
    /// search path), applies environment overrides, and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file {} does not exist", path.display());
                }
                Some(path.to_path_buf())
            }
            None => search_paths().into_iter().find(|p| p.exists()),
        };

        let mut config = match &file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Overrides file values with any non-empty variable returned by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("TFC_TOKEN") {
            self.terraform_cloud.token = v;
        }
        if let Some(v) = get("TFC_ORGANIZATION") {
            self.terraform_cloud.organization = v;
        }
        if let Some(v) = get("TFC_ADDRESS") {
            self.terraform_cloud.address = v;
        }
        if let Some(v) = get("AWS_REGION") {
            self.aws.region = v;
        }
        if let Some(v) = get("S3_BUCKET") {
            self.aws.bucket = v;
        }
        if let Some(v) = get("S3_PREFIX") {
            self.aws.prefix = v;
        }
        if let Some(v) = get("AWS_PROFILE") {
            self.aws.profile = Some(v);
        }
        if let Some(v) = get("S3_ENDPOINT") {
            self.aws.endpoint = Some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid =
            |msg: &str| -> Result<()> { Err(MigratorError::Validation(msg.to_string()).into()) };

        if self.terraform_cloud.token.is_empty() {
            return invalid(
                "Terraform Cloud token is required (terraform_cloud.token or TFC_TOKEN)",
            );
        }
        if self.terraform_cloud.organization.is_empty() {
            return invalid(
                "Terraform Cloud organization is required (terraform_cloud.organization or TFC_ORGANIZATION)",
            );
        }
        if self.aws.bucket.is_empty() {
            return invalid("S3 bucket is required (aws.bucket or S3_BUCKET)");
        }
        if self.migration.batch_size == 0 {
            return invalid("migration.batch_size must be greater than 0");
        }
        if self.migration.concurrent_uploads == 0 {
            return invalid("migration.concurrent_uploads must be greater than 0");
        }
        if self.migration.retry_attempts == 0 {
            return invalid("migration.retry_attempts must be at least 1");
        }
        Ok(())
    }

    pub fn migration_settings(&self) -> MigrationSettings {
        MigrationSettings {
            batch_size: self.migration.batch_size,
            concurrent_uploads: self.migration.concurrent_uploads,
            retry_attempts: self.migration.retry_attempts,
            retry_delay: Duration::from_secs(self.migration.retry_delay_secs),
            batch_pause: Duration::from_secs(self.migration.batch_pause_secs),
        }
    }
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("migrator.toml"),
        PathBuf::from("config").join("migrator.toml"),
    ];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".terraform-migrator").join("config.toml"));
    }
    paths
}
