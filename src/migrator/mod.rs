// ABOUTME: Migration orchestration: planning, batching, concurrent transfers, and stats
// ABOUTME: Migrator ties a WorkspaceSource to a StateStore for one organization

pub mod normalize;
pub mod planner;
pub mod scheduler;
pub mod stats;
pub mod task;

pub use normalize::{normalize_name, ENVIRONMENT_SUFFIXES};
pub use planner::{MigrationPlan, PlanSummary};
pub use scheduler::SharedStats;
pub use stats::{FailedMigration, MigrationStats};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::MigratorError;
use crate::source::{Workspace, WorkspaceSource};
use crate::store::StateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationSettings {
    pub batch_size: usize,
    pub concurrent_uploads: usize,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub batch_pause: Duration,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            concurrent_uploads: 3,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
            batch_pause: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    /// Fetch state but never write to the destination.
    pub dry_run: bool,
    /// Workspace names to migrate; empty means all of them.
    pub workspaces: Vec<String>,
}

#[derive(Clone)]
pub struct Migrator {
    source: Arc<dyn WorkspaceSource>,
    store: Arc<dyn StateStore>,
    organization: String,
    settings: MigrationSettings,
    progress: ProgressBar,
}

impl Migrator {
    pub fn new(
        source: Arc<dyn WorkspaceSource>,
        store: Arc<dyn StateStore>,
        organization: impl Into<String>,
        settings: MigrationSettings,
    ) -> Self {
        Self {
            source,
            store,
            organization: organization.into(),
            settings,
            progress: ProgressBar::hidden(),
        }
    }

    /// Reports each finished workspace on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn settings(&self) -> &MigrationSettings {
        &self.settings
    }

    pub async fn validate_connections(&self) -> Result<()> {
        info!("Validating connections");

        self.source
            .validate_connection()
            .await
            .context("Terraform Cloud validation failed")?;
        self.store
            .validate_connection()
            .await
            .context("S3 validation failed")?;

        info!("All connections validated");
        Ok(())
    }

    pub async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        self.validate_connections().await?;
        self.source.list_workspaces().await
    }

    /// Runs a migration to completion and returns its stats.
    ///
    /// Errors only when connections or planning fail; workspace failures are
    /// reported through the returned stats.
    pub async fn run(&self, options: &MigrationOptions) -> Result<MigrationStats> {
        self.validate_connections().await?;

        let mut stats = MigrationStats::start();
        let plan = self
            .plan(&options.workspaces)
            .await
            .context("Failed to build the list of workspaces to migrate")?;
        stats.begin(plan.workspaces.len());

        if plan.is_empty() {
            warn!("No workspaces to migrate");
            stats.finalize();
            return Ok(stats);
        }

        info!(
            total_workspaces = stats.total,
            batch_size = self.settings.batch_size,
            concurrent_uploads = self.settings.concurrent_uploads,
            dry_run = options.dry_run,
            "Starting migration"
        );

        self.progress.set_length(stats.total as u64);
        let shared: SharedStats = Arc::new(Mutex::new(stats));
        self.process_batches(&plan.workspaces, options, &shared)
            .await;
        self.progress.finish_and_clear();

        let mut stats = shared.lock().await.clone();
        stats.finalize();
        stats.log_summary(options.dry_run);
        Ok(stats)
    }

    /// Like [`Migrator::run`], but any failed workspace turns into an error.
    pub async fn migrate(&self, options: &MigrationOptions) -> Result<MigrationStats> {
        let stats = self.run(options).await?;

        if stats.failed > 0 {
            return Err(MigratorError::Migration(format!(
                "migration finished with {} of {} workspaces failed",
                stats.failed, stats.total
            ))
            .into());
        }
        Ok(stats)
    }
}
