// ABOUTME: Aggregate results of one migration run
// ABOUTME: Counts outcomes, keeps failure details, and reports duration and success rate

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedMigration {
    pub workspace_name: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct MigrationStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration: Duration,
    pub failures: Vec<FailedMigration>,
    started: Instant,
}

impl MigrationStats {
    /// Stamps the start of a run; `total` is set once planning is done.
    pub fn start() -> Self {
        Self {
            total: 0,
            successful: 0,
            failed: 0,
            started_at: Utc::now(),
            finished_at: None,
            duration: Duration::ZERO,
            failures: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn begin(&mut self, total: usize) {
        self.total = total;
    }

    pub fn record_success(&mut self) {
        self.successful += 1;
    }

    pub fn record_failure(&mut self, workspace_name: &str, error: impl Into<String>) {
        self.failed += 1;
        self.failures.push(FailedMigration {
            workspace_name: workspace_name.to_string(),
            error: error.into(),
        });
    }

    pub fn record(&mut self, workspace_name: &str, outcome: &anyhow::Result<()>) {
        match outcome {
            Ok(()) => self.record_success(),
            Err(e) => self.record_failure(workspace_name, format!("{:#}", e)),
        }
    }

    pub fn finalize(&mut self) {
        self.finished_at = Some(Utc::now());
        self.duration = self.started.elapsed();
    }

    pub fn completed(&self) -> usize {
        self.successful + self.failed
    }

    /// Every planned workspace has produced exactly one outcome.
    pub fn is_complete(&self) -> bool {
        self.completed() == self.total
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total as f64 * 100.0
    }

    pub fn log_summary(&self, dry_run: bool) {
        let mode = if dry_run { "dry run" } else { "migration" };

        info!(
            mode = mode,
            total = self.total,
            successful = self.successful,
            failed = self.failed,
            duration = ?self.duration,
            success_rate = %format!("{:.1}%", self.success_rate()),
            "Migration finished"
        );

        if !self.failures.is_empty() {
            error!(count = self.failures.len(), "Workspaces that failed:");
            for failure in &self.failures {
                error!(
                    workspace = %failure.workspace_name,
                    error = %failure.error,
                    "Workspace migration failed"
                );
            }
        }
    }
}
