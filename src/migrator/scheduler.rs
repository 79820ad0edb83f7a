// ABOUTME: Runs planned workspaces in sequential batches of concurrent tasks
// ABOUTME: A per-batch semaphore bounds in-flight transfers; outcomes land in shared stats

use anyhow::{anyhow, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info};

use super::stats::MigrationStats;
use super::{MigrationOptions, Migrator};
use crate::source::Workspace;

pub type SharedStats = Arc<Mutex<MigrationStats>>;

impl Migrator {
    /// Processes `workspaces` in contiguous batches of `batch_size`.
    ///
    /// Batches run strictly one after another with `batch_pause` between
    /// them. A failing batch is logged and the next one still runs.
    pub async fn process_batches(
        &self,
        workspaces: &[Workspace],
        options: &MigrationOptions,
        stats: &SharedStats,
    ) {
        let batch_size = self.settings.batch_size.max(1);
        let total_batches = workspaces.len().div_ceil(batch_size);

        for (index, batch) in workspaces.chunks(batch_size).enumerate() {
            let batch_number = index + 1;
            let processed = index * batch_size;

            info!(
                batch = batch_number,
                total_batches = total_batches,
                batch_size = batch.len(),
                progress = %format!("{:.1}%", processed as f64 / workspaces.len() as f64 * 100.0),
                "Processing batch"
            );

            if let Err(e) = self.run_batch(batch, options, stats).await {
                error!(
                    batch = batch_number,
                    error = %format!("{:#}", e),
                    "Error while processing batch"
                );
            }

            if batch_number < total_batches {
                tokio::time::sleep(self.settings.batch_pause).await;
            }
        }
    }

    /// Migrates one batch with at most `concurrent_uploads` tasks in flight.
    ///
    /// Returns once every task has finished. Workspace failures are recorded
    /// in `stats`; only aborted tasks make this return an error.
    pub async fn run_batch(
        &self,
        batch: &[Workspace],
        options: &MigrationOptions,
        stats: &SharedStats,
    ) -> Result<()> {
        let permits = Arc::new(Semaphore::new(self.settings.concurrent_uploads.max(1)));
        let mut handles = Vec::with_capacity(batch.len());

        for workspace in batch {
            let migrator = self.clone();
            let permits = Arc::clone(&permits);
            let stats = Arc::clone(stats);
            let workspace = workspace.clone();
            let simulate = options.dry_run;
            let name = workspace.name.clone();

            let handle = tokio::spawn(async move {
                let outcome = match permits.acquire().await {
                    Ok(_permit) => migrator.migrate_workspace(&workspace, simulate).await,
                    Err(e) => Err(anyhow!("concurrency pool closed: {}", e)),
                };
                migrator
                    .record_outcome(&stats, &workspace.name, outcome)
                    .await;
            });
            handles.push((name, handle));
        }

        let results = join_all(
            handles
                .into_iter()
                .map(|(name, handle)| async move { (name, handle.await) }),
        )
        .await;

        let mut aborted = 0;
        for (name, result) in results {
            if let Err(e) = result {
                aborted += 1;
                self.record_outcome(stats, &name, Err(anyhow!("migration task aborted: {}", e)))
                    .await;
            }
        }

        if aborted > 0 {
            anyhow::bail!("{} migration tasks aborted", aborted);
        }
        Ok(())
    }

    async fn record_outcome(&self, stats: &SharedStats, workspace_name: &str, outcome: Result<()>) {
        match &outcome {
            Ok(()) => info!(workspace = %workspace_name, "Workspace migrated"),
            Err(e) => error!(
                workspace = %workspace_name,
                error = %format!("{:#}", e),
                "Workspace migration failed"
            ),
        }

        stats.lock().await.record(workspace_name, &outcome);
        self.progress.inc(1);
    }
}
