// ABOUTME: Migration of a single workspace: fetch state, then upload with retries
// ABOUTME: Dry runs stop after the fetch and never touch the destination

use anyhow::{Context, Result};
use tracing::info;

use super::normalize::normalize_name;
use super::Migrator;
use crate::retry::{retry_with_linear_backoff, RetryPolicy};
use crate::source::Workspace;

impl Migrator {
    pub async fn migrate_workspace(&self, workspace: &Workspace, simulate: bool) -> Result<()> {
        // Fetch failures are permanent for this run and are not retried.
        let state = self
            .source
            .get_workspace_state(&workspace.id)
            .await
            .context("Failed to fetch state")?;

        let destination = normalize_name(&workspace.name);

        if simulate {
            info!(
                workspace = %workspace.name,
                destination = %destination,
                state_size = state.content.len(),
                serial = state.version,
                "Dry run: state would be migrated"
            );
            return Ok(());
        }

        let policy = RetryPolicy::linear(self.settings.retry_attempts, self.settings.retry_delay);
        let operation = format!("upload {}", workspace.name);

        retry_with_linear_backoff(&policy, &operation, |_| {
            self.store.upload_state(
                &self.organization,
                &destination,
                &state.content,
                &state.metadata,
            )
        })
        .await
        .with_context(|| format!("upload failed after {} attempts", policy.max_attempts.max(1)))
    }
}
