// ABOUTME: Decides which workspaces a run migrates
// ABOUTME: Resolves name filters, skips stateless, already migrated and colliding workspaces

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::normalize::normalize_name;
use super::Migrator;
use crate::error::MigratorError;
use crate::source::Workspace;

/// The ordered set of workspaces to migrate plus why the rest were left out.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    pub workspaces: Vec<Workspace>,
    pub total_found: usize,
    pub not_found: Vec<String>,
    pub without_state: Vec<String>,
    pub already_migrated: Vec<String>,
    /// Workspaces whose destination name is taken by an earlier one in the plan.
    pub collisions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanSummary {
    pub total_found: usize,
    pub with_state: usize,
    pub without_state: usize,
    pub already_migrated: usize,
    pub collisions: usize,
    pub to_migrate: usize,
}

impl MigrationPlan {
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            total_found: self.total_found,
            with_state: self.total_found - self.without_state.len(),
            without_state: self.without_state.len(),
            already_migrated: self.already_migrated.len(),
            collisions: self.collisions.len(),
            to_migrate: self.workspaces.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }
}

impl Migrator {
    /// Builds the migration plan. An empty `filter` selects every workspace.
    ///
    /// Only a failing inventory listing or a failing lookup (other than
    /// not found) aborts planning. Existence check errors fail open.
    pub async fn plan(&self, filter: &[String]) -> Result<MigrationPlan> {
        let mut plan = MigrationPlan::default();

        let candidates = if filter.is_empty() {
            info!(organization = %self.organization, "Planning migration of ALL workspaces");
            self.source
                .list_workspaces()
                .await
                .context("Failed to list workspaces")?
        } else {
            self.resolve_filter(filter, &mut plan.not_found).await?
        };
        plan.total_found = candidates.len();

        let mut destinations: HashMap<String, String> = HashMap::new();

        for workspace in candidates {
            if !workspace.has_state {
                debug!(workspace = %workspace.name, "Workspace has no state, skipping");
                plan.without_state.push(workspace.name);
                continue;
            }

            let destination = normalize_name(&workspace.name);
            match self.store.check_exists(&self.organization, &destination).await {
                Ok(true) => {
                    debug!(
                        workspace = %workspace.name,
                        destination = %destination,
                        "State already exists at destination, skipping"
                    );
                    plan.already_migrated.push(workspace.name);
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        workspace = %workspace.name,
                        destination = %destination,
                        error = %format!("{:#}", e),
                        "Failed to check destination, assuming it does not exist"
                    );
                }
            }

            if let Some(first) = destinations.get(&destination) {
                warn!(
                    workspace = %workspace.name,
                    kept = %first,
                    destination = %destination,
                    "Destination already claimed by another workspace in this run, skipping"
                );
                plan.collisions.push(workspace.name);
                continue;
            }

            destinations.insert(destination, workspace.name.clone());
            plan.workspaces.push(workspace);
        }

        let summary = plan.summary();
        info!(
            total_found = summary.total_found,
            with_state = summary.with_state,
            without_state = summary.without_state,
            already_migrated = summary.already_migrated,
            collisions = summary.collisions,
            to_migrate = summary.to_migrate,
            "Workspace analysis complete"
        );

        if !plan.not_found.is_empty() {
            warn!(not_found = ?plan.not_found, "Some requested workspaces were not found");
        }
        if !plan.without_state.is_empty() {
            info!(workspaces = ?plan.without_state, "Workspaces without state will be ignored");
        }
        if !plan.already_migrated.is_empty() {
            info!(workspaces = ?plan.already_migrated, "Workspaces already migrated will be skipped");
        }

        Ok(plan)
    }

    async fn resolve_filter(
        &self,
        filter: &[String],
        not_found: &mut Vec<String>,
    ) -> Result<Vec<Workspace>> {
        info!(projects = ?filter, "Planning migration of selected workspaces");

        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for name in filter {
            if !seen.insert(name.as_str()) {
                continue;
            }

            match self.source.get_workspace_by_name(name).await {
                Ok(workspace) => resolved.push(workspace),
                Err(e) if MigratorError::is_not_found(&e) => {
                    warn!(workspace = %name, "Workspace not found");
                    not_found.push(name.clone());
                }
                Err(e) => {
                    return Err(e.context(format!("Failed to look up workspace '{}'", name)));
                }
            }
        }

        Ok(resolved)
    }
}
