// ABOUTME: Source side of the migration: where workspace state is read from
// ABOUTME: Defines the WorkspaceSource seam and its Terraform Cloud implementation

pub mod client;
pub mod models;

pub use client::TerraformCloudClient;
pub use models::{StateData, Workspace};

use anyhow::Result;
use async_trait::async_trait;

/// Read access to workspaces and their current state.
///
/// The organization is bound when the implementation is constructed.
#[async_trait]
pub trait WorkspaceSource: Send + Sync {
    async fn validate_connection(&self) -> Result<()>;

    /// Full inventory, pagination already flattened.
    async fn list_workspaces(&self) -> Result<Vec<Workspace>>;

    /// Fails with `MigratorError::NotFound` when no workspace has that name.
    async fn get_workspace_by_name(&self, name: &str) -> Result<Workspace>;

    async fn get_workspace_state(&self, workspace_id: &str) -> Result<StateData>;
}
