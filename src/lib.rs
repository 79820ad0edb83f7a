// ABOUTME: Library root for the Terraform Cloud to S3 state migrator
// ABOUTME: Exposes the orchestration core and its source/destination collaborators

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod migrator;
pub mod retry;
pub mod source;
pub mod store;

pub use config::Config;
pub use error::MigratorError;
pub use migrator::{MigrationOptions, MigrationSettings, MigrationStats, Migrator};
pub use source::{StateData, Workspace, WorkspaceSource};
pub use store::StateStore;
