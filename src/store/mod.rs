// ABOUTME: Destination side of the migration: where state objects are written
// ABOUTME: Defines the StateStore seam, object key layout, and the S3 implementation

pub mod s3;

pub use s3::S3StateStore;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

pub const STATE_FILE: &str = "terraform.tfstate";
pub const METADATA_FILE: &str = "metadata.json";

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn validate_connection(&self) -> Result<()>;

    /// Whether `{name}/terraform.tfstate` already exists under the prefix.
    async fn check_exists(&self, organization: &str, name: &str) -> Result<bool>;

    /// Writes the raw state and its pretty-printed metadata next to it.
    async fn upload_state(
        &self,
        organization: &str,
        name: &str,
        content: &[u8],
        metadata: &BTreeMap<String, Value>,
    ) -> Result<()>;
}

/// Object key for `file` of destination `name` under `prefix`.
pub fn object_key(prefix: &str, name: &str, file: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}", name, file)
    } else {
        format!("{}/{}/{}", prefix, name, file)
    }
}
