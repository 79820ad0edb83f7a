// ABOUTME: Custom error types for the state migrator
// ABOUTME: Provides context-specific error variants with actionable messages

use std::fmt;

#[derive(Debug)]
pub enum MigratorError {
    Connection(String),
    Permission(String),
    Validation(String),
    NotFound(String),
    Migration(String),
}

impl MigratorError {
    /// True when the error reports a missing remote resource.
    pub fn is_not_found(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<MigratorError>(),
            Some(MigratorError::NotFound(_))
        )
    }
}

impl fmt::Display for MigratorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MigratorError::Connection(msg) => write!(f, "Connection error: {}", msg),
            MigratorError::Permission(msg) => write!(f, "Permission error: {}", msg),
            MigratorError::Validation(msg) => write!(f, "Validation error: {}", msg),
            MigratorError::NotFound(msg) => write!(f, "Not found: {}", msg),
            MigratorError::Migration(msg) => write!(f, "Migration error: {}", msg),
        }
    }
}

impl std::error::Error for MigratorError {}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_display_prefixes_category() {
        let err = MigratorError::Permission("bucket 'states' denied HeadBucket".to_string());
        assert_eq!(
            err.to_string(),
            "Permission error: bucket 'states' denied HeadBucket"
        );
    }

    #[test]
    fn test_not_found_survives_context() {
        let err: anyhow::Error = MigratorError::NotFound("workspace 'app'".to_string()).into();
        let err = Err::<(), _>(err)
            .context("failed to look up workspace")
            .unwrap_err();
        assert!(MigratorError::is_not_found(&err));

        let other = anyhow::anyhow!("connection reset");
        assert!(!MigratorError::is_not_found(&other));
    }
}
