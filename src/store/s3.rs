// ABOUTME: S3 client that stores migrated state objects
// ABOUTME: Resolves credentials through the AWS default chain and maps S3 statuses to migrator errors

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::{object_key, StateStore, METADATA_FILE, STATE_FILE};
use crate::config::AwsConfig;
use crate::error::MigratorError;

pub struct S3StateStore {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3StateStore {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Builds the client from the default credential chain (environment,
    /// shared config and SSO, web identity, container and instance roles).
    /// `aws.profile` selects a shared-config profile; `aws.endpoint` switches
    /// to path-style addressing for MinIO and LocalStack.
    pub async fn from_config(config: &AwsConfig) -> Result<Self> {
        let endpoint = config.endpoint.as_deref().filter(|e| !e.is_empty());
        if let Some(endpoint) = endpoint {
            reqwest::Url::parse(endpoint)
                .with_context(|| format!("Invalid S3 endpoint '{}'", endpoint))?;
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(profile) = config.profile.as_deref().filter(|p| !p.is_empty()) {
            debug!(profile = %profile, "Using AWS shared config profile");
            loader = loader.profile_name(profile);
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self::new(
            Client::from_conf(builder.build()),
            config.bucket.clone(),
            config.prefix.clone(),
        ))
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        file_type: &str,
        organization: &str,
        workspace: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .metadata("workspace", workspace)
            .metadata("organization", organization)
            .metadata("file-type", file_type)
            .send()
            .await
            .map_err(|e| {
                request_error(
                    response_status(&e),
                    &format!("upload of s3://{}/{}", self.bucket, key),
                    &DisplayErrorContext(&e).to_string(),
                )
            })?;
        Ok(())
    }
}

fn response_status<E>(err: &SdkError<E>) -> Option<u16> {
    err.raw_response().map(|response| response.status().as_u16())
}

/// Outcome of a HEAD on the state object: `Some(exists)` for a definite
/// answer, `None` when the status says nothing about existence.
fn existence_from_status(status: u16) -> Option<bool> {
    match status {
        200..=299 => Some(true),
        404 => Some(false),
        _ => None,
    }
}

fn bucket_check_error(bucket: &str, status: Option<u16>, detail: &str) -> MigratorError {
    match status {
        Some(403) => MigratorError::Permission(format!(
            "Access to S3 bucket '{}' was denied. Check the bucket policy and the AWS credentials or profile",
            bucket
        )),
        Some(404) => MigratorError::Connection(format!("S3 bucket '{}' does not exist", bucket)),
        Some(status) => MigratorError::Connection(format!(
            "S3 bucket '{}' check failed with status {}: {}",
            bucket, status, detail
        )),
        None => MigratorError::Connection(format!(
            "Cannot reach S3 bucket '{}': {}",
            bucket, detail
        )),
    }
}

fn request_error(status: Option<u16>, what: &str, detail: &str) -> anyhow::Error {
    match status {
        Some(403) => MigratorError::Permission(format!(
            "S3 denied {}. Check the bucket policy and the AWS credentials or profile",
            what
        ))
        .into(),
        Some(404) => MigratorError::NotFound(what.to_string()).into(),
        Some(status) => anyhow!("S3 {} failed with status {}: {}", what, status, detail),
        None => anyhow!("S3 {} failed: {}", what, detail),
    }
}

#[async_trait]
impl StateStore for S3StateStore {
    async fn validate_connection(&self) -> Result<()> {
        debug!(bucket = %self.bucket, "Validating S3 connection");

        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                bucket_check_error(
                    &self.bucket,
                    response_status(&e),
                    &DisplayErrorContext(&e).to_string(),
                )
            })?;

        info!(bucket = %self.bucket, "S3 connection validated");
        Ok(())
    }

    async fn check_exists(&self, _organization: &str, name: &str) -> Result<bool> {
        let key = object_key(&self.prefix, name, STATE_FILE);
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    return Ok(false);
                }
                match response_status(&e).and_then(existence_from_status) {
                    Some(exists) => Ok(exists),
                    None => Err(request_error(
                        response_status(&e),
                        &format!("existence check of s3://{}/{}", self.bucket, key),
                        &DisplayErrorContext(&e).to_string(),
                    )),
                }
            }
        }
    }

    async fn upload_state(
        &self,
        organization: &str,
        name: &str,
        content: &[u8],
        metadata: &BTreeMap<String, Value>,
    ) -> Result<()> {
        let state_key = object_key(&self.prefix, name, STATE_FILE);
        let metadata_key = object_key(&self.prefix, name, METADATA_FILE);

        info!(
            workspace = %name,
            state_key = %state_key,
            size_bytes = content.len(),
            "Uploading state"
        );

        self.put_object(&state_key, content.to_vec(), "terraform-state", organization, name)
            .await
            .with_context(|| format!("Failed to upload state for workspace {}", name))?;

        let metadata_json = serde_json::to_vec_pretty(metadata)
            .with_context(|| format!("Failed to serialize metadata for workspace {}", name))?;

        self.put_object(&metadata_key, metadata_json, "metadata", organization, name)
            .await
            .with_context(|| format!("Failed to upload metadata for workspace {}", name))?;

        info!(
            workspace = %name,
            state_key = %state_key,
            metadata_key = %metadata_key,
            "Upload complete"
        );
        Ok(())
    }
}
