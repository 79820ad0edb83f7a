// ABOUTME: HTTP client for the Terraform Cloud v2 API
// ABOUTME: Lists workspaces, resolves them by name, and downloads current state

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use super::models::{Document, StateData, StateVersionResource, Workspace, WorkspaceResource};
use super::WorkspaceSource;
use crate::error::MigratorError;

const PAGE_SIZE: u32 = 100;
const JSON_API: &str = "application/vnd.api+json";

pub struct TerraformCloudClient {
    client: Client,
    api_base_url: String,
    token: String,
    organization: String,
}

impl TerraformCloudClient {
    pub fn new(address: &str, token: String, organization: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base_url: format!("{}/api/v2", address.trim_end_matches('/')),
            token,
            organization,
        })
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, JSON_API)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let response = self
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to request {} from Terraform Cloud", what))?;

        let response = check_status(response, what).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", what))
    }

    async fn read_workspace_by_id(&self, workspace_id: &str) -> Result<Workspace> {
        let url = format!("{}/workspaces/{}", self.api_base_url, workspace_id);
        let doc: Document<WorkspaceResource> = self
            .fetch(&url, &format!("workspace {}", workspace_id))
            .await?;
        Ok(doc.data.into())
    }

    async fn download(&self, url: &str, workspace_name: &str) -> Result<Vec<u8>> {
        // Download URLs are pre-signed by the archivist and take no bearer token.
        let response = self.client.get(url).send().await.with_context(|| {
            format!("Failed to download state for workspace {}", workspace_name)
        })?;
        let what = format!("state download for workspace {}", workspace_name);
        let response = check_status(response, &what).await?;

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read state body for workspace {}", workspace_name))?;
        Ok(bytes.to_vec())
    }

    fn state_metadata(
        &self,
        workspace: &Workspace,
        state_version: &StateVersionResource,
    ) -> BTreeMap<String, Value> {
        let attrs = &state_version.attributes;
        let mut metadata = BTreeMap::from([
            ("workspace_id".to_string(), json!(workspace.id)),
            ("workspace_name".to_string(), json!(workspace.name)),
            ("organization".to_string(), json!(self.organization)),
            ("state_version_id".to_string(), json!(state_version.id)),
            ("serial".to_string(), json!(attrs.serial)),
            ("created_at".to_string(), json!(attrs.created_at)),
            ("terraform_version".to_string(), json!(attrs.terraform_version)),
            ("source".to_string(), json!("terraform_cloud")),
        ]);

        if let Some(sha) = attrs.vcs_commit_sha.as_deref().filter(|s| !s.is_empty()) {
            metadata.insert("vcs_commit_sha".to_string(), json!(sha));
        }

        metadata
    }
}

async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, what, &body))
}

/// Maps a non-success API status to an error. Only 404 becomes
/// `MigratorError::NotFound`; callers rely on that to skip unknown names.
fn status_error(status: StatusCode, what: &str, body: &str) -> anyhow::Error {
    match status {
        StatusCode::NOT_FOUND => MigratorError::NotFound(what.to_string()).into(),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MigratorError::Permission(format!(
            "Terraform Cloud rejected request for {} with status {}. Check that the API token can read the organization",
            what, status
        ))
        .into(),
        _ => anyhow::anyhow!(
            "Terraform Cloud request for {} failed with status {}: {}",
            what,
            status,
            body
        ),
    }
}

#[async_trait]
impl WorkspaceSource for TerraformCloudClient {
    async fn validate_connection(&self) -> Result<()> {
        debug!(organization = %self.organization, "Validating Terraform Cloud connection");

        let url = format!("{}/organizations/{}", self.api_base_url, self.organization);
        let _: Document<Value> = self
            .fetch(&url, &format!("organization {}", self.organization))
            .await
            .map_err(|e| {
                MigratorError::Connection(format!(
                    "Cannot reach Terraform Cloud organization '{}': {:#}",
                    self.organization, e
                ))
            })?;

        info!(organization = %self.organization, "Terraform Cloud connection validated");
        Ok(())
    }

    async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        info!(organization = %self.organization, "Listing workspaces");

        let mut workspaces = Vec::new();
        let mut page = 1;

        loop {
            let url = format!(
                "{}/organizations/{}/workspaces?page%5Bsize%5D={}&page%5Bnumber%5D={}",
                self.api_base_url, self.organization, PAGE_SIZE, page
            );
            let doc: Document<Vec<WorkspaceResource>> = self
                .fetch(&url, &format!("workspace page {}", page))
                .await?;

            workspaces.extend(doc.data.into_iter().map(Workspace::from));

            match doc.meta.and_then(|m| m.pagination).and_then(|p| p.next_page) {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        info!(count = workspaces.len(), "Workspaces listed");
        Ok(workspaces)
    }

    async fn get_workspace_by_name(&self, name: &str) -> Result<Workspace> {
        debug!(workspace = %name, "Looking up workspace by name");

        let url = format!(
            "{}/organizations/{}/workspaces/{}",
            self.api_base_url,
            self.organization,
            urlencoding::encode(name)
        );
        let doc: Document<WorkspaceResource> =
            self.fetch(&url, &format!("workspace '{}'", name)).await?;
        Ok(doc.data.into())
    }

    async fn get_workspace_state(&self, workspace_id: &str) -> Result<StateData> {
        debug!(workspace_id = %workspace_id, "Fetching workspace state");

        let workspace = self.read_workspace_by_id(workspace_id).await?;
        if !workspace.has_state {
            anyhow::bail!("workspace {} has no current state", workspace.name);
        }

        let url = format!(
            "{}/workspaces/{}/current-state-version",
            self.api_base_url, workspace_id
        );
        let doc: Document<StateVersionResource> = self
            .fetch(
                &url,
                &format!("current state version of workspace {}", workspace.name),
            )
            .await?;
        let state_version = doc.data;

        let download_url = state_version
            .attributes
            .hosted_state_download_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .with_context(|| {
                format!(
                    "No download URL available for the state of workspace {}",
                    workspace.name
                )
            })?;

        let content = self.download(download_url, &workspace.name).await?;
        let metadata = self.state_metadata(&workspace, &state_version);

        debug!(
            workspace = %workspace.name,
            serial = state_version.attributes.serial,
            size_bytes = content.len(),
            "Workspace state fetched"
        );

        Ok(StateData {
            workspace_name: workspace.name,
            content,
            version: state_version.attributes.serial,
            state_version_id: state_version.id,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::models::StateVersionAttributes;

    fn client() -> TerraformCloudClient {
        TerraformCloudClient::new(
            "https://app.terraform.io/",
            "token".to_string(),
            "acme".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert_eq!(client.api_base_url, "https://app.terraform.io/api/v2");
        assert_eq!(client.organization(), "acme");
    }

    #[test]
    fn test_state_metadata_includes_commit_only_when_present() {
        let client = client();
        let workspace = Workspace {
            id: "ws-1".to_string(),
            name: "network-prod".to_string(),
            description: None,
            has_state: true,
            current_state_version: Some("sv-9".to_string()),
        };
        let mut state_version = StateVersionResource {
            id: "sv-9".to_string(),
            attributes: StateVersionAttributes {
                serial: 7,
                created_at: Some("2024-03-01T10:00:00Z".to_string()),
                terraform_version: Some("1.7.4".to_string()),
                vcs_commit_sha: None,
                hosted_state_download_url: None,
            },
        };

        let metadata = client.state_metadata(&workspace, &state_version);
        assert_eq!(metadata["organization"], json!("acme"));
        assert_eq!(metadata["serial"], json!(7));
        assert_eq!(metadata["source"], json!("terraform_cloud"));
        assert!(!metadata.contains_key("vcs_commit_sha"));

        state_version.attributes.vcs_commit_sha = Some("abc123".to_string());
        let metadata = client.state_metadata(&workspace, &state_version);
        assert_eq!(metadata["vcs_commit_sha"], json!("abc123"));
    }

    #[test]
    fn test_status_error_maps_only_404_to_not_found() {
        let missing = status_error(StatusCode::NOT_FOUND, "workspace 'ghost'", "");
        assert!(MigratorError::is_not_found(&missing));
        assert_eq!(missing.to_string(), "Not found: workspace 'ghost'");

        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = status_error(status, "workspace 'app'", "");
            assert!(!MigratorError::is_not_found(&err));
            assert!(matches!(
                err.downcast_ref::<MigratorError>(),
                Some(MigratorError::Permission(_))
            ));
        }

        let server = status_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "workspace 'app'",
            "upstream down",
        );
        assert!(!MigratorError::is_not_found(&server));
        assert!(server.downcast_ref::<MigratorError>().is_none());
        assert!(server.to_string().contains("500"));
        assert!(server.to_string().contains("upstream down"));

        let throttled = status_error(StatusCode::TOO_MANY_REQUESTS, "workspaces page 2", "");
        assert!(!MigratorError::is_not_found(&throttled));
    }
}
