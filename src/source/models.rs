// ABOUTME: Data structures for Terraform Cloud workspaces and state versions
// ABOUTME: JSON:API response documents plus the domain values handed to the migrator

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A migratable Terraform Cloud workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub has_state: bool,
    pub current_state_version: Option<String>,
}

/// One workspace's current state, ready for upload.
#[derive(Debug, Clone)]
pub struct StateData {
    pub workspace_name: String,
    pub content: Vec<u8>,
    pub version: i64,
    pub state_version_id: String,
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<Meta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Pagination {
    pub current_page: Option<u32>,
    pub next_page: Option<u32>,
    pub total_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceResource {
    pub id: String,
    pub attributes: WorkspaceAttributes,
    #[serde(default)]
    pub relationships: WorkspaceRelationships,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceAttributes {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkspaceRelationships {
    #[serde(default)]
    pub current_state_version: Option<Relationship>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relationship {
    pub data: Option<ResourceRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateVersionResource {
    pub id: String,
    pub attributes: StateVersionAttributes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StateVersionAttributes {
    pub serial: i64,
    pub created_at: Option<String>,
    pub terraform_version: Option<String>,
    pub vcs_commit_sha: Option<String>,
    pub hosted_state_download_url: Option<String>,
}

impl From<WorkspaceResource> for Workspace {
    fn from(resource: WorkspaceResource) -> Self {
        let current_state_version = resource
            .relationships
            .current_state_version
            .and_then(|rel| rel.data)
            .map(|data| data.id);

        Workspace {
            id: resource.id,
            name: resource.attributes.name,
            description: resource.attributes.description.filter(|d| !d.is_empty()),
            has_state: current_state_version.is_some(),
            current_state_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_page_deserializes() {
        let body = r#"{
            "data": [
                {
                    "id": "ws-abc",
                    "type": "workspaces",
                    "attributes": { "name": "network-prod", "description": "core vpc" },
                    "relationships": {
                        "current-state-version": { "data": { "id": "sv-123", "type": "state-versions" } }
                    }
                },
                {
                    "id": "ws-def",
                    "type": "workspaces",
                    "attributes": { "name": "sandbox", "description": null },
                    "relationships": { "current-state-version": { "data": null } }
                }
            ],
            "meta": { "pagination": { "current-page": 1, "next-page": 2, "total-count": 140 } }
        }"#;

        let doc: Document<Vec<WorkspaceResource>> = serde_json::from_str(body).unwrap();
        let next = doc.meta.and_then(|m| m.pagination).and_then(|p| p.next_page);
        assert_eq!(next, Some(2));

        let workspaces: Vec<Workspace> = doc.data.into_iter().map(Workspace::from).collect();
        assert_eq!(workspaces[0].name, "network-prod");
        assert!(workspaces[0].has_state);
        assert_eq!(workspaces[0].current_state_version.as_deref(), Some("sv-123"));
        assert_eq!(workspaces[0].description.as_deref(), Some("core vpc"));
        assert!(!workspaces[1].has_state);
        assert_eq!(workspaces[1].description, None);
    }

    #[test]
    fn test_workspace_without_relationships() {
        let body = r#"{ "data": { "id": "ws-1", "attributes": { "name": "bare" } } }"#;
        let doc: Document<WorkspaceResource> = serde_json::from_str(body).unwrap();
        let workspace = Workspace::from(doc.data);
        assert!(!workspace.has_state);
        assert_eq!(workspace.current_state_version, None);
    }

    #[test]
    fn test_state_version_deserializes() {
        let body = r#"{
            "data": {
                "id": "sv-123",
                "type": "state-versions",
                "attributes": {
                    "serial": 42,
                    "created-at": "2024-03-01T10:00:00.000Z",
                    "terraform-version": "1.7.4",
                    "vcs-commit-sha": null,
                    "hosted-state-download-url": "https://archivist.terraform.io/v1/object/abc"
                }
            }
        }"#;

        let doc: Document<StateVersionResource> = serde_json::from_str(body).unwrap();
        assert_eq!(doc.data.attributes.serial, 42);
        assert_eq!(doc.data.attributes.terraform_version.as_deref(), Some("1.7.4"));
        assert_eq!(doc.data.attributes.vcs_commit_sha, None);
        assert!(doc
            .data
            .attributes
            .hosted_state_download_url
            .unwrap()
            .starts_with("https://archivist"));
    }
}
