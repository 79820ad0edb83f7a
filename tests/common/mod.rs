// ABOUTME: In-memory source and store used by the integration tests
// ABOUTME: Record every call with its (paused) clock offset for timing assertions

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use tfc_state_migrator::error::MigratorError;
use tfc_state_migrator::migrator::{MigrationSettings, Migrator};
use tfc_state_migrator::source::{StateData, Workspace, WorkspaceSource};
use tfc_state_migrator::store::StateStore;

pub fn workspace(name: &str, has_state: bool) -> Workspace {
    Workspace {
        id: format!("ws-{}", name),
        name: name.to_string(),
        description: None,
        has_state,
        current_state_version: has_state.then(|| format!("sv-{}", name)),
    }
}

pub fn settings(batch_size: usize, concurrent_uploads: usize, retry_attempts: u32) -> MigrationSettings {
    MigrationSettings {
        batch_size,
        concurrent_uploads,
        retry_attempts,
        retry_delay: Duration::from_secs(1),
        batch_pause: Duration::from_secs(1),
    }
}

pub fn migrator(
    source: &Arc<FakeSource>,
    store: &Arc<FakeStore>,
    settings: MigrationSettings,
) -> Migrator {
    Migrator::new(source.clone(), store.clone(), "acme", settings)
}

pub struct FakeSource {
    workspaces: Vec<Workspace>,
    failing_states: HashSet<String>,
    failing_lookups: HashSet<String>,
    panicking_states: HashSet<String>,
    list_fails: bool,
    connection_fails: bool,
    start: Instant,
    pub fetches: Mutex<Vec<(String, Duration)>>,
    pub lookups: Mutex<Vec<String>>,
    pub list_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(workspaces: Vec<Workspace>) -> Self {
        Self {
            workspaces,
            failing_states: HashSet::new(),
            failing_lookups: HashSet::new(),
            panicking_states: HashSet::new(),
            list_fails: false,
            connection_fails: false,
            start: Instant::now(),
            fetches: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// State download for `name` always fails.
    pub fn failing_state(mut self, name: &str) -> Self {
        self.failing_states.insert(name.to_string());
        self
    }

    /// State download for `name` panics inside the migration task.
    pub fn panicking_state(mut self, name: &str) -> Self {
        self.panicking_states.insert(name.to_string());
        self
    }

    /// Lookup of `name` fails with a non-404 error.
    pub fn failing_lookup(mut self, name: &str) -> Self {
        self.failing_lookups.insert(name.to_string());
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.list_fails = true;
        self
    }

    pub fn failing_connection(mut self) -> Self {
        self.connection_fails = true;
        self
    }

    pub fn fetched_names(&self) -> Vec<String> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl WorkspaceSource for FakeSource {
    async fn validate_connection(&self) -> Result<()> {
        if self.connection_fails {
            return Err(MigratorError::Connection("organization unreachable".to_string()).into());
        }
        Ok(())
    }

    async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.list_fails {
            return Err(anyhow!("workspace listing returned 500"));
        }
        Ok(self.workspaces.clone())
    }

    async fn get_workspace_by_name(&self, name: &str) -> Result<Workspace> {
        self.lookups.lock().unwrap().push(name.to_string());
        if self.failing_lookups.contains(name) {
            return Err(anyhow!("lookup of {} timed out", name));
        }
        self.workspaces
            .iter()
            .find(|ws| ws.name == name)
            .cloned()
            .ok_or_else(|| MigratorError::NotFound(format!("workspace '{}'", name)).into())
    }

    async fn get_workspace_state(&self, workspace_id: &str) -> Result<StateData> {
        let workspace = self
            .workspaces
            .iter()
            .find(|ws| ws.id == workspace_id)
            .ok_or_else(|| anyhow!("unknown workspace id {}", workspace_id))?;

        self.fetches
            .lock()
            .unwrap()
            .push((workspace.name.clone(), self.start.elapsed()));

        if self.panicking_states.contains(&workspace.name) {
            panic!("state of {} is corrupt", workspace.name);
        }
        if self.failing_states.contains(&workspace.name) {
            return Err(anyhow!("download of {} failed", workspace.name));
        }

        let content = format!(r#"{{"version":4,"serial":1,"lineage":"{}"}}"#, workspace.name);
        Ok(StateData {
            workspace_name: workspace.name.clone(),
            content: content.into_bytes(),
            version: 1,
            state_version_id: format!("sv-{}", workspace.name),
            metadata: BTreeMap::from([
                ("workspace_name".to_string(), json!(workspace.name)),
                ("serial".to_string(), json!(1)),
                ("source".to_string(), json!("terraform_cloud")),
            ]),
        })
    }
}

pub struct FakeStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    failures: Mutex<HashMap<String, u32>>,
    exists_fails: bool,
    latency: Duration,
    start: Instant,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub uploads: Mutex<Vec<(String, Duration)>>,
    pub exists_checks: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(HashMap::new()),
            exists_fails: false,
            latency: Duration::ZERO,
            start: Instant::now(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
            exists_checks: Mutex::new(Vec::new()),
        }
    }

    /// The next `times` uploads of destination `name` fail.
    pub fn failing_upload(self, name: &str, times: u32) -> Self {
        self.failures.lock().unwrap().insert(name.to_string(), times);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_exists(mut self) -> Self {
        self.exists_fails = true;
        self
    }

    /// Pretends `name` was migrated by an earlier run.
    pub fn with_existing(self, name: &str) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(format!("{}/terraform.tfstate", name), b"{}".to_vec());
        self
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn upload_names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl StateStore for FakeStore {
    async fn validate_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn check_exists(&self, _organization: &str, name: &str) -> Result<bool> {
        self.exists_checks.lock().unwrap().push(name.to_string());
        if self.exists_fails {
            return Err(anyhow!("HeadObject throttled"));
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .contains_key(&format!("{}/terraform.tfstate", name)))
    }

    async fn upload_state(
        &self,
        _organization: &str,
        name: &str,
        content: &[u8],
        metadata: &BTreeMap<String, Value>,
    ) -> Result<()> {
        self.uploads
            .lock()
            .unwrap()
            .push((name.to_string(), self.start.elapsed()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(name) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(anyhow!("PutObject for {} returned 503 SlowDown", name));
                }
            }
        }

        let mut objects = self.objects.lock().unwrap();
        objects.insert(format!("{}/terraform.tfstate", name), content.to_vec());
        objects.insert(
            format!("{}/metadata.json", name),
            serde_json::to_vec_pretty(metadata)?,
        );
        Ok(())
    }
}
