//! Shared helpers for drawsync integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use drawsync_client::{CanvasApi, ClientError, ClientResult, Health, RemoteElement};
use drawsync_core::{ElementPatch, Skeleton};
use serde_json::{json, Value};

/// A call received by [`FakeCanvas`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Health,
    List,
    Create(usize),
    Update(String),
    Delete(String),
    Clear,
}

#[derive(Default)]
struct Inner {
    elements: BTreeMap<String, Value>,
    next_id: u64,
    calls: Vec<Call>,
    fail_creates: bool,
    fail_deletes: bool,
    short_batches: bool,
}

/// In-memory canvas server that records every call.
///
/// Remote ids are handed out as `el-1`, `el-2`, ... in creation order.
#[derive(Default)]
pub struct FakeCanvas {
    inner: Mutex<Inner>,
}

impl FakeCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut inner = self.inner.lock().expect("fake canvas lock");
        f(&mut inner)
    }

    /// Calls received so far, then forget them.
    pub fn take_calls(&self) -> Vec<Call> {
        self.with(|i| std::mem::take(&mut i.calls))
    }

    /// Remote ids currently on the canvas.
    pub fn ids(&self) -> Vec<String> {
        self.with(|i| i.elements.keys().cloned().collect())
    }

    /// Stored JSON for a remote element.
    pub fn element(&self, id: &str) -> Option<Value> {
        self.with(|i| i.elements.get(id).cloned())
    }

    /// Empty the canvas behind drawsync's back, as a server restart would.
    pub fn wipe(&self) {
        self.with(|i| i.elements.clear());
    }

    /// Remove one element behind drawsync's back.
    pub fn remove(&self, id: &str) {
        self.with(|i| i.elements.remove(id));
    }

    pub fn fail_creates(&self, fail: bool) {
        self.with(|i| i.fail_creates = fail);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.with(|i| i.fail_deletes = fail);
    }

    /// Answer batch creates with one element fewer than requested.
    pub fn short_batches(&self, short: bool) {
        self.with(|i| i.short_batches = short);
    }
}

fn server_error() -> ClientError {
    ClientError::Status {
        status: 500,
        body: "injected failure".into(),
    }
}

fn to_value(skeleton: &Skeleton) -> Value {
    serde_json::to_value(skeleton).expect("skeleton serializes")
}

#[async_trait]
impl CanvasApi for FakeCanvas {
    async fn health(&self) -> ClientResult<Health> {
        self.with(|i| {
            i.calls.push(Call::Health);
            Ok(Health {
                status: "healthy".into(),
                elements_count: i.elements.len() as u64,
                websocket_clients: 0,
            })
        })
    }

    async fn list_elements(&self) -> ClientResult<Vec<RemoteElement>> {
        self.with(|i| {
            i.calls.push(Call::List);
            i.elements
                .values()
                .map(|v| serde_json::from_value(v.clone()).map_err(ClientError::from))
                .collect()
        })
    }

    async fn create_elements(&self, skeletons: &[Skeleton]) -> ClientResult<Vec<RemoteElement>> {
        self.with(|i| {
            i.calls.push(Call::Create(skeletons.len()));
            if i.fail_creates {
                return Err(server_error());
            }
            let mut created: Vec<RemoteElement> = Vec::with_capacity(skeletons.len());
            for skeleton in skeletons {
                i.next_id += 1;
                let id = format!("el-{}", i.next_id);
                let mut value = to_value(skeleton);
                value["id"] = json!(id);
                i.elements.insert(id, value.clone());
                created.push(serde_json::from_value(value)?);
            }
            if i.short_batches {
                created.pop();
            }
            Ok(created)
        })
    }

    /// Merges the patch into the stored element, as the canvas server does.
    async fn update_element(&self, id: &str, patch: &ElementPatch) -> ClientResult<()> {
        self.with(|i| {
            i.calls.push(Call::Update(id.to_string()));
            let Some(Value::Object(existing)) = i.elements.get_mut(id) else {
                return Err(ClientError::NotFound(format!("/api/elements/{id}")));
            };
            for (key, value) in patch.fields() {
                existing.insert(key.clone(), value.clone());
            }
            Ok(())
        })
    }

    async fn delete_element(&self, id: &str) -> ClientResult<()> {
        self.with(|i| {
            i.calls.push(Call::Delete(id.to_string()));
            if i.fail_deletes {
                return Err(server_error());
            }
            match i.elements.remove(id) {
                Some(_) => Ok(()),
                None => Err(ClientError::NotFound(format!("/api/elements/{id}"))),
            }
        })
    }

    async fn clear(&self) -> ClientResult<usize> {
        self.with(|i| {
            i.calls.push(Call::Clear);
            let count = i.elements.len();
            i.elements.clear();
            Ok(count)
        })
    }
}

/// A temporary directory holding one diagram file.
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub document: PathBuf,
}

impl Workspace {
    pub fn new(yaml: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let document = dir.path().join("arch.yaml");
        std::fs::write(&document, yaml).expect("write diagram");
        Self { dir, document }
    }

    pub fn rewrite(&self, yaml: &str) {
        std::fs::write(&self.document, yaml).expect("rewrite diagram");
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("arch.state.json")
    }

    pub fn state(&self) -> Value {
        let text = std::fs::read_to_string(self.state_path()).expect("state file");
        serde_json::from_str(&text).expect("state json")
    }

    /// Remote id recorded for a document id.
    pub fn remote_id(&self, id: &str) -> String {
        self.state()["mappings"][id]["remote_id"]
            .as_str()
            .unwrap_or_else(|| panic!("no mapping for {id}"))
            .to_string()
    }

    pub fn document(&self) -> &Path {
        &self.document
    }
}

/// Two rectangles joined by an arrow.
pub const ARCH: &str = r"
shapes:
  - id: api
    type: rectangle
    pos: [100, 100, 200x80]
    label: API
  - id: db
    type: rectangle
    pos: [400, 100, 200x80]
    label: Database
connectors:
  - from: api
    to: db
";

/// [`ARCH`] with `db` moved down.
pub fn arch_with_db_moved() -> String {
    ARCH.replace("[400, 100, 200x80]", "[400, 300, 200x80]")
}
