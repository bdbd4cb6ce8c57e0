//! The canvas server surface drawsync depends on.

use async_trait::async_trait;
use drawsync_core::{ElementPatch, Skeleton};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClientResult;

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Server-reported status, `"healthy"` when all is well.
    pub status: String,
    /// Number of elements on the canvas.
    #[serde(default)]
    pub elements_count: u64,
    /// Number of connected websocket clients.
    #[serde(default)]
    pub websocket_clients: u64,
}

/// An element as stored by the canvas server.
///
/// Only the fields drawsync reads are typed; everything else is kept in
/// `extra` so listings can be printed back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteElement {
    /// Server-assigned identifier.
    pub id: String,
    /// Element type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// X coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Y coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Text content, for texts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// All other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RemoteElement {
    /// Short human readable description: type, position and a text excerpt.
    #[must_use]
    pub fn summary(&self) -> String {
        let kind = self.kind.as_deref().unwrap_or("?");
        let mut line = match (self.x, self.y) {
            (Some(x), Some(y)) => format!("{kind} at ({x:.0}, {y:.0})"),
            _ => kind.to_string(),
        };
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            let excerpt: String = text.chars().take(30).collect();
            line = format!("{line} \"{excerpt}\"");
        }
        line
    }
}

/// Operations of the canvas server REST API.
///
/// Implemented over HTTP by [`crate::CanvasClient`]; tests substitute an
/// in-memory canvas.
#[async_trait]
pub trait CanvasApi: Send + Sync {
    /// `GET /health`.
    async fn health(&self) -> ClientResult<Health>;

    /// `GET /api/elements`: every element on the canvas.
    async fn list_elements(&self) -> ClientResult<Vec<RemoteElement>>;

    /// `POST /api/elements/batch`: create elements, returned in request order.
    async fn create_elements(&self, skeletons: &[Skeleton]) -> ClientResult<Vec<RemoteElement>>;

    /// `PUT /api/elements/{id}`: merge `patch` into an element.
    async fn update_element(&self, id: &str, patch: &ElementPatch) -> ClientResult<()>;

    /// `DELETE /api/elements/{id}`.
    async fn delete_element(&self, id: &str) -> ClientResult<()>;

    /// `DELETE /api/elements`: remove everything, returning how many elements
    /// were on the canvas beforehand.
    async fn clear(&self) -> ClientResult<usize>;
}
