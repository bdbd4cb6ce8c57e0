//! Rendering of command results for the terminal.

use clap::ValueEnum;
use drawsync_client::{Health, RemoteElement};

/// Output format of `query`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum QueryFormat {
    /// One line per element.
    #[default]
    Text,
    /// The raw element list as pretty JSON.
    Json,
}

/// Render a health response.
#[must_use]
pub fn health_text(base_url: &str, health: &Health) -> String {
    format!(
        "{base_url}: {}\n  elements: {}\n  websocket clients: {}",
        health.status, health.elements_count, health.websocket_clients
    )
}

/// Render an element listing.
///
/// # Errors
///
/// Returns an error if JSON output cannot be serialized.
pub fn elements(format: QueryFormat, elements: &[RemoteElement]) -> Result<String, serde_json::Error> {
    match format {
        QueryFormat::Json => serde_json::to_string_pretty(elements),
        QueryFormat::Text => {
            let mut lines = vec![format!("{} elements on canvas", elements.len())];
            lines.extend(
                elements
                    .iter()
                    .map(|e| format!("  {}  {}", e.id, e.summary())),
            );
            Ok(lines.join("\n"))
        }
    }
}

/// Render the result of `clear`.
#[must_use]
pub fn cleared_text(count: usize) -> String {
    match count {
        1 => "Cleared 1 element".to_string(),
        n => format!("Cleared {n} elements"),
    }
}
