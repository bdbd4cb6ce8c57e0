//! Error types for diagram loading, validation and state persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while validating a diagram document.
///
/// Every variant names the offending element or field. A document that fails
/// validation never reaches the canvas server.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent.
    #[error("{entity} is missing '{field}'")]
    MissingField {
        /// Description of the element, e.g. `shape 'api'`.
        entity: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field has an unusable value.
    #[error("{entity}: invalid '{field}': {reason}")]
    InvalidField {
        /// Description of the element.
        entity: String,
        /// Name of the field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Two entries share an identifier.
    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    /// A group contains another group.
    #[error("group '{group}' contains group '{member}'; groups cannot be nested")]
    NestedGroup {
        /// Outer group identifier.
        group: String,
        /// Identifier (or description) of the nested group.
        member: String,
    },

    /// A connector end does not name a known shape.
    #[error("connector '{connector}': '{end}' references unknown shape '{target}'")]
    UnknownShape {
        /// Connector identifier.
        connector: String,
        /// `from` or `to`.
        end: &'static str,
        /// The identifier that could not be resolved.
        target: String,
    },

    /// An entry could not be encoded.
    #[error("cannot encode '{id}': {reason}")]
    Unencodable {
        /// Entry identifier.
        id: String,
        /// Serializer message.
        reason: String,
    },
}

/// Errors raised while reading a diagram document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path of the document.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a well-formed diagram document.
    #[error("failed to parse diagram: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors raised while loading or saving reconciliation state.
#[derive(Debug, Error)]
pub enum StateError {
    /// An I/O error occurred.
    #[error("state file {}: {source}", path.display())]
    Io {
        /// Path of the state file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The state file is not valid JSON of the expected shape.
    #[error("state file {} is corrupt: {source}", path.display())]
    Corrupt {
        /// Path of the state file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The state file was written by an incompatible version.
    #[error("state file {} has unsupported version {version}", path.display())]
    UnsupportedVersion {
        /// Path of the state file.
        path: PathBuf,
        /// Version found in the file.
        version: u32,
    },

    /// State could not be serialized.
    #[error("failed to serialize state: {0}")]
    Serialization(#[from] serde_json::Error),
}
