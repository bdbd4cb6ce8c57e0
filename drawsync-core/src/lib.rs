//! # Drawsync Core
//!
//! Everything drawsync does without touching the network: reading diagram
//! documents, validating them, clipping connectors to shape boundaries,
//! compiling canvas skeletons, fingerprinting entries and diffing them
//! against persisted reconciliation state.
//!
//! ## Pipeline
//!
//! ```text
//! YAML ──▶ RawDocument ──validate──▶ ValidatedDiagram
//!                                        │
//!                     ┌──────────────────┼───────────────────┐
//!                     ▼                                      ▼
//!              SkeletonCompiler                      fingerprint_diagram
//!            (geometry, styles)                              │
//!                     │                     SyncState ──▶ compute_diff
//!                     ▼                                      │
//!             Vec<CompiledElement>                          Diff
//! ```
//!
//! All of it is synchronous and side-effect free apart from [`StateFile`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod diff;
pub mod document;
pub mod error;
pub mod fingerprint;
pub mod geometry;
pub mod model;
pub mod skeleton;
pub mod state;
pub mod style;
pub mod validate;

pub use diff::{compute_diff, Diff, Removal, Unchanged, Update};
pub use document::RawDocument;
pub use error::{DocumentError, StateError, ValidationError};
pub use fingerprint::{fingerprint_diagram, Fingerprinted};
pub use geometry::{clip_to_rect, connector_geometry, ConnectorGeometry, Point, Rect};
pub use model::{Connector, ConnectorKind, Element, GroupMembership, Shape, ShapeKind, Text};
pub use skeleton::{CompiledElement, ElementPatch, Skeleton, SkeletonCompiler, SkeletonKind};
pub use state::{Mapping, StateFile, SyncState};
pub use style::StyleTables;
pub use validate::{remote_group_id, validate, ValidatedDiagram};

/// Drawsync core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
