//! # Drawsync CLI
//!
//! Reconciles declarative YAML diagrams against a live Excalidraw canvas
//! server.
//!
//! ## Usage
//!
//! ```bash
//! drawsync push docs/arch.yaml
//! drawsync --url http://canvas:3000 push docs/arch.yaml --clear
//! drawsync query --format json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `AppConfig` - Client settings and the command to run
//! - [`push::push`] - The reconciliation driver, written against
//!   [`drawsync_client::CanvasApi`]
//! - [`output`] - Terminal rendering for the read-only commands

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod output;
pub mod push;
pub mod reference;

pub use config::{AppConfig, CliArgs, Command};
pub use output::QueryFormat;
pub use push::{
    push, push_document, Phase, PushError, PushMode, PushOptions, PushReport, UpdateStrategy,
};
pub use reference::FORMAT_REFERENCE;
