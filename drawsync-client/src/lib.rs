//! # Drawsync Client
//!
//! Talks to an Excalidraw canvas server over its REST API.
//!
//! [`CanvasApi`] is the seam the reconciliation driver is written against;
//! [`CanvasClient`] implements it with `reqwest`, explicit timeouts and a
//! configurable retry policy. Idempotent calls (GET, PUT, DELETE) are retried
//! on transport errors and 5xx responses; a batch create is only resent when
//! the connection could not be established.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod error;
pub mod http;

pub use api::{CanvasApi, Health, RemoteElement};
pub use config::{ClientConfig, RetryConfig, DEFAULT_BASE_URL};
pub use error::{ClientError, ClientResult};
pub use http::CanvasClient;
