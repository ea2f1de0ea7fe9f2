//! trajview: derivation core for trajectory-regression result viewers.
//!
//! `core` turns one experiment document into ranked, flattened, optionally
//! relative plot data; `api` wraps it with configuration, document sources
//! and an immutable view snapshot that hosts render however they like.

pub mod api;
pub mod core;
pub mod error;
pub mod telemetry;

pub use api::{ViewParams, ViewSession, ViewSnapshot, ViewerConfig, derive_view};
pub use error::{ViewError, ViewResult};
