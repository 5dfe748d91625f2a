//! `bytebridge` Core Library
//!
//! Shared functionality for `bytebridge` components:
//! - Connection specification grammar (`type:detail1:detail2`)
//! - Settings resolution and hierarchy
//! - Common error types
//! - Tracing initialisation

pub mod config;
pub mod error;
pub mod spec;
pub mod tracing_init;

pub use config::Settings;
pub use error::{Error, Result};
pub use spec::{ConnectionKind, ConnectionSpec, SniffSpec, SniffTarget};
