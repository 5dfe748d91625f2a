//! Fixed-period relay between two primary endpoints.

pub mod engine;
pub mod stats;

pub use engine::RelayEngine;
pub use stats::{Direction, DirectionStats, RelayStats};
