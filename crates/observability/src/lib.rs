//! Tracing and logging (shared setup).

pub mod tracing;

pub use self::tracing::{LogConfig, init};
