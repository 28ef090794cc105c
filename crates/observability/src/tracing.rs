//! Tracing/logging initialization.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from
//! [`LogConfig::default_directive`].

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub const ENV_LOG_JSON: &str = "KEYWARD_LOG_JSON";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"info,keyward_auth=debug"`.
    pub default_directive: String,

    /// JSON lines instead of human-readable output.
    pub json: bool,

    /// Route output through the test harness capture.
    #[serde(skip)]
    pub test_writer: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            json: true,
            test_writer: false,
        }
    }
}

impl LogConfig {
    /// Human-readable, captured by the test harness, debug for keyward crates.
    pub fn for_tests() -> Self {
        Self {
            default_directive: "warn,keyward_auth=debug,keyward_infra=debug".to_string(),
            json: false,
            test_writer: true,
        }
    }

    /// Defaults, with `KEYWARD_LOG_JSON=false` (or `0`) switching to text output.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(ENV_LOG_JSON) {
            config.json = !matches!(raw.trim(), "0" | "false" | "no");
        }
        config
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_directive))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the process-wide subscriber.
///
/// Safe to call multiple times; returns `false` when a subscriber was already
/// installed and this call did nothing.
pub fn init(config: &LogConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    match (config.json, config.test_writer) {
        (true, true) => builder.json().with_test_writer().try_init().is_ok(),
        (true, false) => builder.json().try_init().is_ok(),
        (false, true) => builder.with_test_writer().try_init().is_ok(),
        (false, false) => builder.try_init().is_ok(),
    }
}
