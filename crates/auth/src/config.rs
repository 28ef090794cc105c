//! Runtime configuration for the decision core.

use std::time::Duration as StdDuration;

use serde::{Deserialize, Serialize};

/// Environment variable names read by [`AuthConfig::from_env`].
pub const ENV_LOCKOUT_MAX_FAILURES: &str = "KEYWARD_LOCKOUT_MAX_FAILURES";
pub const ENV_LOCKOUT_WINDOW_SECS: &str = "KEYWARD_LOCKOUT_WINDOW_SECS";
pub const ENV_SERVICE_ACCOUNT_PREFIX: &str = "KEYWARD_SERVICE_ACCOUNT_PREFIX";
pub const ENV_CALL_TIMEOUT_MS: &str = "KEYWARD_CALL_TIMEOUT_MS";

/// Consecutive-failure lockout policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutPolicy {
    /// Failures at or above this count lock the account.
    pub max_failures: u32,

    /// Cool-down window, measured from the most recent failure.
    pub window_secs: u64,
}

impl LockoutPolicy {
    pub const DEFAULT_MAX_FAILURES: u32 = 5;
    pub const DEFAULT_WINDOW_SECS: u64 = 15 * 60;

    pub fn window(&self) -> chrono::Duration {
        // chrono caps durations at i64::MAX milliseconds
        let secs = self.window_secs.min((i64::MAX / 1000) as u64) as i64;
        chrono::Duration::seconds(secs)
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failures: Self::DEFAULT_MAX_FAILURES,
            window_secs: Self::DEFAULT_WINDOW_SECS,
        }
    }
}

/// Top-level configuration.
///
/// Every field has a default, so a partial document (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub lockout: LockoutPolicy,

    /// Requesters whose identifier starts with this prefix are trusted
    /// internal callers.
    pub service_account_prefix: String,

    /// Deadline applied to every store and directory call.
    pub call_timeout_ms: u64,

    /// Action passed to policy engines by the resource access check.
    pub resource_action: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            lockout: LockoutPolicy::default(),
            service_account_prefix: "app/".to_string(),
            call_timeout_ms: 5_000,
            resource_action: "read".to_string(),
        }
    }
}

impl AuthConfig {
    pub fn call_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.call_timeout_ms)
    }

    /// Load configuration from `KEYWARD_*` environment variables, falling back
    /// to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, ENV_LOCKOUT_MAX_FAILURES) {
            config.lockout.max_failures = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_LOCKOUT_WINDOW_SECS) {
            config.lockout.window_secs = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_CALL_TIMEOUT_MS) {
            config.call_timeout_ms = v;
        }
        if let Some(prefix) = lookup(ENV_SERVICE_ACCOUNT_PREFIX) {
            if prefix.is_empty() {
                tracing::warn!(
                    var = ENV_SERVICE_ACCOUNT_PREFIX,
                    "empty service account prefix ignored; keeping default"
                );
            } else {
                config.service_account_prefix = prefix;
            }
        }

        config
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = key, value = %raw, "unparsable value; using default");
            None
        }
    }
}
