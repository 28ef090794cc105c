//! Stable message keys handed to the localisation collaborator.
//!
//! The core never renders user-facing text. Every outcome maps to a
//! [`Message`]: a stable key plus positional arguments that a [`Translator`]
//! turns into final text for a locale.

use serde::Serialize;

/// Message keys produced by the core.
pub mod keys {
    pub const INVALID_CREDENTIAL: &str = "auth.invalid_credential";
    pub const ACCOUNT_LOCKED: &str = "auth.account_locked";
    pub const ACCOUNT_FORBIDDEN: &str = "auth.account_forbidden";
    pub const UNSUPPORTED_SCHEME: &str = "auth.unsupported_scheme";
    pub const FEDERATED_ACCOUNT: &str = "auth.federated_account";
    pub const ORGANIZATION_NOT_FOUND: &str = "organization.not_found";
    pub const POLICY_ENGINE_FAILED: &str = "access.policy_engine_failed";
    pub const AMBIGUOUS_IDENTITY: &str = "directory.ambiguous_identity";
    pub const DIRECTORY_ERROR: &str = "directory.error";
    pub const SERVICE_UNAVAILABLE: &str = "service.unavailable";
    pub const LOGIN_REQUIRED: &str = "session.login_required";
    pub const SESSION_OUTDATED: &str = "session.outdated";
    pub const TARGET_NOT_FOUND: &str = "account.not_found";
    pub const NO_PERMISSION: &str = "access.no_permission";
}

/// A localisable message: key + positional arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    key: &'static str,
    args: Vec<String>,
}

impl Message {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl core::fmt::Display for Message {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key)?;
        if !self.args.is_empty() {
            write!(f, " [{}]", self.args.join(", "))?;
        }
        Ok(())
    }
}

/// Localisation collaborator.
pub trait Translator: Send + Sync {
    fn translate(&self, locale: &str, message: &Message) -> String;
}
