//! Authentication failure taxonomy.
//!
//! Credential failures are deliberately uninformative: the caller learns the
//! kind, never the cause, so a wrong secret and an unknown account look the
//! same. Configuration and infrastructure failures are operator-facing and
//! carry identifiers.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use keyward_core::AccountId;

use crate::message::{Message, keys};

/// Misconfiguration detected while verifying or deciding. Never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("organization of account {account} does not exist")]
    OrganizationNotFound { account: AccountId },

    #[error("organization '{organization}' uses unsupported credential scheme '{scheme}'")]
    UnsupportedScheme { organization: String, scheme: String },

    #[error("account {account} is bound to a directory and cannot use local credentials")]
    FederatedAccount { account: AccountId },

    #[error("policy engine for grant '{grant}' failed: {message}")]
    PolicyEngine { grant: String, message: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Too many consecutive failures; resolves itself once `remaining` elapses.
    #[error(
        "account locked; retry in {}m {}s",
        .remaining.as_secs() / 60,
        .remaining.as_secs() % 60
    )]
    Locked { remaining: Duration },

    #[error("incorrect credential")]
    InvalidCredential,

    #[error("account {account} is forbidden from signing in")]
    Forbidden { account: AccountId },

    /// More than one directory entry matched; the directory is misconfigured.
    #[error("directory {binding} holds more than one entry for '{name}'")]
    AmbiguousIdentity { binding: String, name: String },

    #[error("directory {binding} failed: {message}")]
    Directory { binding: String, message: String },

    /// Store or directory unreachable or past its deadline. Safe to retry.
    #[error("{operation} unavailable: {detail}")]
    Transient {
        operation: &'static str,
        detail: String,
    },
}

/// Discriminant of [`AuthError`], for metrics and response mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Locked,
    InvalidCredential,
    Forbidden,
    AmbiguousIdentity,
    Directory,
    Transient,
}

impl AuthError {
    pub fn transient(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Transient {
            operation,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Configuration(_) => ErrorKind::Configuration,
            AuthError::Locked { .. } => ErrorKind::Locked,
            AuthError::InvalidCredential => ErrorKind::InvalidCredential,
            AuthError::Forbidden { .. } => ErrorKind::Forbidden,
            AuthError::AmbiguousIdentity { .. } => ErrorKind::AmbiguousIdentity,
            AuthError::Directory { .. } => ErrorKind::Directory,
            AuthError::Transient { .. } => ErrorKind::Transient,
        }
    }

    /// Whether a higher layer may retry automatically (with backoff).
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Localisable message for this failure.
    pub fn message(&self) -> Message {
        match self {
            AuthError::Configuration(ConfigurationError::OrganizationNotFound { account }) => {
                Message::new(keys::ORGANIZATION_NOT_FOUND).with_arg(account)
            }
            AuthError::Configuration(ConfigurationError::UnsupportedScheme { scheme, .. }) => {
                Message::new(keys::UNSUPPORTED_SCHEME).with_arg(scheme)
            }
            AuthError::Configuration(ConfigurationError::FederatedAccount { account }) => {
                Message::new(keys::FEDERATED_ACCOUNT).with_arg(account)
            }
            AuthError::Configuration(ConfigurationError::PolicyEngine { grant, .. }) => {
                Message::new(keys::POLICY_ENGINE_FAILED).with_arg(grant)
            }
            AuthError::Locked { remaining } => Message::new(keys::ACCOUNT_LOCKED)
                .with_arg(remaining.as_secs() / 60)
                .with_arg(remaining.as_secs() % 60),
            AuthError::InvalidCredential => Message::new(keys::INVALID_CREDENTIAL),
            AuthError::Forbidden { account } => {
                Message::new(keys::ACCOUNT_FORBIDDEN).with_arg(account)
            }
            AuthError::AmbiguousIdentity { name, .. } => {
                Message::new(keys::AMBIGUOUS_IDENTITY).with_arg(name)
            }
            AuthError::Directory { binding, message } => Message::new(keys::DIRECTORY_ERROR)
                .with_arg(binding)
                .with_arg(message),
            AuthError::Transient { operation, .. } => {
                Message::new(keys::SERVICE_UNAVAILABLE).with_arg(operation)
            }
        }
    }
}
