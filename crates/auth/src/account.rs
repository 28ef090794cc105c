//! Account and organization records as seen by the decision core.
//!
//! These records are owned by the data-access collaborator. The core borrows
//! them for one decision and only ever writes back the lockout fields.

use serde::{Deserialize, Serialize};

use keyward_core::{AccountId, Entity};

// ─────────────────────────────────────────────────────────────────────────────
// Account
// ─────────────────────────────────────────────────────────────────────────────

/// Identity record scoped to an organization.
///
/// # Invariants
/// - An account with a non-empty `federation` reference is never
///   authenticated through local credentials.
/// - `last_signin_failure` is either empty or an RFC 3339 UTC instant.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    /// Owning organization.
    pub owner: String,
    /// Name, unique within `owner`.
    pub name: String,
    pub password_hash: String,
    pub password_salt: String,
    /// Directory federation reference; empty for locally authenticated accounts.
    pub federation: String,
    pub is_forbidden: bool,
    pub is_deleted: bool,
    pub is_global_admin: bool,
    /// Organization-admin standing.
    pub is_admin: bool,
    /// Consecutive failed sign-ins.
    pub signin_failures: u32,
    /// Instant of the most recent failed sign-in.
    pub last_signin_failure: String,
}

impl Account {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_password(mut self, hash: impl Into<String>, salt: impl Into<String>) -> Self {
        self.password_hash = hash.into();
        self.password_salt = salt.into();
        self
    }

    pub fn with_federation(mut self, reference: impl Into<String>) -> Self {
        self.federation = reference.into();
        self
    }

    pub fn id(&self) -> AccountId {
        AccountId::new(self.owner.clone(), self.name.clone())
    }

    pub fn is_federated(&self) -> bool {
        !self.federation.is_empty()
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> AccountId {
        Account::id(self)
    }
}

impl core::fmt::Debug for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Account")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .field("password_salt", &"<redacted>")
            .field("federation", &self.federation)
            .field("is_forbidden", &self.is_forbidden)
            .field("is_deleted", &self.is_deleted)
            .field("is_global_admin", &self.is_global_admin)
            .field("is_admin", &self.is_admin)
            .field("signin_failures", &self.signin_failures)
            .field("last_signin_failure", &self.last_signin_failure)
            .finish()
    }
}

/// Account columns the core may write back through `AccountStore::update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountField {
    SigninFailures,
    LastSigninFailure,
}

impl AccountField {
    pub fn column(self) -> &'static str {
        match self {
            AccountField::SigninFailures => "signin_wrong_times",
            AccountField::LastSigninFailure => "last_signin_wrong_time",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Organization
// ─────────────────────────────────────────────────────────────────────────────

/// Tenant boundary: credential policy and optional master secret.
///
/// # Invariants
/// - Exactly one credential scheme; every account in the organization is
///   verified with it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub name: String,
    /// Credential scheme identifier resolved through the `CredentialRegistry`.
    pub password_scheme: String,
    pub password_salt: String,
    /// Stored hash of the master secret; empty when unset.
    pub master_password: String,
    /// Default phone-number country prefix.
    pub phone_prefix: String,
}

impl Organization {
    pub fn new(name: impl Into<String>, password_scheme: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password_scheme: password_scheme.into(),
            ..Default::default()
        }
    }

    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.password_salt = salt.into();
        self
    }

    pub fn with_master_password(mut self, hash: impl Into<String>) -> Self {
        self.master_password = hash.into();
        self
    }

    pub fn has_master_password(&self) -> bool {
        !self.master_password.is_empty()
    }
}

impl core::fmt::Debug for Organization {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Organization")
            .field("name", &self.name)
            .field("password_scheme", &self.password_scheme)
            .field("password_salt", &"<redacted>")
            .field("has_master_password", &self.has_master_password())
            .field("phone_prefix", &self.phone_prefix)
            .finish()
    }
}
