//! Directory federation: verifying a secret against external directories.
//!
//! The wire protocol belongs to the [`DirectoryClient`] implementation; this
//! module only decides which binding to try, what to search for and how each
//! outcome maps onto [`AuthError`]. Lockout state is never read or written on
//! this path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use keyward_core::Entity;

use crate::account::Account;
use crate::error::AuthError;
use crate::store::{self, BindingStore};

/// One federated-directory endpoint configured for an organization.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryBinding {
    pub id: String,
    /// Owning organization.
    pub owner: String,
    pub host: String,
    pub port: u16,
    pub admin_dn: String,
    pub admin_password: String,
    /// Subtree searched for account entries.
    pub base_dn: String,
}

impl DirectoryBinding {
    pub fn new(id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            port: 389,
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_admin(mut self, dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.admin_dn = dn.into();
        self.admin_password = password.into();
        self
    }

    pub fn with_base_dn(mut self, base_dn: impl Into<String>) -> Self {
        self.base_dn = base_dn.into();
        self
    }

    /// `host:port`.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Entity for DirectoryBinding {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl core::fmt::Debug for DirectoryBinding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DirectoryBinding")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("admin_dn", &self.admin_dn)
            .field("admin_password", &"<redacted>")
            .field("base_dn", &self.base_dn)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Distinguished name.
    pub dn: String,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self { dn: dn.into() }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("search failed: {0}")]
    Search(String),

    #[error("bind rejected: {0}")]
    Bind(String),
}

/// Opens administrative sessions against a directory binding.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Connect and bind with the binding's administrative credentials.
    async fn connect(
        &self,
        binding: &DirectoryBinding,
    ) -> Result<Box<dyn DirectoryConnection>, DirectoryError>;
}

#[async_trait]
pub trait DirectoryConnection: Send {
    async fn search(
        &mut self,
        base_dn: &str,
        filter: &str,
    ) -> Result<Vec<DirectoryEntry>, DirectoryError>;

    /// Authenticate as `dn` with `secret`.
    async fn bind(&mut self, dn: &str, secret: &str) -> Result<(), DirectoryError>;
}

/// Escape a value for use inside an RFC 4515 search filter.
pub fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' => out.push_str("\\2a"),
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            '\\' => out.push_str("\\5c"),
            '\0' => out.push_str("\\00"),
            c => out.push(c),
        }
    }
    out
}

/// Search filter selecting the posix account named `name`.
pub fn account_filter(name: &str) -> String {
    format!(
        "(&(objectClass=posixAccount)(uid={}))",
        escape_filter_value(name)
    )
}

pub struct DirectoryVerifier {
    bindings: Arc<dyn BindingStore>,
    client: Arc<dyn DirectoryClient>,
    call_timeout: Duration,
}

impl DirectoryVerifier {
    pub fn new(
        bindings: Arc<dyn BindingStore>,
        client: Arc<dyn DirectoryClient>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            bindings,
            client,
            call_timeout,
        }
    }

    /// Verify `secret` for a federated account against its organization's
    /// bindings, in order.
    ///
    /// The first successful bind wins. A binding that cannot be reached, has
    /// no matching entry, or rejects the bind passes the attempt on to the
    /// next one. An ambiguous match or a search error aborts immediately.
    /// An empty secret is refused without contacting any directory: a bind
    /// with a DN and no password is an unauthenticated bind.
    pub async fn verify_federated(
        &self,
        account: &Account,
        secret: &str,
    ) -> Result<Account, AuthError> {
        if secret.is_empty() {
            tracing::debug!(account = %account.id(), "empty secret refused for federated account");
            return Err(AuthError::InvalidCredential);
        }

        let bindings = store::call(
            self.call_timeout,
            "directory binding lookup",
            self.bindings.list_by_owner(&account.owner),
        )
        .await?;

        let filter = account_filter(&account.name);
        let mut reached_any = false;

        for binding in &bindings {
            let mut conn = match tokio::time::timeout(self.call_timeout, self.client.connect(binding)).await {
                Ok(Ok(conn)) => conn,
                Ok(Err(e)) => {
                    tracing::debug!(binding = %binding.id, endpoint = %binding.endpoint(), error = %e, "directory unreachable; trying next binding");
                    continue;
                }
                Err(_) => {
                    tracing::debug!(binding = %binding.id, endpoint = %binding.endpoint(), "directory connect timed out; trying next binding");
                    continue;
                }
            };
            reached_any = true;

            let entries = match tokio::time::timeout(self.call_timeout, conn.search(&binding.base_dn, &filter)).await {
                Ok(Ok(entries)) => entries,
                Ok(Err(e)) => {
                    tracing::warn!(binding = %binding.id, error = %e, "directory search failed");
                    return Err(AuthError::Directory {
                        binding: binding.id.clone(),
                        message: e.to_string(),
                    });
                }
                Err(_) => {
                    tracing::warn!(binding = %binding.id, "directory search timed out");
                    return Err(AuthError::transient(
                        "directory search",
                        format!("binding {} exceeded {:?}", binding.id, self.call_timeout),
                    ));
                }
            };

            let entry = match entries.as_slice() {
                [] => {
                    tracing::debug!(binding = %binding.id, account = %account.id(), "no directory entry");
                    continue;
                }
                [entry] => entry,
                _ => {
                    tracing::warn!(
                        binding = %binding.id,
                        account = %account.id(),
                        matches = entries.len(),
                        "ambiguous directory identity"
                    );
                    return Err(AuthError::AmbiguousIdentity {
                        binding: binding.id.clone(),
                        name: account.name.clone(),
                    });
                }
            };

            match tokio::time::timeout(self.call_timeout, conn.bind(&entry.dn, secret)).await {
                Ok(Ok(())) => {
                    tracing::info!(binding = %binding.id, account = %account.id(), "federated sign-in succeeded");
                    return Ok(account.clone());
                }
                Ok(Err(e)) => {
                    tracing::debug!(binding = %binding.id, error = %e, "directory bind rejected");
                }
                Err(_) => {
                    tracing::warn!(binding = %binding.id, "directory bind timed out");
                    return Err(AuthError::transient(
                        "directory bind",
                        format!("binding {} exceeded {:?}", binding.id, self.call_timeout),
                    ));
                }
            }
        }

        // An unreachable directory is an outage, reported as transient like
        // any other failed external call; it never reads as a wrong secret.
        if !bindings.is_empty() && !reached_any {
            tracing::warn!(account = %account.id(), bindings = bindings.len(), "no directory binding reachable");
            return Err(AuthError::transient(
                "directory connect",
                format!("none of {} bindings reachable", bindings.len()),
            ));
        }

        Err(AuthError::InvalidCredential)
    }
}

impl core::fmt::Debug for DirectoryVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DirectoryVerifier")
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}
