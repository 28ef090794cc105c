//! Data-access collaborator contracts.
//!
//! The core defines what it needs to read and write; the host application
//! (or `keyward-infra` in tests) decides how records are stored. Every call is
//! made under a deadline, see [`call`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use keyward_core::AccountId;

use crate::account::{Account, AccountField, Organization};
use crate::directory::DirectoryBinding;
use crate::error::AuthError;
use crate::permissions::PermissionGrant;

/// Failure reported by a storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_by_name(
        &self,
        organization: &str,
        name: &str,
    ) -> Result<Option<Account>, StoreError>;

    async fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, StoreError>;

    /// Persist `fields` of `account`; other columns are left untouched.
    async fn update(
        &self,
        id: &AccountId,
        account: &Account,
        fields: &[AccountField],
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn get_by_account(&self, account: &Account) -> Result<Option<Organization>, StoreError>;
}

#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Grants scoped to `owner`, in retrieval order.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<PermissionGrant>, StoreError>;
}

#[async_trait]
pub trait BindingStore: Send + Sync {
    /// Directory bindings configured for organization `owner`, in priority order.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<DirectoryBinding>, StoreError>;
}

/// Run a store call under `deadline`.
///
/// Both a store failure and an expired deadline surface as
/// [`AuthError::Transient`] naming `operation`.
pub(crate) async fn call<T, F>(deadline: Duration, operation: &'static str, fut: F) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::warn!(operation, error = %e, "store call failed");
            Err(AuthError::transient(operation, e.to_string()))
        }
        Err(_) => {
            tracing::warn!(operation, ?deadline, "store call exceeded deadline");
            Err(AuthError::transient(
                operation,
                format!("deadline of {deadline:?} exceeded"),
            ))
        }
    }
}
