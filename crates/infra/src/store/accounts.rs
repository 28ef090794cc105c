use async_trait::async_trait;

use keyward_auth::{Account, AccountField, AccountStore, StoreError};
use keyward_core::AccountId;

use super::faults::Faults;
use super::owner_store::InMemoryOwnerStore;

/// Accounts keyed by organization and name.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    rows: InMemoryOwnerStore<AccountId, Account>,
    faults: Faults,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision (or replace) an account.
    pub fn insert(&self, account: Account) {
        self.rows.put(&account.owner.clone(), account);
    }

    pub fn get(&self, id: &AccountId) -> Option<Account> {
        self.rows.get(id.owner(), id)
    }

    pub fn list(&self, organization: &str) -> Vec<Account> {
        self.rows.list(organization)
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_by_name(
        &self,
        organization: &str,
        name: &str,
    ) -> Result<Option<Account>, StoreError> {
        self.faults.gate("account store").await?;
        Ok(self.get(&AccountId::new(organization, name)))
    }

    async fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        self.faults.gate("account store").await?;
        Ok(self.get(id))
    }

    async fn update(
        &self,
        id: &AccountId,
        account: &Account,
        fields: &[AccountField],
    ) -> Result<(), StoreError> {
        self.faults.gate("account store").await?;

        let found = self.rows.modify(id.owner(), id, |row| {
            for field in fields {
                match field {
                    AccountField::SigninFailures => row.signin_failures = account.signin_failures,
                    AccountField::LastSigninFailure => {
                        row.last_signin_failure = account.last_signin_failure.clone()
                    }
                }
            }
        });

        if !found {
            return Err(anyhow::anyhow!("account {id} does not exist").into());
        }

        tracing::debug!(
            account = %id,
            columns = ?fields.iter().map(|f| f.column()).collect::<Vec<_>>(),
            "account updated"
        );
        Ok(())
    }
}
