use async_trait::async_trait;

use keyward_auth::{Account, Organization, OrganizationStore, StoreError};

use super::faults::Faults;
use super::owner_store::InMemoryOwnerStore;

/// Owner under which organizations themselves are recorded.
pub const BUILT_IN_OWNER: &str = "admin";

#[derive(Debug, Default)]
pub struct InMemoryOrganizationStore {
    rows: InMemoryOwnerStore<String, Organization>,
    faults: Faults,
}

impl InMemoryOrganizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, organization: Organization) {
        self.rows
            .upsert(BUILT_IN_OWNER, organization.name.clone(), organization);
    }

    pub fn get(&self, name: &str) -> Option<Organization> {
        self.rows.get(BUILT_IN_OWNER, &name.to_string())
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }
}

#[async_trait]
impl OrganizationStore for InMemoryOrganizationStore {
    async fn get_by_account(&self, account: &Account) -> Result<Option<Organization>, StoreError> {
        self.faults.gate("organization store").await?;
        Ok(self.get(&account.owner))
    }
}
