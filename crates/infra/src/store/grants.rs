use async_trait::async_trait;

use keyward_auth::{GrantStore, PermissionGrant, StoreError};

use super::faults::Faults;
use super::owner_store::InMemoryOwnerStore;

/// Permission grants, listed per owner in the order they were first added.
#[derive(Debug, Default)]
pub struct InMemoryGrantStore {
    rows: InMemoryOwnerStore<String, PermissionGrant>,
    faults: Faults,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, grant: PermissionGrant) {
        self.rows.put(&grant.owner.clone(), grant);
    }

    pub fn remove(&self, owner: &str, name: &str) -> Option<PermissionGrant> {
        self.rows.remove(owner, &format!("{owner}/{name}"))
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }
}

#[async_trait]
impl GrantStore for InMemoryGrantStore {
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<PermissionGrant>, StoreError> {
        self.faults.gate("grant store").await?;
        Ok(self.rows.list(owner))
    }
}
