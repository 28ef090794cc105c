use async_trait::async_trait;

use keyward_auth::{BindingStore, DirectoryBinding, StoreError};

use super::faults::Faults;
use super::owner_store::InMemoryOwnerStore;

/// Directory bindings per organization, in priority (insertion) order.
#[derive(Debug, Default)]
pub struct InMemoryBindingStore {
    rows: InMemoryOwnerStore<String, DirectoryBinding>,
    faults: Faults,
}

impl InMemoryBindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, binding: DirectoryBinding) {
        self.rows.put(&binding.owner.clone(), binding);
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }
}

#[async_trait]
impl BindingStore for InMemoryBindingStore {
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<DirectoryBinding>, StoreError> {
        self.faults.gate("binding store").await?;
        Ok(self.rows.list(owner))
    }
}
