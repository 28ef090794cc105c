//! Minimal in-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use keyward_core::AccountId;

use crate::account::{Account, AccountField, Organization};
use crate::directory::{
    DirectoryBinding, DirectoryClient, DirectoryConnection, DirectoryEntry, DirectoryError,
};
use crate::permissions::PermissionGrant;
use crate::store::{AccountStore, BindingStore, GrantStore, OrganizationStore, StoreError};

#[derive(Default)]
pub struct MemoryAccounts {
    rows: Mutex<HashMap<AccountId, Account>>,
    updates: Mutex<Vec<Vec<AccountField>>>,
    fail_updates: Mutex<bool>,
}

impl MemoryAccounts {
    pub fn insert(&self, account: Account) {
        self.rows.lock().unwrap().insert(account.id(), account);
    }

    pub fn stored(&self, id: &AccountId) -> Option<Account> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn last_update_fields(&self) -> Option<Vec<AccountField>> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub fn fail_updates(&self, fail: bool) {
        *self.fail_updates.lock().unwrap() = fail;
    }
}

#[async_trait]
impl AccountStore for MemoryAccounts {
    async fn get_by_name(&self, organization: &str, name: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.stored(&AccountId::new(organization, name)))
    }

    async fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.stored(id))
    }

    async fn update(&self, id: &AccountId, account: &Account, fields: &[AccountField]) -> Result<(), StoreError> {
        if *self.fail_updates.lock().unwrap() {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows.entry(id.clone()).or_insert_with(|| account.clone());
        for field in fields {
            match field {
                AccountField::SigninFailures => row.signin_failures = account.signin_failures,
                AccountField::LastSigninFailure => {
                    row.last_signin_failure = account.last_signin_failure.clone()
                }
            }
        }
        self.updates.lock().unwrap().push(fields.to_vec());
        Ok(())
    }
}

pub struct MemoryOrganizations(Option<Organization>);

impl MemoryOrganizations {
    pub fn new(organization: Option<Organization>) -> Self {
        Self(organization)
    }
}

#[async_trait]
impl OrganizationStore for MemoryOrganizations {
    async fn get_by_account(&self, account: &Account) -> Result<Option<Organization>, StoreError> {
        Ok(self.0.clone().filter(|o| o.name == account.owner))
    }
}

pub struct MemoryGrants(Vec<PermissionGrant>);

impl MemoryGrants {
    pub fn new(grants: Vec<PermissionGrant>) -> Self {
        Self(grants)
    }
}

#[async_trait]
impl GrantStore for MemoryGrants {
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<PermissionGrant>, StoreError> {
        Ok(self.0.iter().filter(|g| g.owner == owner).cloned().collect())
    }
}

pub struct MemoryBindings(Vec<DirectoryBinding>);

impl MemoryBindings {
    pub fn new(bindings: Vec<DirectoryBinding>) -> Self {
        Self(bindings)
    }
}

#[async_trait]
impl BindingStore for MemoryBindings {
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<DirectoryBinding>, StoreError> {
        Ok(self.0.iter().filter(|b| b.owner == owner).cloned().collect())
    }
}

type SearchLog = Arc<Mutex<Vec<(String, String, String)>>>;

/// Directory answering from fixed tables, keyed by binding id.
#[derive(Default)]
pub struct FakeDirectory {
    entries: HashMap<String, Vec<DirectoryEntry>>,
    secrets: HashMap<String, String>,
    unreachable: HashSet<String>,
    search_fails: HashSet<String>,
    searches: SearchLog,
}

impl FakeDirectory {
    pub fn entries<'a>(mut self, binding: &str, dns: impl IntoIterator<Item = &'a str>) -> Self {
        self.entries
            .insert(binding.into(), dns.into_iter().map(DirectoryEntry::new).collect());
        self
    }

    pub fn secret(mut self, dn: &str, secret: &str) -> Self {
        self.secrets.insert(dn.into(), secret.into());
        self
    }

    pub fn unreachable(mut self, binding: &str) -> Self {
        self.unreachable.insert(binding.into());
        self
    }

    pub fn search_fails(mut self, binding: &str) -> Self {
        self.search_fails.insert(binding.into());
        self
    }

    pub fn searches(&self) -> SearchLog {
        Arc::clone(&self.searches)
    }
}

struct FakeConnection {
    binding: String,
    entries: Vec<DirectoryEntry>,
    secrets: HashMap<String, String>,
    search_fails: bool,
    searches: SearchLog,
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn connect(&self, binding: &DirectoryBinding) -> Result<Box<dyn DirectoryConnection>, DirectoryError> {
        if self.unreachable.contains(&binding.id) {
            return Err(DirectoryError::Connect(format!("{} refused", binding.endpoint())));
        }
        Ok(Box::new(FakeConnection {
            binding: binding.id.clone(),
            entries: self.entries.get(&binding.id).cloned().unwrap_or_default(),
            secrets: self.secrets.clone(),
            search_fails: self.search_fails.contains(&binding.id),
            searches: Arc::clone(&self.searches),
        }))
    }
}

#[async_trait]
impl DirectoryConnection for FakeConnection {
    async fn search(&mut self, base_dn: &str, filter: &str) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        self.searches
            .lock()
            .unwrap()
            .push((self.binding.clone(), base_dn.into(), filter.into()));
        if self.search_fails {
            return Err(DirectoryError::Search("size limit exceeded".into()));
        }
        Ok(self.entries.clone())
    }

    async fn bind(&mut self, dn: &str, secret: &str) -> Result<(), DirectoryError> {
        match self.secrets.get(dn) {
            Some(expected) if expected == secret => Ok(()),
            _ => Err(DirectoryError::Bind("invalid credentials".into())),
        }
    }
}
