//! In-memory collaborator adapters for tests/dev.

mod faults;
mod owner_store;

pub mod accounts;
pub mod bindings;
pub mod grants;
pub mod organizations;

pub use accounts::InMemoryAccountStore;
pub use bindings::InMemoryBindingStore;
pub use faults::Faults;
pub use grants::InMemoryGrantStore;
pub use organizations::{BUILT_IN_OWNER, InMemoryOrganizationStore};
pub use owner_store::InMemoryOwnerStore;
