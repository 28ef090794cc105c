//! Infrastructure layer: in-memory collaborator adapters for the
//! authentication core (stores, directory, message catalog).

pub mod directory;
pub mod i18n;
pub mod store;

pub use directory::{DirectoryOp, ScriptedDirectory};
pub use i18n::CatalogTranslator;
pub use store::{
    InMemoryAccountStore, InMemoryBindingStore, InMemoryGrantStore, InMemoryOrganizationStore,
};
