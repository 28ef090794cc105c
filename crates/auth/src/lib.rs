//! `keyward-auth` — authentication and access-decision core.
//!
//! Decides whether a presented secret proves an account's identity (locally
//! or against a federated directory), throttles repeated failures with a
//! time-boxed lockout, and answers the two access questions: may this caller
//! act on that account, and may this principal reach that resource.
//!
//! The crate performs no storage or network I/O of its own. Everything flows
//! through the collaborator traits in [`store`], [`directory`], [`policy`]
//! and [`message`].

pub mod account;
pub mod authenticate;
pub mod authorize;
pub mod config;
pub mod credential;
pub mod directory;
pub mod error;
pub mod governor;
pub mod local;
pub mod message;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod store;

#[cfg(test)]
mod test_support;

pub use account::{Account, AccountField, Organization};
pub use authenticate::{Authenticator, AuthenticatorDeps};
pub use authorize::{AccessDecisions, AuthorityDecision, AuthorityRequest, DenialReason};
pub use config::{AuthConfig, LockoutPolicy};
pub use credential::{CredentialRegistry, CredentialVerifier};
pub use directory::{
    DirectoryBinding, DirectoryClient, DirectoryConnection, DirectoryEntry, DirectoryError,
    DirectoryVerifier,
};
pub use error::{AuthError, ConfigurationError, ErrorKind};
pub use governor::{LockState, SigninGovernor};
pub use local::LocalVerifier;
pub use message::{Message, Translator};
pub use permissions::{GrantEffect, PermissionGrant};
pub use policy::{CasbinEngine, EngineResolver, GrantEngineResolver, PolicyEngine, PolicyError};
pub use principal::Requester;
pub use store::{AccountStore, BindingStore, GrantStore, OrganizationStore, StoreError};
