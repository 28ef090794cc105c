//! Sign-in entry point: resolve the account, then route to the right verifier.

use std::sync::Arc;
use std::time::Duration;

use keyward_core::Clock;

use crate::account::Account;
use crate::config::AuthConfig;
use crate::credential::CredentialRegistry;
use crate::directory::{DirectoryClient, DirectoryVerifier};
use crate::error::AuthError;
use crate::governor::SigninGovernor;
use crate::local::LocalVerifier;
use crate::store::{self, AccountStore, BindingStore, OrganizationStore};

/// Collaborators needed to authenticate.
pub struct AuthenticatorDeps {
    pub accounts: Arc<dyn AccountStore>,
    pub organizations: Arc<dyn OrganizationStore>,
    pub bindings: Arc<dyn BindingStore>,
    pub directory: Arc<dyn DirectoryClient>,
    pub registry: Arc<CredentialRegistry>,
    pub clock: Arc<dyn Clock>,
}

pub struct Authenticator {
    accounts: Arc<dyn AccountStore>,
    local: LocalVerifier,
    federated: DirectoryVerifier,
    call_timeout: Duration,
}

impl Authenticator {
    pub fn new(deps: AuthenticatorDeps, config: &AuthConfig) -> Self {
        let call_timeout = config.call_timeout();
        let governor = SigninGovernor::new(deps.accounts.clone(), deps.clock, config);

        Self {
            local: LocalVerifier::new(governor, deps.organizations, deps.registry, call_timeout),
            federated: DirectoryVerifier::new(deps.bindings, deps.directory, call_timeout),
            accounts: deps.accounts,
            call_timeout,
        }
    }

    pub fn local(&self) -> &LocalVerifier {
        &self.local
    }

    pub fn federated(&self) -> &DirectoryVerifier {
        &self.federated
    }

    /// Authenticate `name` in `organization` with `secret`.
    ///
    /// Unknown and soft-deleted accounts fail exactly like a wrong secret.
    pub async fn authenticate(
        &self,
        organization: &str,
        name: &str,
        secret: &str,
    ) -> Result<Account, AuthError> {
        let found = store::call(
            self.call_timeout,
            "account lookup",
            self.accounts.get_by_name(organization, name),
        )
        .await?;

        let mut account = match found {
            Some(account) if !account.is_deleted => account,
            _ => {
                tracing::debug!(organization, name, "sign-in for unknown account");
                return Err(AuthError::InvalidCredential);
            }
        };

        if account.is_forbidden {
            tracing::warn!(account = %account.id(), "sign-in by forbidden account");
            return Err(AuthError::Forbidden {
                account: account.id(),
            });
        }

        if account.is_federated() {
            return self.federated.verify_federated(&account, secret).await;
        }

        self.local.verify_local(&mut account, secret).await?;
        Ok(account)
    }
}

impl core::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authenticator")
            .field("local", &self.local)
            .field("federated", &self.federated)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use keyward_core::ManualClock;

    use super::*;
    use crate::account::Organization;
    use crate::credential::scheme;
    use crate::directory::DirectoryBinding;
    use crate::error::ErrorKind;
    use crate::test_support::{FakeDirectory, MemoryAccounts, MemoryBindings, MemoryOrganizations};

    fn authenticator(accounts: Arc<MemoryAccounts>, dir: FakeDirectory) -> Authenticator {
        let deps = AuthenticatorDeps {
            accounts,
            organizations: Arc::new(MemoryOrganizations::new(Some(Organization::new(
                "acme",
                scheme::PLAIN,
            )))),
            bindings: Arc::new(MemoryBindings::new(vec![DirectoryBinding::new("ldap1", "acme")])),
            directory: Arc::new(dir),
            registry: Arc::new(CredentialRegistry::with_defaults()),
            clock: Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())),
        };
        Authenticator::new(deps, &AuthConfig::default())
    }

    #[tokio::test]
    async fn local_account_signs_in() {
        let accounts = Arc::new(MemoryAccounts::default());
        accounts.insert(Account::new("acme", "alice").with_password("pw", ""));
        let auth = authenticator(accounts, FakeDirectory::default());

        let account = auth.authenticate("acme", "alice", "pw").await.unwrap();
        assert_eq!(account.name, "alice");
    }

    #[tokio::test]
    async fn unknown_and_deleted_accounts_look_like_wrong_secrets() {
        let accounts = Arc::new(MemoryAccounts::default());
        let mut gone = Account::new("acme", "gone").with_password("pw", "");
        gone.is_deleted = true;
        accounts.insert(gone);
        let auth = authenticator(accounts, FakeDirectory::default());

        assert_eq!(
            auth.authenticate("acme", "nobody", "pw").await.unwrap_err(),
            AuthError::InvalidCredential
        );
        assert_eq!(
            auth.authenticate("acme", "gone", "pw").await.unwrap_err(),
            AuthError::InvalidCredential
        );
    }

    #[tokio::test]
    async fn forbidden_account_is_refused() {
        let accounts = Arc::new(MemoryAccounts::default());
        let mut banned = Account::new("acme", "mallory").with_password("pw", "");
        banned.is_forbidden = true;
        accounts.insert(banned);
        let auth = authenticator(accounts, FakeDirectory::default());

        let err = auth.authenticate("acme", "mallory", "pw").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn federated_account_goes_to_directory_and_skips_lockout() {
        let accounts = Arc::new(MemoryAccounts::default());
        let mut bob = Account::new("acme", "bob").with_federation("corp");
        bob.signin_failures = 99;
        bob.last_signin_failure = "2024-03-01T00:00:00Z".into();
        accounts.insert(bob);

        let dir = FakeDirectory::default()
            .entries("ldap1", ["uid=bob"])
            .secret("uid=bob", "dir-pw");
        let auth = authenticator(accounts.clone(), dir);

        let account = auth.authenticate("acme", "bob", "dir-pw").await.unwrap();
        assert_eq!(account.name, "bob");
        assert_eq!(accounts.update_count(), 0);
    }
}
