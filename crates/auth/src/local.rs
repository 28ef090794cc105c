//! Local credential verification for accounts that are not federated.

use std::sync::Arc;
use std::time::Duration;

use crate::account::Account;
use crate::credential::CredentialRegistry;
use crate::error::{AuthError, ConfigurationError};
use crate::governor::SigninGovernor;
use crate::store::{self, OrganizationStore};

pub struct LocalVerifier {
    governor: SigninGovernor,
    organizations: Arc<dyn OrganizationStore>,
    registry: Arc<CredentialRegistry>,
    call_timeout: Duration,
}

impl LocalVerifier {
    pub fn new(
        governor: SigninGovernor,
        organizations: Arc<dyn OrganizationStore>,
        registry: Arc<CredentialRegistry>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            governor,
            organizations,
            registry,
            call_timeout,
        }
    }

    pub fn governor(&self) -> &SigninGovernor {
        &self.governor
    }

    /// Verify `secret` against the account's stored hash, or against the
    /// organization master secret when one is configured.
    ///
    /// A locked account is refused before the secret is looked at. Success
    /// clears the failure counter; a mismatch is recorded before returning.
    /// Configuration problems (missing organization, unknown scheme) do not
    /// count as failures.
    pub async fn verify_local(&self, account: &mut Account, secret: &str) -> Result<(), AuthError> {
        if account.is_federated() {
            return Err(ConfigurationError::FederatedAccount {
                account: account.id(),
            }
            .into());
        }

        let _attempt = self.governor.begin_attempt(account).await?;
        self.governor.check_lock(account).await?;

        let organization = store::call(
            self.call_timeout,
            "organization lookup",
            self.organizations.get_by_account(account),
        )
        .await?
        .ok_or_else(|| {
            tracing::warn!(account = %account.id(), "organization missing for account");
            ConfigurationError::OrganizationNotFound {
                account: account.id(),
            }
        })?;

        let verifier = self
            .registry
            .get(&organization.password_scheme)
            .ok_or_else(|| {
                tracing::warn!(
                    organization = %organization.name,
                    scheme = %organization.password_scheme,
                    "unsupported credential scheme"
                );
                ConfigurationError::UnsupportedScheme {
                    organization: organization.name.clone(),
                    scheme: organization.password_scheme.clone(),
                }
            })?;

        let via_master = organization.has_master_password()
            && verifier.verify(
                secret,
                &organization.master_password,
                "",
                &organization.password_salt,
            );

        if via_master
            || verifier.verify(
                secret,
                &account.password_hash,
                &account.password_salt,
                &organization.password_salt,
            )
        {
            self.governor.reset(account).await?;
            tracing::info!(account = %account.id(), via_master, "local sign-in succeeded");
            return Ok(());
        }

        Err(self.governor.record_failure(account).await)
    }
}

impl core::fmt::Debug for LocalVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LocalVerifier")
            .field("governor", &self.governor)
            .field("registry", &self.registry)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use keyward_core::ManualClock;

    use super::*;
    use crate::account::Organization;
    use crate::config::AuthConfig;
    use crate::credential::{Sha256SaltVerifier, scheme};
    use crate::error::ErrorKind;
    use crate::test_support::{MemoryAccounts, MemoryOrganizations};

    struct Fixture {
        clock: Arc<ManualClock>,
        accounts: Arc<MemoryAccounts>,
        verifier: LocalVerifier,
    }

    fn fixture(org: Option<Organization>) -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let accounts = Arc::new(MemoryAccounts::default());
        let config = AuthConfig::default();
        let governor = SigninGovernor::new(accounts.clone(), clock.clone(), &config);
        let verifier = LocalVerifier::new(
            governor,
            Arc::new(MemoryOrganizations::new(org)),
            Arc::new(CredentialRegistry::with_defaults()),
            config.call_timeout(),
        );
        Fixture {
            clock,
            accounts,
            verifier,
        }
    }

    fn salted_org() -> Organization {
        Organization::new("acme", scheme::SALT).with_salt("org-salt")
    }

    fn alice() -> Account {
        let hash = Sha256SaltVerifier::derive("s3cret", "acct-salt", "org-salt");
        Account::new("acme", "alice").with_password(hash, "acct-salt")
    }

    fn seed(fx: &Fixture, account: &Account) {
        fx.accounts.insert(account.clone());
    }

    #[tokio::test]
    async fn correct_secret_verifies_and_resets_counter() {
        let fx = fixture(Some(salted_org()));
        let mut account = alice();
        account.signin_failures = 3;
        account.last_signin_failure = "2024-03-01T11:59:00Z".into();
        seed(&fx, &account);

        fx.verifier.verify_local(&mut account, "s3cret").await.unwrap();
        assert_eq!(account.signin_failures, 0);
        assert_eq!(fx.accounts.stored(&account.id()).unwrap().signin_failures, 0);
    }

    #[tokio::test]
    async fn sixth_attempt_is_locked_even_with_correct_secret() {
        let fx = fixture(Some(salted_org()));
        let mut account = alice();
        seed(&fx, &account);

        for _ in 0..5 {
            let err = fx.verifier.verify_local(&mut account, "wrong").await.unwrap_err();
            assert_eq!(err, AuthError::InvalidCredential);
        }

        fx.clock.advance(chrono::Duration::seconds(30));
        let err = fx.verifier.verify_local(&mut account, "s3cret").await.unwrap_err();
        match err {
            AuthError::Locked { remaining } => {
                assert_eq!(remaining, Duration::from_secs(15 * 60 - 30));
            }
            other => panic!("expected lock, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn lock_lifts_after_window_and_attempt_is_judged_on_merit() {
        let fx = fixture(Some(salted_org()));
        let mut account = alice();
        seed(&fx, &account);

        for _ in 0..5 {
            let _ = fx.verifier.verify_local(&mut account, "wrong").await;
        }
        fx.clock.advance(chrono::Duration::minutes(15));

        let err = fx.verifier.verify_local(&mut account, "still wrong").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredential);
        assert_eq!(account.signin_failures, 1);
    }

    #[tokio::test]
    async fn master_secret_signs_in_any_account() {
        let master = Sha256SaltVerifier::derive("master!", "", "org-salt");
        let fx = fixture(Some(salted_org().with_master_password(master)));
        let mut account = alice();
        seed(&fx, &account);

        fx.verifier.verify_local(&mut account, "master!").await.unwrap();

        let mut other = Account::new("acme", "bob").with_password("unrelated", "x");
        seed(&fx, &other);
        fx.verifier.verify_local(&mut other, "master!").await.unwrap();
    }

    #[tokio::test]
    async fn federated_account_is_rejected_without_touching_counters() {
        let fx = fixture(Some(salted_org()));
        let mut account = alice().with_federation("corp");
        seed(&fx, &account);

        let err = fx.verifier.verify_local(&mut account, "s3cret").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(fx.accounts.update_count(), 0);
    }

    #[tokio::test]
    async fn missing_organization_is_configuration_error() {
        let fx = fixture(None);
        let mut account = alice();
        seed(&fx, &account);

        let err = fx.verifier.verify_local(&mut account, "s3cret").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Configuration(ConfigurationError::OrganizationNotFound { .. })
        ));
        assert_eq!(account.signin_failures, 0);
    }

    #[tokio::test]
    async fn unknown_scheme_is_configuration_error_not_wrong_secret() {
        let fx = fixture(Some(Organization::new("acme", "md5-crypt")));
        let mut account = alice();
        seed(&fx, &account);

        let err = fx.verifier.verify_local(&mut account, "s3cret").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Configuration(ConfigurationError::UnsupportedScheme { ref scheme, .. })
                if scheme == "md5-crypt"
        ));
        assert_eq!(fx.accounts.update_count(), 0);
    }
}
