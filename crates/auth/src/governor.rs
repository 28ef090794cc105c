//! Sign-in attempt governor: the consecutive-failure lockout state machine.
//!
//! States, derived from the account's lockout fields:
//!
//! - **Clear**: fewer than `max_failures` consecutive failures.
//! - **Locked**: at or above the limit and the cool-down window, measured
//!   from the *last* failure, has not elapsed. Every further failure moves
//!   the window forward.
//! - **Expired**: at or above the limit but the window has elapsed. The
//!   next check resets the counter and the account is Clear again without
//!   needing a successful sign-in.
//!
//! Each sign-in attempt runs under a per-account [`AttemptGuard`], so the
//! read → compare → increment → persist sequence of one account never
//! interleaves with another attempt on the same account.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use keyward_core::{AccountId, Clock};

use crate::account::{Account, AccountField};
use crate::config::{AuthConfig, LockoutPolicy};
use crate::error::AuthError;
use crate::store::{self, AccountStore};

/// Lockout classification of an account at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Clear,
    Locked { remaining: Duration },
    Expired,
}

pub struct SigninGovernor {
    accounts: Arc<dyn AccountStore>,
    clock: Arc<dyn Clock>,
    policy: LockoutPolicy,
    call_timeout: Duration,
    in_flight: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl SigninGovernor {
    pub fn new(accounts: Arc<dyn AccountStore>, clock: Arc<dyn Clock>, config: &AuthConfig) -> Self {
        Self {
            accounts,
            clock,
            policy: config.lockout.clone(),
            call_timeout: config.call_timeout(),
            in_flight: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Serialize sign-in attempts on `account` and refresh its lockout fields
    /// from the store, so the decision sees every failure recorded by an
    /// attempt that finished before this one started.
    pub async fn begin_attempt(&self, account: &mut Account) -> Result<AttemptGuard<'_>, AuthError> {
        let id = account.id();
        let slot = self.in_flight.entry(id.clone()).or_default().clone();
        let guard = AttemptGuard {
            in_flight: &self.in_flight,
            id,
            guard: Some(slot.lock_owned().await),
        };

        let fresh = store::call(
            self.call_timeout,
            "account lookup",
            self.accounts.get_by_id(&guard.id),
        )
        .await?;

        if let Some(fresh) = fresh {
            account.signin_failures = fresh.signin_failures;
            account.last_signin_failure = fresh.last_signin_failure;
        }

        Ok(guard)
    }

    /// Classify `account` at `now` without side effects.
    pub fn assess(&self, account: &Account, now: DateTime<Utc>) -> LockState {
        if account.signin_failures < self.policy.max_failures {
            return LockState::Clear;
        }

        // An unreadable timestamp counts as "long ago".
        let Some(last_failure) = parse_failure_instant(&account.last_signin_failure) else {
            return LockState::Expired;
        };

        let remaining = (self.policy.window() - (now - last_failure)).num_seconds();
        if remaining > 0 {
            LockState::Locked {
                remaining: Duration::from_secs(remaining as u64),
            }
        } else {
            LockState::Expired
        }
    }

    /// Refuse the attempt while the account is locked. An expired lockout is
    /// cleared (and persisted) on the way through.
    pub async fn check_lock(&self, account: &mut Account) -> Result<(), AuthError> {
        match self.assess(account, self.clock.now()) {
            LockState::Clear => Ok(()),
            LockState::Locked { remaining } => {
                tracing::warn!(
                    account = %account.id(),
                    failures = account.signin_failures,
                    remaining_secs = remaining.as_secs(),
                    "sign-in refused: account locked"
                );
                Err(AuthError::Locked { remaining })
            }
            LockState::Expired => {
                account.signin_failures = 0;
                self.persist(account, &[AccountField::SigninFailures]).await?;
                tracing::info!(account = %account.id(), "lockout window elapsed; failures reset");
                Ok(())
            }
        }
    }

    /// Count a failed attempt and return the error to surface to the caller.
    ///
    /// The result is [`AuthError::InvalidCredential`] (never the new counter
    /// value) unless the failure could not be persisted.
    pub async fn record_failure(&self, account: &mut Account) -> AuthError {
        account.signin_failures = account.signin_failures.saturating_add(1);
        account.last_signin_failure = format_failure_instant(self.clock.now());

        if let Err(e) = self
            .persist(
                account,
                &[AccountField::SigninFailures, AccountField::LastSigninFailure],
            )
            .await
        {
            return e;
        }

        if account.signin_failures >= self.policy.max_failures {
            tracing::warn!(
                account = %account.id(),
                failures = account.signin_failures,
                window_secs = self.policy.window_secs,
                "failure limit reached; account locked"
            );
        } else {
            tracing::debug!(account = %account.id(), failures = account.signin_failures, "sign-in failure recorded");
        }

        AuthError::InvalidCredential
    }

    /// Zero the failure counter. No store write when it is already zero.
    pub async fn reset(&self, account: &mut Account) -> Result<(), AuthError> {
        if account.signin_failures == 0 {
            return Ok(());
        }
        account.signin_failures = 0;
        self.persist(account, &[AccountField::SigninFailures]).await
    }

    async fn persist(&self, account: &Account, fields: &[AccountField]) -> Result<(), AuthError> {
        store::call(
            self.call_timeout,
            "account update",
            self.accounts.update(&account.id(), account, fields),
        )
        .await
    }
}

impl core::fmt::Debug for SigninGovernor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SigninGovernor")
            .field("policy", &self.policy)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

/// Exclusive hold on one account's sign-in sequence.
///
/// Dropping the guard releases the account; the slot is removed from the
/// in-flight map once no other attempt is waiting on it.
pub struct AttemptGuard<'a> {
    in_flight: &'a DashMap<AccountId, Arc<Mutex<()>>>,
    id: AccountId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.in_flight
            .remove_if(&self.id, |_, slot| Arc::strong_count(slot) == 1);
    }
}

/// Serialized form of a failure instant: RFC 3339, UTC, whole seconds.
pub fn format_failure_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_failure_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
