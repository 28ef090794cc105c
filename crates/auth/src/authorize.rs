use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use keyward_core::{AccountId, DecisionId};

use crate::account::Account;
use crate::config::AuthConfig;
use crate::error::{AuthError, ConfigurationError};
use crate::message::{Message, keys};
use crate::permissions::{PermissionGrant, WILDCARD};
use crate::policy::EngineResolver;
use crate::principal::Requester;
use crate::store::{self, AccountStore, GrantStore};

/// Input of the principal authority check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityRequest {
    /// Authenticated caller; `None` when no session identifies one.
    pub requester: Option<String>,
    /// Account the caller wants to act on or view.
    pub target: Option<String>,
    /// Scope to compare against when no target is given.
    pub target_scope: String,
    /// Same-scope callers additionally need organization-admin standing.
    pub strict: bool,
}

impl AuthorityRequest {
    pub fn by(requester: impl Into<String>) -> Self {
        Self {
            requester: Some(requester.into()),
            ..Default::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn on_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn in_scope(mut self, scope: impl Into<String>) -> Self {
        self.target_scope = scope.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Reason attached to every authority decision.
///
/// A reason accompanies granted decisions too; callers act on
/// [`AuthorityDecision::granted`] and log the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    NotAuthenticated,
    TargetNotFound { target: String },
    SessionInvalid,
    NoPermission,
}

impl DenialReason {
    pub fn message(&self) -> Message {
        match self {
            DenialReason::NotAuthenticated => Message::new(keys::LOGIN_REQUIRED),
            DenialReason::TargetNotFound { target } => {
                Message::new(keys::TARGET_NOT_FOUND).with_arg(target)
            }
            DenialReason::SessionInvalid => Message::new(keys::SESSION_OUTDATED),
            DenialReason::NoPermission => Message::new(keys::NO_PERMISSION),
        }
    }
}

/// Outcome of a principal authority check, with an id for audit correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorityDecision {
    pub id: DecisionId,
    pub granted: bool,
    pub reason: DenialReason,
}

impl AuthorityDecision {
    fn new(granted: bool, reason: DenialReason) -> Self {
        Self {
            id: DecisionId::new(),
            granted,
            reason,
        }
    }

    fn denied(reason: DenialReason) -> Self {
        Self::new(false, reason)
    }
}

/// Access decision engine: who may act on whom, and who may reach which
/// protected resource.
pub struct AccessDecisions {
    accounts: Arc<dyn AccountStore>,
    grants: Arc<dyn GrantStore>,
    engines: Arc<dyn EngineResolver>,
    service_account_prefix: String,
    resource_action: String,
    call_timeout: Duration,
}

impl AccessDecisions {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        grants: Arc<dyn GrantStore>,
        engines: Arc<dyn EngineResolver>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            accounts,
            grants,
            engines,
            service_account_prefix: config.service_account_prefix.clone(),
            resource_action: config.resource_action.clone(),
            call_timeout: config.call_timeout(),
        }
    }

    /// Decide whether the requester may act on (or view) the target.
    ///
    /// Authority is granted to service accounts, global admins, the target
    /// itself, and members of the target's scope (who must also be
    /// organization admins when `strict` is set).
    pub async fn may_act(&self, request: &AuthorityRequest) -> Result<AuthorityDecision, AuthError> {
        let decision = self.decide_authority(request).await?;

        tracing::info!(
            decision = %decision.id,
            requester = request.requester.as_deref().unwrap_or(""),
            target = request.target.as_deref().unwrap_or(""),
            strict = request.strict,
            granted = decision.granted,
            reason = decision.reason.message().key(),
            "authority decision"
        );

        Ok(decision)
    }

    async fn decide_authority(&self, request: &AuthorityRequest) -> Result<AuthorityDecision, AuthError> {
        let Some(raw_requester) = request.requester.as_deref().filter(|r| !r.is_empty()) else {
            return Ok(AuthorityDecision::denied(DenialReason::NotAuthenticated));
        };

        let mut scope = request.target_scope.clone();
        let mut target_id = None;
        if let Some(raw_target) = request.target.as_deref().filter(|t| !t.is_empty()) {
            let not_found = || {
                AuthorityDecision::denied(DenialReason::TargetNotFound {
                    target: raw_target.to_string(),
                })
            };
            let Ok(id) = raw_target.parse::<AccountId>() else {
                return Ok(not_found());
            };
            match self.lookup(&id, "target lookup").await? {
                Some(target) => scope = target.owner,
                None => return Ok(not_found()),
            }
            target_id = Some(id);
        }

        let requester_id = match Requester::classify(raw_requester, &self.service_account_prefix) {
            Ok(Requester::ServiceAccount(_)) => {
                return Ok(AuthorityDecision::new(true, DenialReason::NoPermission));
            }
            Ok(Requester::Account(id)) => id,
            Err(e) => {
                tracing::debug!(requester = raw_requester, error = %e, "requester id malformed");
                return Ok(AuthorityDecision::denied(DenialReason::SessionInvalid));
            }
        };

        let Some(requester) = self.lookup(&requester_id, "requester lookup").await? else {
            return Ok(AuthorityDecision::denied(DenialReason::SessionInvalid));
        };

        let granted = requester.is_global_admin
            || target_id.as_ref() == Some(&requester_id)
            || (requester.owner == scope && (!request.strict || requester.is_admin));

        Ok(AuthorityDecision::new(granted, DenialReason::NoPermission))
    }

    async fn lookup(
        &self,
        id: &AccountId,
        operation: &'static str,
    ) -> Result<Option<Account>, AuthError> {
        store::call(self.call_timeout, operation, self.accounts.get_by_id(id)).await
    }

    /// Decide whether `principal` may access `resource` owned by `owner`.
    ///
    /// Access is allowed unless some grant restricts the resource. The first
    /// enabled grant (in store order) that lists the resource and names at
    /// least one principal decides alone: a wildcard or literal principal
    /// entry allows outright, otherwise the grant's policy engine answers.
    pub async fn may_access_resource(
        &self,
        principal: &str,
        owner: &str,
        resource: &str,
    ) -> Result<bool, AuthError> {
        let grants = store::call(
            self.call_timeout,
            "grant lookup",
            self.grants.list_by_owner(owner),
        )
        .await?;

        let Some(grant) = grants
            .iter()
            .find(|g| g.is_effective() && g.covers_resource(resource))
        else {
            tracing::debug!(principal, owner, resource, "no grant restricts resource; allowed");
            return Ok(true);
        };

        if grant
            .principals
            .iter()
            .any(|p| p == WILDCARD || p == principal)
        {
            tracing::debug!(principal, resource, grant = %grant.grant_id(), "principal listed by grant; allowed");
            return Ok(true);
        }

        let allowed = self.enforce(grant, principal, resource).await?;
        tracing::debug!(principal, resource, grant = %grant.grant_id(), allowed, "policy engine decided");
        Ok(allowed)
    }

    async fn enforce(
        &self,
        grant: &PermissionGrant,
        principal: &str,
        resource: &str,
    ) -> Result<bool, AuthError> {
        let engine_failed = |message: String| {
            tracing::warn!(grant = %grant.grant_id(), error = %message, "policy engine failed");
            AuthError::from(ConfigurationError::PolicyEngine {
                grant: grant.grant_id(),
                message,
            })
        };

        let engine = self
            .engines
            .engine_for(grant)
            .await
            .map_err(|e| engine_failed(e.to_string()))?;
        engine
            .enforce(principal, resource, &self.resource_action)
            .map_err(|e| engine_failed(e.to_string()))
    }
}

impl core::fmt::Debug for AccessDecisions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccessDecisions")
            .field("service_account_prefix", &self.service_account_prefix)
            .field("resource_action", &self.resource_action)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}
