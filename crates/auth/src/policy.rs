//! Policy-enforcement engines behind permission grants.
//!
//! Each grant is evaluated by one engine. [`GrantEngineResolver`] builds a
//! Casbin enforcer from the grant itself unless the host registered a
//! dedicated engine for that grant at startup. Built enforcers are memoized
//! per grant and rebuilt when the grant's content changes.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use casbin::{CoreApi, DefaultModel, Enforcer, MemoryAdapter, MgmtApi};
use dashmap::DashMap;
use thiserror::Error;

use keyward_core::AccountId;

use crate::permissions::{GrantEffect, PermissionGrant, WILDCARD};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("policy model invalid: {0}")]
    Model(String),

    #[error("enforcement failed: {0}")]
    Enforcement(String),
}

/// Answers `(principal, resource, action)` requests for one grant.
pub trait PolicyEngine: Send + Sync {
    fn enforce(&self, principal: &str, resource: &str, action: &str) -> Result<bool, PolicyError>;
}

/// Yields the engine that evaluates a grant.
#[async_trait]
pub trait EngineResolver: Send + Sync {
    async fn engine_for(&self, grant: &PermissionGrant) -> Result<Arc<dyn PolicyEngine>, PolicyError>;
}

// `r.scope` is "<organization>/*" for well-formed account ids, so an
// organization entry is a plain equality against it.
const MATCHER: &str = r#"(p.sub == "*" || p.sub == r.sub || p.sub == r.scope) && p.obj == r.obj && (p.act == "*" || p.act == r.act)"#;

fn model_text(effect: GrantEffect) -> String {
    let effect = match effect {
        GrantEffect::Allow => "some(where (p.eft == allow))",
        GrantEffect::Deny => "!some(where (p.eft == deny))",
    };
    format!(
        "[request_definition]\nr = sub, scope, obj, act\n\n\
         [policy_definition]\np = sub, obj, act, eft\n\n\
         [policy_effect]\ne = {effect}\n\n\
         [matchers]\nm = {MATCHER}\n"
    )
}

/// Policy rows for a grant: principals × resources × actions, each tagged
/// with the grant's effect. An empty action list becomes `*`.
fn policy_rules(grant: &PermissionGrant) -> Vec<Vec<String>> {
    let eft = match grant.effect {
        GrantEffect::Allow => "allow",
        GrantEffect::Deny => "deny",
    };
    let actions: Vec<&str> = if grant.actions.is_empty() {
        vec![WILDCARD]
    } else {
        grant.actions.iter().map(String::as_str).collect()
    };

    let mut rules = BTreeSet::new();
    for principal in &grant.principals {
        for resource in &grant.resources {
            for action in &actions {
                rules.insert(vec![
                    principal.clone(),
                    resource.clone(),
                    (*action).to_string(),
                    eft.to_string(),
                ]);
            }
        }
    }
    rules.into_iter().collect()
}

/// Organization scope entry that names `principal`, or the principal itself
/// when it is not an account id.
fn principal_scope(principal: &str) -> String {
    match principal.parse::<AccountId>() {
        Ok(id) => format!("{}/*", id.owner()),
        Err(_) => principal.to_string(),
    }
}

/// Casbin enforcer over a grant's own principals, resources and actions.
///
/// With [`GrantEffect::Allow`] only listed tuples are allowed. With
/// [`GrantEffect::Deny`] listed tuples are denied and everything else is
/// allowed. Principal entries may be literal ids, `*`, or `<organization>/*`.
pub struct CasbinEngine {
    grant_id: String,
    enforcer: Enforcer,
}

impl CasbinEngine {
    pub async fn from_grant(grant: &PermissionGrant) -> Result<Self, PolicyError> {
        let grant_id = grant.grant_id();
        if grant.resources.is_empty() {
            return Err(PolicyError::Model(format!("grant {grant_id} lists no resources")));
        }

        let model_failed = |e: casbin::Error| PolicyError::Model(format!("grant {grant_id}: {e}"));

        let model = DefaultModel::from_str(&model_text(grant.effect))
            .await
            .map_err(model_failed)?;
        let mut enforcer = Enforcer::new(model, MemoryAdapter::default())
            .await
            .map_err(model_failed)?;

        let rules = policy_rules(grant);
        if !rules.is_empty() {
            enforcer.add_policies(rules).await.map_err(model_failed)?;
        }

        tracing::debug!(grant = %grant_id, effect = ?grant.effect, "policy enforcer built");
        Ok(Self { grant_id, enforcer })
    }
}

impl PolicyEngine for CasbinEngine {
    fn enforce(&self, principal: &str, resource: &str, action: &str) -> Result<bool, PolicyError> {
        let scope = principal_scope(principal);
        self.enforcer
            .enforce((principal, scope.as_str(), resource, action))
            .map_err(|e| PolicyError::Enforcement(format!("grant {}: {e}", self.grant_id)))
    }
}

impl core::fmt::Debug for CasbinEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CasbinEngine")
            .field("grant_id", &self.grant_id)
            .finish_non_exhaustive()
    }
}

type BuiltEngine = (PermissionGrant, Arc<dyn PolicyEngine>);

/// Default resolver: per-grant overrides, else a [`CasbinEngine`].
#[derive(Default)]
pub struct GrantEngineResolver {
    overrides: HashMap<String, Arc<dyn PolicyEngine>>,
    built: DashMap<String, BuiltEngine>,
}

impl GrantEngineResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the grant identified by `grant_id` (`"<owner>/<name>"`) with
    /// `engine` instead of its Casbin enforcer.
    pub fn with_engine<E>(mut self, grant_id: impl Into<String>, engine: E) -> Self
    where
        E: PolicyEngine + 'static,
    {
        self.overrides.insert(grant_id.into(), Arc::new(engine));
        self
    }

    fn cached(&self, grant: &PermissionGrant) -> Option<Arc<dyn PolicyEngine>> {
        let entry = self.built.get(&grant.grant_id())?;
        let (built_from, engine) = entry.value();
        (built_from == grant).then(|| Arc::clone(engine))
    }
}

#[async_trait]
impl EngineResolver for GrantEngineResolver {
    async fn engine_for(&self, grant: &PermissionGrant) -> Result<Arc<dyn PolicyEngine>, PolicyError> {
        if let Some(engine) = self.overrides.get(&grant.grant_id()) {
            return Ok(Arc::clone(engine));
        }
        if let Some(engine) = self.cached(grant) {
            return Ok(engine);
        }

        let engine: Arc<dyn PolicyEngine> = Arc::new(CasbinEngine::from_grant(grant).await?);
        self.built
            .insert(grant.grant_id(), (grant.clone(), Arc::clone(&engine)));
        Ok(engine)
    }
}

impl core::fmt::Debug for GrantEngineResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut ids: Vec<&str> = self.overrides.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("GrantEngineResolver")
            .field("overrides", &ids)
            .field("built", &self.built.len())
            .finish()
    }
}
