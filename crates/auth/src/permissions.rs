//! Permission grants over protected application resources.

use serde::{Deserialize, Serialize};

use keyward_core::Entity;

/// Principal entry meaning "every principal".
pub const WILDCARD: &str = "*";

/// Effect applied by a grant's policy rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantEffect {
    #[default]
    Allow,
    Deny,
}

/// Authorization rule over protected application resources.
///
/// A grant applies to a resource only when the resource name is a literal
/// member of `resources`; there is no pattern matching on resource names.
/// Principal entries may be a literal principal id, [`WILDCARD`], or
/// `"<organization>/*"` for every principal of one organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionGrant {
    pub owner: String,
    pub name: String,
    pub is_enabled: bool,
    /// Ordered resource names.
    pub resources: Vec<String>,
    pub principals: Vec<String>,
    /// Actions covered; empty covers every action.
    pub actions: Vec<String>,
    pub effect: GrantEffect,
}

impl PermissionGrant {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            is_enabled: true,
            ..Default::default()
        }
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_principals<I, S>(mut self, principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.principals = principals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_effect(mut self, effect: GrantEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self
    }

    /// `"<owner>/<name>"`.
    pub fn grant_id(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Enabled and names at least one principal.
    pub fn is_effective(&self) -> bool {
        self.is_enabled && !self.principals.is_empty()
    }

    pub fn covers_resource(&self, resource: &str) -> bool {
        self.resources.iter().any(|r| r == resource)
    }
}

impl Entity for PermissionGrant {
    type Id = String;

    fn id(&self) -> String {
        self.grant_id()
    }
}
