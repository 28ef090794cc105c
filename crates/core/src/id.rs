//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a single access decision (audit correlation).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered) so audit lines sort by decision time.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(DecisionId, "DecisionId");

/// Identifier of an account: `"<organization>/<name>"`.
///
/// Account names are only unique inside their organization, so the owning
/// organization is part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId {
    owner: String,
    name: String,
}

impl AccountId {
    pub const SEPARATOR: char = '/';

    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// The owning organization.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}{}", self.owner, Self::SEPARATOR, self.name)
    }
}

impl FromStr for AccountId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s
            .split_once(Self::SEPARATOR)
            .ok_or_else(|| DomainError::invalid_id(format!("AccountId: missing '/' in '{s}'")))?;

        if owner.is_empty() || name.is_empty() {
            return Err(DomainError::invalid_id(format!(
                "AccountId: empty organization or name in '{s}'"
            )));
        }

        Ok(Self::new(owner, name))
    }
}

impl TryFrom<String> for AccountId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_parses_owner_and_name() {
        let id: AccountId = "acme/alice".parse().unwrap();
        assert_eq!(id.owner(), "acme");
        assert_eq!(id.name(), "alice");
        assert_eq!(id.to_string(), "acme/alice");
    }

    #[test]
    fn account_id_keeps_slashes_after_the_first_in_the_name() {
        let id: AccountId = "app/built-in/portal".parse().unwrap();
        assert_eq!(id.owner(), "app");
        assert_eq!(id.name(), "built-in/portal");
    }

    #[test]
    fn account_id_rejects_malformed_input() {
        for bad in ["alice", "/alice", "acme/", ""] {
            let err = bad.parse::<AccountId>().unwrap_err();
            assert!(matches!(err, DomainError::InvalidId(_)), "{bad}");
        }
    }

    #[test]
    fn account_id_serializes_as_string() {
        let id = AccountId::new("acme", "bob");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"acme/bob\"");

        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn decision_ids_are_unique() {
        assert_ne!(DecisionId::new(), DecisionId::new());
    }
}
