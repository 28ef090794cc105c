use keyward_core::{AccountId, DomainError};

/// Identity of a caller asking for an access decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requester {
    /// Trusted internal caller, identified by the service-account prefix.
    ServiceAccount(String),
    /// A regular account, resolved through the account store.
    Account(AccountId),
}

impl Requester {
    /// Classify a raw requester identifier.
    ///
    /// The service-account prefix wins over account-id parsing, so
    /// `"app/portal"` is a service account even though it is also a
    /// well-formed account id.
    pub fn classify(raw: &str, service_account_prefix: &str) -> Result<Self, DomainError> {
        if !service_account_prefix.is_empty() && raw.starts_with(service_account_prefix) {
            return Ok(Self::ServiceAccount(raw.to_string()));
        }
        Ok(Self::Account(raw.parse()?))
    }

    pub fn is_service_account(&self) -> bool {
        matches!(self, Requester::ServiceAccount(_))
    }
}

impl core::fmt::Display for Requester {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Requester::ServiceAccount(raw) => f.write_str(raw),
            Requester::Account(id) => core::fmt::Display::fmt(id, f),
        }
    }
}
