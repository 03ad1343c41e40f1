use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An account or contract address on the target ledger.
///
/// Kept opaque: the orchestrator never interprets addresses, it only moves
/// them between the deploy client, the registry document, and step contexts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Address(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Address(s)
    }
}

// ---------------------------------------------------------------------------
// ContractRole
// ---------------------------------------------------------------------------

/// The closed set of logical components the application deploys.
///
/// A role is the key under which a deployed address is registered; the
/// registry maps each role to at most one active address per chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContractRole {
    Market,
    Token,
    Oracle,
    Redemption,
    Resolution,
    Shareholders,
    Usdc,
    Voting,
}

impl ContractRole {
    pub fn all() -> &'static [ContractRole] {
        &[
            ContractRole::Market,
            ContractRole::Token,
            ContractRole::Oracle,
            ContractRole::Redemption,
            ContractRole::Resolution,
            ContractRole::Shareholders,
            ContractRole::Usdc,
            ContractRole::Voting,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContractRole::Market => "Market",
            ContractRole::Token => "Token",
            ContractRole::Oracle => "Oracle",
            ContractRole::Redemption => "Redemption",
            ContractRole::Resolution => "Resolution",
            ContractRole::Shareholders => "Shareholders",
            ContractRole::Usdc => "Usdc",
            ContractRole::Voting => "Voting",
        }
    }
}

impl fmt::Display for ContractRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContractRole {
    type Err = crate::error::ChainrunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Market" => Ok(ContractRole::Market),
            "Token" => Ok(ContractRole::Token),
            "Oracle" => Ok(ContractRole::Oracle),
            "Redemption" => Ok(ContractRole::Redemption),
            "Resolution" => Ok(ContractRole::Resolution),
            "Shareholders" => Ok(ContractRole::Shareholders),
            "Usdc" => Ok(ContractRole::Usdc),
            "Voting" => Ok(ContractRole::Voting),
            _ => Err(crate::error::ChainrunError::InvalidRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// AccessRole
// ---------------------------------------------------------------------------

/// Permission labels granted between contracts during wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRole {
    DefaultAdmin,
    Operator,
    Resolution,
    Escrow,
    ShareholderRegistry,
    TokenManager,
}

impl AccessRole {
    /// The on-chain role label, as the access-control contracts name it.
    pub fn as_str(self) -> &'static str {
        match self {
            AccessRole::DefaultAdmin => "DEFAULT_ADMIN_ROLE",
            AccessRole::Operator => "OPERATOR_ROLE",
            AccessRole::Resolution => "RESOLUTION_ROLE",
            AccessRole::Escrow => "ESCROW_ROLE",
            AccessRole::ShareholderRegistry => "SHAREHOLDER_REGISTRY_ROLE",
            AccessRole::TokenManager => "TOKEN_MANAGER_ROLE",
        }
    }
}

impl fmt::Display for AccessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_roundtrip_via_str() {
        for role in ContractRole::all() {
            assert_eq!(ContractRole::from_str(role.as_str()).unwrap(), *role);
        }
    }

    #[test]
    fn unknown_role_rejected() {
        assert!(ContractRole::from_str("Treasury").is_err());
    }

    #[test]
    fn role_serializes_as_document_key() {
        let json = serde_json::to_string(&ContractRole::Shareholders).unwrap();
        assert_eq!(json, "\"Shareholders\"");
    }

    #[test]
    fn address_is_transparent_in_json() {
        let addr = Address::from("0xabc123");
        assert_eq!(serde_json::to_string(&addr).unwrap(), "\"0xabc123\"");
    }

    #[test]
    fn access_role_labels() {
        assert_eq!(AccessRole::Operator.as_str(), "OPERATOR_ROLE");
        assert_eq!(
            AccessRole::ShareholderRegistry.as_str(),
            "SHAREHOLDER_REGISTRY_ROLE"
        );
    }
}
