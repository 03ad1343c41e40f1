use crate::error::{ChainrunError, Result};
use crate::types::{Address, ContractRole};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// ContractHandle
// ---------------------------------------------------------------------------

/// A deployed component as steps consume it: role plus current address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractHandle {
    pub role: ContractRole,
    pub address: Address,
}

impl ContractHandle {
    pub fn new(role: ContractRole, address: Address) -> Self {
        Self { role, address }
    }
}

/// Whatever the registry currently holds; some roles may be absent.
pub type PartialContracts = BTreeMap<ContractRole, ContractHandle>;

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// The complete application: one handle per role.
///
/// Obtained through the completeness gate `from_partial`; sequences that run
/// before the application exists work off `PartialContracts` instead.
#[derive(Debug, Clone)]
pub struct Contracts {
    pub market: ContractHandle,
    pub token: ContractHandle,
    pub oracle: ContractHandle,
    pub redemption: ContractHandle,
    pub resolution: ContractHandle,
    pub shareholders: ContractHandle,
    pub usdc: ContractHandle,
    pub voting: ContractHandle,
}

impl Contracts {
    /// Fails with `MissingContracts` listing every absent role.
    pub fn from_partial(mut partial: PartialContracts) -> Result<Self> {
        let missing: Vec<ContractRole> = ContractRole::all()
            .iter()
            .copied()
            .filter(|role| !partial.contains_key(role))
            .collect();
        if !missing.is_empty() {
            return Err(ChainrunError::MissingContracts(missing));
        }
        Ok(Self {
            market: take(&mut partial, ContractRole::Market)?,
            token: take(&mut partial, ContractRole::Token)?,
            oracle: take(&mut partial, ContractRole::Oracle)?,
            redemption: take(&mut partial, ContractRole::Redemption)?,
            resolution: take(&mut partial, ContractRole::Resolution)?,
            shareholders: take(&mut partial, ContractRole::Shareholders)?,
            usdc: take(&mut partial, ContractRole::Usdc)?,
            voting: take(&mut partial, ContractRole::Voting)?,
        })
    }

    pub fn get(&self, role: ContractRole) -> &ContractHandle {
        match role {
            ContractRole::Market => &self.market,
            ContractRole::Token => &self.token,
            ContractRole::Oracle => &self.oracle,
            ContractRole::Redemption => &self.redemption,
            ContractRole::Resolution => &self.resolution,
            ContractRole::Shareholders => &self.shareholders,
            ContractRole::Usdc => &self.usdc,
            ContractRole::Voting => &self.voting,
        }
    }

    pub fn address(&self, role: ContractRole) -> &Address {
        &self.get(role).address
    }
}

fn take(partial: &mut PartialContracts, role: ContractRole) -> Result<ContractHandle> {
    partial
        .remove(&role)
        .ok_or_else(|| ChainrunError::MissingContracts(vec![role]))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn full_partial() -> PartialContracts {
        ContractRole::all()
            .iter()
            .map(|&role| {
                (
                    role,
                    ContractHandle::new(role, Address::new(format!("0x{role}"))),
                )
            })
            .collect()
    }

    #[test]
    fn completeness_gate_accepts_full_set() {
        let contracts = Contracts::from_partial(full_partial()).unwrap();
        assert_eq!(contracts.voting.address, Address::from("0xVoting"));
        assert_eq!(
            contracts.address(ContractRole::Oracle),
            &Address::from("0xOracle")
        );
    }

    #[test]
    fn completeness_gate_lists_all_missing_roles() {
        let mut partial = full_partial();
        partial.remove(&ContractRole::Oracle);
        partial.remove(&ContractRole::Voting);
        match Contracts::from_partial(partial) {
            Err(ChainrunError::MissingContracts(missing)) => {
                assert_eq!(missing, vec![ContractRole::Oracle, ContractRole::Voting]);
            }
            other => panic!("expected MissingContracts, got {other:?}"),
        }
    }

    #[test]
    fn empty_partial_reports_every_role() {
        match Contracts::from_partial(PartialContracts::new()) {
            Err(ChainrunError::MissingContracts(missing)) => {
                assert_eq!(missing.len(), ContractRole::all().len());
            }
            other => panic!("expected MissingContracts, got {other:?}"),
        }
    }
}
