//! Seeding the freshly deployed application with its initial participants.
//!
//! The contributor list is dynamic runtime data, so every entry here is
//! expandable: preprocessing snapshots the list and fans each entry out into
//! one concrete step per contributor. Expansion must stay deterministic for
//! a given list — resuming a partially seeded run with a changed list would
//! silently shift which step the cursor points at.

use crate::client::Operation;
use crate::contracts::PartialContracts;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::sequence::{expandable, ContextProvider, Sequence, Step};
use crate::types::{Address, ContractRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// One whole share, in the token's smallest unit.
pub const ONE_SHARE: &str = "1000000000000000000";

// ---------------------------------------------------------------------------
// Contributor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorStatus {
    Contributor,
    Board,
    Investor,
}

impl ContributorStatus {
    /// The status label as the shareholder registry contract names it.
    pub fn as_str(self) -> &'static str {
        match self {
            ContributorStatus::Contributor => "CONTRIBUTOR_STATUS",
            ContributorStatus::Board => "MANAGING_BOARD_STATUS",
            ContributorStatus::Investor => "INVESTOR_STATUS",
        }
    }
}

impl fmt::Display for ContributorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub address: Address,
    pub status: ContributorStatus,
    pub tokens: u128,
}

// ---------------------------------------------------------------------------
// SetupContext
// ---------------------------------------------------------------------------

pub struct SetupContext {
    pub orchestrator: Orchestrator,
    pub contracts: PartialContracts,
    pub contributors: Vec<Contributor>,
}

impl SetupContext {
    pub fn address(&self, role: ContractRole) -> anyhow::Result<Address> {
        self.contracts
            .get(&role)
            .map(|handle| handle.address.clone())
            .ok_or_else(|| anyhow::anyhow!("{role} not deployed yet"))
    }
}

/// Carries the externally supplied contributor list into every generated
/// context, unchanged for the lifetime of the provider.
pub struct SetupContextProvider {
    contributors: Vec<Contributor>,
}

impl SetupContextProvider {
    pub fn new(contributors: Vec<Contributor>) -> Self {
        Self { contributors }
    }
}

#[async_trait]
impl ContextProvider for SetupContextProvider {
    type Ctx = SetupContext;

    async fn generate(&self, orchestrator: &Orchestrator) -> Result<SetupContext> {
        Ok(SetupContext {
            contracts: orchestrator.load_contracts_partial()?,
            contributors: self.contributors.clone(),
            orchestrator: orchestrator.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// The sequence
// ---------------------------------------------------------------------------

pub fn setup_sequence() -> Sequence<SetupContext> {
    vec![
        // One share each
        expandable("mint one share per contributor", |c: &SetupContext| {
            c.contributors
                .iter()
                .map(|contributor| {
                    let addr = contributor.address.clone();
                    Step::new(format!("mint share to {addr}"), move |c: SetupContext| {
                        let addr = addr.clone();
                        async move {
                            let registry = c.address(ContractRole::Shareholders)?;
                            let op = Operation::call(
                                registry,
                                "mint",
                                vec![json!(addr), json!(ONE_SHARE)],
                            );
                            Ok(Some(c.orchestrator.submit(op).await?))
                        }
                    })
                })
                .collect()
        }),
        // Statuses
        expandable("set contributor statuses", |c: &SetupContext| {
            c.contributors
                .iter()
                .map(|contributor| {
                    let addr = contributor.address.clone();
                    let status = contributor.status;
                    Step::new(
                        format!("set {addr} to {status}"),
                        move |c: SetupContext| {
                            let addr = addr.clone();
                            async move {
                                let registry = c.address(ContractRole::Shareholders)?;
                                let op = Operation::call(
                                    registry,
                                    "setStatus",
                                    vec![json!(status.as_str()), json!(addr)],
                                );
                                Ok(Some(c.orchestrator.submit(op).await?))
                            }
                        },
                    )
                })
                .collect()
        }),
        // Governance tokens
        expandable("mint governance tokens", |c: &SetupContext| {
            c.contributors
                .iter()
                .map(|contributor| {
                    let addr = contributor.address.clone();
                    let tokens = contributor.tokens;
                    Step::new(
                        format!("mint {tokens} tokens to {addr}"),
                        move |c: SetupContext| {
                            let addr = addr.clone();
                            async move {
                                let token = c.address(ContractRole::Token)?;
                                let op = Operation::call(
                                    token,
                                    "mint",
                                    vec![json!(addr), json!(tokens.to_string())],
                                );
                                Ok(Some(c.orchestrator.submit(op).await?))
                            }
                        },
                    )
                })
                .collect()
        }),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::orchestrator::RunOptions;
    use crate::sim::SimulatedClient;
    use std::sync::Arc;

    fn contributors() -> Vec<Contributor> {
        vec![
            Contributor {
                address: Address::from("0xalice"),
                status: ContributorStatus::Contributor,
                tokens: 100,
            },
            Contributor {
                address: Address::from("0xbob"),
                status: ContributorStatus::Board,
                tokens: 50,
            },
            Contributor {
                address: Address::from("0xcarol"),
                status: ContributorStatus::Investor,
                tokens: 0,
            },
        ]
    }

    async fn seeded_orchestrator() -> Orchestrator {
        let config = Config::new(31337, Address::from("0xdeployer"));
        let orch = Orchestrator::in_memory(config, Arc::new(SimulatedClient::new(31337)));
        orch.deploy_proxy(ContractRole::Shareholders, vec![])
            .await
            .unwrap();
        orch.deploy_proxy(ContractRole::Token, vec![]).await.unwrap();
        orch
    }

    #[tokio::test]
    async fn seeding_fans_out_per_contributor() {
        let orch = seeded_orchestrator().await;
        let provider = SetupContextProvider::new(contributors());
        orch.run(&provider, setup_sequence(), RunOptions::default())
            .await
            .unwrap();
        // 3 expandables x 3 contributors.
        assert_eq!(orch.cursor().unwrap(), 9);
    }

    #[tokio::test]
    async fn empty_contributor_list_yields_an_empty_run() {
        let orch = seeded_orchestrator().await;
        let provider = SetupContextProvider::new(vec![]);
        orch.run(&provider, setup_sequence(), RunOptions::default())
            .await
            .unwrap();
        assert_eq!(orch.cursor().unwrap(), 0);
    }

    #[tokio::test]
    async fn seeding_requires_the_registry_contract() {
        let config = Config::new(31337, Address::from("0xdeployer"));
        let orch = Orchestrator::in_memory(config, Arc::new(SimulatedClient::new(31337)));
        let provider = SetupContextProvider::new(contributors());
        let err = orch
            .run(&provider, setup_sequence(), RunOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Shareholders"));
    }
}
