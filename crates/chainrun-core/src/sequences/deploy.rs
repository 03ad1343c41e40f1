//! The canned application deployment: create every component, seed the
//! oracle, grant permissions, and wire cross-references.
//!
//! Every entry is a plain declared step: the orchestrator's cursor decides
//! where a resumed run picks up, and the regenerated `DeployContext` lets
//! later entries reference addresses deployed by earlier ones.

use crate::client::Operation;
use crate::contracts::PartialContracts;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::sequence::{step, ContextProvider, Sequence, SequenceEntry};
use crate::types::{AccessRole, Address, ContractRole};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// DeployContext
// ---------------------------------------------------------------------------

pub struct DeployContext {
    pub orchestrator: Orchestrator,
    pub contracts: PartialContracts,
    pub deployer: Address,
    pub reserve: Address,
}

impl DeployContext {
    /// Address of an already-deployed role, failing the step otherwise.
    pub fn address(&self, role: ContractRole) -> anyhow::Result<Address> {
        self.contracts
            .get(&role)
            .map(|handle| handle.address.clone())
            .ok_or_else(|| anyhow::anyhow!("{role} not deployed yet"))
    }
}

pub struct DeployContextProvider;

#[async_trait]
impl ContextProvider for DeployContextProvider {
    type Ctx = DeployContext;

    async fn generate(&self, orchestrator: &Orchestrator) -> Result<DeployContext> {
        Ok(DeployContext {
            contracts: orchestrator.load_contracts_partial()?,
            deployer: orchestrator.config().deployer.clone(),
            reserve: orchestrator.config().reserve.clone(),
            orchestrator: orchestrator.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Step builders
// ---------------------------------------------------------------------------

fn deploy(role: ContractRole) -> SequenceEntry<DeployContext> {
    step(format!("deploy {role}"), move |c: DeployContext| async move {
        c.orchestrator.deploy(role, vec![]).await?;
        Ok(None)
    })
}

fn deploy_proxy<F>(role: ContractRole, args: F) -> SequenceEntry<DeployContext>
where
    F: Fn(&DeployContext) -> anyhow::Result<Vec<Value>> + Send + Sync + 'static,
{
    step(
        format!("deploy proxy {role}"),
        move |c: DeployContext| {
            let args = args(&c);
            async move {
                c.orchestrator.deploy_proxy(role, args?).await?;
                Ok(None)
            }
        },
    )
}

fn call<F>(target: ContractRole, method: &'static str, args: F) -> SequenceEntry<DeployContext>
where
    F: Fn(&DeployContext) -> anyhow::Result<Vec<Value>> + Send + Sync + 'static,
{
    step(format!("{target}.{method}"), move |c: DeployContext| {
        let prepared = c.address(target).and_then(|addr| Ok((addr, args(&c)?)));
        async move {
            let (addr, args) = prepared?;
            let tx = c
                .orchestrator
                .submit(Operation::call(addr, method, args))
                .await?;
            Ok(Some(tx))
        }
    })
}

#[derive(Debug, Clone, Copy)]
enum Grantee {
    Deployer,
    Contract(ContractRole),
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grantee::Deployer => f.write_str("deployer"),
            Grantee::Contract(role) => write!(f, "{role}"),
        }
    }
}

fn grant(target: ContractRole, access: AccessRole, grantee: Grantee) -> SequenceEntry<DeployContext> {
    step(
        format!("{target}.grantRole({access}, {grantee})"),
        move |c: DeployContext| {
            let prepared = c.address(target).and_then(|addr| {
                let who = match grantee {
                    Grantee::Deployer => c.deployer.clone(),
                    Grantee::Contract(role) => c.address(role)?,
                };
                Ok((addr, who))
            });
            async move {
                let (addr, who) = prepared?;
                let op = Operation::call(
                    addr,
                    "grantRole",
                    vec![json!(access.as_str()), json!(who)],
                );
                let tx = c.orchestrator.submit(op).await?;
                Ok(Some(tx))
            }
        },
    )
}

// ---------------------------------------------------------------------------
// The sequence
// ---------------------------------------------------------------------------

pub fn deploy_sequence() -> Sequence<DeployContext> {
    use AccessRole as A;
    use ContractRole::*;
    use Grantee::{Contract, Deployer};

    vec![
        // Deploy contracts
        deploy(Usdc),
        deploy(Oracle),
        deploy_proxy(Voting, |_| Ok(vec![])),
        deploy_proxy(Token, |_| Ok(vec![json!("Governance Token"), json!("GOV")])),
        deploy_proxy(Redemption, |_| Ok(vec![])),
        deploy_proxy(Market, |c| Ok(vec![json!(c.address(Token)?)])),
        deploy_proxy(Shareholders, |_| {
            Ok(vec![json!("Governance Share"), json!("GSH")])
        }),
        deploy_proxy(Resolution, |c| {
            Ok(vec![
                json!(c.address(Shareholders)?),
                json!(c.address(Token)?),
                json!(c.address(Voting)?),
            ])
        }),
        // Seed the oracle
        call(Oracle, "relay", |_| {
            Ok(vec![json!(["eur", "usd"]), json!([1, 1]), json!([1, 1])])
        }),
        call(Oracle, "relay", |_| {
            Ok(vec![json!(["usdc", "usd"]), json!([1, 1]), json!([1, 1])])
        }),
        // Grant permissions
        grant(Resolution, A::Operator, Deployer),
        grant(Resolution, A::Resolution, Deployer),
        grant(Resolution, A::Resolution, Contract(Resolution)),
        grant(Shareholders, A::Operator, Deployer),
        grant(Shareholders, A::Resolution, Deployer),
        grant(Shareholders, A::Resolution, Contract(Resolution)),
        grant(Voting, A::ShareholderRegistry, Contract(Shareholders)),
        grant(Voting, A::Operator, Deployer),
        grant(Voting, A::Resolution, Deployer),
        grant(Voting, A::Resolution, Contract(Resolution)),
        grant(Token, A::Operator, Deployer),
        grant(Token, A::Resolution, Deployer),
        grant(Token, A::Resolution, Contract(Resolution)),
        grant(Market, A::Resolution, Deployer),
        grant(Market, A::Resolution, Contract(Resolution)),
        grant(Redemption, A::TokenManager, Contract(Token)),
        grant(Redemption, A::TokenManager, Contract(Market)),
        // Wire cross-references
        call(Shareholders, "setVoting", |c| Ok(vec![json!(c.address(Voting)?)])),
        call(Voting, "setShareholderRegistry", |c| {
            Ok(vec![json!(c.address(Shareholders)?)])
        }),
        call(Voting, "setToken", |c| Ok(vec![json!(c.address(Token)?)])),
        call(Token, "setVoting", |c| Ok(vec![json!(c.address(Voting)?)])),
        call(Token, "setInternalMarket", |c| Ok(vec![json!(c.address(Market)?)])),
        call(Token, "setRedemptionController", |c| {
            Ok(vec![json!(c.address(Redemption)?)])
        }),
        call(Token, "setShareholderRegistry", |c| {
            Ok(vec![json!(c.address(Shareholders)?)])
        }),
        call(Market, "setRedemptionController", |c| {
            Ok(vec![json!(c.address(Redemption)?)])
        }),
        call(Market, "setExchangePair", |c| {
            Ok(vec![json!(c.address(Usdc)?), json!(c.address(Oracle)?)])
        }),
        call(Market, "setReserve", |c| Ok(vec![json!(c.reserve)])),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
