use crate::types::{Address, ContractRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A state-changing call against an already-deployed contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub target: Address,
    pub method: String,
    pub args: Vec<Value>,
}

impl Operation {
    pub fn call(target: Address, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            target,
            method: method.into(),
            args,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}/{}", self.target, self.method, self.args.len())
    }
}

/// Handle to an operation acknowledged by the network but not yet confirmed.
#[derive(Debug, Clone)]
pub struct PendingTx {
    pub id: Uuid,
    /// Human-readable description of what was submitted.
    pub label: String,
}

/// Confirmation result for a pending operation.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub block_number: u64,
    pub block_hash: String,
    /// Set for instance-creation operations only.
    pub contract_address: Option<Address>,
}

// ---------------------------------------------------------------------------
// DeployClient
// ---------------------------------------------------------------------------

/// The transaction-signing and network-submission collaborator.
///
/// Implementations own nonce management and encoding; the orchestrator only
/// sequences calls and waits on confirmations. Errors surface as
/// `anyhow::Error` and are wrapped at the orchestrator boundary.
#[async_trait]
pub trait DeployClient: Send + Sync {
    /// Submit a call operation, returning once the network acknowledged it.
    async fn submit(&self, op: Operation) -> anyhow::Result<PendingTx>;

    /// Wait until `confirmations` blocks have built on the transaction.
    async fn await_confirmations(
        &self,
        tx: &PendingTx,
        confirmations: u64,
    ) -> anyhow::Result<Receipt>;

    /// Submit a creation operation for a new instance of `role`'s template.
    /// With `proxy` set, the instance goes behind an upgradeable proxy and
    /// `args` feed its initializer instead of a constructor.
    async fn create_instance(
        &self,
        role: ContractRole,
        args: Vec<Value>,
        proxy: bool,
    ) -> anyhow::Result<PendingTx>;
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

/// Optional source-verification collaborator (e.g. a block explorer API).
/// Verification failures are logged by the orchestrator, never fatal.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        address: &Address,
        role: ContractRole,
        args: &[Value],
    ) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operation_display_names_target_and_method() {
        let op = Operation::call(
            Address::from("0xvoting"),
            "grantRole",
            vec![json!("OPERATOR_ROLE"), json!("0xdeployer")],
        );
        assert_eq!(op.to_string(), "0xvoting.grantRole/2");
    }
}
