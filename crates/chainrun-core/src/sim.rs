use crate::client::{DeployClient, Operation, PendingTx, Receipt};
use crate::types::{Address, ContractRole};
use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SimulatedClient
// ---------------------------------------------------------------------------

/// An in-process stand-in for the real submission client.
///
/// Addresses and block hashes are derived from the chain id and a
/// monotonically increasing nonce, so a given call order always produces the
/// same ledger state. Pairs with `MemoryEnvironment` for isolated test runs
/// and local simulation; unlike the durable artifacts, the simulated ledger
/// lives as long as the client value does, which lets tests share one
/// "network" across several orchestrator instances.
pub struct SimulatedClient {
    chain_id: u64,
    state: Mutex<SimState>,
}

#[derive(Default)]
struct SimState {
    nonce: u64,
    block: u64,
    /// Pending id -> contract address (creation ops only).
    pending: HashMap<Uuid, Option<Address>>,
}

impl SimulatedClient {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            state: Mutex::new(SimState::default()),
        }
    }

    fn derive_address(&self, nonce: u64) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(self.chain_id.to_be_bytes());
        hasher.update(nonce.to_be_bytes());
        let digest = hex::encode(hasher.finalize());
        Address::new(format!("0x{}", &digest[..40]))
    }

    fn derive_block_hash(&self, height: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"block");
        hasher.update(self.chain_id.to_be_bytes());
        hasher.update(height.to_be_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }
}

#[async_trait]
impl DeployClient for SimulatedClient {
    async fn submit(&self, op: Operation) -> anyhow::Result<PendingTx> {
        let mut state = self.state.lock().expect("sim mutex poisoned");
        state.nonce += 1;
        let tx = PendingTx {
            id: Uuid::new_v4(),
            label: op.to_string(),
        };
        state.pending.insert(tx.id, None);
        Ok(tx)
    }

    async fn await_confirmations(
        &self,
        tx: &PendingTx,
        confirmations: u64,
    ) -> anyhow::Result<Receipt> {
        let mut state = self.state.lock().expect("sim mutex poisoned");
        let contract_address = state
            .pending
            .get(&tx.id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown pending tx: {}", tx.label))?;
        state.block += confirmations.max(1);
        let height = state.block;
        Ok(Receipt {
            block_number: height,
            block_hash: self.derive_block_hash(height),
            contract_address,
        })
    }

    async fn create_instance(
        &self,
        role: ContractRole,
        _args: Vec<Value>,
        proxy: bool,
    ) -> anyhow::Result<PendingTx> {
        let mut state = self.state.lock().expect("sim mutex poisoned");
        state.nonce += 1;
        let address = self.derive_address(state.nonce);
        let tx = PendingTx {
            id: Uuid::new_v4(),
            label: if proxy {
                format!("create proxy {role}")
            } else {
                format!("create {role}")
            },
        };
        state.pending.insert(tx.id, Some(address));
        Ok(tx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn identical_call_order_yields_identical_addresses() {
        let a = SimulatedClient::new(1);
        let b = SimulatedClient::new(1);
        for client in [&a, &b] {
            let tx = client
                .create_instance(ContractRole::Oracle, vec![], false)
                .await
                .unwrap();
            let receipt = client.await_confirmations(&tx, 1).await.unwrap();
            assert!(receipt.contract_address.is_some());
        }
        let tx_a = a
            .create_instance(ContractRole::Voting, vec![], true)
            .await
            .unwrap();
        let tx_b = b
            .create_instance(ContractRole::Voting, vec![], true)
            .await
            .unwrap();
        let addr_a = a.await_confirmations(&tx_a, 1).await.unwrap().contract_address;
        let addr_b = b.await_confirmations(&tx_b, 1).await.unwrap().contract_address;
        assert_eq!(addr_a, addr_b);
    }

    #[tokio::test]
    async fn chains_produce_distinct_addresses() {
        let a = SimulatedClient::new(1);
        let b = SimulatedClient::new(2);
        let tx_a = a
            .create_instance(ContractRole::Token, vec![], false)
            .await
            .unwrap();
        let tx_b = b
            .create_instance(ContractRole::Token, vec![], false)
            .await
            .unwrap();
        assert_ne!(
            a.await_confirmations(&tx_a, 1).await.unwrap().contract_address,
            b.await_confirmations(&tx_b, 1).await.unwrap().contract_address
        );
    }

    #[tokio::test]
    async fn call_receipts_carry_no_contract_address() {
        let client = SimulatedClient::new(1);
        let tx = client
            .submit(Operation::call(
                Address::from("0xtarget"),
                "setReserve",
                vec![json!("0xreserve")],
            ))
            .await
            .unwrap();
        let receipt = client.await_confirmations(&tx, 2).await.unwrap();
        assert!(receipt.contract_address.is_none());
        assert!(receipt.block_number >= 2);
    }

    #[tokio::test]
    async fn unknown_pending_tx_is_rejected() {
        let client = SimulatedClient::new(1);
        let stray = PendingTx {
            id: Uuid::new_v4(),
            label: "stray".to_string(),
        };
        assert!(client.await_confirmations(&stray, 1).await.is_err());
    }
}
