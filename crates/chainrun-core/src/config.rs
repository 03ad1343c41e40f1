use crate::types::Address;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Orchestrator configuration.
///
/// `chain_id` is the partition key for both the progress cursor and the
/// registry document and is fixed for the orchestrator's lifetime; mixing
/// networks within one instance is disallowed by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target network identifier.
    pub chain_id: u64,
    /// Signing identity submitting every operation.
    pub deployer: Address,
    /// Designated reserve account, wired into the market during deployment.
    pub reserve: Address,
    /// Trigger external source verification after each deploy.
    #[serde(default)]
    pub verify_contracts: bool,
    /// Persist the contract registry to the network document.
    #[serde(default)]
    pub persist_registry: bool,
    /// Log step-by-step progress.
    #[serde(default)]
    pub verbose: bool,
    /// Confirmations to wait for after each submission.
    #[serde(default = "default_wait_blocks")]
    pub wait_blocks: u64,
}

fn default_wait_blocks() -> u64 {
    1
}

impl Config {
    /// A config with default flags; the reserve defaults to the deployer,
    /// matching how a fresh deployment is usually bootstrapped.
    pub fn new(chain_id: u64, deployer: Address) -> Self {
        let reserve = deployer.clone();
        Self {
            chain_id,
            deployer,
            reserve,
            verify_contracts: false,
            persist_registry: false,
            verbose: false,
            wait_blocks: default_wait_blocks(),
        }
    }

    pub fn with_reserve(mut self, reserve: Address) -> Self {
        self.reserve = reserve;
        self
    }

    pub fn with_verify_contracts(mut self, verify: bool) -> Self {
        self.verify_contracts = verify;
        self
    }

    pub fn with_persist_registry(mut self, persist: bool) -> Self {
        self.persist_registry = persist;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_wait_blocks(mut self, blocks: u64) -> Self {
        self.wait_blocks = blocks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_off() {
        let config = Config::new(31337, Address::from("0xdeployer"));
        assert!(!config.verify_contracts);
        assert!(!config.persist_registry);
        assert!(!config.verbose);
        assert_eq!(config.wait_blocks, 1);
        assert_eq!(config.reserve, config.deployer);
    }

    #[test]
    fn missing_flags_deserialize_to_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"chain_id": 1, "deployer": "0xd", "reserve": "0xr"}"#,
        )
        .unwrap();
        assert_eq!(config.wait_blocks, 1);
        assert!(!config.verbose);
        assert_eq!(config.reserve, Address::from("0xr"));
    }
}
