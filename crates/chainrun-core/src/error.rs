use crate::types::ContractRole;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainrunError {
    #[error("missing contracts: {}", format_roles(.0))]
    MissingContracts(Vec<ContractRole>),

    #[error("step {}/{} '{}' failed: {}", .index + 1, .total, .name, .source)]
    StepFailed {
        index: usize,
        total: usize,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("deploy client error: {0}")]
    Client(#[source] anyhow::Error),

    #[error("no registry entry for {role} on chain {chain_id}")]
    ContractNotFound { role: ContractRole, chain_id: u64 },

    #[error("invalid contract role: {0}")]
    InvalidRole(String),

    #[error("invalid progress cursor in {}: {reason}", .path.display())]
    InvalidCursor { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn format_roles(roles: &[ContractRole]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ChainrunError>;
