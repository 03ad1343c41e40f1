use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Artifact layout
// ---------------------------------------------------------------------------

/// Directory holding every per-network durable artifact.
pub const DEPLOYMENTS_DIR: &str = "deployments";

/// Suffix of the progress cursor artifact (`<chain>.nextstep`).
pub const PROGRESS_SUFFIX: &str = "nextstep";

/// Suffix of the contract registry document (`<chain>.network.json`).
pub const REGISTRY_SUFFIX: &str = "network.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn deployments_dir(root: &Path) -> PathBuf {
    root.join(DEPLOYMENTS_DIR)
}

/// Progress cursor file for a chain: decimal index of the next step to run.
pub fn progress_path(root: &Path, chain_id: u64) -> PathBuf {
    deployments_dir(root).join(format!("{chain_id}.{PROGRESS_SUFFIX}"))
}

/// Registry document for a chain: role -> address + provenance.
pub fn registry_path(root: &Path, chain_id: u64) -> PathBuf {
    deployments_dir(root).join(format!("{chain_id}.{REGISTRY_SUFFIX}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
