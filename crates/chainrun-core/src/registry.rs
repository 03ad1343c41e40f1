use crate::error::Result;
use crate::io::atomic_write;
use crate::paths;
use crate::types::{Address, ContractRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// RegistryEntry
// ---------------------------------------------------------------------------

/// One registered component: address plus deployment provenance.
///
/// Provenance is present only when the durable backend recorded a
/// confirmation receipt; the in-memory backend leaves it unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
}

impl RegistryEntry {
    pub fn bare(address: Address) -> Self {
        Self {
            address,
            block_number: None,
            block_hash: None,
            deployed_at: None,
        }
    }
}

/// The registry document shape: role -> entry.
pub type RegistryDocument = BTreeMap<ContractRole, RegistryEntry>;

// ---------------------------------------------------------------------------
// ContractRegistry
// ---------------------------------------------------------------------------

/// Directory of deployed component addresses, scoped to one chain.
///
/// A role maps to at most one active address; `put` overwrites, never
/// appends, and nothing in this subsystem deletes entries.
pub trait ContractRegistry: Send + Sync {
    fn put(&self, role: ContractRole, entry: RegistryEntry) -> Result<()>;
    fn get(&self, role: ContractRole) -> Result<Option<RegistryEntry>>;
    fn all(&self) -> Result<RegistryDocument>;
}

// ---------------------------------------------------------------------------
// FileRegistry
// ---------------------------------------------------------------------------

/// Durable registry: one JSON document per chain under `deployments/`.
///
/// A missing document reads as the empty registry. Any other I/O or decode
/// failure is fatal and propagated.
pub struct FileRegistry {
    root: PathBuf,
    chain_id: u64,
}

impl FileRegistry {
    pub fn new(root: impl Into<PathBuf>, chain_id: u64) -> Self {
        Self {
            root: root.into(),
            chain_id,
        }
    }

    fn path(&self) -> PathBuf {
        paths::registry_path(&self.root, self.chain_id)
    }

    fn load(&self) -> Result<RegistryDocument> {
        load_document(&self.path())
    }
}

fn load_document(path: &Path) -> Result<RegistryDocument> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RegistryDocument::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&data)?)
}

impl ContractRegistry for FileRegistry {
    fn put(&self, role: ContractRole, entry: RegistryEntry) -> Result<()> {
        let mut doc = self.load()?;
        doc.insert(role, entry);
        let data = serde_json::to_vec_pretty(&doc)?;
        atomic_write(&self.path(), &data)
    }

    fn get(&self, role: ContractRole) -> Result<Option<RegistryEntry>> {
        Ok(self.load()?.remove(&role))
    }

    fn all(&self) -> Result<RegistryDocument> {
        self.load()
    }
}

// ---------------------------------------------------------------------------
// MemoryRegistry
// ---------------------------------------------------------------------------

/// Process-local registry; never persists across process boundaries by
/// design, which is what makes it safe for repeated isolated test runs.
#[derive(Default)]
pub struct MemoryRegistry {
    inner: Mutex<RegistryDocument>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContractRegistry for MemoryRegistry {
    fn put(&self, role: ContractRole, entry: RegistryEntry) -> Result<()> {
        let mut doc = self.inner.lock().expect("registry mutex poisoned");
        doc.insert(role, entry);
        Ok(())
    }

    fn get(&self, role: ContractRole) -> Result<Option<RegistryEntry>> {
        let doc = self.inner.lock().expect("registry mutex poisoned");
        Ok(doc.get(&role).cloned())
    }

    fn all(&self) -> Result<RegistryDocument> {
        let doc = self.inner.lock().expect("registry mutex poisoned");
        Ok(doc.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(addr: &str) -> RegistryEntry {
        RegistryEntry {
            address: Address::from(addr),
            block_number: Some(42),
            block_hash: Some("0xblock".to_string()),
            deployed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn missing_document_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path(), 31337);
        assert!(registry.all().unwrap().is_empty());
        assert!(registry.get(ContractRole::Token).unwrap().is_none());
    }

    #[test]
    fn file_registry_roundtrip() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path(), 31337);
        registry.put(ContractRole::Token, entry("0xtoken")).unwrap();
        registry.put(ContractRole::Voting, entry("0xvote")).unwrap();

        let reopened = FileRegistry::new(dir.path(), 31337);
        let all = reopened.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&ContractRole::Token].address, Address::from("0xtoken"));
        assert_eq!(all[&ContractRole::Token].block_number, Some(42));
    }

    #[test]
    fn put_overwrites_same_role() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path(), 1);
        registry.put(ContractRole::Oracle, entry("0xold")).unwrap();
        registry.put(ContractRole::Oracle, entry("0xnew")).unwrap();
        let all = registry.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[&ContractRole::Oracle].address, Address::from("0xnew"));
    }

    #[test]
    fn corrupt_document_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = paths::registry_path(dir.path(), 7);
        crate::io::atomic_write(&path, b"not json").unwrap();
        let registry = FileRegistry::new(dir.path(), 7);
        assert!(registry.all().is_err());
    }

    #[test]
    fn chains_are_isolated() {
        let dir = TempDir::new().unwrap();
        let mainnet = FileRegistry::new(dir.path(), 1);
        let devnet = FileRegistry::new(dir.path(), 31337);
        mainnet.put(ContractRole::Token, entry("0xmain")).unwrap();
        assert!(devnet.get(ContractRole::Token).unwrap().is_none());
    }

    #[test]
    fn memory_registry_overwrites() {
        let registry = MemoryRegistry::new();
        registry
            .put(ContractRole::Market, RegistryEntry::bare(Address::from("0xa")))
            .unwrap();
        registry
            .put(ContractRole::Market, RegistryEntry::bare(Address::from("0xb")))
            .unwrap();
        assert_eq!(
            registry.get(ContractRole::Market).unwrap().unwrap().address,
            Address::from("0xb")
        );
    }

    #[test]
    fn document_uses_original_key_casing() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path(), 5);
        registry.put(ContractRole::Token, entry("0xtoken")).unwrap();
        let raw = std::fs::read_to_string(paths::registry_path(dir.path(), 5)).unwrap();
        assert!(raw.contains("\"Token\""));
        assert!(raw.contains("\"blockNumber\""));
        assert!(raw.contains("\"blockHash\""));
    }
}
