use crate::progress::{FileProgressStore, MemoryProgressStore, ProgressStore};
use crate::registry::{ContractRegistry, FileRegistry, MemoryRegistry};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Where a running orchestrator keeps its cursor and its registry.
///
/// Exactly two realizations exist, selected by dependency injection: a
/// durable one for real networks and an in-memory one for deterministic
/// tests and local simulation. The in-memory backend's defining property is
/// that nothing survives the process.
pub trait Environment: Send + Sync {
    fn progress(&self) -> &dyn ProgressStore;
    fn registry(&self) -> &dyn ContractRegistry;
}

// ---------------------------------------------------------------------------
// FsEnvironment
// ---------------------------------------------------------------------------

/// Durable backend: cursor and registry live under `<root>/deployments/`.
///
/// With `persist_registry` off the cursor stays durable but the registry
/// half is held in memory, mirroring the original tooling where progress was
/// always checkpointed while writing the network document was opt-in.
pub struct FsEnvironment {
    progress: FileProgressStore,
    registry: Box<dyn ContractRegistry>,
}

impl FsEnvironment {
    pub fn new(root: impl Into<PathBuf>, chain_id: u64, persist_registry: bool) -> Self {
        let root = root.into();
        let registry: Box<dyn ContractRegistry> = if persist_registry {
            Box::new(FileRegistry::new(&root, chain_id))
        } else {
            Box::new(MemoryRegistry::new())
        };
        Self {
            progress: FileProgressStore::new(root),
            registry,
        }
    }
}

impl Environment for FsEnvironment {
    fn progress(&self) -> &dyn ProgressStore {
        &self.progress
    }

    fn registry(&self) -> &dyn ContractRegistry {
        &*self.registry
    }
}

// ---------------------------------------------------------------------------
// MemoryEnvironment
// ---------------------------------------------------------------------------

/// In-memory backend: no cross-process persistence by design.
#[derive(Default)]
pub struct MemoryEnvironment {
    progress: MemoryProgressStore,
    registry: MemoryRegistry,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Environment for MemoryEnvironment {
    fn progress(&self) -> &dyn ProgressStore {
        &self.progress
    }

    fn registry(&self) -> &dyn ContractRegistry {
        &self.registry
    }
}
