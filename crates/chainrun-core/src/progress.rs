use crate::error::{ChainrunError, Result};
use crate::io::atomic_write;
use crate::paths;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// ProgressStore
// ---------------------------------------------------------------------------

/// Durable cursor: index of the next sequence step to execute, per chain.
///
/// 0 means nothing has been committed yet. The cursor is the sole resumption
/// mechanism; it advances after every committed (or force-skipped) step and
/// is never decremented except by an explicit restart request.
pub trait ProgressStore: Send + Sync {
    /// Read the cursor, defaulting to 0 when no artifact exists. Any other
    /// I/O failure is fatal — the orchestrator never guesses a cursor.
    fn read(&self, chain_id: u64) -> Result<u64>;

    fn write(&self, chain_id: u64, cursor: u64) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileProgressStore
// ---------------------------------------------------------------------------

/// One `deployments/<chain>.nextstep` file per chain holding a decimal index.
pub struct FileProgressStore {
    root: PathBuf,
}

impl FileProgressStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, chain_id: u64) -> PathBuf {
        paths::progress_path(&self.root, chain_id)
    }
}

impl ProgressStore for FileProgressStore {
    fn read(&self, chain_id: u64) -> Result<u64> {
        let path = self.path(chain_id);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        data.trim()
            .parse::<u64>()
            .map_err(|e| ChainrunError::InvalidCursor {
                path,
                reason: e.to_string(),
            })
    }

    fn write(&self, chain_id: u64, cursor: u64) -> Result<()> {
        atomic_write(&self.path(chain_id), cursor.to_string().as_bytes())
    }
}

// ---------------------------------------------------------------------------
// MemoryProgressStore
// ---------------------------------------------------------------------------

/// Process-local cursor map; intentionally lost on process exit.
#[derive(Default)]
pub struct MemoryProgressStore {
    cursors: Mutex<HashMap<u64, u64>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn read(&self, chain_id: u64) -> Result<u64> {
        let cursors = self.cursors.lock().expect("progress mutex poisoned");
        Ok(cursors.get(&chain_id).copied().unwrap_or(0))
    }

    fn write(&self, chain_id: u64, cursor: u64) -> Result<()> {
        let mut cursors = self.cursors.lock().expect("progress mutex poisoned");
        cursors.insert(chain_id, cursor);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn absent_artifact_reads_zero() {
        let dir = TempDir::new().unwrap();
        let store = FileProgressStore::new(dir.path());
        assert_eq!(store.read(31337).unwrap(), 0);
    }

    #[test]
    fn cursor_roundtrip_across_instances() {
        let dir = TempDir::new().unwrap();
        FileProgressStore::new(dir.path()).write(31337, 12).unwrap();
        assert_eq!(FileProgressStore::new(dir.path()).read(31337).unwrap(), 12);
    }

    #[test]
    fn cursor_is_plain_decimal() {
        let dir = TempDir::new().unwrap();
        let store = FileProgressStore::new(dir.path());
        store.write(5, 3).unwrap();
        let raw = std::fs::read_to_string(paths::progress_path(dir.path(), 5)).unwrap();
        assert_eq!(raw, "3");
    }

    #[test]
    fn corrupt_cursor_is_fatal() {
        let dir = TempDir::new().unwrap();
        atomic_write(&paths::progress_path(dir.path(), 9), b"twelve").unwrap();
        let store = FileProgressStore::new(dir.path());
        assert!(matches!(
            store.read(9),
            Err(ChainrunError::InvalidCursor { .. })
        ));
    }

    #[test]
    fn chains_have_independent_cursors() {
        let dir = TempDir::new().unwrap();
        let store = FileProgressStore::new(dir.path());
        store.write(1, 7).unwrap();
        assert_eq!(store.read(1).unwrap(), 7);
        assert_eq!(store.read(2).unwrap(), 0);
    }

    #[test]
    fn memory_store_defaults_to_zero() {
        let store = MemoryProgressStore::new();
        assert_eq!(store.read(1).unwrap(), 0);
        store.write(1, 4).unwrap();
        assert_eq!(store.read(1).unwrap(), 4);
        assert_eq!(store.read(2).unwrap(), 0);
    }
}
