//! Pluggable storage backends behind a single [`Storage`] trait: an
//! in-memory map, the same map fronted by an [`LruCache`], and a
//! file-backed map that persists to the binary layout described in the
//! module-level docs of [`file`].

mod file;
mod memory;
mod memory_lru;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use memory_lru::MemoryLruStorage;

use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// The capability set every storage backend exposes. Selected by
/// configuration through [`StorageKind`] rather than inheritance.
pub trait Storage: Send + Sync {
    /// Store `value` under `key`, overwriting any existing value.
    /// Returns `false` only for a catastrophic engine error; in-memory
    /// backends always return `true`.
    fn put(&self, key: &[u8], value: &[u8]) -> bool;

    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Remove `key`. Returns `true` iff the key existed.
    fn delete(&self, key: &[u8]) -> bool;

    /// A point-in-time snapshot of every entry. Ordering is unspecified.
    fn get_all_entries(&self) -> HashMap<Vec<u8>, Vec<u8>>;

    /// Flush to the backing file, if any. A no-op for purely in-memory
    /// backends.
    fn persist(&self) -> Result<()> {
        Ok(())
    }
}

/// Which storage backend to construct, and its parameters. Mirrors the
/// `storage_type`/`cache_capacity`/`storage_path` configuration fields.
#[derive(Debug, Clone)]
pub enum StorageKind {
    Memory,
    MemoryLru { cache_capacity: usize },
    File { path: String },
}

/// Construct the storage backend named by `kind`. This is the single
/// place that maps configuration onto a concrete [`Storage`]
/// implementation; callers never match on the kind again afterward.
pub fn build_storage(kind: &StorageKind) -> Result<Arc<dyn Storage>> {
    Ok(match kind {
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
        StorageKind::MemoryLru { cache_capacity } => {
            Arc::new(MemoryLruStorage::new(*cache_capacity))
        }
        StorageKind::File { path } => Arc::new(FileStorage::open(path)?),
    })
}
