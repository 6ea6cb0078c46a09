//! Credential store for the CNS admin backend, built on a fjall keyspace
//!
//! Records live in one partition per table, with secondary-index partitions
//! for the unique and foreign-key lookups. Every write goes through a
//! [`StoreTxn`], which serializes writers and applies its changes as a single
//! atomic fjall batch on commit.

use cns_core::*;
use fjall::{Config, Keyspace, PersistMode};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

pub mod store;
pub mod table;
pub mod txn;

pub use store::*;
pub use txn::*;

use table::Tables;

pub(crate) fn storage_error(e: impl std::fmt::Display) -> CnsError {
    CnsError::Storage(e.to_string())
}

/// Storage engine wrapping the fjall keyspace and its table partitions
#[derive(Clone)]
pub struct StorageEngine {
    keyspace: Arc<Keyspace>,
    tables: Arc<Tables>,
    writer: Arc<Mutex<()>>,
}

impl StorageEngine {
    /// Open (or create) the store at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let keyspace = Config::new(path).open().map_err(storage_error)?;
        let tables = Tables::open(&keyspace)?;

        Ok(StorageEngine {
            keyspace: Arc::new(keyspace),
            tables: Arc::new(tables),
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Create temporary storage engine for testing
    #[cfg(any(test, feature = "test-utils"))]
    pub fn temp() -> Result<(Self, tempfile::TempDir)> {
        let temp_dir = tempfile::tempdir()?;
        let engine = Self::new(temp_dir.path())?;
        Ok((engine, temp_dir))
    }

    pub(crate) fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub(crate) fn tables(&self) -> &Tables {
        &self.tables
    }

    pub(crate) fn writer(&self) -> &Mutex<()> {
        &self.writer
    }

    /// Flush all committed writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(storage_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_engine_creation() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let store = Store::new(engine);
        assert!(store.users().unwrap().is_empty());
        assert!(store.managers().unwrap().is_empty());
        assert!(store.associations().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_committed_data() {
        let temp = tempfile::tempdir().unwrap();
        {
            let store = Store::new(StorageEngine::new(temp.path()).unwrap());
            store
                .insert_user(User::new("alice", "hash".into(), Role::Admin))
                .unwrap();
            store.engine().persist().unwrap();
        }
        let store = Store::new(StorageEngine::new(temp.path()).unwrap());
        let alice = store.user_by_username("alice").unwrap().unwrap();
        assert_eq!(alice.role, Role::Admin);
    }
}
