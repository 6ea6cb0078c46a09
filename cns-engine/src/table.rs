//! Typed tables over fjall partitions
//!
//! Rows are stored as JSON under their id. Index tables map a unique value
//! (username, email) to a row id, or hold composite `owner/child` keys with an
//! empty value for one-to-many lookups.

use cns_core::*;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::de::DeserializeOwned;

use crate::storage_error;

/// Separator of composite index keys. Entity ids never contain it.
pub const KEY_SEPARATOR: u8 = b'/';

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKind {
    Users,
    UsersByName,
    Managers,
    ManagersByEmail,
    Associations,
    AssociationsByManager,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::Users,
        TableKind::UsersByName,
        TableKind::Managers,
        TableKind::ManagersByEmail,
        TableKind::Associations,
        TableKind::AssociationsByManager,
    ];

    /// Partition name on disk
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Users => "users",
            TableKind::UsersByName => "users_by_name",
            TableKind::Managers => "managers",
            TableKind::ManagersByEmail => "managers_by_email",
            TableKind::Associations => "associations",
            TableKind::AssociationsByManager => "associations_by_manager",
        }
    }
}

/// One partition of the keyspace
pub struct Table {
    kind: TableKind,
    partition: PartitionHandle,
}

impl Table {
    fn open(keyspace: &Keyspace, kind: TableKind) -> Result<Self> {
        let partition = keyspace
            .open_partition(kind.name(), PartitionCreateOptions::default())
            .map_err(storage_error)?;
        Ok(Table { kind, partition })
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub(crate) fn partition(&self) -> &PartitionHandle {
        &self.partition
    }

    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.partition.get(key) {
            Ok(Some(value)) => Ok(Some(value.to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_error(e)),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All entries whose key starts with `prefix`, in key order
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.partition
            .prefix(prefix)
            .map(|item| {
                item.map(|(k, v)| (k.to_vec(), v.to_vec()))
                    .map_err(|e| CnsError::Storage(format!("scan of {} failed: {}", self.kind.name(), e)))
            })
            .collect()
    }

    pub fn count_prefix(&self, prefix: &[u8]) -> Result<u64> {
        let mut count = 0;
        for item in self.partition.prefix(prefix) {
            item.map_err(storage_error)?;
            count += 1;
        }
        Ok(count)
    }

    /// Decode every row of the table
    pub fn values<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.scan_prefix(&[])?
            .into_iter()
            .map(|(_, v)| serde_json::from_slice(&v).map_err(CnsError::from))
            .collect()
    }
}

/// All tables of the store, opened once per engine
pub struct Tables {
    tables: Vec<Table>,
}

impl Tables {
    pub(crate) fn open(keyspace: &Keyspace) -> Result<Self> {
        let tables = TableKind::ALL
            .iter()
            .map(|kind| Table::open(keyspace, *kind))
            .collect::<Result<Vec<_>>>()?;
        Ok(Tables { tables })
    }

    pub fn get(&self, kind: TableKind) -> &Table {
        // opened in `TableKind::ALL` order
        &self.tables[kind as usize]
    }
}

/// Composite index key `owner/child`
pub fn composite_key(owner: &str, child: &str) -> Vec<u8> {
    let mut key = owner_prefix(owner);
    key.extend_from_slice(child.as_bytes());
    key
}

/// Prefix selecting every composite key of `owner`
pub fn owner_prefix(owner: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(owner.len() + 1);
    key.extend_from_slice(owner.as_bytes());
    key.push(KEY_SEPARATOR);
    key
}

/// Child part of a composite key
pub fn child_of(key: &[u8]) -> Option<&str> {
    let pos = key.iter().position(|b| *b == KEY_SEPARATOR)?;
    std::str::from_utf8(&key[pos + 1..]).ok()
}
