//! The navigation state machine.
//!
//! An [`Explorer`] owns the opened store, the current bucket path, and the
//! two per-session caches. Every read operation opens its own short-lived
//! snapshot and resolves the current path inside it, so each answer is a
//! point-in-time view of the whole store.
//!
//! Cached listings and counts are keyed by the serialized path and are
//! never invalidated: the session treats the file as a static snapshot,
//! so moving away from a path and back reuses the earlier read. That
//! staleness is deliberate and holds for the life of the session.

use std::collections::HashMap;
use std::path::Path;

use crate::core::decode::{FieldType, decode};
use crate::core::error::ExplorerError;
use crate::core::store::{BucketTotals, DbInfo, RawItem, Store};

/// Path segments joined for use as a cache key.
const PATH_DELIMITER: &str = ".";

/// One decoded key within a bucket. `value_string` is `None` exactly when
/// the key names a nested bucket rather than a leaf value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub field_type: FieldType,
    pub value: Vec<u8>,
    pub value_string: Option<String>,
}

impl Entry {
    pub fn is_bucket(&self) -> bool {
        self.field_type == FieldType::Bucket
    }

    fn from_raw(item: RawItem) -> Entry {
        match item {
            RawItem::Bucket { name } => Entry {
                name,
                field_type: FieldType::Bucket,
                value: Vec::new(),
                value_string: None,
            },
            RawItem::Leaf { name, value } => {
                let decoded = decode(&value);
                Entry {
                    name,
                    field_type: decoded.field_type,
                    value,
                    value_string: Some(decoded.text),
                }
            }
        }
    }
}

/// Session state for exploring one opened database.
///
/// Owned by the caller and passed explicitly; there is no shared global
/// instance anywhere in the crate.
pub struct Explorer {
    store: Store,
    path: Vec<String>,
    entry_cache: HashMap<String, Vec<Entry>>,
    count_cache: HashMap<String, u64>,
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("path", &self.path)
            .field("entry_cache", &self.entry_cache)
            .field("count_cache", &self.count_cache)
            .finish_non_exhaustive()
    }
}

impl Explorer {
    /// Opens `file` and starts a session at the root of its bucket tree.
    pub fn open(file: impl AsRef<Path>) -> Result<Explorer, ExplorerError> {
        Ok(Explorer {
            store: Store::open(file)?,
            path: Vec::new(),
            entry_cache: HashMap::new(),
            count_cache: HashMap::new(),
        })
    }

    /// Releases the store handle. Idempotent; also runs when the explorer
    /// is dropped.
    pub fn close(&mut self) {
        self.store.close();
    }

    pub fn at_root(&self) -> bool {
        self.path.is_empty()
    }

    /// The current position as bucket-name segments, root first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The serialized form of the current path, used as the cache key.
    pub fn path_key(&self) -> String {
        self.path.join(PATH_DELIMITER)
    }

    /// All entries of the current bucket in on-disk key order, decoded.
    ///
    /// The first listing per path reads the store; every later call for
    /// the same path returns the cached sequence untouched.
    pub fn list_entries(&mut self) -> Result<&[Entry], ExplorerError> {
        let key = self.path_key();
        if !self.entry_cache.contains_key(&key) {
            let entries = {
                let snapshot = self.store.snapshot()?;
                match snapshot.resolve(&self.path) {
                    Ok(container) => container
                        .items()
                        .into_iter()
                        .map(Entry::from_raw)
                        .collect(),
                    // A validated path that stopped resolving means the file
                    // changed underneath us; report the bucket as empty.
                    Err(ExplorerError::BucketNotFound(_)) => Vec::new(),
                    Err(other) => return Err(other),
                }
            };
            self.entry_cache.insert(key.clone(), entries);
        }
        Ok(&self.entry_cache[&key])
    }

    /// Number of keys in the current bucket, counted by full iteration
    /// and cached per path like the listings are.
    pub fn key_count(&mut self) -> Result<u64, ExplorerError> {
        let key = self.path_key();
        if let Some(&count) = self.count_cache.get(&key) {
            return Ok(count);
        }

        let snapshot = self.store.snapshot()?;
        let count = match snapshot.resolve(&self.path) {
            Ok(container) => container.count(),
            Err(ExplorerError::BucketNotFound(_)) => 0,
            Err(other) => return Err(other),
        };
        self.count_cache.insert(key, count);
        Ok(count)
    }

    /// Decoded value of `key` in the current bucket. Missing keys, keys
    /// naming nested buckets, and keys without a scalar payload all read
    /// as `"nil"` rather than an error.
    pub fn get_value(&self, key: &str) -> Result<String, ExplorerError> {
        let key = key.trim();
        let snapshot = self.store.snapshot()?;
        let container = match snapshot.resolve(&self.path) {
            Ok(container) => container,
            Err(ExplorerError::BucketNotFound(_)) => return Ok("nil".to_string()),
            Err(other) => return Err(other),
        };
        Ok(match container.item(key) {
            Some(RawItem::Leaf { value, .. }) => decode(&value).text,
            Some(RawItem::Bucket { .. }) | None => "nil".to_string(),
        })
    }

    /// Moves into a direct child bucket of the current position.
    ///
    /// Only an exact key match counts, and the matched key must be a
    /// bucket. On any failure the path is left unchanged.
    pub fn enter(&mut self, name: &str) -> Result<(), ExplorerError> {
        let name = name.trim();
        let snapshot = self.store.snapshot()?;
        let container = snapshot.resolve(&self.path)?;
        match container.item(name) {
            None => Err(ExplorerError::BucketNotFound(name.to_string())),
            Some(RawItem::Leaf { .. }) => Err(ExplorerError::NotABucket(name.to_string())),
            Some(RawItem::Bucket { .. }) => {
                self.path.push(name.to_string());
                Ok(())
            }
        }
    }

    /// Moves back up one bucket level.
    pub fn back(&mut self) -> Result<(), ExplorerError> {
        if self.path.is_empty() {
            return Err(ExplorerError::AlreadyAtRoot);
        }
        self.path.pop();
        Ok(())
    }

    /// Jumps straight to the root. Never fails.
    pub fn to_root(&mut self) {
        self.path.clear();
    }

    /// Database-level storage figures, forwarded from the store.
    pub fn db_info(&self) -> Result<DbInfo, ExplorerError> {
        self.store.info()
    }

    /// Subtree figures for the bucket at the current position.
    pub fn bucket_totals(&self) -> Result<BucketTotals, ExplorerError> {
        let snapshot = self.store.snapshot()?;
        match snapshot.resolve(&self.path) {
            Ok(container) => Ok(container.totals()),
            Err(ExplorerError::BucketNotFound(_)) => Ok(BucketTotals::default()),
            Err(other) => Err(other),
        }
    }
}
