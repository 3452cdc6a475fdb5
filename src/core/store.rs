//! Read-only access to a bolt-format database file.
//!
//! Everything the rest of the crate knows about the on-disk store goes
//! through this module: opening the file (with a bounded wait on the
//! store's exclusive file lock), taking point-in-time snapshots, walking
//! nested buckets, and pulling storage figures. The page layout itself is
//! the store's business; we only consume its container and cursor API.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use jammdb::{Bucket, DB, Data, Tx};

use crate::core::error::ExplorerError;

/// Bound on how long an open waits for the store's file lock. Another
/// process holding the database keeps the lock until it exits.
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Exclusively-owned handle to an opened database file.
pub struct Store {
    db: Option<DB>,
    path: PathBuf,
}

impl Store {
    /// Validates `path` and opens it as a database, waiting at most
    /// [`OPEN_TIMEOUT`] for the file lock.
    pub fn open(path: impl AsRef<Path>) -> Result<Store, ExplorerError> {
        let path = path.as_ref();
        let meta = fs::metadata(path)
            .map_err(|_| ExplorerError::PathNotFound(path.display().to_string()))?;
        if !meta.is_file() {
            return Err(ExplorerError::NotAFile(path.display().to_string()));
        }

        let db = open_with_timeout(path.to_path_buf(), OPEN_TIMEOUT)?;
        Ok(Store {
            db: Some(db),
            path: path.to_path_buf(),
        })
    }

    /// Releases the database handle. Safe to call any number of times.
    pub fn close(&mut self) {
        self.db.take();
    }

    /// Opens a point-in-time read-only view of the whole store. The view
    /// is released when the returned snapshot drops.
    pub fn snapshot(&self) -> Result<Snapshot<'_>, ExplorerError> {
        let db = self.db.as_ref().ok_or(ExplorerError::Closed)?;
        Ok(Snapshot { tx: db.tx(false)? })
    }

    /// Database-level storage figures.
    pub fn info(&self) -> Result<DbInfo, ExplorerError> {
        let db = self.db.as_ref().ok_or(ExplorerError::Closed)?;
        let file_size = fs::metadata(&self.path)?.len();
        let pagesize = db.pagesize();
        Ok(DbInfo {
            path: self.path.clone(),
            file_size,
            pagesize,
            page_count: file_size / pagesize,
        })
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.close();
    }
}

/// The store blocks on its exclusive file lock, so the open runs on a
/// helper thread and we wait on a channel instead. If the open finishes
/// after the deadline the handle is dropped by the failed send, which
/// releases the lock again.
fn open_with_timeout(path: PathBuf, timeout: Duration) -> Result<DB, ExplorerError> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let _ = sender.send(DB::open(&path));
    });

    match receiver.recv_timeout(timeout) {
        Ok(opened) => Ok(opened?),
        Err(_) => Err(ExplorerError::OpenTimeout(timeout)),
    }
}

/// Storage figures for the database as a whole, forwarded from the store
/// plus the file geometry derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub pagesize: u64,
    pub page_count: u64,
}

/// Aggregate figures for one container's subtree, gathered by a full walk
/// inside a single snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketTotals {
    /// Leaf keys directly in this container.
    pub keys: u64,
    /// Buckets directly in this container.
    pub buckets: u64,
    /// Leaf keys in the whole subtree.
    pub total_keys: u64,
    /// Buckets in the whole subtree.
    pub total_buckets: u64,
    /// Deepest bucket nesting below this container.
    pub depth: u64,
}

/// One child of a container, with the raw value bytes for leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawItem {
    Bucket { name: String },
    Leaf { name: String, value: Vec<u8> },
}

/// A consistent read view over the whole store.
pub struct Snapshot<'db> {
    tx: Tx<'db>,
}

impl<'db> Snapshot<'db> {
    /// The root container: the anonymous top level that holds the
    /// top-level buckets.
    pub fn root(&self) -> Container<'_, 'db> {
        Container::Root(&self.tx)
    }

    /// Walks `path` from the root, descending one bucket per segment.
    /// Any segment that is missing or names a leaf key fails the whole
    /// resolution with `BucketNotFound`.
    pub fn resolve(&self, path: &[String]) -> Result<Container<'_, 'db>, ExplorerError> {
        let mut here = self.root();
        for segment in path {
            here = match here.child(segment) {
                Ok(next) => next,
                Err(ExplorerError::BucketNotFound(_)) | Err(ExplorerError::NotABucket(_)) => {
                    return Err(ExplorerError::BucketNotFound(path.join(".")));
                }
                Err(other) => return Err(other),
            };
        }
        Ok(here)
    }
}

/// Either the store's root or a nested bucket. The root is not itself a
/// bucket in the store's API, so the two cases stay explicit.
pub enum Container<'s, 'db> {
    Root(&'s Tx<'db>),
    Bucket(Bucket<'s, 'db>),
}

impl<'s, 'db> Container<'s, 'db> {
    /// Descends into a direct child bucket.
    pub fn child(&self, name: &str) -> Result<Container<'s, 'db>, ExplorerError> {
        let looked_up = match self {
            Container::Root(tx) => {
                // Copy the shared reference out so the child bucket is tied
                // to the snapshot, not to this `&self` borrow.
                let tx: &'s Tx<'db> = *tx;
                tx.get_bucket(name.to_string())
            }
            Container::Bucket(bucket) => bucket.get_bucket(name.to_string()),
        };
        match looked_up {
            Ok(bucket) => Ok(Container::Bucket(bucket)),
            Err(jammdb::Error::BucketMissing) => {
                Err(ExplorerError::BucketNotFound(name.to_string()))
            }
            Err(jammdb::Error::IncompatibleValue) => {
                Err(ExplorerError::NotABucket(name.to_string()))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Exact-match lookup of a direct child. `None` when nothing under
    /// this container carries that exact key.
    pub fn item(&self, key: &str) -> Option<RawItem> {
        match self {
            Container::Root(tx) => match tx.get_bucket(key.to_string()) {
                Ok(_) => Some(RawItem::Bucket {
                    name: key.to_string(),
                }),
                Err(_) => None,
            },
            Container::Bucket(bucket) => bucket.get(key).map(|data| raw_item(&data)),
        }
    }

    /// All direct children in their on-disk key order, materialized while
    /// the snapshot is held.
    pub fn items(&self) -> Vec<RawItem> {
        match self {
            Container::Root(tx) => tx
                .buckets()
                .map(|(name, _)| RawItem::Bucket {
                    name: String::from_utf8_lossy(name.name()).into_owned(),
                })
                .collect(),
            Container::Bucket(bucket) => bucket.cursor().map(|data| raw_item(&data)).collect(),
        }
    }

    /// Number of direct children. The store keeps no counts, so this is a
    /// full iteration.
    pub fn count(&self) -> u64 {
        match self {
            Container::Root(tx) => tx.buckets().count() as u64,
            Container::Bucket(bucket) => bucket.cursor().count() as u64,
        }
    }

    /// Recursive subtree figures.
    pub fn totals(&self) -> BucketTotals {
        let mut totals = BucketTotals::default();
        match self {
            Container::Root(tx) => {
                for (_, bucket) in tx.buckets() {
                    totals.buckets += 1;
                    totals.total_buckets += 1;
                    fold_subtree(&mut totals, Container::Bucket(bucket).totals());
                }
            }
            Container::Bucket(bucket) => {
                for data in bucket.cursor() {
                    match data {
                        Data::Bucket(name) => {
                            totals.buckets += 1;
                            totals.total_buckets += 1;
                            if let Ok(nested) = bucket.get_bucket(name.name().to_vec()) {
                                fold_subtree(&mut totals, Container::Bucket(nested).totals());
                            }
                        }
                        Data::KeyValue(_) => {
                            totals.keys += 1;
                            totals.total_keys += 1;
                        }
                    }
                }
            }
        }
        totals
    }
}

fn fold_subtree(totals: &mut BucketTotals, sub: BucketTotals) {
    totals.total_keys += sub.total_keys;
    totals.total_buckets += sub.total_buckets;
    totals.depth = totals.depth.max(sub.depth + 1);
}

fn raw_item(data: &Data<'_, '_>) -> RawItem {
    match data {
        Data::Bucket(name) => RawItem::Bucket {
            name: String::from_utf8_lossy(name.name()).into_owned(),
        },
        Data::KeyValue(kv) => RawItem::Leaf {
            name: String::from_utf8_lossy(kv.key()).into_owned(),
            value: kv.value().to_vec(),
        },
    }
}
