use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("path not found: {0}")]
    PathNotFound(String),
    #[error("path must be to a file: {0}")]
    NotAFile(String),
    #[error("timed out after {0:?} waiting for the database file lock")]
    OpenTimeout(Duration),
    #[error("database error: {0}")]
    StoreError(#[from] jammdb::Error),
    #[error("invalid bucket name: {0}")]
    BucketNotFound(String),
    #[error("not a bucket: {0}")]
    NotABucket(String),
    #[error("already at root")]
    AlreadyAtRoot,
    #[error("database handle is closed")]
    Closed,
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("readline error: {0}")]
    ReadlineError(#[from] rustyline::error::ReadlineError),
}
