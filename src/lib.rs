//! Burrow: an interactive, read-only shell for bolt-format databases.
//!
//! Burrow opens a single-file bucket database and lets you walk its
//! nested bucket tree like a filesystem: `cd` into buckets, `list` keys
//! with their decoded values, `count` them, `show` a single value, and
//! inspect per-bucket and per-database storage figures.
//!
//! The database is opened strictly read-only and treated as a static
//! snapshot for the whole session: listings and counts are cached per
//! path and never recomputed. Writes are out of scope entirely.
//!
//! # Crate Structure
//!
//! - [`core`]: the navigation state machine, store adapter, and
//!   typed-value decoder
//! - [`shell`]: the interactive loop, command table, completion, and
//!   table rendering

pub mod core;
pub mod shell;

use std::path::PathBuf;

use clap::Parser;

use crate::core::error::ExplorerError;
use crate::core::state::Explorer;

#[derive(Parser, Debug)]
#[clap(
    name = "burrow",
    version = env!("CARGO_PKG_VERSION"),
    about = "Interactive read-only shell for exploring bolt-format bucket database files"
)]
struct Cli {
    /// Database file to explore.
    file: PathBuf,
}

pub fn run() -> Result<(), ExplorerError> {
    let cli = Cli::parse();

    if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    println!("opening db file: {}", cli.file.display());
    let explorer = Explorer::open(&cli.file)?;
    shell::run_shell(explorer)
}
