//! The interactive shell: line editing, dispatch, and rendering.
//!
//! This layer is deliberately thin. It owns the terminal loop and the
//! command table and calls into [`crate::core::state::Explorer`] for
//! everything that touches the database.

pub mod commands;
pub mod complete;
pub mod handlers;

use std::sync::{Arc, RwLock};

use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use crate::core::error::ExplorerError;
use crate::core::state::Explorer;
use crate::shell::complete::ShellHelper;

enum Control {
    Continue,
    Exit,
}

/// Runs the interactive session until `quit` or end of input, then closes
/// the store.
pub fn run_shell(mut explorer: Explorer) -> Result<(), ExplorerError> {
    println!("Tab completion enabled. Type `help` for commands, `quit` to leave.");

    let keys = Arc::new(RwLock::new(Vec::new()));
    let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ShellHelper::new(keys.clone())));

    loop {
        refresh_key_completions(&keys, &mut explorer);

        let prompt = handlers::prompt_for(explorer.path());
        let line = match rl.readline(prompt.as_str()) {
            Ok(line) => line,
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => continue,
            Err(err) => return Err(err.into()),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        match dispatch(&mut explorer, line) {
            Ok(Control::Continue) => {}
            Ok(Control::Exit) => break,
            Err(err) => eprintln!("{} {err}", "error:".red().bold()),
        }
    }

    explorer.close();
    Ok(())
}

/// Runs one line of input against the explorer. Input that matches no
/// command is tried as a bucket name, matching the original ergonomics of
/// typing a bucket to enter it.
fn dispatch(explorer: &mut Explorer, line: &str) -> Result<Control, ExplorerError> {
    let (word, args) = match line.find(' ') {
        Some(space) => (&line[..space], &line[space + 1..]),
        None => (line, ""),
    };

    if let Some(command) = commands::find(word) {
        match command.name {
            "quit" => return Ok(Control::Exit),
            "list" => handlers::list(explorer, args)?,
            "list-all" => handlers::list_all(explorer)?,
            "cd" => handlers::cd(explorer, args)?,
            "count" => handlers::count(explorer)?,
            "back" => explorer.back()?,
            "root" => explorer.to_root(),
            "pwd" => handlers::pwd(explorer),
            "show" => handlers::show(explorer, args)?,
            "stats-bucket" => handlers::stats_bucket(explorer)?,
            "stats-db" => handlers::stats_db(explorer)?,
            "clear" => handlers::clear(),
            "help" => handlers::help(),
            other => unreachable!("command {other} has no handler"),
        }
        return Ok(Control::Continue);
    }

    let mut name = line;
    if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
        name = &name[1..name.len() - 1];
    }
    if explorer.enter(name).is_err() {
        eprintln!(
            "{} unknown command or bucket name: {}",
            "error:".red().bold(),
            name
        );
    }
    Ok(Control::Continue)
}

fn refresh_key_completions(keys: &Arc<RwLock<Vec<String>>>, explorer: &mut Explorer) {
    let names = explorer
        .list_entries()
        .map(|entries| entries.iter().map(|entry| entry.name.clone()).collect())
        .unwrap_or_default();
    if let Ok(mut guard) = keys.write() {
        *guard = names;
    }
}
