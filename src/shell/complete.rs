//! Tab completion for the shell.
//!
//! The first word completes against the command table. For commands that
//! take a key argument (`cd`, `show`), the argument completes against the
//! keys of the current bucket, refreshed by the shell loop after every
//! navigation so the candidates track the session's position.

use std::sync::{Arc, RwLock};

use rustyline::Context;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;

use crate::shell::commands;

pub struct ShellHelper {
    commands: Vec<String>,
    keys: Arc<RwLock<Vec<String>>>,
}

impl ShellHelper {
    pub fn new(keys: Arc<RwLock<Vec<String>>>) -> ShellHelper {
        ShellHelper {
            commands: commands::completion_words(),
            keys,
        }
    }

    fn pairs_from_prefix(items: &[String], prefix: &str) -> Vec<Pair> {
        items
            .iter()
            .filter(|item| item.starts_with(prefix))
            .map(|item| Pair {
                display: item.clone(),
                replacement: item.clone(),
            })
            .collect()
    }
}

impl rustyline::Helper for ShellHelper {}

impl Highlighter for ShellHelper {}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Validator for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace())
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &line[start..pos];
        let earlier: Vec<&str> = line[..start].split_whitespace().collect();

        // First word: complete command names.
        if earlier.is_empty() {
            return Ok((start, Self::pairs_from_prefix(&self.commands, word)));
        }

        // Argument position: complete keys of the current bucket for the
        // commands that take one.
        if let Some(command) = commands::find(earlier[0]) {
            if command.completes_keys {
                if let Ok(keys) = self.keys.read() {
                    return Ok((start, Self::pairs_from_prefix(&keys, word)));
                }
            }
        }

        Ok((start, Vec::new()))
    }
}
