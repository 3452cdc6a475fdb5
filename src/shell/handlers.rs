//! Handlers behind each shell command. All of them print directly and
//! talk to the core only through the `Explorer` operations.

use std::io::Write as _;

use comfy_table::{ContentArrangement, Table};
use regex::Regex;

use crate::core::error::ExplorerError;
use crate::core::state::{Entry, Explorer};
use crate::shell::commands;

/// `list` shows at most this many keys unless told otherwise.
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Listed values are clipped to this many characters; `show` prints the
/// full value.
pub const VALUE_CLIP: usize = 50;

/// Parses `--skip <n>` / `--limit <n>` out of the raw argument text.
/// Malformed numbers are ignored, a negative skip clamps to zero, and a
/// non-positive limit means "no limit" (-1).
pub fn parse_list_args(args: &str) -> (i64, i64) {
    let flag = Regex::new(r"--(skip|limit)\s+(-?\d+)").unwrap();

    let mut skip = 0i64;
    let mut limit = DEFAULT_LIST_LIMIT;
    for caps in flag.captures_iter(args) {
        if let Ok(n) = caps[2].parse::<i64>() {
            if &caps[1] == "skip" {
                skip = n;
            } else {
                limit = n;
            }
        }
    }

    if skip < 0 {
        skip = 0;
    }
    if limit <= 0 {
        limit = -1;
    }
    (skip, limit)
}

/// Escapes newlines/tabs and clips the text for one-line table cells.
pub fn clip_value(text: &str) -> String {
    let escaped = text.replace('\n', "\\n").replace('\t', "\\t");
    if escaped.chars().count() <= VALUE_CLIP {
        escaped
    } else {
        escaped.chars().take(VALUE_CLIP).collect()
    }
}

/// Prompt prefix for the current path. Deep paths elide the middle so the
/// prompt stays readable.
pub fn prompt_for(path: &[String]) -> String {
    let shown = match path.len() {
        0 => "root".to_string(),
        1..=4 => path.join("."),
        len => format!("{}...{}", path[0], path[len - 3..].join(".")),
    };
    format!("{}> ", shown)
}

pub fn list(explorer: &mut Explorer, args: &str) -> Result<(), ExplorerError> {
    let (skip, limit) = parse_list_args(args);
    render_entries(explorer, skip, limit)
}

pub fn list_all(explorer: &mut Explorer) -> Result<(), ExplorerError> {
    render_entries(explorer, 0, -1)
}

fn render_entries(explorer: &mut Explorer, skip: i64, limit: i64) -> Result<(), ExplorerError> {
    let entries = explorer.list_entries()?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Key", "Type", "Value"]);

    let mut shown = 0i64;
    for entry in entries.iter().skip(skip.max(0) as usize) {
        if limit != -1 && shown >= limit {
            break;
        }
        shown += 1;
        table.add_row(row_for(entry));
    }

    println!();
    println!("{table}");
    if entries.is_empty() {
        println!("...dust");
    }
    println!();
    let limit_text = if limit == -1 {
        "no limit".to_string()
    } else {
        limit.to_string()
    };
    println!("skipped: {}, limit: {}", skip, limit_text);
    println!();
    Ok(())
}

fn row_for(entry: &Entry) -> Vec<String> {
    let value = match &entry.value_string {
        Some(text) => clip_value(text),
        None => "...".to_string(),
    };
    vec![entry.name.clone(), entry.field_type.to_string(), value]
}

pub fn cd(explorer: &mut Explorer, args: &str) -> Result<(), ExplorerError> {
    let name = args.trim();
    if name == ".." {
        return explorer.back();
    }
    explorer.enter(name)
}

pub fn count(explorer: &mut Explorer) -> Result<(), ExplorerError> {
    let count = explorer.key_count()?;
    println!();
    println!("Count: {}", count);
    println!();
    Ok(())
}

pub fn pwd(explorer: &Explorer) {
    if explorer.at_root() {
        println!("root");
    } else {
        println!("{}", explorer.path_key());
    }
}

pub fn show(explorer: &Explorer, args: &str) -> Result<(), ExplorerError> {
    println!("{}", explorer.get_value(args)?);
    Ok(())
}

pub fn stats_db(explorer: &Explorer) -> Result<(), ExplorerError> {
    let info = explorer.db_info()?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Property", "Value", "Description"]);
    table.add_row(vec![
        "PageSize".to_string(),
        info.pagesize.to_string(),
        "page size in bytes reported by the store".to_string(),
    ]);
    table.add_row(vec![
        "PageCount".to_string(),
        info.page_count.to_string(),
        "number of pages in the file".to_string(),
    ]);
    table.add_row(vec![
        "FileSize".to_string(),
        info.file_size.to_string(),
        "size of the database file in bytes".to_string(),
    ]);

    println!();
    println!("{table}");
    println!();
    Ok(())
}

pub fn stats_bucket(explorer: &Explorer) -> Result<(), ExplorerError> {
    let totals = explorer.bucket_totals()?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Property", "Value", "Description"]);
    table.add_row(vec![
        "Keys".to_string(),
        totals.keys.to_string(),
        "leaf keys directly in this bucket".to_string(),
    ]);
    table.add_row(vec![
        "Buckets".to_string(),
        totals.buckets.to_string(),
        "buckets directly in this bucket".to_string(),
    ]);
    table.add_row(vec![
        "TotalKeys".to_string(),
        totals.total_keys.to_string(),
        "leaf keys in the whole subtree".to_string(),
    ]);
    table.add_row(vec![
        "TotalBuckets".to_string(),
        totals.total_buckets.to_string(),
        "buckets in the whole subtree".to_string(),
    ]);
    table.add_row(vec![
        "Depth".to_string(),
        totals.depth.to_string(),
        "deepest bucket nesting below this bucket".to_string(),
    ]);

    println!();
    println!("{table}");
    println!();
    Ok(())
}

pub fn clear() {
    print!("\x1B[2J\x1B[1;1H");
    let _ = std::io::stdout().flush();
}

pub fn help() {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["command", "aliases", "description"]);
    for command in commands::COMMANDS {
        table.add_row(vec![
            command.usage.to_string(),
            command.aliases.join(", "),
            command.description.to_string(),
        ]);
    }
    println!();
    println!("{table}");
    println!();
}
