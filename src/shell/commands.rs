//! The shell's command table.

/// One shell command: its primary name, accepted aliases, and the help
/// text shown by `help`. `completes_keys` marks commands whose argument
/// is a key in the current bucket, so tab completion can offer them.
pub struct Command {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub description: &'static str,
    pub completes_keys: bool,
}

impl Command {
    pub fn matches(&self, word: &str) -> bool {
        self.name == word || self.aliases.contains(&word)
    }
}

pub const COMMANDS: &[Command] = &[
    Command {
        name: "list",
        aliases: &["ls"],
        usage: "list [--skip <n>] [--limit <n>]",
        description: "list keys (default limit 100, -1 = no limit)",
        completes_keys: false,
    },
    Command {
        name: "list-all",
        aliases: &["la"],
        usage: "list-all",
        description: "list all keys",
        completes_keys: false,
    },
    Command {
        name: "cd",
        aliases: &[],
        usage: "cd <bucket>",
        description: "enter a bucket (cd .. goes back)",
        completes_keys: true,
    },
    Command {
        name: "count",
        aliases: &[],
        usage: "count",
        description: "number of keys in the current bucket",
        completes_keys: false,
    },
    Command {
        name: "back",
        aliases: &["b"],
        usage: "back",
        description: "go back one bucket level",
        completes_keys: false,
    },
    Command {
        name: "root",
        aliases: &["r"],
        usage: "root",
        description: "return to the root bucket",
        completes_keys: false,
    },
    Command {
        name: "pwd",
        aliases: &[],
        usage: "pwd",
        description: "print the full path",
        completes_keys: false,
    },
    Command {
        name: "show",
        aliases: &[],
        usage: "show <key>",
        description: "print the full value of a key",
        completes_keys: true,
    },
    Command {
        name: "stats-bucket",
        aliases: &[],
        usage: "stats-bucket",
        description: "show stats for the current bucket",
        completes_keys: false,
    },
    Command {
        name: "stats-db",
        aliases: &[],
        usage: "stats-db",
        description: "show stats for the database",
        completes_keys: false,
    },
    Command {
        name: "clear",
        aliases: &["cls"],
        usage: "clear",
        description: "clear the console",
        completes_keys: false,
    },
    Command {
        name: "help",
        aliases: &[],
        usage: "help",
        description: "print this help",
        completes_keys: false,
    },
    Command {
        name: "quit",
        aliases: &["q"],
        usage: "quit",
        description: "leave the shell",
        completes_keys: false,
    },
];

/// Looks a command up by name or alias.
pub fn find(word: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|command| command.matches(word))
}

/// Every name and alias, sorted, for first-word completion.
pub fn completion_words() -> Vec<String> {
    let mut words: Vec<String> = COMMANDS
        .iter()
        .flat_map(|command| {
            std::iter::once(command.name).chain(command.aliases.iter().copied())
        })
        .map(str::to_string)
        .collect();
    words.sort();
    words
}
