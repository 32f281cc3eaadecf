// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use textwrap::Options;

use crate::{CommandNode, CommandSet};

pub const HELP_OPTION: &str = "-h, --help";
pub const HELP_OPTION_TEXT: &str = "Show command help.";

/// Help for one command:
///
/// ```text
/// sensor - Sensor commands. Long help text is wrapped and continues
///          under the first column of the help text.
/// Options:
///   -h, --help  :Show command help.
/// Subcommands:
///   get     :Read a sensor.
///   select  :Select the active sensor.
/// ```
pub fn format_help(node: &CommandNode, width: usize) -> String {
    let mut acc = match &node.help {
        Some(help) => {
            let prefix = format!("{} - ", node.syntax);
            wrap_with_prefix(&prefix, help, width)
        }
        None => node.syntax.to_string(),
    };
    acc.push('\n');

    acc.push_str("Options:\n");
    acc.push_str(&format_entries(
        [(HELP_OPTION, Some(HELP_OPTION_TEXT))].into_iter(),
        width,
    ));

    if let Some(subcommands) = node.subcommands.as_ref().filter(|it| !it.is_empty()) {
        acc.push_str("Subcommands:\n");
        acc.push_str(&format_set(subcommands, width));
    }

    acc
}

/// Every command in `set`, one per line, with its help text aligned in a column.
pub fn format_set(set: &CommandSet, width: usize) -> String {
    let nodes: Vec<CommandNode> = set.iter().collect();
    format_entries(
        nodes
            .iter()
            .map(|node| (&*node.syntax, node.help.as_deref())),
        width,
    )
}

/// `help` at the root: the list of all top level commands.
pub fn format_command_list(root: &CommandSet, width: usize) -> String {
    let mut acc = String::from(
        "Please press the <Tab> button to see all available commands.\n\
         You can also use the <Tab> button to prompt or auto-complete all commands or its subcommands.\n\
         You can try to call commands with <-h> or <--help> parameter for more information.\n\n",
    );
    acc.push_str("Available commands:\n");
    acc.push_str(&format_set(root, width));
    acc
}

fn format_entries<'a>(
    entries: impl Iterator<Item = (&'a str, Option<&'a str>)> + Clone,
    width: usize,
) -> String {
    let longest = entries.clone().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut acc = String::new();
    for (name, help) in entries {
        let prefix = format!("  {name:<field$}:", field = longest + 2);
        match help {
            Some(help) => acc.push_str(&wrap_with_prefix(&prefix, help, width)),
            None => acc.push_str(&prefix),
        }
        acc.push('\n');
    }
    acc
}

/// `prefix` followed by `text`, wrapped at `width`. Continuation lines are indented to
/// line up with the first character after `prefix`.
fn wrap_with_prefix(prefix: &str, text: &str, width: usize) -> String {
    let indent = " ".repeat(prefix.len());
    // Never wrap narrower than the prefix plus a few characters of text.
    let width = width.max(prefix.len() + 8);
    let options = Options::new(width)
        .initial_indent(prefix)
        .subsequent_indent(&indent);
    textwrap::fill(text, options)
}
