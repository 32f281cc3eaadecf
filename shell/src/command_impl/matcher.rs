// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::wildcard::{self, ExpansionBuffer, WildcardStatus};
use crate::{CommandError, CommandNode, CommandSet};

pub const HELP_FLAGS: [&str; 2] = ["-h", "--help"];

pub fn is_help_flag(token: &str) -> bool { HELP_FLAGS.contains(&token) }

/// Walk `argv` down the tree with exact matches only, first match wins at every level.
/// Returns the deepest matched node and how many tokens were consumed, or `None` if
/// `argv[0]` isn't a root command.
pub fn get_last_command(root: &CommandSet, argv: &[&str]) -> Option<(CommandNode, usize)> {
    let mut set = root.clone();
    let mut last = None;
    for (index, token) in argv.iter().enumerate() {
        let Some(node) = set.find(token) else {
            break;
        };
        let children = node.subcommands.clone();
        last = Some((node, index + 1));
        match children {
            Some(it) => set = it,
            None => break,
        }
    }
    last
}

/// Wildcard expansion state for one dispatch.
#[derive(Debug)]
pub struct WildcardContext {
    pub buffer: ExpansionBuffer,
    /// Set once any pattern was replaced. The caller must then tokenize `buffer` again.
    pub rewritten: bool,
    /// User visible warnings (the buffer was too short to hold every match).
    pub warnings: Vec<String>,
}

impl WildcardContext {
    pub fn new(line: &str, capacity: usize) -> Self {
        Self {
            buffer: ExpansionBuffer::new(line, capacity),
            rewritten: false,
            warnings: vec![],
        }
    }
}

/// The result of walking a command line down the tree.
#[derive(Debug, Clone)]
pub struct CommandMatch {
    /// Deepest node reached.
    pub node: CommandNode,
    /// How many tokens were consumed to reach it.
    pub depth: usize,
    /// Deepest node with a handler, and the index of its token in `argv`.
    pub handler: Option<(CommandNode, usize)>,
    /// Deepest node with help text.
    pub help: Option<CommandNode>,
    /// `-h` or `--help` was found.
    pub help_requested: bool,
    /// Index of the first token that matched none of the subcommands of the deepest node.
    pub stopped_at: Option<usize>,
}

impl CommandMatch {
    fn new(root: CommandNode) -> Self {
        let mut it = Self {
            node: root.clone(),
            depth: 0,
            handler: None,
            help: None,
            help_requested: false,
            stopped_at: None,
        };
        it.descend(root, 0);
        it
    }

    fn descend(&mut self, node: CommandNode, index: usize) {
        if node.has_handler() {
            self.handler = Some((node.clone(), index));
        }
        if node.help.is_some() {
            self.help = Some(node.clone());
        }
        self.node = node;
        self.depth = index + 1;
    }

    /// The node to print help for when `-h` is given.
    pub fn help_node(&self) -> &CommandNode { self.help.as_ref().unwrap_or(&self.node) }
}

/// Walk a tokenized command line for dispatch.
///
/// 1. `argv[0]` must be a root command, otherwise the line is "command not found".
/// 2. At every level after that, `-h` / `--help` stops the walk and asks for help.
/// 3. A token containing a wildcard (when `wildcards` is given) is expanded against the
///    subcommands of the current node. One match descends into it like an exact match.
///    Several matches stay at the current level, and none of them may have a handler
///    (that would be several handlers for one line). No match stops the walk.
/// 4. Any other token descends into the first subcommand with exactly that syntax. Once
///    several matches were expanded, descending into a node with a handler is an error
///    too.
/// 5. A token that matches nothing stops the walk. What is left over is the argument
///    list of the deepest handler.
pub fn walk(
    root: &CommandSet,
    argv: &[&str],
    mut wildcards: Option<&mut WildcardContext>,
) -> Result<CommandMatch, CommandError> {
    let first = argv.first().copied().unwrap_or_default();
    let root_node = root
        .find(first)
        .ok_or_else(|| CommandError::NotFound(first.to_owned()))?;

    let mut found = CommandMatch::new(root_node);
    let mut expanded_several = false;

    for (index, token) in argv.iter().enumerate().skip(1) {
        if is_help_flag(token) {
            found.help_requested = true;
            break;
        }

        // Scan the children of the deepest node, fresh for every token.
        let Some(set) = found.node.subcommands.clone() else {
            break;
        };

        if let (true, Some(context)) =
            (wildcard::has_wildcard(token), wildcards.as_deref_mut())
        {
            let status = wildcard::expand(&set, token, &mut context.buffer);
            tracing::debug!(pattern = %token, ?status, "wildcard expanded");
            let count = match status {
                WildcardStatus::Added(count) => count,
                WildcardStatus::MissingSpace(count) => {
                    context.warnings.push(format!(
                        "Command buffer is too short to expand all commands matching wildcard pattern: {token}"
                    ));
                    count
                }
                WildcardStatus::NoMatch => 0,
            };
            if count == 0 {
                found.stopped_at = Some(index);
                break;
            }
            context.rewritten = true;

            let mut matched: Vec<CommandNode> = wildcard::matching(&set, token).take(count).collect();
            if count == 1 {
                if let Some(node) = matched.pop() {
                    if expanded_several && node.has_handler() {
                        return Err(CommandError::MultipleExecution);
                    }
                    found.descend(node, index);
                }
            } else if matched.iter().any(CommandNode::has_handler) {
                return Err(CommandError::MultipleExecution);
            } else {
                expanded_several = true;
            }
            continue;
        }

        match set.find(token) {
            Some(node) => {
                if expanded_several && node.has_handler() {
                    return Err(CommandError::MultipleExecution);
                }
                found.descend(node, index);
            }
            None => {
                found.stopped_at = Some(index);
                break;
            }
        }
    }

    Ok(found)
}
