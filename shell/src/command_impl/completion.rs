// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Tab completion. This is split into a pure part ([prepare], [find_candidates],
//! [complete]) that works on a copy of the line, and a rendering part ([apply]) that
//! edits the line and draws the option list. Only the text before the cursor is ever
//! looked at, whatever follows the cursor is left alone.

use std::io::{self, Write};

use super::{matcher::get_last_command,
            tokenizer::{TokenLimit, tokenize_with_limit},
            wildcard::has_wildcard};
use crate::{CommandNode, CommandSet, CommandTree, LineBuffer, LineState, ShellColor};

/// Where the token being completed sits in the command tree.
#[derive(Debug, Clone)]
pub struct CompletionPrep {
    /// Tokens before the cursor.
    pub argv: Vec<String>,
    /// The set the token being completed is looked up in.
    pub parent: CommandSet,
    /// What was typed of the token being completed (empty after a space).
    pub prefix: String,
    /// Index of that token in `argv` (equal to `argv.len()` after a space).
    pub token_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Candidates {
    /// In declaration order.
    pub nodes: Vec<CommandNode>,
    /// Index of the first candidate in its set.
    pub first_index: Option<usize>,
    /// Length of the longest candidate syntax.
    pub longest: usize,
}

impl Candidates {
    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Length in bytes of the prefix that every candidate shares. Always on a char
    /// boundary of every candidate.
    pub fn common_prefix_len(&self) -> usize {
        let Some((first, rest)) = self.nodes.split_first() else {
            return 0;
        };
        rest.iter().fold(first.syntax.len(), |common, node| {
            first
                .syntax
                .char_indices()
                .zip(node.syntax.chars())
                .take_while(|((index, lhs), rhs)| *index < common && lhs == rhs)
                .last()
                .map_or(0, |((index, ch), _)| index + ch.len_utf8())
        })
    }
}

#[derive(Debug, Clone)]
pub enum Completion {
    /// No candidates, or no room left in the line. Nothing changes on screen.
    Nothing,
    /// Insert `suffix`, then a space (or step over the space that is already there).
    Single { suffix: String },
    /// List the candidates, then insert the part of their common prefix that wasn't
    /// typed yet (may be empty).
    Multiple {
        candidates: Candidates,
        common_suffix: String,
    },
}

/// Find the token under completion in `text` (the line up to the cursor) and the set of
/// commands it has to be completed from. `None` if the tokens before it don't lead to a
/// command with subcommands, if one of them is a wildcard pattern, or if a quote is open.
pub fn prepare(tree: &CommandTree, text: &str, max_argc: usize) -> Option<CompletionPrep> {
    let tokens = tokenize_with_limit(text, TokenLimit::Max(max_argc));
    if tokens.unterminated_quote.is_some() {
        return None;
    }
    let after_space = text.is_empty() || text.ends_with(char::is_whitespace);
    let argc = tokens.len();

    let token_index = if after_space || argc == 0 {
        if argc >= max_argc {
            return None;
        }
        argc
    } else {
        argc - 1
    };

    let argv = tokens.as_argv();
    let complete = &argv[..token_index];
    if complete.iter().any(|token| has_wildcard(token)) {
        return None;
    }

    let parent = if complete.is_empty() {
        tree.root().clone()
    } else {
        let (node, depth) = get_last_command(tree.root(), complete)?;
        if depth != complete.len() {
            return None;
        }
        node.subcommands?
    };

    let prefix = argv.get(token_index).copied().unwrap_or_default().to_owned();
    Some(CompletionPrep {
        argv: tokens.argv,
        parent,
        prefix,
        token_index,
    })
}

/// Every node in `set` whose syntax starts with `prefix`.
pub fn find_candidates(set: &CommandSet, prefix: &str) -> Candidates {
    let mut candidates = Candidates::default();
    for (index, node) in set.iter().enumerate() {
        if !node.syntax.starts_with(prefix) {
            continue;
        }
        candidates.first_index.get_or_insert(index);
        candidates.longest = candidates.longest.max(node.syntax.len());
        candidates.nodes.push(node);
    }
    candidates
}

/// Work out what Tab does for `buffer`.
pub fn complete(tree: &CommandTree, buffer: &LineBuffer, max_argc: usize) -> Completion {
    let room = buffer.remaining();
    if room == 0 {
        return Completion::Nothing;
    }
    let Some(prep) = prepare(tree, buffer.before_cursor(), max_argc) else {
        return Completion::Nothing;
    };
    let candidates = find_candidates(&prep.parent, &prep.prefix);
    let typed = prep.prefix.len();

    match candidates.len() {
        0 => Completion::Nothing,
        1 => {
            let syntax = &candidates.nodes[0].syntax;
            let suffix = syntax[typed..].chars().take(room).collect();
            Completion::Single { suffix }
        }
        _ => {
            let common = candidates.common_prefix_len();
            let common_suffix = candidates.nodes[0].syntax[typed..common]
                .chars()
                .take(room)
                .collect();
            Completion::Multiple {
                candidates,
                common_suffix,
            }
        }
    }
}

/// Carry out a [Completion] on the line being edited.
pub fn apply(state: &mut LineState, term: &mut dyn Write, completion: Completion) -> io::Result<()> {
    match completion {
        Completion::Nothing => Ok(()),
        Completion::Single { suffix } => {
            state.insert_str(term, &suffix)?;
            if state.buffer.byte_at(state.buffer.cursor()) == Some(b' ') {
                state.move_with(term, |it| {
                    it.move_cursor(1);
                })
            } else {
                state.insert_byte(term, b' ', false)
            }
        }
        Completion::Multiple {
            candidates,
            common_suffix,
        } => {
            list_options(state, term, &candidates)?;
            state.insert_str(term, &common_suffix)?;
            Ok(())
        }
    }
}

/// Print the candidates in columns below the line, then draw the prompt and the line
/// again underneath.
pub fn list_options(
    state: &mut LineState,
    term: &mut dyn Write,
    candidates: &Candidates,
) -> io::Result<()> {
    if !state.flags.echo {
        return Ok(());
    }
    let column_width = candidates.longest + 2;
    let width = usize::from(state.cons.size.width);
    let columns = (width.saturating_sub(2) / column_width).max(1);

    // Start below the last row of the line.
    let len = state.buffer.len();
    state.cons.queue_move_between(term, state.buffer.cursor(), len)?;

    for (index, node) in candidates.nodes.iter().enumerate() {
        if index % columns == 0 {
            term.write_all(b"\r\n  ")?;
        }
        state.set_color(term, ShellColor::OPTION)?;
        term.write_all(node.syntax.as_bytes())?;
        let last_in_row = (index + 1) % columns == 0 || index + 1 == candidates.len();
        if !last_in_row {
            let padding = column_width - node.syntax.len();
            write!(term, "{:padding$}", "")?;
        }
    }
    state.set_color(term, ShellColor::NORMAL)?;
    term.write_all(b"\r\n")?;
    state.render_with_prompt(term)
}
