// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CommandNode, CommandSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardStatus {
    /// This many matches replaced the pattern.
    Added(usize),
    /// The buffer filled up after this many matches. What was added stays, the caller
    /// warns the user.
    MissingSpace(usize),
    NoMatch,
}

pub fn has_wildcard(token: &str) -> bool { token.contains(['*', '?']) }

/// Shell style pattern match, case sensitive. `*` matches any run of characters
/// (including none) and `?` matches exactly one.
pub fn fnmatch(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Where the last `*` was seen, and the text position it is currently matched up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(it) if *it == '?' || *it == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched_to)) => {
                    backtrack = Some((star, matched_to + 1));
                    p = star + 1;
                    t = matched_to + 1;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|it| *it == '*')
}

/// Siblings of `set` that `pattern` matches, in declaration order.
pub fn matching<'a>(set: &'a CommandSet, pattern: &'a str) -> impl Iterator<Item = CommandNode> + 'a {
    set.iter().filter(move |node| fnmatch(pattern, &node.syntax))
}

/// A copy of the command line that wildcard patterns are expanded into. It has the same
/// capacity as the line buffer, expanding must not touch the line being scanned.
///
/// Whitespace runs are collapsed to single spaces when the copy is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionBuffer {
    text: String,
    capacity: usize,
}

impl ExpansionBuffer {
    pub fn new(line: &str, capacity: usize) -> Self {
        Self {
            text: line.split_whitespace().collect::<Vec<_>>().join(" "),
            capacity,
        }
    }

    pub fn as_str(&self) -> &str { &self.text }

    /// Byte offset of the first whole word equal to `word`. If the word isn't there as
    /// typed (eg: it was quoted) the first occurrence as a substring is used.
    pub fn find_word(&self, word: &str) -> Option<usize> {
        let mut offset = 0;
        for candidate in self.text.split(' ') {
            if candidate == word {
                return Some(offset);
            }
            offset += candidate.len() + 1;
        }
        self.text.find(word)
    }

    /// Insert `word` followed by a space at `pos`. Returns `false` if it doesn't fit.
    pub fn insert_word_at(&mut self, pos: usize, word: &str) -> bool {
        if self.text.len() + word.len() + 2 > self.capacity {
            return false;
        }
        self.text.insert_str(pos, " ");
        self.text.insert_str(pos, word);
        true
    }

    /// Remove the `len` bytes at `pos` and the space in front of them.
    pub fn remove_word_at(&mut self, pos: usize, len: usize) {
        let end = (pos + len).min(self.text.len());
        let start = if pos > 0 && self.text.as_bytes()[pos - 1] == b' ' {
            pos - 1
        } else {
            pos
        };
        self.text.replace_range(start..end, "");
    }
}

/// Replace `pattern` in `buffer` with the syntax of every node in `set` it matches,
/// space separated and in declaration order.
///
/// The line is tokenized again from `buffer` afterwards, and [ExpansionBuffer::new]
/// collapsed every whitespace run, quoted or not. So on a line with wildcards,
/// `log 'a   b' *able` hands `a b` to the handler.
pub fn expand(set: &CommandSet, pattern: &str, buffer: &mut ExpansionBuffer) -> WildcardStatus {
    let Some(mut position) = buffer.find_word(pattern) else {
        return WildcardStatus::NoMatch;
    };

    let mut count = 0;
    let mut overflow = false;
    for node in matching(set, pattern) {
        if !buffer.insert_word_at(position, &node.syntax) {
            overflow = true;
            break;
        }
        position += node.syntax.len() + 1;
        count += 1;
    }

    if count > 0 {
        buffer.remove_word_at(position, pattern.len());
    }

    match (count, overflow) {
        (_, true) => WildcardStatus::MissingSpace(count),
        (0, false) => WildcardStatus::NoMatch,
        (count, false) => WildcardStatus::Added(count),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    fn set(names: &[&'static str]) -> CommandSet {
        names
            .iter()
            .map(|name| CommandNode::new(*name))
            .collect::<Vec<_>>()
            .into()
    }

    #[test_case("ba*", "bar", true)]
    #[test_case("ba*", "qux", false)]
    #[test_case("b?r", "bar", true)]
    #[test_case("b?r", "br", false)]
    #[test_case("*", "", true)]
    #[test_case("*a*b", "xaxxab", true)]
    #[test_case("*a*b", "xaxxa", false)]
    #[test_case("a**", "a", true)]
    #[test_case("Bar", "bar", false ; "case sensitive")]
    fn test_fnmatch(pattern: &str, text: &str, expected: bool) {
        assert_eq!(fnmatch(pattern, text), expected);
    }

    #[test]
    fn test_has_wildcard() {
        assert!(has_wildcard("ba*"));
        assert!(has_wildcard("b?"));
        assert!(!has_wildcard("bar"));
    }

    #[test]
    fn test_expand_in_declaration_order() {
        let set = set(&["bar", "baz", "qux"]);
        let mut buffer = ExpansionBuffer::new("foo   ba*  x", 64);
        assert_eq!(expand(&set, "ba*", &mut buffer), WildcardStatus::Added(2));
        assert_eq!(buffer.as_str(), "foo bar baz x");
    }

    #[test]
    fn test_expand_no_match_leaves_buffer() {
        let set = set(&["bar", "baz"]);
        let mut buffer = ExpansionBuffer::new("foo z*", 64);
        assert_eq!(expand(&set, "z*", &mut buffer), WildcardStatus::NoMatch);
        assert_eq!(buffer.as_str(), "foo z*");
    }

    #[test]
    fn test_expand_overflow_keeps_partial_result() {
        let set = set(&["bar", "baz", "bat"]);
        // "foo ba*" is 7 bytes, "bar " fits, "baz " doesn't.
        let mut buffer = ExpansionBuffer::new("foo ba*", 13);
        assert_eq!(expand(&set, "ba*", &mut buffer), WildcardStatus::MissingSpace(1));
        assert_eq!(buffer.as_str(), "foo bar");
    }

    #[test]
    fn test_expand_overflow_before_any_match() {
        let set = set(&["bar"]);
        let mut buffer = ExpansionBuffer::new("foo ba*", 8);
        assert_eq!(expand(&set, "ba*", &mut buffer), WildcardStatus::MissingSpace(0));
        assert_eq!(buffer.as_str(), "foo ba*");
    }

    #[test]
    fn test_whitespace_collapses_inside_quotes() {
        let buffer = ExpansionBuffer::new("log 'a   b'  *able", 64);
        assert_eq!(buffer.as_str(), "log 'a b' *able");
    }

    #[test]
    fn test_find_word_is_whole_word() {
        let buffer = ExpansionBuffer::new("xba* ba*", 64);
        assert_eq!(buffer.find_word("ba*"), Some(5));
    }
}
