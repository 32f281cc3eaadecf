// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::collections::VecDeque;

use crate::HISTORY_SIZE_DEFAULT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Up,
    Down,
}

/// # History navigation
///
/// Entries are stored newest first in a bounded ring. When it is full, adding a new entry
/// evicts the oldest one.
///
/// ## Going up ([History::get] with [HistoryDirection::Up])
///
/// 1. If history mode isn't active yet, the line being edited is backed up into the
///    draft and the newest entry is recalled.
/// 2. Otherwise the next older entry is recalled. At the oldest entry this keeps
///    returning the oldest entry.
///
/// ## Going down ([History::get] with [HistoryDirection::Down])
///
/// 1. If history mode isn't active this does nothing, it is not possible to go past the
///    live line from outside history.
/// 2. From the newest entry the draft is restored and history mode exits.
/// 3. Otherwise the next newer entry is recalled.
///
/// ## Leaving history mode ([History::mode_exit])
///
/// Enter, Ctrl-C, Tab and the editing keys leave history mode. Whatever is in the live
/// buffer at that point (a recalled entry, or the restored draft) stays there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: VecDeque<String>,
    max_size: usize,
    current_position: Option<usize>,
    draft: String,
}

impl Default for History {
    fn default() -> Self { Self::new(HISTORY_SIZE_DEFAULT) }
}

impl History {
    /// A `max_size` of 0 disables history.
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
            current_position: None,
            draft: String::new(),
        }
    }

    /// Save a submitted line. Leading and trailing whitespace is trimmed. Empty lines and
    /// a repeat of the newest entry are ignored.
    pub fn put(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.max_size == 0 {
            return;
        }
        if self.entries.front().is_some_and(|newest| newest == line) {
            return;
        }
        if self.entries.len() == self.max_size {
            self.entries.pop_back();
        }
        self.entries.push_front(line.to_owned());
    }

    /// `buffer` holds the live line on entry and the recalled line on return. The
    /// caller keeps reusing the same buffer, its allocation is kept.
    ///
    /// Returns the length of the line now in `buffer`, or `None` if nothing changed.
    pub fn get(&mut self, direction: HistoryDirection, buffer: &mut String) -> Option<usize> {
        let position = match (direction, self.current_position) {
            (HistoryDirection::Up, None) => {
                if self.entries.is_empty() {
                    return None;
                }
                self.draft.clear();
                self.draft.push_str(buffer);
                0
            }
            (HistoryDirection::Up, Some(position)) => {
                (position + 1).min(self.entries.len().saturating_sub(1))
            }
            (HistoryDirection::Down, None) => return None,
            (HistoryDirection::Down, Some(0)) => {
                buffer.clear();
                buffer.push_str(&self.draft);
                self.mode_exit();
                return Some(buffer.len());
            }
            (HistoryDirection::Down, Some(position)) => position - 1,
        };

        let entry = self.entries.get(position)?;
        self.current_position = Some(position);
        buffer.clear();
        buffer.push_str(entry);
        Some(buffer.len())
    }

    pub fn is_active(&self) -> bool { self.current_position.is_some() }

    pub fn mode_exit(&mut self) {
        self.current_position = None;
        self.draft.clear();
    }

    /// Drop every entry.
    pub fn purge(&mut self) {
        self.entries.clear();
        self.mode_exit();
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> { self.entries.iter().map(String::as_str) }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn history_with(max_size: usize, lines: &[&str]) -> History {
        let mut history = History::new(max_size);
        for line in lines {
            history.put(line);
        }
        history
    }

    #[test]
    fn test_put_trims_and_ignores_empty_and_repeats() {
        let history = history_with(4, &["  ls  ", "", "   ", "ls", "pwd"]);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["pwd", "ls"]);
    }

    #[test]
    fn test_fifo_eviction_and_newest_to_oldest_recall() {
        let n = 3;
        let mut history = history_with(n, &["one", "two", "three", "four"]);
        assert_eq!(history.len(), n);

        let mut buffer = String::new();
        let mut recalled = vec![];
        for _ in 0..n {
            history.get(HistoryDirection::Up, &mut buffer);
            recalled.push(buffer.clone());
        }
        assert_eq!(recalled, vec!["four", "three", "two"]);

        // Stays on the oldest entry.
        assert_eq!(history.get(HistoryDirection::Up, &mut buffer), Some(3));
        assert_eq!(buffer, "two");
    }

    #[test]
    fn test_draft_is_restored() {
        let n = 3;
        let mut history = history_with(n, &["one", "two", "three"]);

        let mut buffer = String::from("partial");
        history.get(HistoryDirection::Up, &mut buffer);
        assert_eq!(buffer, "three");
        assert!(history.is_active());

        for _ in 0..n {
            history.get(HistoryDirection::Down, &mut buffer);
        }
        assert_eq!(buffer, "partial");
        assert!(!history.is_active());
    }

    #[test]
    fn test_down_outside_history_mode_is_noop() {
        let mut history = history_with(3, &["one"]);
        let mut buffer = String::from("live");
        assert_eq!(history.get(HistoryDirection::Down, &mut buffer), None);
        assert_eq!(buffer, "live");
    }

    #[test]
    fn test_up_with_empty_history_is_noop() {
        let mut history = History::default();
        let mut buffer = String::from("live");
        assert_eq!(history.get(HistoryDirection::Up, &mut buffer), None);
        assert!(!history.is_active());
    }

    #[test]
    fn test_mode_exit_keeps_selected_entry() {
        let mut history = history_with(3, &["one", "two"]);
        let mut buffer = String::from("draft");
        history.get(HistoryDirection::Up, &mut buffer);
        history.get(HistoryDirection::Up, &mut buffer);
        history.mode_exit();
        assert_eq!(buffer, "one");
        assert!(!history.is_active());

        // A fresh navigation backs up the live line again.
        history.get(HistoryDirection::Up, &mut buffer);
        history.get(HistoryDirection::Down, &mut buffer);
        assert_eq!(buffer, "one");
    }

    #[test]
    fn test_disabled_and_purge() {
        let mut history = history_with(0, &["one"]);
        assert!(history.is_empty());

        let mut history = history_with(2, &["one", "two"]);
        history.purge();
        assert!(history.is_empty());
    }
}
