// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::CMD_BUFFER_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordDirection {
    Left,
    Right,
}

/// The text of the command line and the insertion point. This only knows about bytes and
/// offsets, rendering is done by [`crate::LineState`].
///
/// - The text only ever holds printable ASCII, so byte offsets and columns are the same.
/// - `len() < capacity()` always holds, an insert that would break this is denied and the
///   caller is told by a `false` return value (it is not an error).
/// - `0 <= cursor() <= len()` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    text: String,
    cursor: usize,
    capacity: usize,
}

impl Default for LineBuffer {
    fn default() -> Self { Self::new(CMD_BUFFER_CAPACITY) }
}

impl LineBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            text: String::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    pub fn as_str(&self) -> &str { &self.text }

    pub fn len(&self) -> usize { self.text.len() }

    pub fn is_empty(&self) -> bool { self.text.is_empty() }

    pub fn cursor(&self) -> usize { self.cursor }

    pub fn capacity(&self) -> usize { self.capacity }

    /// How many more bytes fit before the buffer is full.
    pub fn remaining(&self) -> usize { self.capacity - 1 - self.len() }

    pub fn byte_at(&self, pos: usize) -> Option<u8> { self.text.as_bytes().get(pos).copied() }

    /// The text before the cursor.
    pub fn before_cursor(&self) -> &str { &self.text[..self.cursor] }

    /// Put `byte` at `pos` and leave the cursor right after it. With `overwrite` the byte
    /// under `pos` is replaced (unless `pos` is the end of the line), otherwise the text
    /// from `pos` onward shifts right.
    ///
    /// Returns `false` and changes nothing if the line would grow past its capacity, or if
    /// `byte` isn't printable ASCII.
    pub fn insert(&mut self, pos: usize, byte: u8, overwrite: bool) -> bool {
        if !is_printable(byte) || pos > self.len() {
            return false;
        }
        let ch = char::from(byte);
        if overwrite && pos < self.len() {
            self.text.replace_range(pos..pos + 1, ch.encode_utf8(&mut [0; 4]));
        } else {
            if self.remaining() == 0 {
                return false;
            }
            self.text.insert(pos, ch);
        }
        self.cursor = pos + 1;
        true
    }

    /// Remove the byte under `pos`, the cursor lands on `pos`.
    pub fn delete(&mut self, pos: usize) -> bool {
        if pos >= self.len() {
            return false;
        }
        self.text.remove(pos);
        self.cursor = pos;
        true
    }

    /// Remove the byte before `pos`, the cursor lands on `pos - 1`.
    pub fn backspace(&mut self, pos: usize) -> bool {
        if pos == 0 || pos > self.len() {
            return false;
        }
        self.delete(pos - 1)
    }

    /// Move the cursor by `delta`, clamped to the text. Returns the distance moved.
    pub fn move_cursor(&mut self, delta: isize) -> isize {
        let old = self.cursor;
        self.cursor = self.cursor.saturating_add_signed(delta).min(self.len());
        self.cursor as isize - old as isize
    }

    pub fn home(&mut self) { self.cursor = 0; }

    pub fn end(&mut self) { self.cursor = self.len(); }

    /// Jump over a word. Going left skips the spaces before the cursor, then the word in
    /// front of them, landing on its first character. Going right skips the rest of the
    /// current word, then the spaces after it, landing on the first character of the next
    /// word (or the end of the line).
    pub fn word_move(&mut self, direction: WordDirection) {
        let bytes = self.text.as_bytes();
        let mut pos = self.cursor;
        match direction {
            WordDirection::Left => {
                while pos > 0 && bytes[pos - 1] == b' ' {
                    pos -= 1;
                }
                while pos > 0 && bytes[pos - 1] != b' ' {
                    pos -= 1;
                }
            }
            WordDirection::Right => {
                while pos < bytes.len() && bytes[pos] != b' ' {
                    pos += 1;
                }
                while pos < bytes.len() && bytes[pos] == b' ' {
                    pos += 1;
                }
            }
        }
        self.cursor = pos;
    }

    /// Delete backward from the cursor through the run of non-space characters, then
    /// through the run of spaces in front of it. No-op at the start of the line. Returns
    /// how many bytes were removed.
    pub fn word_remove(&mut self) -> usize {
        let bytes = self.text.as_bytes();
        let mut start = self.cursor;
        while start > 0 && bytes[start - 1] != b' ' {
            start -= 1;
        }
        while start > 0 && bytes[start - 1] == b' ' {
            start -= 1;
        }
        let removed = self.cursor - start;
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        removed
    }

    /// Remove everything from the cursor to the end of the line.
    pub fn delete_to_end(&mut self) -> usize {
        let removed = self.len() - self.cursor;
        self.text.truncate(self.cursor);
        removed
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Replace the whole line (eg: with a history entry), truncated to fit. The cursor
    /// goes to the end.
    pub fn replace(&mut self, line: &str) {
        self.clear();
        self.text.extend(
            line.bytes()
                .filter(|byte| is_printable(*byte))
                .take(self.capacity - 1)
                .map(char::from),
        );
        self.cursor = self.len();
    }

    /// Insert `text` at the cursor, shifting the rest of the line. Stops when the line is
    /// full. Returns how many bytes went in.
    pub fn insert_str(&mut self, text: &str) -> usize {
        let mut count = 0;
        for byte in text.bytes() {
            if !self.insert(self.cursor, byte, false) {
                break;
            }
            count += 1;
        }
        count
    }
}

pub fn is_printable(byte: u8) -> bool { (b' '..=b'~').contains(&byte) }
