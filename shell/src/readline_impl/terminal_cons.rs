// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{cmp::Ordering,
          io::{self, Write}};

use crossterm::{QueueableCommand, cursor};

pub const TERMINAL_WIDTH_DEFAULT: u16 = 80;
pub const TERMINAL_HEIGHT_DEFAULT: u16 = 24;
/// Cursor moves used to probe the bottom right corner of the screen are clamped by the
/// terminal, so moving this far is enough to reach it.
pub const TERMINAL_SIZE_MAX: u16 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: TERMINAL_WIDTH_DEFAULT,
            height: TERMINAL_HEIGHT_DEFAULT,
        }
    }
}

impl Size {
    pub fn new(width: u16, height: u16) -> Self { Self { width, height } }
}

/// 0 based row and column, relative to the row where the prompt starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenPos {
    pub row: usize,
    pub col: usize,
}

/// The terminal model. Nothing that depends on the cursor is stored here, every screen
/// position is computed from a buffer offset when it is needed, so it can't go stale
/// across an edit.
///
/// The prompt occupies the first `prompt_len` columns of the first row, and the buffer
/// text follows it, wrapping at `size.width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalCons {
    pub size: Size,
    pub prompt_len: usize,
}

impl TerminalCons {
    pub fn new(size: Size, prompt_len: usize) -> Self { Self { size, prompt_len } }

    fn width(&self) -> usize { usize::from(self.size.width.max(1)) }

    /// Where the character at `offset` in the buffer is drawn.
    pub fn position_of(&self, offset: usize) -> ScreenPos {
        let absolute = offset + self.prompt_len;
        ScreenPos {
            row: absolute / self.width(),
            col: absolute % self.width(),
        }
    }

    /// Number of rows between two buffer offsets, positive when `to` is below `from`.
    pub fn row_span(&self, from: usize, to: usize) -> isize {
        self.position_of(to).row as isize - self.position_of(from).row as isize
    }

    /// Number of columns between two buffer offsets, positive when `to` is to the right.
    pub fn col_span(&self, from: usize, to: usize) -> isize {
        self.position_of(to).col as isize - self.position_of(from).col as isize
    }

    /// Queue the relative cursor move that goes from the screen position of buffer offset
    /// `from` to the one of `to`.
    pub fn queue_move_between(
        &self,
        term: &mut dyn Write,
        from: usize,
        to: usize,
    ) -> io::Result<()> {
        queue_move_by(term, self.row_span(from, to), self.col_span(from, to))
    }
}

/// Queue a relative cursor move. Zero counts are skipped since `CSI 0 A` and friends move
/// by one on most terminals.
pub fn queue_move_by(term: &mut dyn Write, rows: isize, cols: isize) -> io::Result<()> {
    match rows.cmp(&0) {
        Ordering::Less => {
            term.queue(cursor::MoveUp(saturate(-rows)))?;
        }
        Ordering::Greater => {
            term.queue(cursor::MoveDown(saturate(rows)))?;
        }
        Ordering::Equal => {}
    }
    match cols.cmp(&0) {
        Ordering::Less => {
            term.queue(cursor::MoveLeft(saturate(-cols)))?;
        }
        Ordering::Greater => {
            term.queue(cursor::MoveRight(saturate(cols)))?;
        }
        Ordering::Equal => {}
    }
    Ok(())
}

fn saturate(count: isize) -> u16 { u16::try_from(count).unwrap_or(u16::MAX) }

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(0, 0, 2 ; "first char follows the prompt")]
    #[test_case(77, 0, 79 ; "last column of the first row")]
    #[test_case(78, 1, 0 ; "wraps to the second row")]
    #[test_case(160, 2, 2 ; "third row")]
    fn test_position_of(offset: usize, row: usize, col: usize) {
        let cons = TerminalCons::new(Size::default(), 2);
        assert_eq!(cons.position_of(offset), ScreenPos { row, col });
    }

    #[test]
    fn test_spans() {
        let cons = TerminalCons::new(Size::new(10, 5), 2);
        assert_eq!(cons.row_span(0, 8), 1);
        assert_eq!(cons.col_span(0, 8), -2);
        assert_eq!(cons.row_span(8, 0), -1);
        assert_eq!(cons.col_span(3, 3), 0);
    }

    #[test]
    fn test_queue_move_skips_zero_counts() {
        let mut out: Vec<u8> = vec![];
        queue_move_by(&mut out, 0, 0).unwrap();
        assert!(out.is_empty());

        queue_move_by(&mut out, -1, 3).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\x1b[1A\x1b[3C");
    }

    #[test]
    fn test_queue_move_between_across_wrap() {
        let cons = TerminalCons::new(Size::new(10, 5), 2);
        let mut out: Vec<u8> = vec![];
        // Offset 8 is row 1 col 0, offset 3 is row 0 col 5.
        cons.queue_move_between(&mut out, 8, 3).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\x1b[1A\x1b[5C");
    }
}
