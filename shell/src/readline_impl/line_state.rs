// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io::{self, Write};

use crossterm::{QueueableCommand,
                cursor,
                terminal::{Clear, ClearType}};
use strum_macros::Display;

use super::{KeyAction, LineBuffer, Size, TerminalCons, WordDirection};
use crate::{ShellColor, VtColors};

/// Is the prompt on screen, or is a command running?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LineStateLiveness {
    /// The prompt and the line being edited are on screen, output from other tasks has to
    /// erase them first and redraw them afterwards.
    Prompting,
    /// A handler is running. Its output (and log lines) are written as is.
    Executing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellFlags {
    pub echo: bool,
    /// When set, typing over existing text replaces it instead of shifting it right.
    pub insert_mode: bool,
    pub use_colors: bool,
}

impl Default for ShellFlags {
    fn default() -> Self {
        Self {
            echo: true,
            insert_mode: false,
            use_colors: true,
        }
    }
}

/// With echo off the buffer is still edited, but nothing is written to the terminal.
macro_rules! early_return_if_echo_off {
    ($self:ident) => {
        if !$self.flags.echo {
            return Ok(());
        }
    };
}

/// The line editor. It owns the [LineBuffer] and keeps the terminal in sync with it.
///
/// The invariant this maintains is that the terminal cursor is always drawn at
/// `cons.position_of(buffer.cursor())`, relative to the row the prompt starts on. Every
/// edit re-renders only the suffix of the line starting at the edit point, and then moves
/// the terminal cursor back using the [TerminalCons] model.
///
/// The terminal is any [Write] implementation, commands are queued into it with
/// [crossterm::QueueableCommand] and the caller flushes it.
#[derive(Debug)]
pub struct LineState {
    pub buffer: LineBuffer,
    pub cons: TerminalCons,
    pub prompt: String,
    pub flags: ShellFlags,
    pub colors: VtColors,
    pub liveness: LineStateLiveness,
}

impl LineState {
    pub fn new(prompt: String, capacity: usize, size: Size, flags: ShellFlags) -> Self {
        Self {
            buffer: LineBuffer::new(capacity),
            cons: TerminalCons::new(size, prompt.len()),
            prompt,
            flags,
            colors: VtColors::default(),
            liveness: LineStateLiveness::Prompting,
        }
    }

    pub fn set_prompt(&mut self, prompt: String) {
        self.cons.prompt_len = prompt.len();
        self.prompt = prompt;
    }

    pub fn set_size(&mut self, size: Size) { self.cons.size = size; }

    pub fn set_color(&mut self, term: &mut dyn Write, color: ShellColor) -> io::Result<()> {
        if !self.flags.use_colors {
            return Ok(());
        }
        self.colors.set_fg(term, color)
    }

    /// Turn colors on or off. Turning them off resets the terminal colors first.
    pub fn set_use_colors(&mut self, term: &mut dyn Write, use_colors: bool) -> io::Result<()> {
        if self.flags.use_colors && !use_colors {
            self.colors.reset(term)?;
        }
        self.flags.use_colors = use_colors;
        Ok(())
    }

    /// Apply an editing key. Keys that need more than the line editor (Enter, Tab,
    /// history, Ctrl-C) are handled by the [crate::Shell] and are ignored here.
    pub fn apply_key(&mut self, term: &mut dyn Write, action: KeyAction) -> io::Result<()> {
        match action {
            KeyAction::Insert(byte) => self.insert_char(term, byte),
            KeyAction::Backspace => self.backspace(term),
            KeyAction::Delete => self.delete(term),
            KeyAction::Left => self.move_with(term, |it| {
                it.move_cursor(-1);
            }),
            KeyAction::Right => self.move_with(term, |it| {
                it.move_cursor(1);
            }),
            KeyAction::Home => self.move_with(term, LineBuffer::home),
            KeyAction::End => self.move_with(term, LineBuffer::end),
            KeyAction::WordLeft => {
                self.move_with(term, |it| it.word_move(WordDirection::Left))
            }
            KeyAction::WordRight => {
                self.move_with(term, |it| it.word_move(WordDirection::Right))
            }
            KeyAction::InsertToggle => {
                self.flags.insert_mode = !self.flags.insert_mode;
                Ok(())
            }
            KeyAction::WordRemove => self.word_remove(term),
            KeyAction::DeleteToEnd => self.delete_to_end(term),
            KeyAction::ClearLine => self.clear_line(term),
            KeyAction::ClearScreen => self.clear_screen(term),
            KeyAction::None
            | KeyAction::Submit
            | KeyAction::Tab
            | KeyAction::Up
            | KeyAction::Down
            | KeyAction::Cancel => Ok(()),
        }
    }

    pub fn insert_char(&mut self, term: &mut dyn Write, byte: u8) -> io::Result<()> {
        self.insert_byte(term, byte, self.flags.insert_mode)
    }

    /// Like [LineState::insert_char], but ignores the insert mode flag.
    pub fn insert_byte(
        &mut self,
        term: &mut dyn Write,
        byte: u8,
        overwrite: bool,
    ) -> io::Result<()> {
        let pos = self.buffer.cursor();
        if !self.buffer.insert(pos, byte, overwrite) {
            return Ok(());
        }
        early_return_if_echo_off!(self);
        self.repaint_from(term, pos, false)
    }

    /// Insert text at the cursor (eg: a completion). Returns how many bytes fit.
    pub fn insert_str(&mut self, term: &mut dyn Write, text: &str) -> io::Result<usize> {
        let pos = self.buffer.cursor();
        let count = self.buffer.insert_str(text);
        if count > 0 && self.flags.echo {
            self.repaint_from(term, pos, false)?;
        }
        Ok(count)
    }

    pub fn backspace(&mut self, term: &mut dyn Write) -> io::Result<()> {
        let pos = self.buffer.cursor();
        if !self.buffer.backspace(pos) {
            return Ok(());
        }
        early_return_if_echo_off!(self);
        self.cons.queue_move_between(term, pos, pos - 1)?;
        self.repaint_from(term, pos - 1, true)
    }

    pub fn delete(&mut self, term: &mut dyn Write) -> io::Result<()> {
        let pos = self.buffer.cursor();
        if !self.buffer.delete(pos) {
            return Ok(());
        }
        early_return_if_echo_off!(self);
        self.repaint_from(term, pos, true)
    }

    pub fn word_remove(&mut self, term: &mut dyn Write) -> io::Result<()> {
        let old = self.buffer.cursor();
        if self.buffer.word_remove() == 0 {
            return Ok(());
        }
        early_return_if_echo_off!(self);
        let new = self.buffer.cursor();
        self.cons.queue_move_between(term, old, new)?;
        self.repaint_from(term, new, true)
    }

    pub fn delete_to_end(&mut self, term: &mut dyn Write) -> io::Result<()> {
        if self.buffer.delete_to_end() == 0 {
            return Ok(());
        }
        early_return_if_echo_off!(self);
        self.repaint_from(term, self.buffer.cursor(), true)
    }

    pub fn clear_line(&mut self, term: &mut dyn Write) -> io::Result<()> {
        self.replace_line(term, "")
    }

    /// Swap the whole line (eg: for a history entry). The cursor ends up at the end.
    pub fn replace_line(&mut self, term: &mut dyn Write, line: &str) -> io::Result<()> {
        let old = self.buffer.cursor();
        self.buffer.replace(line);
        early_return_if_echo_off!(self);
        self.cons.queue_move_between(term, old, 0)?;
        self.repaint_from(term, 0, true)
    }

    /// Move the cursor by running `mutate` on the buffer, then move the terminal cursor
    /// to match.
    pub fn move_with(
        &mut self,
        term: &mut dyn Write,
        mutate: impl FnOnce(&mut LineBuffer),
    ) -> io::Result<()> {
        let old = self.buffer.cursor();
        mutate(&mut self.buffer);
        early_return_if_echo_off!(self);
        self.cons.queue_move_between(term, old, self.buffer.cursor())
    }

    /// The terminal cursor must be at the screen position of `from`. Writes the text from
    /// `from` to the end of the line, clears whatever was drawn after it if the line
    /// `shrank`, and moves the terminal cursor back to the buffer cursor.
    fn repaint_from(&mut self, term: &mut dyn Write, from: usize, shrank: bool) -> io::Result<()> {
        let len = self.buffer.len();
        let suffix = &self.buffer.as_str()[from..];
        term.write_all(suffix.as_bytes())?;
        // The terminal holds the cursor on the last column after it fills a row, so step
        // onto the next row explicitly.
        if !suffix.is_empty() && self.cons.position_of(len).col == 0 {
            term.write_all(b"\r\n")?;
        }
        if shrank {
            term.queue(Clear(ClearType::FromCursorDown))?;
        }
        self.cons.queue_move_between(term, len, self.buffer.cursor())
    }

    /// Draw the prompt and the whole line, starting at column 0 of the current row, and
    /// put the terminal cursor on the buffer cursor.
    pub fn render_with_prompt(&mut self, term: &mut dyn Write) -> io::Result<()> {
        early_return_if_echo_off!(self);
        self.set_color(term, ShellColor::INFO)?;
        term.write_all(self.prompt.as_bytes())?;
        self.set_color(term, ShellColor::NORMAL)?;
        let len = self.buffer.len();
        term.write_all(self.buffer.as_str().as_bytes())?;
        if self.prompt.len() + len > 0 && self.cons.position_of(len).col == 0 {
            term.write_all(b"\r\n")?;
        }
        self.cons.queue_move_between(term, len, self.buffer.cursor())
    }

    /// Remove the prompt and the line from the screen, leaving the terminal cursor at
    /// column 0 of the row the prompt started on.
    pub fn erase(&mut self, term: &mut dyn Write) -> io::Result<()> {
        early_return_if_echo_off!(self);
        let row = self.cons.position_of(self.buffer.cursor()).row;
        if row > 0 {
            term.queue(cursor::MoveUp(u16::try_from(row).unwrap_or(u16::MAX)))?;
        }
        term.queue(cursor::MoveToColumn(0))?;
        term.queue(Clear(ClearType::FromCursorDown))?;
        Ok(())
    }

    /// Start editing a fresh line.
    pub fn new_prompt(&mut self, term: &mut dyn Write) -> io::Result<()> {
        self.buffer.clear();
        self.liveness = LineStateLiveness::Prompting;
        self.render_with_prompt(term)
    }

    /// Ctrl-C: leave the line on screen as typed and start a fresh one below it.
    pub fn cancel(&mut self, term: &mut dyn Write) -> io::Result<()> {
        self.finish_line(term)?;
        self.new_prompt(term)
    }

    /// Enter: put the cursor below the line so whatever runs next prints on a fresh row.
    pub fn finish_line(&mut self, term: &mut dyn Write) -> io::Result<()> {
        self.liveness = LineStateLiveness::Executing;
        early_return_if_echo_off!(self);
        let len = self.buffer.len();
        self.cons.queue_move_between(term, self.buffer.cursor(), len)?;
        if self.cons.position_of(len).col != 0 {
            term.write_all(b"\r\n")?;
        }
        Ok(())
    }

    /// Cursor home and clear the screen. The prompt is redrawn if it was showing.
    pub fn clear_screen(&mut self, term: &mut dyn Write) -> io::Result<()> {
        term.queue(cursor::MoveTo(0, 0))?;
        term.queue(Clear(ClearType::All))?;
        match self.liveness {
            LineStateLiveness::Prompting => self.render_with_prompt(term),
            LineStateLiveness::Executing => Ok(()),
        }
    }

    /// Output from a handler. It is printed in `color`, `\n` is sent as `\r\n`, and the
    /// previous color is restored afterwards.
    pub fn print_colored(
        &mut self,
        term: &mut dyn Write,
        color: ShellColor,
        text: &str,
    ) -> io::Result<()> {
        let previous = self.colors.fg;
        self.set_color(term, color)?;
        write_crlf(term, text.as_bytes())?;
        self.set_color(term, previous)
    }

    /// Output from another task (a log line). While prompting this erases the prompt and
    /// the line, prints `data` (and a warning first, if `lost` lines were dropped since
    /// the last delivery), then redraws the prompt and the line.
    pub fn print_log(&mut self, term: &mut dyn Write, data: &[u8], lost: usize) -> io::Result<()> {
        let redraw = self.flags.echo && self.liveness == LineStateLiveness::Prompting;
        if redraw {
            self.erase(term)?;
        }

        if lost > 0 {
            let warning = format!("Lost logs: {lost} - increase log queue size.\n");
            self.print_colored(term, ShellColor::ERROR, &warning)?;
        }
        self.set_color(term, ShellColor::NORMAL)?;
        write_crlf(term, data)?;
        if redraw && !data.ends_with(b"\n") {
            term.write_all(b"\r\n")?;
        }

        if redraw {
            self.render_with_prompt(term)?;
        }
        Ok(())
    }
}

/// Write `data` translating lone `\n` into `\r\n`, since the terminal is in raw mode.
pub fn write_crlf(term: &mut dyn Write, data: &[u8]) -> io::Result<()> {
    let mut previous = 0_u8;
    let mut start = 0;
    for (index, byte) in data.iter().enumerate() {
        if *byte == b'\n' && previous != b'\r' {
            term.write_all(&data[start..index])?;
            term.write_all(b"\r")?;
            start = index;
        }
        previous = *byte;
    }
    term.write_all(&data[start..])
}
