// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io::Write, thread, time::Duration};

use crossterm::{QueueableCommand, cursor};

use crate::{CommandNode, CommandTree, History, LogStats, ShellColor, ShellConfig, ShellOutput,
            Size, TERMINAL_SIZE_MAX, Transport, help, ok};

/// Empty reads of the transport before giving up on a cursor position report.
pub const CURSOR_REPORT_POLL_MAX: usize = 50;
pub const CURSOR_REPORT_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// What a command handler gets to work with. All output goes through [ShellOutput], so it
/// never clashes with log lines printed by other tasks.
#[derive(Debug)]
pub struct ShellContext<'a> {
    pub output: &'a ShellOutput,
    pub tree: &'a CommandTree,
    pub history: &'a History,
    pub config: &'a ShellConfig,
    pub log_stats: &'a LogStats,
    pub last_retval: i32,
    /// The node whose handler is running.
    pub current: Option<CommandNode>,
}

impl ShellContext<'_> {
    pub fn print(&self, color: ShellColor, text: &str) {
        if let Err(error) = self.output.print(color, text) {
            tracing::warn!(?error, "failed to print command output");
        }
    }

    pub fn println(&self, color: ShellColor, text: &str) {
        self.print(color, &format!("{text}\n"));
    }

    pub fn info(&self, text: &str) { self.println(ShellColor::INFO, text); }

    pub fn warn(&self, text: &str) { self.println(ShellColor::WARNING, text); }

    pub fn error(&self, text: &str) { self.println(ShellColor::ERROR, text); }

    /// Help for the command being executed.
    pub fn print_help(&self) {
        if let Some(node) = &self.current {
            self.print_help_for(node);
        }
    }

    pub fn print_help_for(&self, node: &CommandNode) {
        self.print(ShellColor::NORMAL, &help::format_help(node, self.width()));
    }

    /// Every root command with its help text.
    pub fn print_command_list(&self) {
        self.print(
            ShellColor::NORMAL,
            &help::format_command_list(self.tree.root(), self.width()),
        );
    }

    pub fn echo(&self) -> bool { self.output.safe_line_state.lock().unwrap().flags.echo }

    pub fn set_echo(&self, echo: bool) {
        self.output.safe_line_state.lock().unwrap().flags.echo = echo;
    }

    pub fn use_colors(&self) -> bool {
        self.output.safe_line_state.lock().unwrap().flags.use_colors
    }

    pub fn set_use_colors(&self, use_colors: bool) {
        let result = self
            .output
            .with_term(|line_state, term| line_state.set_use_colors(term, use_colors));
        if let Err(error) = result {
            tracing::warn!(?error, "failed to reset colors");
        }
    }

    pub fn clear_screen(&self) {
        if let Err(error) = self
            .output
            .with_term(|line_state, term| line_state.clear_screen(term))
        {
            tracing::warn!(?error, "failed to clear screen");
        }
    }

    /// Newest first.
    pub fn history(&self) -> &History { self.history }

    pub fn terminal_size(&self) -> Size { self.output.safe_line_state.lock().unwrap().cons.size }

    pub fn set_terminal_size(&self, size: Size) {
        self.output.safe_line_state.lock().unwrap().set_size(size);
    }

    pub fn last_retval(&self) -> i32 { self.last_retval }

    /// Log lines dropped because the log channel was full.
    pub fn log_stats(&self) -> usize { self.log_stats.lost_total() }

    pub fn reset_log_stats(&self) { self.log_stats.reset(); }

    /// Ask the terminal how big it is.
    ///
    /// 1. Ask for the cursor position (`ESC[6n`), which also tells whether anything on the
    ///    other end answers at all.
    /// 2. Move the cursor [TERMINAL_SIZE_MAX] columns right and rows down. The terminal
    ///    stops it at the bottom right corner.
    /// 3. Ask for the cursor position again, which is now the size of the screen.
    /// 4. Put the cursor back where it was.
    ///
    /// Returns `None` if the terminal doesn't answer. Bytes read while waiting for an
    /// answer are not seen by the line editor.
    ///
    /// This blocks the calling thread while it polls the transport, up to
    /// [CURSOR_REPORT_POLL_MAX] times [CURSOR_REPORT_POLL_INTERVAL] for each of the two
    /// reports. Handlers run on the task that calls [crate::Shell::run], so on a tokio
    /// runtime this holds up a worker thread for that long.
    pub fn query_terminal_size(&self) -> Option<Size> {
        let (row, col) = self.query_cursor_position()?;

        let moved = self.output.with_term(|_, term| {
            term.queue(cursor::MoveDown(TERMINAL_SIZE_MAX))?;
            term.queue(cursor::MoveRight(TERMINAL_SIZE_MAX))?;
            ok!()
        });
        if moved.is_err() {
            return None;
        }
        let corner = self.query_cursor_position();

        let restored = self.output.with_term(|_, term| {
            term.queue(cursor::MoveTo(col.saturating_sub(1), row.saturating_sub(1)))?;
            ok!()
        });
        if let Err(error) = restored {
            tracing::warn!(?error, "failed to restore cursor");
        }

        let (height, width) = corner?;
        tracing::debug!(width, height, "terminal size reported");
        Some(Size::new(width, height))
    }

    /// One based `(row, col)` from a cursor position report.
    fn query_cursor_position(&self) -> Option<(u16, u16)> {
        self.output
            .with_term(|_, term| term.write_all(b"\x1b[6n"))
            .ok()?;

        // One byte at a time, so nothing after the `R` is consumed.
        let mut reply = Vec::new();
        let mut idle_polls = 0;
        while idle_polls < CURSOR_REPORT_POLL_MAX {
            let mut byte = [0_u8; 1];
            let count = self
                .output
                .safe_transport
                .lock()
                .unwrap()
                .read(&mut byte)
                .ok()?;
            if count == 0 {
                idle_polls += 1;
                thread::sleep(CURSOR_REPORT_POLL_INTERVAL);
                continue;
            }
            reply.push(byte[0]);
            if byte[0] == b'R' {
                match parse_cursor_position(&reply) {
                    Some(position) => return Some(position),
                    None => reply.clear(),
                }
            }
        }
        None
    }

    fn width(&self) -> usize { usize::from(self.terminal_size().width) }
}

/// Find `ESC [ <row> ; <col> R` in `reply`.
pub fn parse_cursor_position(reply: &[u8]) -> Option<(u16, u16)> {
    let start = reply.windows(2).position(|it| it == b"\x1b[")? + 2;
    let rest = &reply[start..];
    let end = rest.iter().position(|it| *it == b'R')?;
    let text = std::str::from_utf8(&rest[..end]).ok()?;
    let (row, col) = text.split_once(';')?;
    Some((row.parse().ok()?, col.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(b"\x1b[24;80R", Some((24, 80)))]
    #[test_case(b"junk\x1b[3;7Rmore", Some((3, 7)))]
    #[test_case(b"\x1b[24;80", None ; "incomplete")]
    #[test_case(b"\x1b[x;80R", None ; "not a number")]
    fn test_parse_cursor_position(reply: &[u8], expected: Option<(u16, u16)>) {
        assert_eq!(parse_cursor_position(reply), expected);
    }
}
