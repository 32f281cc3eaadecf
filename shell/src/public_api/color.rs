// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io::{self, Write};

use crossterm::{QueueableCommand,
                style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor}};
use strum_macros::{Display, EnumIter, EnumString};

/// The 8 basic VT100 colors plus the terminal's own default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ShellColor {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl ShellColor {
    pub const NORMAL: Self = Self::Default;
    pub const INFO: Self = Self::Green;
    pub const OPTION: Self = Self::Cyan;
    pub const WARNING: Self = Self::Yellow;
    pub const ERROR: Self = Self::Red;

    /// `None` for [ShellColor::Default], which is emitted as a reset.
    pub fn as_crossterm_color(self) -> Option<Color> {
        match self {
            ShellColor::Default => None,
            ShellColor::Black => Some(Color::Black),
            ShellColor::Red => Some(Color::DarkRed),
            ShellColor::Green => Some(Color::DarkGreen),
            ShellColor::Yellow => Some(Color::DarkYellow),
            ShellColor::Blue => Some(Color::DarkBlue),
            ShellColor::Magenta => Some(Color::DarkMagenta),
            ShellColor::Cyan => Some(Color::DarkCyan),
            ShellColor::White => Some(Color::Grey),
        }
    }
}

/// The colors the terminal is currently set to. Escape sequences are only queued when a
/// color actually changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VtColors {
    pub fg: ShellColor,
    pub bg: ShellColor,
}

impl VtColors {
    pub fn set_fg(&mut self, term: &mut dyn Write, color: ShellColor) -> io::Result<()> {
        if self.fg == color {
            return Ok(());
        }
        self.fg = color;
        match color.as_crossterm_color() {
            Some(it) => {
                term.queue(SetForegroundColor(it))?;
            }
            None => {
                // A reset also drops the background, so put it back.
                term.queue(ResetColor)?;
                if let Some(bg) = self.bg.as_crossterm_color() {
                    term.queue(SetBackgroundColor(bg))?;
                }
            }
        }
        Ok(())
    }

    pub fn set_bg(&mut self, term: &mut dyn Write, color: ShellColor) -> io::Result<()> {
        if self.bg == color {
            return Ok(());
        }
        self.bg = color;
        term.queue(SetBackgroundColor(
            color.as_crossterm_color().unwrap_or(Color::Reset),
        ))?;
        Ok(())
    }

    /// Forget what the terminal is set to (eg: after colors were switched off), so the
    /// next change is always emitted.
    pub fn reset(&mut self, term: &mut dyn Write) -> io::Result<()> {
        *self = Self::default();
        term.queue(ResetColor)?;
        Ok(())
    }
}
