// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use strum_macros::Display;

use super::line_buffer::is_printable;

pub mod ascii {
    pub const CTRL_A: u8 = 0x01;
    pub const CTRL_B: u8 = 0x02;
    pub const CTRL_C: u8 = 0x03;
    pub const CTRL_D: u8 = 0x04;
    pub const CTRL_E: u8 = 0x05;
    pub const CTRL_F: u8 = 0x06;
    pub const BACKSPACE: u8 = 0x08;
    pub const TAB: u8 = 0x09;
    pub const LF: u8 = 0x0A;
    pub const CTRL_K: u8 = 0x0B;
    pub const CTRL_L: u8 = 0x0C;
    pub const CR: u8 = 0x0D;
    pub const CTRL_U: u8 = 0x15;
    pub const CTRL_W: u8 = 0x17;
    pub const ESC: u8 = 0x1B;
    pub const DEL: u8 = 0x7F;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ReceiveState {
    #[default]
    Default,
    Esc,
    EscSeq,
    TildeExpansion,
}

/// What a key (one byte, or the last byte of an escape sequence) asks the shell to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Insert(u8),
    Submit,
    Tab,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    InsertToggle,
    WordLeft,
    WordRight,
    WordRemove,
    DeleteToEnd,
    ClearLine,
    ClearScreen,
    Cancel,
}

impl KeyAction {
    /// Keys that change the text of the line. These leave history mode.
    pub fn edits_text(&self) -> bool {
        matches!(
            self,
            KeyAction::Insert(_)
                | KeyAction::Backspace
                | KeyAction::Delete
                | KeyAction::WordRemove
                | KeyAction::DeleteToEnd
                | KeyAction::ClearLine
        )
    }
}

/// Turns the incoming byte stream into [KeyAction]s, one byte at a time.
///
/// ```text
/// Default --ESC--> Esc --'['--> EscSeq --'1'..'4'--> TildeExpansion --any--> Default
///                   |            |
///                   +--other--+  +--letter / other--> Default
///                             v
///                          Default
/// ```
///
/// CR and LF are de-duplicated, so `\r\n` (or `\n\r`) submits once, while `\r\r` submits
/// twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceiveStateMachine {
    pub state: ReceiveState,
    pub last_newline: Option<u8>,
}

impl ReceiveStateMachine {
    pub fn next(&mut self, byte: u8, metakeys: bool) -> KeyAction {
        if !byte.is_ascii() {
            return KeyAction::None;
        }

        match self.state {
            ReceiveState::Default => self.next_default(byte, metakeys),
            ReceiveState::Esc => {
                self.state = ReceiveState::Default;
                match byte {
                    b'[' => {
                        self.state = ReceiveState::EscSeq;
                        KeyAction::None
                    }
                    b'b' if metakeys => KeyAction::WordLeft,
                    b'f' if metakeys => KeyAction::WordRight,
                    _ => KeyAction::None,
                }
            }
            ReceiveState::EscSeq => {
                self.state = ReceiveState::Default;
                match byte {
                    b'A' => KeyAction::Up,
                    b'B' => KeyAction::Down,
                    b'C' => KeyAction::Right,
                    b'D' => KeyAction::Left,
                    b'F' => KeyAction::End,
                    b'H' => KeyAction::Home,
                    b'L' => KeyAction::InsertToggle,
                    b'1'..=b'4' => {
                        self.state = ReceiveState::TildeExpansion;
                        match byte {
                            b'1' => KeyAction::Home,
                            b'2' => KeyAction::InsertToggle,
                            b'3' => KeyAction::Delete,
                            _ => KeyAction::End,
                        }
                    }
                    _ => KeyAction::None,
                }
            }
            ReceiveState::TildeExpansion => {
                self.state = ReceiveState::Default;
                KeyAction::None
            }
        }
    }

    fn next_default(&mut self, byte: u8, metakeys: bool) -> KeyAction {
        if byte == ascii::CR || byte == ascii::LF {
            return match self.last_newline {
                Some(last) if last != byte => {
                    self.last_newline = None;
                    KeyAction::None
                }
                _ => {
                    self.last_newline = Some(byte);
                    KeyAction::Submit
                }
            };
        }
        self.last_newline = None;

        match byte {
            ascii::TAB => KeyAction::Tab,
            ascii::BACKSPACE | ascii::DEL => KeyAction::Backspace,
            ascii::ESC => {
                self.state = ReceiveState::Esc;
                KeyAction::None
            }
            it if is_printable(it) => KeyAction::Insert(it),
            it if metakeys => match it {
                ascii::CTRL_A => KeyAction::Home,
                ascii::CTRL_B => KeyAction::Left,
                ascii::CTRL_C => KeyAction::Cancel,
                ascii::CTRL_D => KeyAction::Delete,
                ascii::CTRL_E => KeyAction::End,
                ascii::CTRL_F => KeyAction::Right,
                ascii::CTRL_K => KeyAction::DeleteToEnd,
                ascii::CTRL_L => KeyAction::ClearScreen,
                ascii::CTRL_U => KeyAction::ClearLine,
                ascii::CTRL_W => KeyAction::WordRemove,
                _ => KeyAction::None,
            },
            _ => KeyAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    fn feed(bytes: &[u8]) -> Vec<KeyAction> {
        let mut machine = ReceiveStateMachine::default();
        bytes
            .iter()
            .map(|byte| machine.next(*byte, true))
            .filter(|action| *action != KeyAction::None)
            .collect()
    }

    #[test]
    fn test_printable_and_tab() {
        assert_eq!(
            feed(b"ab\t"),
            vec![KeyAction::Insert(b'a'), KeyAction::Insert(b'b'), KeyAction::Tab]
        );
    }

    #[test_case(b"\r\n", 1 ; "crlf")]
    #[test_case(b"\n\r", 1 ; "lfcr")]
    #[test_case(b"\r\r", 2 ; "two cr")]
    #[test_case(b"\n\n", 2 ; "two lf")]
    #[test_case(b"\r\na\r\n", 2 ; "two lines")]
    #[test_case(b"\r\n\r\n", 2 ; "two crlf")]
    #[test_case(b"\r\x1b[A\n", 2 ; "escape sequence between cr and lf")]
    fn test_newline_dedupe(bytes: &[u8], submits: usize) {
        let count = feed(bytes)
            .into_iter()
            .filter(|action| *action == KeyAction::Submit)
            .count();
        assert_eq!(count, submits);
    }

    #[test_case(b"\x1b[A", KeyAction::Up)]
    #[test_case(b"\x1b[B", KeyAction::Down)]
    #[test_case(b"\x1b[C", KeyAction::Right)]
    #[test_case(b"\x1b[D", KeyAction::Left)]
    #[test_case(b"\x1b[H", KeyAction::Home)]
    #[test_case(b"\x1b[F", KeyAction::End)]
    #[test_case(b"\x1b[L", KeyAction::InsertToggle)]
    #[test_case(b"\x1b[1~", KeyAction::Home)]
    #[test_case(b"\x1b[2~", KeyAction::InsertToggle)]
    #[test_case(b"\x1b[3~", KeyAction::Delete)]
    #[test_case(b"\x1b[4~", KeyAction::End)]
    #[test_case(b"\x1bb", KeyAction::WordLeft)]
    #[test_case(b"\x1bf", KeyAction::WordRight)]
    fn test_escape_sequences(bytes: &[u8], expected: KeyAction) {
        assert_eq!(feed(bytes), vec![expected]);
    }

    #[test]
    fn test_tilde_is_consumed() {
        let mut machine = ReceiveStateMachine::default();
        for byte in b"\x1b[3" {
            machine.next(*byte, true);
        }
        assert_eq!(machine.state, ReceiveState::TildeExpansion);
        assert_eq!(machine.next(b'~', true), KeyAction::None);
        assert_eq!(machine.state, ReceiveState::Default);
        assert_eq!(machine.next(b'x', true), KeyAction::Insert(b'x'));
    }

    #[test]
    fn test_unknown_escape_returns_to_default() {
        assert_eq!(feed(b"\x1bzq"), vec![KeyAction::Insert(b'q')]);
        assert_eq!(feed(b"\x1b[zq"), vec![KeyAction::Insert(b'q')]);
    }

    #[test]
    fn test_high_bit_bytes_are_dropped() {
        let mut machine = ReceiveStateMachine::default();
        machine.next(ascii::ESC, true);
        assert_eq!(machine.next(0xC3, true), KeyAction::None);
        // The escape sequence is still in progress.
        assert_eq!(machine.state, ReceiveState::Esc);
    }

    #[test]
    fn test_backspace_variants() {
        assert_eq!(
            feed(&[ascii::BACKSPACE, ascii::DEL]),
            vec![KeyAction::Backspace, KeyAction::Backspace]
        );
    }

    #[test_case(ascii::CTRL_A, KeyAction::Home)]
    #[test_case(ascii::CTRL_B, KeyAction::Left)]
    #[test_case(ascii::CTRL_C, KeyAction::Cancel)]
    #[test_case(ascii::CTRL_D, KeyAction::Delete)]
    #[test_case(ascii::CTRL_E, KeyAction::End)]
    #[test_case(ascii::CTRL_F, KeyAction::Right)]
    #[test_case(ascii::CTRL_K, KeyAction::DeleteToEnd)]
    #[test_case(ascii::CTRL_L, KeyAction::ClearScreen)]
    #[test_case(ascii::CTRL_U, KeyAction::ClearLine)]
    #[test_case(ascii::CTRL_W, KeyAction::WordRemove)]
    fn test_meta_keys(byte: u8, expected: KeyAction) {
        let mut machine = ReceiveStateMachine::default();
        assert_eq!(machine.next(byte, true), expected);
        assert_eq!(machine.next(byte, false), KeyAction::None);
    }
}
