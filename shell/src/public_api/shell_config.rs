// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{ARGC_MAX, CHANNEL_CAPACITY, CMD_BUFFER_CAPACITY, HISTORY_SIZE_DEFAULT, Size};

/// Everything that can be tuned when a [crate::Shell] is created. Start from
/// [ShellConfig::default] and override what you need with the `with_*` methods.
///
/// ```
/// use r3bl_shell::ShellConfig;
///
/// let config = ShellConfig::default()
///     .with_prompt("uart:~$ ")
///     .with_history_capacity(32)
///     .with_wildcards(false);
/// assert_eq!(config.prompt, "uart:~$ ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Printed in the info color in front of every line.
    pub prompt: String,
    /// Line buffer capacity, the line length always stays below it.
    pub cmd_buffer_capacity: usize,
    /// History entries, 0 disables history.
    pub history_capacity: usize,
    pub max_argc: usize,
    pub echo: bool,
    pub use_colors: bool,
    pub wildcards: bool,
    /// Ctrl-key shortcuts and `Esc b` / `Esc f`.
    pub metakeys: bool,
    /// Print the command's help after "wrong parameter count".
    pub help_on_wrong_argc: bool,
    pub terminal_size: Size,
    /// Log lines that can be queued before new ones are dropped.
    pub log_queue_capacity: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "$ ".into(),
            cmd_buffer_capacity: CMD_BUFFER_CAPACITY,
            history_capacity: HISTORY_SIZE_DEFAULT,
            max_argc: ARGC_MAX,
            echo: true,
            use_colors: true,
            wildcards: true,
            metakeys: true,
            help_on_wrong_argc: true,
            terminal_size: Size::default(),
            log_queue_capacity: CHANNEL_CAPACITY,
        }
    }
}

impl ShellConfig {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_cmd_buffer_capacity(mut self, capacity: usize) -> Self {
        self.cmd_buffer_capacity = capacity;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_max_argc(mut self, max_argc: usize) -> Self {
        self.max_argc = max_argc;
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn with_use_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_wildcards(mut self, wildcards: bool) -> Self {
        self.wildcards = wildcards;
        self
    }

    pub fn with_metakeys(mut self, metakeys: bool) -> Self {
        self.metakeys = metakeys;
        self
    }

    pub fn with_help_on_wrong_argc(mut self, help_on_wrong_argc: bool) -> Self {
        self.help_on_wrong_argc = help_on_wrong_argc;
        self
    }

    pub fn with_terminal_size(mut self, size: Size) -> Self {
        self.terminal_size = size;
        self
    }

    pub fn with_log_queue_capacity(mut self, capacity: usize) -> Self {
        self.log_queue_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.prompt, "$ ");
        assert_eq!(config.cmd_buffer_capacity, 128);
        assert_eq!(config.history_capacity, 16);
        assert_eq!(config.max_argc, 12);
        assert_eq!(config.terminal_size, Size::new(80, 24));
        assert_eq!(config.log_queue_capacity, 1_000);
        assert!(config.echo && config.use_colors && config.wildcards);
    }

    #[test]
    fn test_builder() {
        let config = ShellConfig::default()
            .with_echo(false)
            .with_max_argc(4)
            .with_terminal_size(Size::new(40, 10));
        assert!(!config.echo);
        assert_eq!(config.max_argc, 4);
        assert_eq!(config.terminal_size.width, 40);
    }
}
