// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io;

use crate::ShellState;

/// Errors that end up in the caller of the [crate::Shell] API.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ShellError {
    #[error(transparent)]
    #[diagnostic(code(r3bl_shell::io))]
    IO(#[from] io::Error),

    #[error("shell is {actual}, expected it to be {expected}")]
    #[diagnostic(code(r3bl_shell::invalid_state))]
    InvalidState {
        expected: ShellState,
        actual: ShellState,
    },

    #[error("command `{0}` is registered more than once")]
    #[diagnostic(
        code(r3bl_shell::duplicate_command),
        help("root command names must be unique")
    )]
    DuplicateCommand(String),

    #[error("command has an empty syntax")]
    #[diagnostic(code(r3bl_shell::empty_syntax))]
    EmptySyntax,
}

/// A command line that could not be dispatched. The `Display` text is what the user sees
/// (printed in the error color), the shell keeps running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("not terminated: {0}")]
    UnterminatedQuote(char),

    #[error("{0}: command not found")]
    NotFound(String),

    #[error("{command}: unknown parameter: {param}")]
    UnknownParameter { command: String, param: String },

    #[error("{0}: wrong parameter count")]
    WrongArgCount(String),

    #[error("Error: requested multiple function executions")]
    MultipleExecution,

    #[error("Please specify a subcommand.")]
    SpecifySubcommand,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_command_error_text() {
        assert_eq!(
            CommandError::UnterminatedQuote('"').to_string(),
            "not terminated: \""
        );
        assert_eq!(
            CommandError::NotFound("foo".into()).to_string(),
            "foo: command not found"
        );
        assert_eq!(
            CommandError::UnknownParameter {
                command: "cli".into(),
                param: "x".into()
            }
            .to_string(),
            "cli: unknown parameter: x"
        );
        assert_eq!(
            CommandError::WrongArgCount("resize".into()).to_string(),
            "resize: wrong parameter count"
        );
    }

    #[test]
    fn test_invalid_state_text() {
        let error = ShellError::InvalidState {
            expected: ShellState::Initialized,
            actual: ShellState::Active,
        };
        assert_eq!(error.to_string(), "shell is Active, expected it to be Initialized");
    }
}
