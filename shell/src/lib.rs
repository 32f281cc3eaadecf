// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The `r3bl_shell` library is the core of an embeddable interactive shell. It runs a
//! line editor, a command tree, tab completion, wildcard expansion and history over any
//! byte oriented transport (a UART, a socket, a pipe, or `stdin` / `stdout` in raw mode).
//!
//! # Why use this crate
//!
//! 1. The transport only has to move bytes. It is modeled by the [`Transport`] trait
//!    which has a non-blocking `read` and a `write` that may be partial. Everything else
//!    (cursor movement, multi line wrapping, colors) is rendered by this crate using
//!    [`crossterm`] commands queued into a [`TransportWriter`].
//!
//! 2. Log output from other tasks does not corrupt the prompt. Log producers get a
//!    [`SharedWriter`] and every line they write is delivered over a bounded channel to a
//!    monitor task. That task erases the prompt and the line being edited, writes the
//!    log line, then redraws the prompt and puts the cursor back where it was. When the
//!    channel is full the line is dropped and counted, and the count is reported the next
//!    time a line gets through.
//!
//! 3. Commands are a tree of [`CommandNode`]s. Children can be a static list or a
//!    [`CommandSource`] that produces nodes on demand (eg: one subcommand per attached
//!    device). Every node supports `-h` / `--help` and tab completion for free.
//!
//! # Data flow
//!
//! ```text
//! bytes -> ReceiveStateMachine -> LineState (edit ops)
//!                              -> Enter -> tokenize -> wildcard expand -> match -> handler
//!                              -> Tab   -> completion
//!                              -> Up/Down -> History
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use r3bl_shell::{CommandNode, CommandTreeBuilder, LoopbackTransport, Shell,
//!                  ShellColor, ShellConfig, ShellContext};
//!
//! # async fn run() -> miette::Result<()> {
//! let tree = CommandTreeBuilder::default()
//!     .register(
//!         CommandNode::new("hello")
//!             .with_help("Say hello.")
//!             .with_handler(|ctx: &mut ShellContext<'_>, _argv: &[&str]| {
//!                 ctx.println(ShellColor::NORMAL, "Hello!");
//!                 0
//!             }),
//!     )
//!     .with_builtins()
//!     .build()?;
//!
//! let (transport, feeder) = LoopbackTransport::new(std::io::stdout());
//! let (mut shell, shared_writer) = Shell::new(ShellConfig::default(), tree, transport)?;
//! shell.start()?;
//! # drop((feeder, shared_writer));
//! shell.run().await?;
//! # Ok(())
//! # }
//! ```

// https://github.com/rust-lang/rust-clippy
// https://rust-lang.github.io/rust-clippy/master/index.html
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach sources.
pub mod command_impl;
pub mod public_api;
pub mod readline_impl;
pub mod tracing_logging;
pub mod transport;

// Re-export the public API.
pub use command_impl::*;
pub use public_api::*;
pub use readline_impl::*;
pub use tracing_logging::*;
pub use transport::*;

// Type aliases.
use std::sync::Arc;

pub type StdMutex<T> = std::sync::Mutex<T>;

pub type SendTransport = dyn Transport;
pub type SafeTransport = Arc<StdMutex<SendTransport>>;

pub type SafeLineState = Arc<StdMutex<LineState>>;
pub type SafeLogStats = Arc<LogStats>;

pub type Text = Vec<u8>;

// Constants.
pub const CHANNEL_CAPACITY: usize = 1_000;
pub const CMD_BUFFER_CAPACITY: usize = 128;
pub const HISTORY_SIZE_DEFAULT: usize = 16;
pub const ARGC_MAX: usize = 12;
pub const RX_CHUNK_SIZE: usize = 32;

/// Wrap the given value in `Ok(..)`. Saves some typing at the end of functions that
/// return a [`Result`].
#[macro_export]
macro_rules! ok {
    () => {
        Ok(())
    };
    ($value:expr) => {
        Ok($value)
    };
}
