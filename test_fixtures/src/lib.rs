// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Reusable components for testing `r3bl_shell` end to end. This crate is intended to be
//! a
//! [`dev-dependency`](https://doc.rust-lang.org/cargo/reference/specifying-dependencies.html#dev-dependencies).
//!
//! 1. The input stream fixtures stand in for `stdin` (or a UART) that delivers chunks of
//!    bytes over time.
//! 2. The output fixtures capture everything written to the terminal, so a test can
//!    assert on it with or without the ANSI escape sequences.
//!
//! # Input stream fixtures
//!
//! Here's an example of how to create a stream of `T` from a `Vec<T>`.
//!
//! ```
//! # #[tokio::main]
//! # async fn main() {
//! use futures_util::StreamExt;
//! use r3bl_test_fixtures::gen_input_stream;
//!
//! let mut input_stream = gen_input_stream(vec![1, 2, 3]);
//! for _ in 1..=3 {
//!     input_stream.next().await;
//! }
//! assert_eq!(input_stream.next().await, None);
//! # }
//! ```
//!
//! # Output fixtures
//!
//! ```
//! use std::io::Write;
//!
//! use r3bl_test_fixtures::StdoutMock;
//!
//! let mut stdout_mock = StdoutMock::default();
//! let stdout_mock_clone = stdout_mock.clone(); // Shares the buffer.
//!
//! stdout_mock.write_all(b"\x1b[31mhello\x1b[0m").unwrap();
//! assert_eq!(stdout_mock_clone.get_copy_of_buffer_as_string_strip_ansi(), "hello");
//! ```

// Attach sources.
pub mod input_device_fixtures;
pub mod output_device_fixtures;

// Re-export.
pub use input_device_fixtures::*;
pub use output_device_fixtures::*;
