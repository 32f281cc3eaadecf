// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod color;
pub mod error;
pub mod shared_writer;
pub mod shell;
pub mod shell_config;
pub mod shell_context;
pub mod shell_output;

// Re-export.
pub use color::*;
pub use error::*;
pub use shared_writer::*;
pub use shell::*;
pub use shell_config::*;
pub use shell_context::*;
pub use shell_output::*;
