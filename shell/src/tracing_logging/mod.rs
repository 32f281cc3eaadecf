// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Route `tracing` events to the display (through a [crate::SharedWriter] so they don't
//! clobber the prompt), to a file, or both.

// Attach.
pub mod tracing_config;
pub mod tracing_setup;

// Re-export.
pub use tracing_config::*;
pub use tracing_setup::*;
