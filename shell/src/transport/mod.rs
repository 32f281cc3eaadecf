// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod input_stream;
pub mod loopback;
pub mod transport_writer;

// Re-export.
pub use input_stream::*;
pub use loopback::*;
pub use transport_writer::*;
