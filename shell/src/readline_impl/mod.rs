// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod history;
pub mod line_buffer;
pub mod line_state;
pub mod receive;
pub mod terminal_cons;

// Re-export.
pub use history::*;
pub use line_buffer::*;
pub use line_state::*;
pub use receive::*;
pub use terminal_cons::*;
