// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod builtins;
pub mod command_tree;
pub mod completion;
pub mod execute;
pub mod help;
pub mod matcher;
pub mod tokenizer;
pub mod wildcard;

// Re-export.
pub use command_tree::*;
pub use execute::*;
pub use matcher::*;
pub use tokenizer::*;
pub use wildcard::*;
