//! API Module
//!
//! Request/response commands over the core. `commands.rs` is the only
//! surface; the CLI calls it directly.

pub mod commands;

// Re-export current version as default
pub use commands::*;
