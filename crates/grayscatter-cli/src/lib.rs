//! Shared utilities for grayscatter-cli
//!
//! Argument parsing, backend start-up and the convert command, kept out of
//! `main.rs` so they can be tested.

pub mod commands;
pub mod launch;
pub mod parsers;

// Re-export commonly used items at the crate root for convenience
pub use commands::cmd_convert;
pub use launch::{launch, resolve_process_count, Backend, LaunchPlan};
pub use parsers::{parse_backend, parse_format_code, parse_process_count, parse_remainder_policy};
