//! Parsing functions for CLI arguments.

mod format;
mod group;

pub use format::parse_format_code;
pub use group::{parse_backend, parse_process_count, parse_remainder_policy};
