//! Command implementations for the grayscatter CLI.

mod convert;

pub use convert::{cmd_convert, write_report};
