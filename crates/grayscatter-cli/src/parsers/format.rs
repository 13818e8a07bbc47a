//! Output format selection.

use grayscatter_core::OutputFormat;

/// Parse the numeric format code: 1 = PNG, 2 = JPEG.
pub fn parse_format_code(code_str: &str) -> Result<OutputFormat, String> {
    let code = code_str
        .trim()
        .parse::<u8>()
        .map_err(|_| format!("Invalid format code: {} (expected 1 = PNG or 2 = JPEG)", code_str))?;

    OutputFormat::from_code(code)
        .ok_or_else(|| format!("Unknown format code: {} (expected 1 = PNG or 2 = JPEG)", code))
}
