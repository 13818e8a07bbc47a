//! Image decoders
//!
//! PNG through the `png` crate and JPEG through `image`. Both produce 8-bit
//! interleaved samples with the channel count the file declares (1 to 4).

mod jpeg;
mod png;

#[cfg(test)]
mod tests;

use std::path::Path;

use crate::error::{Error, Result};
use crate::models::Image;

/// Extensions [`decode_image`] understands.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Decode an image from a file path, dispatching on its extension.
pub fn decode_image<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();
    let load_error = |message: String| Error::Load {
        path: path.to_path_buf(),
        message,
    };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| load_error("No file extension found".to_string()))?;

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(load_error(format!(
            "Unsupported file format: {} (expected one of: {})",
            extension,
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    let image = if extension == "png" {
        png::decode_png(path)
    } else {
        jpeg::decode_jpeg(path)
    }
    .map_err(load_error)?;

    check_layout(&image).map_err(load_error)?;
    log::debug!(
        "decoded {}: {}x{}, {} channel(s)",
        path.display(),
        image.width,
        image.height,
        image.channels
    );
    Ok(image)
}

/// Reject decoder output whose buffer does not match its dimensions.
fn check_layout(image: &Image) -> std::result::Result<(), String> {
    if image.width == 0 || image.height == 0 {
        return Err(format!(
            "Image has no pixels ({}x{})",
            image.width, image.height
        ));
    }
    let expected = image.pixel_count() * image.channels as usize;
    if image.pixels.len() != expected {
        return Err(format!(
            "Decoded buffer size mismatch: expected {}, got {}",
            expected,
            image.pixels.len()
        ));
    }
    Ok(())
}
