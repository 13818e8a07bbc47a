//! Image exporters for the grayscale result
//!
//! PNG (lossless, gray or gray+alpha) through the `png` crate and JPEG
//! through `image`'s encoder.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::error::{Error, Result};
use crate::models::{GrayscaleImage, OutputFormat, JPEG_QUALITY};

/// Write `image` to `path` in `format`, creating missing parent directories.
pub fn export_image<P: AsRef<Path>>(
    image: &GrayscaleImage,
    path: P,
    format: OutputFormat,
) -> Result<()> {
    let path = path.as_ref();
    let encode_error = |message: String| Error::Encode {
        path: path.to_path_buf(),
        message,
    };

    ensure_parent_dir(path).map_err(encode_error)?;
    match format {
        OutputFormat::Png => export_png(image, path),
        OutputFormat::Jpeg => export_jpeg(image, path, JPEG_QUALITY),
    }
    .map_err(encode_error)
}

/// Export a grayscale image as an 8-bit PNG.
pub fn export_png<P: AsRef<Path>>(image: &GrayscaleImage, path: P) -> Result<(), String> {
    let color = match image.channels {
        1 => png::ColorType::Grayscale,
        2 => png::ColorType::GrayscaleAlpha,
        n => {
            return Err(format!(
                "PNG export only supports 1 or 2 gray channels, got {}",
                n
            ))
        }
    };

    let file =
        File::create(path.as_ref()).map_err(|e| format!("Failed to create PNG file: {}", e))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width, image.height);
    encoder.set_color(color);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| format!("Failed to write PNG header: {}", e))?;
    writer
        .write_image_data(&image.pixels)
        .map_err(|e| format!("Failed to write PNG data: {}", e))?;
    writer
        .finish()
        .map_err(|e| format!("Failed to finish PNG file: {}", e))
}

/// Export a grayscale image as a JPEG at `quality` (1-100).
///
/// JPEG has no alpha channel; a gray+alpha image is written as gray only.
pub fn export_jpeg<P: AsRef<Path>>(
    image: &GrayscaleImage,
    path: P,
    quality: u8,
) -> Result<(), String> {
    if !(1..=100).contains(&quality) {
        return Err(format!("JPEG quality must be in 1-100, got {}", quality));
    }
    if image.channels == 2 {
        log::info!("JPEG output has no alpha channel; writing gray samples only");
    }

    let file =
        File::create(path.as_ref()).map_err(|e| format!("Failed to create JPEG file: {}", e))?;
    let mut writer = BufWriter::new(file);

    let luma = image.luma();
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    encoder
        .encode(&luma, image.width, image.height, ExtendedColorType::L8)
        .map_err(|e| format!("Failed to encode JPEG image: {}", e))?;

    writer
        .flush()
        .map_err(|e| format!("Failed to flush JPEG file: {}", e))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
    }
    Ok(())
}
