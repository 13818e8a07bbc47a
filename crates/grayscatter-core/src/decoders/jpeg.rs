//! JPEG image decoder

use std::path::Path;

use image::DynamicImage;

use crate::models::Image;

/// Decode a JPEG file. Gray JPEGs stay single-channel, everything else
/// (YCbCr, CMYK) comes out as RGB.
pub(crate) fn decode_jpeg<P: AsRef<Path>>(path: P) -> Result<Image, String> {
    let decoded = image::open(path.as_ref())
        .map_err(|e| format!("Failed to decode JPEG file: {}", e))?;

    let (width, height) = (decoded.width(), decoded.height());
    let (channels, pixels) = match decoded {
        DynamicImage::ImageLuma8(gray) => (1, gray.into_raw()),
        other => (3, other.into_rgb8().into_raw()),
    };

    Ok(Image {
        width,
        height,
        channels,
        pixels,
    })
}
