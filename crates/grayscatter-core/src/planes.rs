//! Channel normalisation ahead of partitioning.
//!
//! The partition kernel reads packed RGB triples, so the coordinator turns
//! whatever the codec produced into a packed RGB plane first:
//!
//! | source channels | RGB plane          | alpha plane |
//! |-----------------|--------------------|-------------|
//! | 1 (gray)        | gray replicated x3 | -           |
//! | 2 (gray+alpha)  | gray replicated x3 | dropped     |
//! | 3 (RGB)         | as is              | -           |
//! | 4 (RGBA)        | RGB                | kept        |
//!
//! The alpha plane of a 4-channel source becomes the second channel of the
//! gray output.

use crate::buffer;
use crate::error::{Error, Result};
use crate::kernel::COLOR_CHANNELS;
use crate::models::Image;

/// Packed RGB plane plus the alpha plane carried into the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPlanes {
    /// `pixel_count * 3` bytes
    pub rgb: Vec<u8>,
    /// `pixel_count` bytes, only for 4-channel sources
    pub alpha: Option<Vec<u8>>,
}

/// Split a decoded image into its RGB and alpha planes.
pub fn split_planes(image: &Image) -> Result<ColorPlanes> {
    let channels = image.channels as usize;
    if !(1..=4).contains(&channels) {
        return Err(Error::UnsupportedChannels(image.channels));
    }

    if channels == COLOR_CHANNELS {
        let mut rgb = buffer::with_capacity(image.pixels.len(), "color image")?;
        rgb.extend_from_slice(&image.pixels);
        return Ok(ColorPlanes { rgb, alpha: None });
    }

    let pixel_count = image.pixel_count();
    let mut rgb = buffer::with_capacity(pixel_count * COLOR_CHANNELS, "color image")?;
    let mut alpha = if channels == 4 {
        Some(buffer::with_capacity(pixel_count, "alpha plane")?)
    } else {
        None
    };

    for px in image.pixels.chunks_exact(channels) {
        match px {
            [gray] | [gray, _] => rgb.extend_from_slice(&[*gray; COLOR_CHANNELS]),
            [r, g, b, a] => {
                rgb.extend_from_slice(&[*r, *g, *b]);
                if let Some(alpha) = alpha.as_mut() {
                    alpha.push(*a);
                }
            }
            _ => unreachable!("chunks_exact yields {} samples", channels),
        }
    }

    Ok(ColorPlanes { rgb, alpha })
}

/// Interleave gray samples with an alpha plane into gray+alpha pixels.
pub fn interleave_alpha(gray: &[u8], alpha: &[u8]) -> Result<Vec<u8>> {
    let mut out = buffer::with_capacity(gray.len() * 2, "gray image")?;
    for (&g, &a) in gray.iter().zip(alpha) {
        out.extend_from_slice(&[g, a]);
    }
    Ok(out)
}
