//! Data models for grayscatter
//!
//! Image buffers, the metadata shared between ranks, and output selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// JPEG quality used for every JPEG write.
pub const JPEG_QUALITY: u8 = 100;

/// Decoded source image, owned by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Channel count reported by the codec (1 to 4)
    pub channels: u8,

    /// Row-major interleaved 8-bit samples, `width * height * channels` long
    pub pixels: Vec<u8>,
}

impl Image {
    /// Metadata broadcast to the group for this image.
    pub fn metadata(&self) -> ImageMetadata {
        ImageMetadata {
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    /// Number of pixels (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Dimensions and channel count agreed on by every rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl ImageMetadata {
    /// Number of scalars in the broadcast form.
    pub const SCALARS: usize = 3;

    /// Encode as the scalar set carried by the metadata broadcast.
    pub fn to_scalars(self) -> [u64; Self::SCALARS] {
        [
            u64::from(self.width),
            u64::from(self.height),
            u64::from(self.channels),
        ]
    }

    /// Decode the scalar set received from the metadata broadcast.
    ///
    /// Returns `None` if a value does not fit its field.
    pub fn from_scalars(values: &[u64]) -> Option<Self> {
        match values {
            [width, height, channels] => Some(Self {
                width: u32::try_from(*width).ok()?,
                height: u32::try_from(*height).ok()?,
                channels: u8::try_from(*channels).ok()?,
            }),
            _ => None,
        }
    }

    /// Number of pixels (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Channel count of the grayscale output for this source.
    pub fn gray_channels(&self) -> u8 {
        gray_channels(self.channels)
    }
}

/// Gray channel count for a source channel count.
///
/// A 4-channel source keeps its alpha as a second channel; everything else
/// becomes single-channel gray. This shapes the output only, never the
/// partition sizes.
pub fn gray_channels(channels: u8) -> u8 {
    if channels == 4 {
        2
    } else {
        1
    }
}

/// Grayscale result assembled by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayscaleImage {
    pub width: u32,
    pub height: u32,

    /// 1 (gray) or 2 (gray + alpha)
    pub channels: u8,

    /// Row-major interleaved samples, `width * height * channels` long
    pub pixels: Vec<u8>,
}

impl GrayscaleImage {
    /// Gray samples only, dropping alpha when present.
    pub fn luma(&self) -> Vec<u8> {
        if self.channels == 2 {
            self.pixels.iter().step_by(2).copied().collect()
        } else {
            self.pixels.clone()
        }
    }
}

/// Output container selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG (format code 1)
    Png,
    /// JPEG at [`JPEG_QUALITY`] (format code 2)
    Jpeg,
}

impl OutputFormat {
    /// Map a numeric format code (1 = PNG, 2 = JPEG).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Png),
            2 => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Numeric format code.
    pub fn code(self) -> u8 {
        match self {
            Self::Png => 1,
            Self::Jpeg => 2,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Jpeg => write!(f, "JPEG (quality {})", JPEG_QUALITY),
        }
    }
}
