//! Partition kernel: RGB triples to grayscale bytes.
//!
//! Pure and stateless. Every rank runs it over its own color partition; the
//! coordinator also runs it over the trailing pixels when the remainder is
//! assigned to the root.

/// Luminance weights applied to (R, G, B).
pub const LUMA_WEIGHTS: [f64; 3] = [0.30, 0.58, 0.11];

/// Bytes per pixel in a color partition.
pub const COLOR_CHANNELS: usize = 3;

/// One 8-bit RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from an `[r, g, b]` chunk.
    pub fn from_triple(triple: [u8; 3]) -> Self {
        let [r, g, b] = triple;
        Self { r, g, b }
    }

    /// Weighted luminance, truncated toward zero.
    ///
    /// Evaluated in `f64` in R, G, B order, so results are reproducible
    /// byte for byte; `as u8` truncates and saturates.
    pub fn luminance(self) -> u8 {
        let [wr, wg, wb] = LUMA_WEIGHTS;
        (f64::from(self.r) * wr + f64::from(self.g) * wg + f64::from(self.b) * wb) as u8
    }
}

/// Convert a color partition to its gray partition.
///
/// `color` is read as consecutive RGB triples; the output holds one byte per
/// triple in the same order. A trailing partial triple is ignored.
pub fn gray_partition(color: &[u8]) -> Vec<u8> {
    debug_assert_eq!(color.len() % COLOR_CHANNELS, 0, "partition is not whole pixels");
    pixels(color).map(Rgb::luminance).collect()
}

/// Same as [`gray_partition`], writing into a caller-owned buffer.
///
/// Converts `min(color.len() / 3, gray.len())` pixels and returns that count.
pub fn gray_partition_into(color: &[u8], gray: &mut [u8]) -> usize {
    let mut written = 0;
    for (out, px) in gray.iter_mut().zip(pixels(color)) {
        *out = px.luminance();
        written += 1;
    }
    written
}

/// Whole RGB pixels of `color`, in order.
fn pixels(color: &[u8]) -> impl Iterator<Item = Rgb> + '_ {
    color
        .chunks_exact(COLOR_CHANNELS)
        .filter_map(|px| <[u8; 3]>::try_from(px).ok())
        .map(Rgb::from_triple)
}
