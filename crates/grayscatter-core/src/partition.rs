//! Partition planning.
//!
//! Splits a packed RGB buffer into `process_count` equal, contiguous,
//! whole-pixel ranges in rank order. Pixels that do not divide evenly are the
//! remainder; what happens to them is decided by [`RemainderPolicy`].

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::comm::ProcessTopology;
use crate::kernel::COLOR_CHANNELS;
use crate::models::ImageMetadata;

/// What to do with the pixels left over after equal partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Exclude trailing pixels; their output bytes stay zero
    #[default]
    Drop,
    /// The coordinator converts trailing pixels after the gather
    Root,
}

impl fmt::Display for RemainderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drop => write!(f, "drop"),
            Self::Root => write!(f, "root"),
        }
    }
}

/// Partition geometry for one run. Identical on every rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartitionPlan {
    pixel_count: usize,
    process_count: usize,
    pixels_per_rank: usize,
}

impl PartitionPlan {
    pub fn new(metadata: &ImageMetadata, topology: ProcessTopology) -> Self {
        Self::for_pixels(metadata.pixel_count(), topology.size())
    }

    /// Plan for `pixel_count` pixels over `process_count` ranks (at least 1).
    pub fn for_pixels(pixel_count: usize, process_count: usize) -> Self {
        let process_count = process_count.max(1);
        Self {
            pixel_count,
            process_count,
            pixels_per_rank: pixel_count / process_count,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub fn process_count(&self) -> usize {
        self.process_count
    }

    pub fn pixels_per_rank(&self) -> usize {
        self.pixels_per_rank
    }

    /// Bytes in each rank's color partition.
    pub fn color_partition_len(&self) -> usize {
        self.pixels_per_rank * COLOR_CHANNELS
    }

    /// Bytes in each rank's gray partition.
    pub fn gray_partition_len(&self) -> usize {
        self.pixels_per_rank
    }

    /// Length of the full packed RGB buffer.
    pub fn color_len(&self) -> usize {
        self.pixel_count * COLOR_CHANNELS
    }

    /// Pixels covered by the scatter.
    pub fn covered_pixels(&self) -> usize {
        self.pixels_per_rank * self.process_count
    }

    /// Pixels left over after equal partitioning.
    pub fn remainder_pixels(&self) -> usize {
        self.pixel_count - self.covered_pixels()
    }

    /// Byte range of `rank`'s partition in the packed RGB buffer.
    pub fn color_range(&self, rank: usize) -> Range<usize> {
        let len = self.color_partition_len();
        rank * len..(rank + 1) * len
    }

    /// Byte range of the unscattered tail in the packed RGB buffer.
    pub fn remainder_color_range(&self) -> Range<usize> {
        self.covered_pixels() * COLOR_CHANNELS..self.color_len()
    }

    /// The skew diagnostic, when the RGB byte count does not divide by
    /// `process_count * 3`.
    pub fn skew(&self) -> Option<PartitionSkew> {
        let remainder_pixels = self.remainder_pixels();
        (remainder_pixels > 0).then_some(PartitionSkew {
            remainder_pixels,
            process_count: self.process_count,
        })
    }
}

/// Non-fatal diagnostic: pixels are not equally distributed among ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartitionSkew {
    pub remainder_pixels: usize,
    pub process_count: usize,
}

impl PartitionSkew {
    pub fn remainder_bytes(&self) -> usize {
        self.remainder_pixels * COLOR_CHANNELS
    }
}

impl fmt::Display for PartitionSkew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pixels are not equally distributed among {} processes: {} trailing pixel(s) ({} bytes) are outside every partition",
            self.process_count,
            self.remainder_pixels,
            self.remainder_bytes()
        )
    }
}
