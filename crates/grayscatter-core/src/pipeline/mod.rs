//! Partition/compute/gather pipeline
//!
//! Every rank runs the same program. The protocol, in collective order:
//!
//! 1. pre-flight: the coordinator loads and stages the image, then broadcasts
//!    a go/no-go word so a failed load never leaves peers blocked
//! 2. metadata broadcast: `[width, height, channels]`
//! 3. scatter of equal color partitions
//! 4. local compute through the partition kernel (no collective)
//! 5. gather of equal gray partitions
//!
//! After the gather only the coordinator has work left: it fills in the
//! remainder, restores alpha and writes the output.
//!
//! This module is organized into submodules:
//! - `preflight`: go/no-go exchange
//! - `coordinator`: rank 0, owner of the whole-image buffers and the codec
//! - `worker`: the per-partition side every rank runs

mod coordinator;
mod preflight;
mod worker;

#[cfg(test)]
mod tests;

pub use coordinator::{
    broadcast_metadata, gather, load, partition_and_scatter, stage, write, StagedImage,
};
pub use preflight::{exchange_verdict, Verdict};
pub use worker::{compute, receive_partition, send_partition};

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::comm::{Communicator, ROOT_RANK};
use crate::error::{Error, Result};
use crate::models::{ImageMetadata, OutputFormat};
use crate::partition::{PartitionPlan, PartitionSkew, RemainderPolicy};

/// Why the coordinator called off a run during pre-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    LoadFailed,
    UnsupportedChannels,
    AllocationFailed,
    Internal,
}

impl AbortReason {
    /// Wire code carried by the go/no-go broadcast.
    pub fn code(self) -> u64 {
        match self {
            Self::LoadFailed => 1,
            Self::UnsupportedChannels => 2,
            Self::AllocationFailed => 3,
            Self::Internal => 4,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::LoadFailed),
            2 => Some(Self::UnsupportedChannels),
            3 => Some(Self::AllocationFailed),
            4 => Some(Self::Internal),
            _ => None,
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::LoadFailed => "the input image could not be loaded",
            Self::UnsupportedChannels => "the input image has an unsupported channel layout",
            Self::AllocationFailed => "the image buffers could not be allocated",
            Self::Internal => "internal error on the coordinator",
        };
        f.write_str(text)
    }
}

/// One conversion request. Every rank is started with the same job; only
/// the coordinator reads the paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
}

/// Behaviour switches shared by every rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub remainder: RemainderPolicy,
    /// Suppress progress output on stdout
    pub silent: bool,
}

/// Summary of a completed run, produced by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub gray_channels: u8,
    pub process_count: usize,
    pub pixels_per_rank: usize,
    pub color_partition_len: usize,
    pub gray_partition_len: usize,
    /// Pixels outside every partition (0 when the image divides evenly)
    pub remainder_pixels: usize,
    /// Diagnostic emitted when the pixels do not divide evenly
    pub skew: Option<PartitionSkew>,
    pub remainder_policy: RemainderPolicy,
    pub elapsed_secs: f64,
}

impl RunReport {
    fn new(job: &Job, plan: &PartitionPlan, metadata: ImageMetadata, options: &PipelineOptions) -> Self {
        Self {
            input: job.input.clone(),
            output: job.output.clone(),
            format: job.format,
            width: metadata.width,
            height: metadata.height,
            channels: metadata.channels,
            gray_channels: metadata.gray_channels(),
            process_count: plan.process_count(),
            pixels_per_rank: plan.pixels_per_rank(),
            color_partition_len: plan.color_partition_len(),
            gray_partition_len: plan.gray_partition_len(),
            remainder_pixels: plan.remainder_pixels(),
            skew: None,
            remainder_policy: options.remainder,
            elapsed_secs: 0.0,
        }
    }
}

/// Run this rank's part of the protocol.
///
/// Returns the run report on the coordinator and `None` on every other rank.
/// The communicator is not finalized; see [`run`].
pub fn run_rank<C: Communicator>(
    comm: &C,
    job: &Job,
    options: &PipelineOptions,
) -> Result<Option<RunReport>> {
    if comm.topology().is_root() {
        coordinator::run(comm, job, options).map(Some)
    } else {
        worker::run(comm).map(|()| None)
    }
}

/// Run this rank's part of the protocol and finalize the communicator,
/// whether or not the run succeeded.
pub fn run<C: Communicator>(
    comm: C,
    job: &Job,
    options: &PipelineOptions,
) -> Result<Option<RunReport>> {
    let result = run_rank(&comm, job, options);
    if let Err(err) = &result {
        log::debug!("rank {} stopping: {}", comm.topology().rank(), err);
    }
    comm.finalize();
    result
}

/// Both sides of the metadata broadcast. The root passes `Some`.
fn share_metadata<C: Communicator>(
    comm: &C,
    metadata: Option<ImageMetadata>,
) -> Result<ImageMetadata> {
    let mut scalars = metadata.map(ImageMetadata::to_scalars).unwrap_or_default();
    comm.broadcast_scalars(&mut scalars, ROOT_RANK)?;
    ImageMetadata::from_scalars(&scalars).ok_or(Error::Aborted(AbortReason::Internal))
}
