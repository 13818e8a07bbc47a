//! Error types for the partition/compute/gather pipeline.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::pipeline::AbortReason;

/// Result type for pipeline operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal conditions of a run.
///
/// Every variant is process-local: a rank that hits one of these reports it
/// and stops. The only cross-rank signal is the pre-flight go/no-go word,
/// which surfaces on peers as [`Error::Aborted`].
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed command line or job description
    #[error("invalid arguments: {0}")]
    Argument(String),

    /// The codec could not decode the input image
    #[error("failed to load image {}: {message}", .path.display())]
    Load {
        /// Input path
        path: PathBuf,
        /// Codec message
        message: String,
    },

    /// The decoded image has a channel layout the kernel cannot consume
    #[error("unsupported channel count {0} (expected 1 to 4)")]
    UnsupportedChannels(u8),

    /// A whole-image or partition buffer could not be allocated
    #[error("unable to allocate {bytes} bytes for the {what}")]
    Allocation {
        /// Which buffer
        what: &'static str,
        /// Requested size
        bytes: usize,
    },

    /// The codec could not write the output image
    #[error("failed to write image {}: {message}", .path.display())]
    Encode {
        /// Output path
        path: PathBuf,
        /// Codec message
        message: String,
    },

    /// The coordinator announced a no-go during pre-flight
    #[error("run aborted by the coordinator: {0}")]
    Aborted(AbortReason),

    /// Collective communication failed
    #[error(transparent)]
    Comm(#[from] CommError),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Pre-flight reason broadcast to peers when this error stops the coordinator.
    pub fn abort_reason(&self) -> AbortReason {
        match self {
            Error::Load { .. } => AbortReason::LoadFailed,
            Error::UnsupportedChannels(_) => AbortReason::UnsupportedChannels,
            Error::Allocation { .. } => AbortReason::AllocationFailed,
            Error::Aborted(reason) => *reason,
            _ => AbortReason::Internal,
        }
    }
}

/// Errors raised by the collective communication layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommError {
    /// Rank or size outside what a process group allows
    #[error("invalid topology: rank {rank} in a group of {size}")]
    InvalidTopology {
        /// Offending rank
        rank: usize,
        /// Group size
        size: usize,
    },

    /// A peer's endpoint is gone
    #[error("rank {0} disconnected from the group")]
    Disconnected(usize),

    /// Two ranks reached different collectives at the same step
    #[error("collective mismatch at step {step}: expected {expected} from rank {from}, got {found}")]
    Mismatch {
        /// Sequence number of the collective
        step: u64,
        /// Sending rank
        from: usize,
        /// What this rank was waiting for
        expected: &'static str,
        /// What arrived
        found: &'static str,
    },

    /// A partition or scalar set arrived with the wrong length
    #[error("length mismatch from rank {from}: expected {expected}, got {found}")]
    LengthMismatch {
        /// Sending rank
        from: usize,
        /// Length this rank agreed to
        expected: usize,
        /// Length that arrived
        found: usize,
    },

    /// The root's send buffer cannot cover every partition
    #[error("root buffer of {len} bytes cannot supply {size} partitions of {partition_len} bytes")]
    BufferTooSmall {
        /// Buffer length
        len: usize,
        /// Group size
        size: usize,
        /// Requested partition length
        partition_len: usize,
    },

    /// The root did not provide a send buffer
    #[error("root rank {0} called scatter without a send buffer")]
    MissingRootBuffer(usize),

    /// No message arrived within the configured timeout
    #[error("timed out after {timeout:?} waiting for rank {from}")]
    Timeout {
        /// Rank being waited on
        from: usize,
        /// Configured timeout
        timeout: Duration,
    },

    /// A rank thread panicked
    #[error("rank {0} panicked")]
    RankPanicked(usize),

    /// The MPI runtime could not be initialised
    #[error("failed to initialise the MPI runtime")]
    MpiInit,
}
