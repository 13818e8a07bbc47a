//! Collective communication layer.
//!
//! Three blocking group operations over a fixed process group: broadcast of
//! a scalar set, scatter of equal partitions, and gather of equal partitions.
//! Every call must be made by every rank, in the same order, with matching
//! sizes; each call completes as a full-group barrier.
//!
//! Implementations: [`SingleProcess`] (group of one), [`LocalGroup`] (ranks
//! on threads, connected only by message channels) and, with the `mpi`
//! feature, [`MpiComm`].

mod local;
#[cfg(feature = "mpi")]
mod mpi_comm;
mod single;


pub use local::{ChannelComm, LocalGroup};
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;
pub use single::SingleProcess;

use serde::Serialize;

use crate::error::CommError;

/// Rank of the coordinator.
pub const ROOT_RANK: usize = 0;

/// This process's place in the group. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessTopology {
    rank: usize,
    size: usize,
}

impl ProcessTopology {
    /// Validate `rank` in `[0, size)` with `size >= 1`.
    pub fn new(rank: usize, size: usize) -> Result<Self, CommError> {
        if size == 0 || rank >= size {
            return Err(CommError::InvalidTopology { rank, size });
        }
        Ok(Self { rank, size })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of processes in the group.
    pub fn size(&self) -> usize {
        self.size
    }

    /// True for the coordinator.
    pub fn is_root(&self) -> bool {
        self.rank == ROOT_RANK
    }

    fn check_root(&self, root: usize) -> Result<(), CommError> {
        if root >= self.size {
            return Err(CommError::InvalidTopology {
                rank: root,
                size: self.size,
            });
        }
        Ok(())
    }
}

/// Blocking collectives over a fixed process group.
pub trait Communicator {
    /// Rank and size of this endpoint.
    fn topology(&self) -> ProcessTopology;

    /// Overwrite `values` on every rank with the root's `values`.
    ///
    /// All ranks must pass slices of the same length.
    fn broadcast_scalars(&self, values: &mut [u64], root: usize) -> Result<(), CommError>;

    /// Split the root's buffer into `size` contiguous partitions of
    /// `partition_len` bytes and return this rank's partition.
    ///
    /// Only the root passes a buffer; it must hold at least
    /// `size * partition_len` bytes and anything past that is not sent.
    fn scatter_equal(
        &self,
        buffer: Option<&[u8]>,
        partition_len: usize,
        root: usize,
    ) -> Result<Vec<u8>, CommError>;

    /// Concatenate every rank's `local` partition in ascending rank order.
    ///
    /// Returns `Some` on the root and `None` elsewhere. All ranks must pass
    /// partitions of the same length.
    fn gather_equal(&self, local: &[u8], root: usize) -> Result<Option<Vec<u8>>, CommError>;

    /// Leave the group. Called once per rank after its last collective.
    fn finalize(self)
    where
        Self: Sized;
}
