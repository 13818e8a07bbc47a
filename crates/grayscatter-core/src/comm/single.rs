//! Group of one process.

use super::{Communicator, ProcessTopology};
use crate::error::CommError;

/// Communicator for `process_count = 1`.
///
/// Every collective is a local copy; there is nobody to wait for.
#[derive(Debug, Default)]
pub struct SingleProcess;

impl SingleProcess {
    const TOPOLOGY: ProcessTopology = ProcessTopology { rank: 0, size: 1 };
}

impl Communicator for SingleProcess {
    fn topology(&self) -> ProcessTopology {
        Self::TOPOLOGY
    }

    fn broadcast_scalars(&self, _values: &mut [u64], root: usize) -> Result<(), CommError> {
        Self::TOPOLOGY.check_root(root)
    }

    fn scatter_equal(
        &self,
        buffer: Option<&[u8]>,
        partition_len: usize,
        root: usize,
    ) -> Result<Vec<u8>, CommError> {
        Self::TOPOLOGY.check_root(root)?;
        let buffer = buffer.ok_or(CommError::MissingRootBuffer(root))?;
        buffer
            .get(..partition_len)
            .map(<[u8]>::to_vec)
            .ok_or(CommError::BufferTooSmall {
                len: buffer.len(),
                size: 1,
                partition_len,
            })
    }

    fn gather_equal(&self, local: &[u8], root: usize) -> Result<Option<Vec<u8>>, CommError> {
        Self::TOPOLOGY.check_root(root)?;
        Ok(Some(local.to_vec()))
    }

    fn finalize(self) {
        log::debug!("rank 0/1 finalized");
    }
}
