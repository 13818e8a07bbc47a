//! MPI process group (`mpi` feature).
//!
//! Ranks are separate processes started by `mpiexec`. Each collective is
//! followed by an `MPI_Barrier` so every call completes as a group barrier,
//! matching the other backends.

use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator as _, CommunicatorCollectives as _, Root as _};

use super::{Communicator, ProcessTopology};
use crate::error::CommError;

/// Communicator over `MPI_COMM_WORLD`.
pub struct MpiComm {
    world: SimpleCommunicator,
    topology: ProcessTopology,
    // Dropped last; finalizes MPI.
    _universe: Universe,
}

impl MpiComm {
    /// Initialise MPI and take rank and size from the world communicator.
    pub fn initialize() -> Result<Self, CommError> {
        let universe = mpi::initialize().ok_or(CommError::MpiInit)?;
        let world = universe.world();
        let topology = ProcessTopology::new(world.rank() as usize, world.size() as usize)?;
        Ok(Self {
            world,
            topology,
            _universe: universe,
        })
    }
}

impl Communicator for MpiComm {
    fn topology(&self) -> ProcessTopology {
        self.topology
    }

    fn broadcast_scalars(&self, values: &mut [u64], root: usize) -> Result<(), CommError> {
        self.topology.check_root(root)?;
        self.world
            .process_at_rank(root as i32)
            .broadcast_into(values);
        self.world.barrier();
        Ok(())
    }

    fn scatter_equal(
        &self,
        buffer: Option<&[u8]>,
        partition_len: usize,
        root: usize,
    ) -> Result<Vec<u8>, CommError> {
        self.topology.check_root(root)?;
        let root_process = self.world.process_at_rank(root as i32);
        let mut local = vec![0u8; partition_len];

        if self.topology.rank() == root {
            let buffer = buffer.ok_or(CommError::MissingRootBuffer(root))?;
            let needed = partition_len * self.topology.size();
            let send = buffer.get(..needed).ok_or(CommError::BufferTooSmall {
                len: buffer.len(),
                size: self.topology.size(),
                partition_len,
            })?;
            root_process.scatter_into_root(send, &mut local[..]);
        } else {
            root_process.scatter_into(&mut local[..]);
        }

        self.world.barrier();
        Ok(local)
    }

    fn gather_equal(&self, local: &[u8], root: usize) -> Result<Option<Vec<u8>>, CommError> {
        self.topology.check_root(root)?;
        let root_process = self.world.process_at_rank(root as i32);

        let gathered = if self.topology.rank() == root {
            let mut gathered = vec![0u8; local.len() * self.topology.size()];
            root_process.gather_into_root(local, &mut gathered[..]);
            Some(gathered)
        } else {
            root_process.gather_into(local);
            None
        };

        self.world.barrier();
        Ok(gathered)
    }

    fn finalize(self) {
        log::debug!(
            "rank {}/{} finalizing MPI",
            self.topology.rank(),
            self.topology.size()
        );
    }
}
