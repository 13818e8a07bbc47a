//! The per-partition side of the protocol, run by every rank.

use crate::comm::{Communicator, ROOT_RANK};
use crate::error::Result;
use crate::kernel;
use crate::partition::PartitionPlan;

use super::{exchange_verdict, share_metadata, Verdict};

/// Non-root ranks: wait for go, then receive, compute and send back.
pub(super) fn run<C: Communicator>(comm: &C) -> Result<()> {
    let topology = comm.topology();

    exchange_verdict(comm, Verdict::Go)?;
    let metadata = share_metadata(comm, None)?;
    let plan = PartitionPlan::new(&metadata, topology);

    let color = receive_partition(comm, &plan)?;
    let gray = compute(&color);
    send_partition(comm, &gray)?;

    log::debug!(
        "rank {}/{} converted {} pixel(s)",
        topology.rank(),
        topology.size(),
        gray.len()
    );
    Ok(())
}

/// Receive this rank's color partition from the scatter.
pub fn receive_partition<C: Communicator>(comm: &C, plan: &PartitionPlan) -> Result<Vec<u8>> {
    Ok(comm.scatter_equal(None, plan.color_partition_len(), ROOT_RANK)?)
}

/// Convert one color partition.
pub fn compute(color: &[u8]) -> Vec<u8> {
    kernel::gray_partition(color)
}

/// Contribute this rank's gray partition to the gather.
///
/// Returns the concatenated partitions on the root.
pub fn send_partition<C: Communicator>(comm: &C, gray: &[u8]) -> Result<Option<Vec<u8>>> {
    Ok(comm.gather_equal(gray, ROOT_RANK)?)
}
