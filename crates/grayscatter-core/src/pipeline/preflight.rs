//! Go/no-go exchange ahead of the first data-bearing collective.
//!
//! The coordinator broadcasts `[status, reason]` once it has loaded and
//! staged the image, or failed to. Peers block here instead of in the
//! metadata broadcast, so a coordinator failure reaches every rank.

use crate::comm::{Communicator, ROOT_RANK};
use crate::error::{Error, Result};

use super::AbortReason;

const STATUS_NO_GO: u64 = 0;
const STATUS_GO: u64 = 1;

/// The coordinator's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Go,
    NoGo(AbortReason),
}

impl Verdict {
    fn to_scalars(self) -> [u64; 2] {
        match self {
            Verdict::Go => [STATUS_GO, 0],
            Verdict::NoGo(reason) => [STATUS_NO_GO, reason.code()],
        }
    }

    /// Unknown words are treated as an internal abort.
    fn from_scalars(values: [u64; 2]) -> Self {
        match values {
            [STATUS_GO, _] => Verdict::Go,
            [_, code] => Verdict::NoGo(AbortReason::from_code(code).unwrap_or(AbortReason::Internal)),
        }
    }
}

/// Broadcast the coordinator's verdict.
///
/// The root passes its decision; other ranks pass anything, it is
/// overwritten. A no-go comes back as [`Error::Aborted`] on every rank.
pub fn exchange_verdict<C: Communicator>(comm: &C, verdict: Verdict) -> Result<()> {
    let mut word = verdict.to_scalars();
    comm.broadcast_scalars(&mut word, ROOT_RANK)?;

    match Verdict::from_scalars(word) {
        Verdict::Go => Ok(()),
        Verdict::NoGo(reason) => Err(Error::Aborted(reason)),
    }
}
