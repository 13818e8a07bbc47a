//! In-process process group.
//!
//! Each rank runs on its own OS thread and owns a [`ChannelComm`]. Ranks
//! share no buffers: every partition or scalar set is moved into a message
//! and sent over a `crossbeam` channel to the receiving rank's inbox.
//!
//! Messages carry the sender's rank, its collective step counter and the
//! collective kind, so a rank that reaches a different collective than its
//! peers is reported as [`CommError::Mismatch`]. Messages that arrive early
//! (from a faster peer, or for a later step) are parked until asked for.

use std::cell::{Cell, RefCell};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use super::{Communicator, ProcessTopology};
use crate::error::CommError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Broadcast,
    Scatter,
    Gather,
}

impl Op {
    fn name(self) -> &'static str {
        match self {
            Op::Broadcast => "broadcast",
            Op::Scatter => "scatter",
            Op::Gather => "gather",
        }
    }
}

#[derive(Debug)]
enum Payload {
    Scalars(Vec<u64>),
    Bytes(Vec<u8>),
    Arrived,
    Release,
}

impl Payload {
    fn kind(&self) -> &'static str {
        match self {
            Payload::Scalars(_) => "scalars",
            Payload::Bytes(_) => "bytes",
            Payload::Arrived => "arrival",
            Payload::Release => "release",
        }
    }
}

#[derive(Debug)]
struct Envelope {
    from: usize,
    step: u64,
    op: Op,
    payload: Payload,
}

/// Builder for a fixed-size group of [`ChannelComm`] endpoints.
#[derive(Debug, Clone)]
pub struct LocalGroup {
    size: usize,
    timeout: Option<Duration>,
}

impl LocalGroup {
    /// A group of `size` ranks whose collectives block indefinitely.
    pub fn new(size: usize) -> Result<Self, CommError> {
        if size == 0 {
            return Err(CommError::InvalidTopology { rank: 0, size });
        }
        Ok(Self {
            size,
            timeout: None,
        })
    }

    /// Fail a collective with [`CommError::Timeout`] instead of waiting
    /// forever on a peer that never arrives.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Create one connected endpoint per rank, in rank order.
    pub fn endpoints(&self) -> Vec<ChannelComm> {
        let (senders, inboxes): (Vec<Sender<Envelope>>, Vec<Receiver<Envelope>>) =
            (0..self.size).map(|_| channel::unbounded()).unzip();

        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ChannelComm {
                topology: ProcessTopology {
                    rank,
                    size: self.size,
                },
                peers: senders
                    .iter()
                    .enumerate()
                    .map(|(peer, tx)| (peer != rank).then(|| tx.clone()))
                    .collect(),
                inbox,
                parked: RefCell::new(Vec::new()),
                step: Cell::new(0),
                timeout: self.timeout,
            })
            .collect()
    }

    /// Run `rank_main` once per rank, each on its own thread, and return the
    /// results in rank order once every rank has finished.
    pub fn run<F, T>(&self, rank_main: F) -> Result<Vec<T>, CommError>
    where
        F: Fn(ChannelComm) -> T + Sync,
        T: Send,
    {
        let endpoints = self.endpoints();
        let rank_main = &rank_main;

        thread::scope(|scope| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|comm| {
                    let rank = comm.topology.rank;
                    (rank, scope.spawn(move || rank_main(comm)))
                })
                .collect();

            handles
                .into_iter()
                .map(|(rank, handle)| handle.join().map_err(|_| CommError::RankPanicked(rank)))
                .collect()
        })
    }
}

/// One rank's endpoint in a [`LocalGroup`].
#[derive(Debug)]
pub struct ChannelComm {
    topology: ProcessTopology,
    peers: Vec<Option<Sender<Envelope>>>,
    inbox: Receiver<Envelope>,
    parked: RefCell<Vec<Envelope>>,
    step: Cell<u64>,
    timeout: Option<Duration>,
}

impl ChannelComm {
    fn others(&self, root: usize) -> impl Iterator<Item = usize> {
        (0..self.topology.size).filter(move |&rank| rank != root)
    }

    fn send(&self, to: usize, op: Op, payload: Payload) -> Result<(), CommError> {
        let tx = self.peers[to]
            .as_ref()
            .ok_or(CommError::InvalidTopology {
                rank: to,
                size: self.topology.size,
            })?;
        tx.send(Envelope {
            from: self.topology.rank,
            step: self.step.get(),
            op,
            payload,
        })
        .map_err(|_| CommError::Disconnected(to))
    }

    /// Next message from `from` for the current step.
    fn recv(&self, from: usize, op: Op) -> Result<Payload, CommError> {
        let step = self.step.get();
        let parked = {
            let mut parked = self.parked.borrow_mut();
            parked
                .iter()
                .position(|env| env.from == from && env.step == step)
                .map(|index| parked.remove(index))
        };

        let envelope = match parked {
            Some(envelope) => envelope,
            None => loop {
                let envelope = self.next_envelope(from)?;
                if envelope.from == from && envelope.step == step {
                    break envelope;
                }
                self.parked.borrow_mut().push(envelope);
            },
        };

        if envelope.op != op {
            return Err(CommError::Mismatch {
                step,
                from,
                expected: op.name(),
                found: envelope.op.name(),
            });
        }
        Ok(envelope.payload)
    }

    fn next_envelope(&self, waiting_on: usize) -> Result<Envelope, CommError> {
        match self.timeout {
            Some(timeout) => self.inbox.recv_timeout(timeout).map_err(|err| match err {
                RecvTimeoutError::Timeout => CommError::Timeout {
                    from: waiting_on,
                    timeout,
                },
                RecvTimeoutError::Disconnected => CommError::Disconnected(waiting_on),
            }),
            None => self
                .inbox
                .recv()
                .map_err(|_| CommError::Disconnected(waiting_on)),
        }
    }

    fn unexpected(&self, from: usize, expected: &'static str, found: &Payload) -> CommError {
        CommError::Mismatch {
            step: self.step.get(),
            from,
            expected,
            found: found.kind(),
        }
    }

    fn recv_bytes(&self, from: usize, op: Op, expected_len: usize) -> Result<Vec<u8>, CommError> {
        match self.recv(from, op)? {
            Payload::Bytes(bytes) if bytes.len() == expected_len => Ok(bytes),
            Payload::Bytes(bytes) => Err(CommError::LengthMismatch {
                from,
                expected: expected_len,
                found: bytes.len(),
            }),
            other => Err(self.unexpected(from, "bytes", &other)),
        }
    }

    /// Root waits for every peer to arrive, then releases them all.
    fn barrier(&self, root: usize, op: Op) -> Result<(), CommError> {
        if self.topology.rank == root {
            for peer in self.others(root) {
                match self.recv(peer, op)? {
                    Payload::Arrived => {}
                    other => return Err(self.unexpected(peer, "arrival", &other)),
                }
            }
            for peer in self.others(root) {
                self.send(peer, op, Payload::Release)?;
            }
        } else {
            self.send(root, op, Payload::Arrived)?;
            match self.recv(root, op)? {
                Payload::Release => {}
                other => return Err(self.unexpected(root, "release", &other)),
            }
        }
        Ok(())
    }

    fn collective<T>(
        &self,
        root: usize,
        op: Op,
        exchange: impl FnOnce(&Self) -> Result<T, CommError>,
    ) -> Result<T, CommError> {
        self.topology.check_root(root)?;
        log::debug!(
            "rank {}/{}: {} step {}",
            self.topology.rank,
            self.topology.size,
            op.name(),
            self.step.get()
        );
        let result = exchange(self)?;
        self.barrier(root, op)?;
        self.step.set(self.step.get() + 1);
        Ok(result)
    }
}

impl Communicator for ChannelComm {
    fn topology(&self) -> ProcessTopology {
        self.topology
    }

    fn broadcast_scalars(&self, values: &mut [u64], root: usize) -> Result<(), CommError> {
        self.collective(root, Op::Broadcast, |comm| {
            if comm.topology.rank == root {
                for peer in comm.others(root) {
                    comm.send(peer, Op::Broadcast, Payload::Scalars(values.to_vec()))?;
                }
                return Ok(());
            }
            match comm.recv(root, Op::Broadcast)? {
                Payload::Scalars(received) if received.len() == values.len() => {
                    values.copy_from_slice(&received);
                    Ok(())
                }
                Payload::Scalars(received) => Err(CommError::LengthMismatch {
                    from: root,
                    expected: values.len(),
                    found: received.len(),
                }),
                other => Err(comm.unexpected(root, "scalars", &other)),
            }
        })
    }

    fn scatter_equal(
        &self,
        buffer: Option<&[u8]>,
        partition_len: usize,
        root: usize,
    ) -> Result<Vec<u8>, CommError> {
        self.collective(root, Op::Scatter, |comm| {
            if comm.topology.rank != root {
                return comm.recv_bytes(root, Op::Scatter, partition_len);
            }

            let buffer = buffer.ok_or(CommError::MissingRootBuffer(root))?;
            let size = comm.topology.size;
            if buffer.len() < partition_len * size {
                return Err(CommError::BufferTooSmall {
                    len: buffer.len(),
                    size,
                    partition_len,
                });
            }

            let range = |rank: usize| rank * partition_len..(rank + 1) * partition_len;
            for peer in comm.others(root) {
                comm.send(peer, Op::Scatter, Payload::Bytes(buffer[range(peer)].to_vec()))?;
            }
            Ok(buffer[range(root)].to_vec())
        })
    }

    fn gather_equal(&self, local: &[u8], root: usize) -> Result<Option<Vec<u8>>, CommError> {
        self.collective(root, Op::Gather, |comm| {
            if comm.topology.rank != root {
                comm.send(root, Op::Gather, Payload::Bytes(local.to_vec()))?;
                return Ok(None);
            }

            let mut gathered = Vec::with_capacity(local.len() * comm.topology.size);
            for rank in 0..comm.topology.size {
                if rank == root {
                    gathered.extend_from_slice(local);
                } else {
                    gathered.extend(comm.recv_bytes(rank, Op::Gather, local.len())?);
                }
            }
            Ok(Some(gathered))
        })
    }

    fn finalize(self) {
        let parked = self.parked.borrow().len();
        if parked > 0 {
            log::warn!(
                "rank {} finalized with {} undelivered message(s)",
                self.topology.rank,
                parked
            );
        }
        log::debug!(
            "rank {}/{} finalized after {} collective(s)",
            self.topology.rank,
            self.topology.size,
            self.step.get()
        );
    }
}
