//! Grayscatter Core Library
//!
//! Distributed color-to-grayscale conversion: a coordinator scatters equal
//! RGB partitions across a process group, every rank converts its own
//! partition, and the coordinator gathers and writes the result.

pub mod buffer;
pub mod comm;
pub mod config;
pub mod decoders;
pub mod error;
pub mod exporters;
pub mod kernel;
pub mod models;
pub mod partition;
pub mod pipeline;
pub mod planes;

// Re-export commonly used types
pub use comm::{Communicator, LocalGroup, ProcessTopology, SingleProcess, ROOT_RANK};
#[cfg(feature = "mpi")]
pub use comm::MpiComm;
pub use error::{CommError, Error, Result};
pub use models::{GrayscaleImage, Image, ImageMetadata, OutputFormat};
pub use partition::{PartitionPlan, RemainderPolicy};
pub use pipeline::{AbortReason, Job, PipelineOptions, RunReport};
