//! Rank 0: the only rank that touches the codec or holds whole-image buffers.

use std::path::Path;
use std::time::Instant;

use crate::buffer;
use crate::comm::{Communicator, ProcessTopology, ROOT_RANK};
use crate::decoders::decode_image;
use crate::error::{Error, Result};
use crate::exporters::export_image;
use crate::kernel;
use crate::models::{GrayscaleImage, Image, ImageMetadata, OutputFormat};
use crate::partition::{PartitionPlan, PartitionSkew, RemainderPolicy};
use crate::planes::{self, ColorPlanes};

use super::{share_metadata, worker, AbortReason, Job, PipelineOptions, RunReport, Verdict};

/// Everything the coordinator prepares before saying go.
#[derive(Debug)]
pub struct StagedImage {
    pub metadata: ImageMetadata,
    pub plan: PartitionPlan,
    pub planes: ColorPlanes,
    /// Zeroed gray plane, one byte per pixel
    pub gray: Vec<u8>,
}

pub(super) fn run<C: Communicator>(
    comm: &C,
    job: &Job,
    options: &PipelineOptions,
) -> Result<RunReport> {
    let started = Instant::now();

    let staged = match stage(&job.input, comm.topology(), options.silent) {
        Ok(staged) => staged,
        Err(err) => {
            announce_abort(comm, err.abort_reason());
            return Err(err);
        }
    };
    super::exchange_verdict(comm, Verdict::Go)?;

    let metadata = broadcast_metadata(comm, staged.metadata)?;
    let (color, skew) = partition_and_scatter(comm, &staged.plan, &staged.planes.rgb)?;
    let gray = worker::compute(&color);
    drop(color);

    let mut report = RunReport::new(job, &staged.plan, metadata, options);
    report.skew = skew;

    let image = gather(comm, &gray, staged, options.remainder)?;
    log::info!(
        "gathered {} gray pixel(s) from {} rank(s)",
        report.pixels_per_rank * report.process_count,
        report.process_count
    );

    write(&job.output, &image, job.format, options.silent)?;
    log::info!("wrote {} as {}", job.output.display(), job.format);

    report.elapsed_secs = started.elapsed().as_secs_f64();
    Ok(report)
}

fn announce_abort<C: Communicator>(comm: &C, reason: AbortReason) {
    log::debug!("announcing no-go: {}", reason);
    match super::exchange_verdict(comm, Verdict::NoGo(reason)) {
        Err(Error::Aborted(_)) | Ok(()) => {}
        Err(err) => log::warn!("failed to announce abort to the group: {}", err),
    }
}

/// Decode the input image.
pub fn load(path: &Path, silent: bool) -> Result<Image> {
    let image = decode_image(path)?;
    if !silent {
        println!(
            "Loaded image {} with a width of {}px, a height of {}px and {} channels",
            path.display(),
            image.width,
            image.height,
            image.channels
        );
    }
    Ok(image)
}

/// Load the input and allocate every whole-image buffer.
///
/// All coordinator-side failures that can happen before the first
/// data-bearing collective happen here.
pub fn stage(path: &Path, topology: ProcessTopology, silent: bool) -> Result<StagedImage> {
    let image = load(path, silent)?;
    let metadata = image.metadata();
    let planes = planes::split_planes(&image)?;
    drop(image);

    let plan = PartitionPlan::new(&metadata, topology);
    let gray = buffer::zeroed(metadata.pixel_count(), "gray image")?;

    if !silent {
        println!(
            "Create image array with a width of {}px, a height of {}px and {} gray channel(s)",
            metadata.width,
            metadata.height,
            metadata.gray_channels()
        );
    }

    Ok(StagedImage {
        metadata,
        plan,
        planes,
        gray,
    })
}

/// Send `[width, height, channels]` to every rank.
pub fn broadcast_metadata<C: Communicator>(
    comm: &C,
    metadata: ImageMetadata,
) -> Result<ImageMetadata> {
    share_metadata(comm, Some(metadata))
}

/// Scatter equal color partitions and return the coordinator's own,
/// together with the skew diagnostic when the plan has a remainder.
///
/// A skewed plan is reported and the tail is left out of the scatter.
pub fn partition_and_scatter<C: Communicator>(
    comm: &C,
    plan: &PartitionPlan,
    rgb: &[u8],
) -> Result<(Vec<u8>, Option<PartitionSkew>)> {
    let skew = plan.skew();
    if let Some(skew) = &skew {
        log::warn!("{}", skew);
    }
    let local = comm.scatter_equal(Some(rgb), plan.color_partition_len(), ROOT_RANK)?;
    Ok((local, skew))
}

/// Collect every rank's gray partition and assemble the output image.
pub fn gather<C: Communicator>(
    comm: &C,
    local: &[u8],
    staged: StagedImage,
    remainder: RemainderPolicy,
) -> Result<GrayscaleImage> {
    let gathered = worker::send_partition(comm, local)?
        .ok_or(Error::Aborted(AbortReason::Internal))?;
    assemble(&gathered, staged, remainder)
}

fn assemble(
    gathered: &[u8],
    staged: StagedImage,
    remainder: RemainderPolicy,
) -> Result<GrayscaleImage> {
    let StagedImage {
        metadata,
        plan,
        planes,
        mut gray,
    } = staged;

    let covered = plan.covered_pixels();
    if gathered.len() != covered {
        return Err(Error::Aborted(AbortReason::Internal));
    }
    gray[..covered].copy_from_slice(gathered);

    if remainder == RemainderPolicy::Root && plan.remainder_pixels() > 0 {
        let tail = &planes.rgb[plan.remainder_color_range()];
        kernel::gray_partition_into(tail, &mut gray[covered..]);
        log::debug!("computed {} remainder pixel(s) on the coordinator", plan.remainder_pixels());
    }

    let (channels, pixels) = match planes.alpha {
        Some(alpha) => (2, planes::interleave_alpha(&gray, &alpha)?),
        None => (1, gray),
    };

    Ok(GrayscaleImage {
        width: metadata.width,
        height: metadata.height,
        channels,
        pixels,
    })
}

/// Encode the grayscale image.
pub fn write(path: &Path, image: &GrayscaleImage, format: OutputFormat, silent: bool) -> Result<()> {
    export_image(image, path, format)?;
    if !silent {
        println!(
            "Wrote image {} with a width of {}px, a height of {}px and {} channels",
            path.display(),
            image.width,
            image.height,
            image.channels
        );
    }
    Ok(())
}
