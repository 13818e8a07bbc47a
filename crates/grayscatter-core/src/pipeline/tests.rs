//! End-to-end tests for the partition/compute/gather pipeline

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{tempdir, TempDir};

use super::*;
use crate::comm::{LocalGroup, SingleProcess};
use crate::decoders::decode_image;

fn write_png(path: &Path, width: u32, height: u32, color: ::png::ColorType, data: &[u8]) {
    let file = fs::File::create(path).unwrap();
    let mut encoder = ::png::Encoder::new(std::io::BufWriter::new(file), width, height);
    encoder.set_color(color);
    encoder.set_depth(::png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(data).unwrap();
    writer.finish().unwrap();
}

fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    rgb.repeat((width * height) as usize)
}

fn gradient_rgb(width: u32, height: u32) -> Vec<u8> {
    (0..width * height * 3)
        .map(|i| (i * 37 % 256) as u8)
        .collect()
}

/// Single-process reference: floor(0.30R + 0.58G + 0.11B) per pixel.
fn reference(rgb: &[u8]) -> Vec<u8> {
    rgb.chunks_exact(3)
        .map(|px| {
            (f64::from(px[0]) * 0.30 + f64::from(px[1]) * 0.58 + f64::from(px[2]) * 0.11).floor()
                as u8
        })
        .collect()
}

struct Fixture {
    _dir: TempDir,
    job: Job,
}

impl Fixture {
    fn rgb(width: u32, height: u32, data: &[u8]) -> Self {
        Self::with_color(width, height, ::png::ColorType::Rgb, data, OutputFormat::Png)
    }

    fn with_color(
        width: u32,
        height: u32,
        color: ::png::ColorType,
        data: &[u8],
        format: OutputFormat,
    ) -> Self {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.png");
        write_png(&input, width, height, color, data);
        let output = dir.path().join(match format {
            OutputFormat::Png => "output.png",
            OutputFormat::Jpeg => "output.jpg",
        });
        Self {
            job: Job {
                input,
                output,
                format,
            },
            _dir: dir,
        }
    }

    fn output(&self) -> crate::models::Image {
        decode_image(&self.job.output).unwrap()
    }
}

fn quiet(remainder: RemainderPolicy) -> PipelineOptions {
    PipelineOptions {
        remainder,
        silent: true,
    }
}

/// Run the job on a local group of `size` ranks and return the coordinator's report.
fn run_group(size: usize, job: &Job, options: PipelineOptions) -> RunReport {
    let results = LocalGroup::new(size)
        .unwrap()
        .run(|comm| run(comm, job, &options))
        .unwrap();

    let mut results = results.into_iter();
    let report = results.next().unwrap().unwrap().unwrap();
    for result in results {
        assert!(matches!(result, Ok(None)));
    }
    report
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[test]
fn test_red_4x4_on_four_ranks() {
    let fixture = Fixture::rgb(4, 4, &solid_rgb(4, 4, [255, 0, 0]));

    let report = run_group(4, &fixture.job, quiet(RemainderPolicy::Drop));
    let output = fixture.output();

    assert_eq!((output.width, output.height, output.channels), (4, 4, 1));
    assert_eq!(output.pixels, vec![76; 16]);
    assert_eq!(report.process_count, 4);
    assert_eq!(report.pixels_per_rank, 4);
    assert_eq!(report.color_partition_len, 12);
    assert_eq!(report.gray_partition_len, 4);
    assert_eq!(report.remainder_pixels, 0);
    assert_eq!(report.skew, None);
}

#[test]
fn test_white_2x2_single_process() {
    let fixture = Fixture::rgb(2, 2, &solid_rgb(2, 2, [255, 255, 255]));

    let report = run(SingleProcess, &fixture.job, &quiet(RemainderPolicy::Drop))
        .unwrap()
        .unwrap();

    assert_eq!(fixture.output().pixels, vec![252; 4]);
    assert_eq!(report.process_count, 1);
    assert_eq!((report.width, report.height, report.channels), (2, 2, 3));
}

#[test]
fn test_single_pixel_truncates() {
    let fixture = Fixture::rgb(1, 1, &[10, 20, 30]);

    run(SingleProcess, &fixture.job, &quiet(RemainderPolicy::Drop)).unwrap();

    assert_eq!(fixture.output().pixels, vec![17]);
}

// ============================================================================
// Partitioning Properties
// ============================================================================

#[test]
fn test_even_partitions_match_reference() {
    let data = gradient_rgb(6, 4);
    let expected = reference(&data);

    for size in [1, 2, 3, 4, 6, 8, 12, 24] {
        let fixture = Fixture::rgb(6, 4, &data);
        run_group(size, &fixture.job, quiet(RemainderPolicy::Drop));
        assert_eq!(fixture.output().pixels, expected, "{} ranks", size);
    }
}

#[test]
fn test_single_process_matches_group() {
    let data = gradient_rgb(8, 3);

    let single = Fixture::rgb(8, 3, &data);
    run(SingleProcess, &single.job, &quiet(RemainderPolicy::Drop)).unwrap();

    let group = Fixture::rgb(8, 3, &data);
    run_group(4, &group.job, quiet(RemainderPolicy::Drop));

    assert_eq!(single.output().pixels, group.output().pixels);
}

#[test]
fn test_skewed_tail_is_zero_under_drop() {
    // 5 pixels over 2 ranks: 2 each, 1 left over
    let data = solid_rgb(5, 1, [200, 100, 50]);
    let fixture = Fixture::rgb(5, 1, &data);

    let report = run_group(2, &fixture.job, quiet(RemainderPolicy::Drop));

    assert_eq!(report.remainder_pixels, 1);
    assert_eq!(report.remainder_policy, RemainderPolicy::Drop);
    assert_eq!(fixture.output().pixels, vec![123, 123, 123, 123, 0]);

    let skew = report.skew.unwrap();
    assert_eq!(
        skew,
        PartitionSkew {
            remainder_pixels: 1,
            process_count: 2,
        }
    );
    assert!(skew
        .to_string()
        .contains("not equally distributed among 2 processes: 1 trailing pixel(s) (3 bytes)"));
}

#[test]
fn test_skewed_tail_is_computed_under_root() {
    let data = gradient_rgb(7, 3);
    let fixture = Fixture::rgb(7, 3, &data);

    let report = run_group(4, &fixture.job, quiet(RemainderPolicy::Root));

    assert_eq!(report.remainder_pixels, 1);
    assert_eq!(fixture.output().pixels, reference(&data));

    // the tail is filled in, but the uneven split is still reported
    let skew = report.skew.unwrap();
    assert_eq!((skew.remainder_pixels, skew.process_count), (1, 4));
    assert!(skew
        .to_string()
        .starts_with("pixels are not equally distributed among 4 processes"));
}

#[test]
fn test_more_ranks_than_pixels() {
    let data = solid_rgb(2, 1, [255, 0, 0]);

    let dropped = Fixture::rgb(2, 1, &data);
    let report = run_group(3, &dropped.job, quiet(RemainderPolicy::Drop));
    assert_eq!(report.pixels_per_rank, 0);
    assert_eq!(dropped.output().pixels, vec![0, 0]);

    let rooted = Fixture::rgb(2, 1, &data);
    run_group(3, &rooted.job, quiet(RemainderPolicy::Root));
    assert_eq!(rooted.output().pixels, vec![76, 76]);
}

#[test]
fn test_rerun_on_gray_output_is_floor_099() {
    let gray: Vec<u8> = (0..=255).collect();
    let first = Fixture::with_color(16, 16, ::png::ColorType::Grayscale, &gray, OutputFormat::Png);

    run_group(4, &first.job, quiet(RemainderPolicy::Drop));
    let output = first.output().pixels;

    // gray input is replicated to R = G = B
    let expected: Vec<u8> = gray
        .iter()
        .map(|&v| (f64::from(v) * 0.30 + f64::from(v) * 0.58 + f64::from(v) * 0.11) as u8)
        .collect();
    assert_eq!(output, expected);
    assert_eq!(output[255], 252);
    assert!(output.iter().skip(1).zip(&gray[1..]).all(|(&o, &v)| o < v));
}

// ============================================================================
// Channel Layout Tests
// ============================================================================

#[test]
fn test_rgba_keeps_alpha_channel() {
    let data = [255, 0, 0, 10, 0, 255, 0, 20, 0, 0, 255, 30, 255, 255, 255, 40];
    let fixture = Fixture::with_color(2, 2, ::png::ColorType::Rgba, &data, OutputFormat::Png);

    let report = run_group(2, &fixture.job, quiet(RemainderPolicy::Drop));
    let output = fixture.output();

    assert_eq!(report.gray_channels, 2);
    assert_eq!(output.channels, 2);
    assert_eq!(output.pixels, vec![76, 10, 147, 20, 28, 30, 252, 40]);
}

#[test]
fn test_gray_alpha_source_drops_alpha() {
    let data = [100, 255, 252, 0];
    let fixture =
        Fixture::with_color(2, 1, ::png::ColorType::GrayscaleAlpha, &data, OutputFormat::Png);

    run(SingleProcess, &fixture.job, &quiet(RemainderPolicy::Drop)).unwrap();
    let output = fixture.output();

    assert_eq!(output.channels, 1);
    assert_eq!(output.pixels, vec![99, 249]);
}

#[test]
fn test_jpeg_output_is_approximate() {
    let fixture = Fixture::with_color(
        16,
        16,
        ::png::ColorType::Rgb,
        &solid_rgb(16, 16, [255, 0, 0]),
        OutputFormat::Jpeg,
    );

    run_group(2, &fixture.job, quiet(RemainderPolicy::Drop));
    let output = fixture.output();

    assert_eq!(output.channels, 1);
    assert!(output.pixels.iter().all(|&v| v.abs_diff(76) <= 2));
}

// ============================================================================
// Failure Tests
// ============================================================================

#[test]
fn test_load_failure_aborts_every_rank() {
    let dir = tempdir().unwrap();
    let job = Job {
        input: dir.path().join("missing.png"),
        output: dir.path().join("out.png"),
        format: OutputFormat::Png,
    };

    let results = LocalGroup::new(3)
        .unwrap()
        .run(|comm| run(comm, &job, &quiet(RemainderPolicy::Drop)))
        .unwrap();

    let mut results = results.into_iter();
    assert!(matches!(results.next().unwrap(), Err(Error::Load { .. })));
    for result in results {
        assert!(matches!(
            result,
            Err(Error::Aborted(AbortReason::LoadFailed))
        ));
    }
    assert!(!job.output.exists());
}

#[test]
fn test_corrupt_input_aborts_single_process() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("corrupt.png");
    fs::write(&input, b"not a png").unwrap();
    let job = Job {
        input,
        output: dir.path().join("out.png"),
        format: OutputFormat::Png,
    };

    let result = run(SingleProcess, &job, &quiet(RemainderPolicy::Drop));

    assert!(matches!(result, Err(Error::Load { .. })));
}

#[test]
fn test_encode_failure_is_reported_by_coordinator_only() {
    let fixture = Fixture::rgb(2, 2, &solid_rgb(2, 2, [1, 2, 3]));
    let blocker = fixture.job.input.with_file_name("blocker");
    fs::write(&blocker, b"x").unwrap();
    let job = Job {
        output: PathBuf::from(&blocker).join("out.png"),
        ..fixture.job.clone()
    };

    let results = LocalGroup::new(2)
        .unwrap()
        .run(|comm| run(comm, &job, &quiet(RemainderPolicy::Drop)))
        .unwrap();

    assert!(matches!(results[0], Err(Error::Encode { .. })));
    assert!(matches!(results[1], Ok(None)));
}

#[test]
fn test_abort_reason_codes_round_trip() {
    for reason in [
        AbortReason::LoadFailed,
        AbortReason::UnsupportedChannels,
        AbortReason::AllocationFailed,
        AbortReason::Internal,
    ] {
        assert_eq!(AbortReason::from_code(reason.code()), Some(reason));
    }
    assert_eq!(AbortReason::from_code(0), None);
}

#[test]
fn test_report_serializes() {
    let fixture = Fixture::rgb(2, 2, &solid_rgb(2, 2, [255, 0, 0]));
    let report = run(SingleProcess, &fixture.job, &quiet(RemainderPolicy::Root))
        .unwrap()
        .unwrap();

    let yaml = serde_yaml::to_string(&report).unwrap();

    assert!(yaml.contains("remainder_policy: root"));
    assert!(yaml.contains("format: png"));
    assert!(yaml.contains("skew: null"));
}
