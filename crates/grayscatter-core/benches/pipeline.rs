//! Benchmarks for grayscatter-core pipeline operations
//!
//! Run with: cargo bench -p grayscatter-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grayscatter_core::comm::{Communicator, LocalGroup, ROOT_RANK};
use grayscatter_core::kernel::gray_partition;
use grayscatter_core::partition::PartitionPlan;

/// Generate synthetic packed RGB data
fn generate_test_rgb(width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut data = Vec::with_capacity(pixel_count * 3);

    for i in 0..pixel_count {
        let x = i % width as usize;
        let y = i / width as usize;

        data.push((x * 255 / width as usize) as u8);
        data.push((y * 255 / height as usize) as u8);
        data.push(((x + y) % 256) as u8);
    }

    data
}

/// Benchmark the partition kernel on a single rank
fn bench_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel");

    for size in [256, 512, 1024, 2048].iter() {
        let width = *size;
        let height = *size;
        let pixel_count = (width * height) as u64;

        group.throughput(Throughput::Elements(pixel_count));

        group.bench_with_input(
            BenchmarkId::new("gray_partition", format!("{}x{}", width, height)),
            &(width, height),
            |b, &(w, h)| {
                let data = generate_test_rgb(w, h);
                b.iter(|| gray_partition(black_box(&data)));
            },
        );
    }

    group.finish();
}

/// Benchmark scatter, compute and gather over an in-process group
fn bench_local_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_group");
    group.sample_size(20);

    let (width, height) = (1024u32, 1024u32);
    let data = generate_test_rgb(width, height);
    group.throughput(Throughput::Elements(u64::from(width * height)));

    for ranks in [1usize, 2, 4, 8].iter() {
        let plan = PartitionPlan::for_pixels((width * height) as usize, *ranks);
        let local_group = match LocalGroup::new(*ranks) {
            Ok(local_group) => local_group,
            Err(_) => continue,
        };

        group.bench_with_input(BenchmarkId::new("scatter_gather", ranks), ranks, |b, _| {
            b.iter(|| {
                local_group
                    .run(|comm| {
                        let send = comm.topology().is_root().then_some(data.as_slice());
                        let color = comm.scatter_equal(send, plan.color_partition_len(), ROOT_RANK)?;
                        let gray = gray_partition(&color);
                        comm.gather_equal(&gray, ROOT_RANK)
                    })
                    .map(black_box)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_kernel, bench_local_group);
criterion_main!(benches);
