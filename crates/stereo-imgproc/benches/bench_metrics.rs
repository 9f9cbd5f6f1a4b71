use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use stereo_image::Image;
use stereo_imgproc::metrics::{self, BlockWindow};

fn bench_block_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_metrics");

    for win in [5usize, 11, 21].iter() {
        group.throughput(criterion::Throughput::Elements((*win * *win) as u64));

        let parameter_string = format!("{win}x{win}");

        let size = [*win, *win].into();
        let left = Image::<u8, 1>::new(size, (0..win * win).map(|x| x as u8).collect()).unwrap();
        let right = Image::<u8, 1>::new(size, (0..win * win).map(|x| (x * 3) as u8).collect())
            .unwrap();
        let left_f32 = left.cast::<f32>().unwrap();
        let right_f32 = right.cast::<f32>().unwrap();

        group.bench_with_input(
            BenchmarkId::new("ssd_u8", &parameter_string),
            &(&left, &right),
            |b, i| {
                b.iter(|| {
                    black_box(metrics::ssd(BlockWindow::from(i.0), BlockWindow::from(i.1))).unwrap()
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("sad_u8", &parameter_string),
            &(&left, &right),
            |b, i| {
                b.iter(|| {
                    black_box(metrics::sad(BlockWindow::from(i.0), BlockWindow::from(i.1))).unwrap()
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("ssd_f32", &parameter_string),
            &(&left_f32, &right_f32),
            |b, i| {
                b.iter(|| {
                    black_box(metrics::ssd(BlockWindow::from(i.0), BlockWindow::from(i.1))).unwrap()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_block_metrics);
criterion_main!(benches);
