//! Benchmarks for page composition and document assembly.
//!
//! Run with: cargo bench
//!
//! Pages are synthetic: blank RGB images with a grid of text regions.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::RgbImage;

use searchpdf::model::{Metadata, Quad, SourceImage, TextRegion};
use searchpdf::ocr::Recognition;
use searchpdf::pdf::{assemble, CoordinateMapper, FontResource, PageCompositor, PreparedPage};

/// A page with `regions` text lines stacked from the top.
fn prepared_page(index: usize, regions: usize) -> PreparedPage {
    let image = SourceImage::from_rgb(index, format!("page{}.png", index), RgbImage::new(1240, 1754));
    let regions = (0..regions)
        .map(|i| {
            TextRegion::new(
                index,
                Quad::from_rect(80.0, 60.0 + 28.0 * i as f32, 900.0, 24.0),
                format!("Line {} of the benchmark page", i + 1),
                0.95,
            )
        })
        .collect();
    let recognition = Recognition {
        regions,
        ..Recognition::default()
    };
    PreparedPage::new(&image, recognition).unwrap()
}

/// Benchmark coordinate mapping for a single region.
fn bench_mapping(c: &mut Criterion) {
    let mapper = CoordinateMapper::new();
    let region = TextRegion::new(0, Quad::from_rect(10.0, 120.0, 200.0, 30.0), "text", 0.9);

    c.bench_function("map_region", |b| {
        b.iter(|| mapper.map(black_box(&region), black_box(1754.0)));
    });
}

/// Benchmark composing one page at various region counts.
fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_page");
    let compositor = PageCompositor::default();

    for regions in [0, 10, 60].iter() {
        group.bench_function(format!("{}_regions", regions), |b| {
            b.iter_batched(
                || prepared_page(0, *regions),
                |page| {
                    let mut font = FontResource::builtin();
                    compositor.compose(page, &mut font).unwrap()
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Benchmark assembling a small document.
fn bench_assemble(c: &mut Criterion) {
    let compositor = PageCompositor::default();

    c.bench_function("assemble_5_pages", |b| {
        b.iter_batched(
            || {
                let mut font = FontResource::builtin();
                let pages: Vec<_> = (0..5)
                    .map(|i| compositor.compose(prepared_page(i, 20), &mut font).unwrap())
                    .collect();
                (pages, font)
            },
            |(pages, font)| assemble(pages, font, Metadata::default()).unwrap(),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_mapping, bench_compose, bench_assemble);
criterion_main!(benches);
