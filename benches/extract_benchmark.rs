//! Benchmarks for unocr extraction performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic OCR output of growing size.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use unocr::{ContentItem, ExtractInput, ExtractOptions, Extractor, RasterPages};

/// Creates synthetic backend markdown with the given number of sections.
fn create_test_markdown(sections: usize) -> String {
    let mut content = String::new();

    for i in 0..sections {
        content.push_str(&format!("# Section {}\n\n", i + 1));
        content.push_str("Benchmark paragraph about neural networks and table extraction. ");
        content.push_str(&format!("Inline math $x_{} = {}$ appears here.\n\n", i, i * 2));
        content.push_str("| name | value | unit |\n|---|---|---|\n");
        for row in 0..5 {
            content.push_str(&format!("| item{} | {} | cm |\n", row, row * i));
        }
        content.push_str("\n<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>\n\n");
        content.push_str(&format!("![figure {}](images/fig_{}.jpg)\n\n", i, i));
        content.push_str("$$\n\\int_0^1 f(x)\\,dx\n$$\n\n");
    }

    content
}

/// Creates a content list mirroring the synthetic markdown.
fn create_test_items(sections: usize) -> Vec<ContentItem> {
    (0..sections)
        .flat_map(|i| {
            let page = (i / 4) as u32;
            vec![
                ContentItem::new("title", format!("Section {}", i + 1)).with_page(page),
                ContentItem::new("text", "Benchmark paragraph.").with_page(page),
                ContentItem::new("table", "| a | b |\n| 1 | 2 |").with_page(page),
                ContentItem::new("equation", "E=mc^2").with_page(page),
            ]
        })
        .collect()
}

/// Benchmark fallback (markdown-only) extraction at various sizes.
fn bench_fallback(c: &mut Criterion) {
    let mut group = c.benchmark_group("fallback_extraction");

    for sections in [1, 10, 50].iter() {
        let markdown = create_test_markdown(*sections);

        group.bench_function(format!("{}_sections_parallel", sections), |b| {
            let extractor = Extractor::default();
            b.iter(|| extractor.extract_markdown(black_box(&markdown)).unwrap());
        });

        group.bench_function(format!("{}_sections_sequential", sections), |b| {
            let extractor = Extractor::new(ExtractOptions::new().sequential());
            b.iter(|| extractor.extract_markdown(black_box(&markdown)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark structured (content list) extraction.
fn bench_structured(c: &mut Criterion) {
    let extractor = Extractor::default();
    let input = ExtractInput::new(create_test_markdown(10)).with_content_items(create_test_items(10));

    c.bench_function("structured_10_sections", |b| {
        b.iter(|| extractor.extract(black_box(&input)).unwrap());
    });
}

/// Benchmark asset synthesis from a rendered page.
fn bench_synthesis(c: &mut Criterion) {
    let mut page = RgbImage::from_pixel(1190, 1682, Rgb([255, 255, 255]));
    for x in 200..400 {
        for y in 300..500 {
            page.put_pixel(x, y, Rgb([20, 40, 60]));
        }
    }
    let pages = RasterPages::new(vec![page]);
    let items = vec![ContentItem::new("image", "")
        .with_img_path("images/a.jpg")
        .with_bbox([90.0, 140.0, 210.0, 260.0])];

    c.bench_function("synthesize_one_image", |b| {
        b.iter(|| {
            let input = ExtractInput::new("")
                .with_content_items(items.clone())
                .with_page_source(&pages);
            Extractor::default().extract(black_box(&input)).unwrap()
        });
    });
}

criterion_group!(benches, bench_fallback, bench_structured, bench_synthesis);
criterion_main!(benches);
