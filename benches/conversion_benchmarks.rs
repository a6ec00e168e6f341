//! Performance benchmarks for table-ir
//!
//! These benchmarks measure the performance of the core HTML <-> OTSL
//! conversion operations across table sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use table_ir::{ConversionOptions, Converter};

fn html_table(rows: usize, cols: usize) -> String {
    let mut html = String::from("<table>");
    for r in 0..rows {
        html.push_str("<tr>");
        for c in 0..cols {
            html.push_str(&format!("<td>R{r}C{c}</td>"));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

fn benchmark_html_to_otsl(c: &mut Criterion) {
    let mut group = c.benchmark_group("html_to_otsl");
    let converter = Converter::new(ConversionOptions::default());

    for &(rows, cols) in &[(10, 5), (100, 10), (1000, 10)] {
        let html = html_table(rows, cols);
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows_x_cols", format!("{rows}x{cols}")), &html, |b, html| {
            b.iter(|| converter.html_to_otsl(black_box(html)).unwrap())
        });
    }

    group.finish();
}

fn benchmark_otsl_to_html(c: &mut Criterion) {
    let mut group = c.benchmark_group("otsl_to_html");
    let converter = Converter::new(ConversionOptions::default());

    for &(rows, cols) in &[(10, 5), (100, 10), (1000, 10)] {
        let html = html_table(rows, cols);
        let otsl = converter.html_to_otsl(&html).unwrap();
        group.throughput(Throughput::Bytes(otsl.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows_x_cols", format!("{rows}x{cols}")), &otsl, |b, otsl| {
            b.iter(|| converter.otsl_to_html(black_box(otsl)).unwrap())
        });
    }

    group.finish();
}

fn benchmark_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("roundtrip_html");
    let converter = Converter::new(ConversionOptions::default());

    let html = html_table(100, 10);
    group.bench_function("html_otsl_html", |b| {
        b.iter(|| converter.roundtrip_html(black_box(&html)).unwrap())
    });

    group.finish();
}

fn benchmark_latex_tagging(c: &mut Criterion) {
    let mut group = c.benchmark_group("latex_tagging");

    let cells_with_formulas = (0..200)
        .map(|i| format!("value $x_{i} + y^{{{i}}}$ and $$\\sum_{{k=0}}^{i} k$$"))
        .collect::<Vec<_>>()
        .join(" ");

    group.throughput(Throughput::Bytes(cells_with_formulas.len() as u64));
    group.bench_function("tag_formulas", |b| {
        b.iter(|| table_ir::latex::tag_formulas(black_box(&cells_with_formulas)))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_html_to_otsl,
    benchmark_otsl_to_html,
    benchmark_roundtrip,
    benchmark_latex_tagging
);
criterion_main!(benches);
