//! Benchmarks for hwpmerge assembly performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks merge synthetic HML fragments into a synthetic template.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

const TEMPLATE: &str = r#"<HWPML Version="2.8"><HEAD><MAPPINGTABLE><BINDATALIST Count="0"/><CHARSHAPELIST Count="1"><CHARSHAPE Id="0"/></CHARSHAPELIST><PARASHAPELIST Count="1"><PARASHAPE Id="0"/></PARASHAPELIST></MAPPINGTABLE></HEAD><BODY><SECTION Id="0"><P InstId="1" ParaShape="0"><TEXT CharShape="0"><SECDEF/><CHAR>{{TITLE}} {{DATE}}</CHAR></TEXT></P><P ParaShape="0"><TEXT CharShape="0"><CHAR>{{CONTENT_HERE}}</CHAR></TEXT></P></SECTION></BODY><TAIL><BINDATASTORAGE/></TAIL></HWPML>"#;

/// Creates a source with the given number of questions, each with one image.
fn create_source(questions: usize) -> Vec<u8> {
    let mut items = String::new();
    let mut data = String::new();
    let mut body = String::new();

    for i in 1..=questions {
        items.push_str(&format!(r#"<BINITEM BinData="{}" Format="png" Type="Embedding"/>"#, i));
        data.push_str(&format!(
            r#"<BINDATA Id="{}" Encoding="Base64" Compress="false">iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==</BINDATA>"#,
            i
        ));
        body.push_str(&format!(
            r#"<P InstId="{0}" ParaShape="0"><TEXT CharShape="0"><ENDNOTE><AUTONUM Number="{0}"/></ENDNOTE><CHAR>{0}. Benchmark question text for hwpmerge.</CHAR></TEXT></P><P ParaShape="0"><TEXT CharShape="0"><PICTURE><IMAGE BinItem="{0}"/></PICTURE></TEXT></P>"#,
            i
        ));
    }

    format!(
        r#"<HWPML Version="2.8"><HEAD><MAPPINGTABLE><BINDATALIST Count="{n}">{items}</BINDATALIST><CHARSHAPELIST Count="1"><CHARSHAPE Id="0"/></CHARSHAPELIST><PARASHAPELIST Count="1"><PARASHAPE Id="0"/></PARASHAPELIST></MAPPINGTABLE></HEAD><BODY><SECTION Id="0">{body}</SECTION></BODY><TAIL><BINDATASTORAGE Count="{n}">{data}</BINDATASTORAGE></TAIL></HWPML>"#,
        n = questions,
        items = items,
        body = body,
        data = data
    )
    .into_bytes()
}

/// Benchmark package format detection.
fn bench_format_detection(c: &mut Criterion) {
    let source = create_source(1);
    let text = b"Not a package at all, just random text content";

    c.bench_function("detect_hml", |b| {
        b.iter(|| hwpmerge::detect_format_from_bytes(black_box(&source)).unwrap());
    });

    c.bench_function("detect_unknown", |b| {
        b.iter(|| hwpmerge::detect_format_from_bytes(black_box(text)).is_err());
    });
}

/// Benchmark fragment extraction at various source sizes.
fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");

    for questions in [1, 10, 50].iter() {
        let package = hwpmerge::read_package(&create_source(*questions)).unwrap();

        group.bench_function(format!("{}_questions", questions), |b| {
            b.iter(|| {
                let options = hwpmerge::ExtractOptions::new().question(1);
                hwpmerge::extract_fragment(black_box(&package), options, 0).unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark full merge runs with a growing number of sources.
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    let options = hwpmerge::MergeOptions::new().with_title("Benchmark").with_date("2024-01-01");

    for sources in [1, 10, 30].iter() {
        let inputs: Vec<Vec<u8>> = (0..*sources).map(|_| create_source(3)).collect();

        group.bench_function(format!("{}_sources", sources), |b| {
            b.iter(|| hwpmerge::merge(black_box(TEMPLATE.as_bytes()), &inputs, &options).unwrap());
        });
    }

    group.finish();
}

/// Benchmark parallel batches of independent merges.
fn bench_batch(c: &mut Criterion) {
    let job = hwpmerge::MergeJob {
        template: TEMPLATE.as_bytes().to_vec(),
        sources: (0..5).map(|_| create_source(2)).collect(),
        options: hwpmerge::MergeOptions::new().with_title("Batch"),
    };
    let jobs = vec![job; 8];

    c.bench_function("batch_8_jobs", |b| {
        b.iter(|| hwpmerge::merge_batch(black_box(&jobs)));
    });
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_extraction,
    bench_merge,
    bench_batch,
);
criterion_main!(benches);
