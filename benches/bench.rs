use criterion::{criterion_group, criterion_main, Criterion};
use yawl::{Dumper, Loader};

/// A synthetic document large enough to exercise the scanner's simple-key
/// machinery, flow and block collections, and the emitter's line wrapping.
fn large_document() -> String {
    let mut text = String::with_capacity(1 << 20);
    for section in 0..200 {
        text.push_str(&format!("section{section}:\n"));
        for entry in 0..20 {
            text.push_str(&format!(
                "  entry{entry}:\n    id: {id}\n    ratio: {ratio}\n    \
                 tags: [alpha, beta, gamma]\n    note: a plain scalar that is \
                 long enough to wrap when the line width runs out {entry}\n",
                id = section * 100 + entry,
                ratio = (entry as f64) / 7.0,
            ));
        }
    }
    text
}

pub fn pipeline(c: &mut Criterion) {
    let input = large_document();

    c.bench_function("load large", |b| {
        b.iter(|| {
            let mut loader = Loader::from_str(&input).unwrap();
            loader.next_document().unwrap().unwrap()
        })
    });

    let document = Loader::from_str(&input)
        .unwrap()
        .next_document()
        .unwrap()
        .unwrap();

    c.bench_function("dump large", |b| {
        let dumper = Dumper::new();
        b.iter(|| dumper.dump_to_string(std::slice::from_ref(&document)).unwrap())
    });
}

criterion_group!(benches, pipeline);
criterion_main!(benches);
