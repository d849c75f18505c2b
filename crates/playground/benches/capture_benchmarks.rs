//! Capture benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use js_engine::JsEngine;
use playground::capture::direct;
use playground::{CaptureMode, Playground, PlaygroundConfig};

const LOOP_SOURCE: &str = r#"
for (var i = 0; i < 50; i++) {
    console.log('item', i, { index: i, even: i % 2 === 0 });
}
"#;

/// Benchmark same-context capture.
fn bench_direct_capture(c: &mut Criterion) {
    let mut page = JsEngine::new().expect("engine");

    c.bench_function("direct_default_source", |b| {
        b.iter(|| direct::capture(&mut page, black_box(playground::DEFAULT_SOURCE)))
    });

    c.bench_function("direct_fifty_lines", |b| {
        b.iter(|| direct::capture(&mut page, black_box(LOOP_SOURCE)))
    });
}

/// Benchmark a full isolated run, document rebuild included.
fn bench_isolated_run(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let config = PlaygroundConfig::new()
        .with_mode(CaptureMode::Isolated)
        .with_notifications(false);
    let mut session = Playground::new(config).expect("session");
    session.set_source(LOOP_SOURCE);

    c.bench_function("isolated_fifty_lines", |b| {
        b.iter(|| runtime.block_on(session.run()))
    });
}

criterion_group!(benches, bench_direct_capture, bench_isolated_run);
criterion_main!(benches);
