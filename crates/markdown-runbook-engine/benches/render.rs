use criterion::{Criterion, criterion_group, criterion_main};
use markdown_runbook_engine::{
    AnswerKeySnapshot, ExecutionState, grammar::parse_commands, render::render,
};
mod common;

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(10);

    let runbook = common::generate_runbook(50);
    let plain = common::generate_plain_markdown(50);
    let state = ExecutionState::new();
    let keys = AnswerKeySnapshot::empty();

    group.bench_function("parse_commands", |b| {
        b.iter(|| std::hint::black_box(parse_commands(std::hint::black_box(&runbook))));
    });

    group.bench_function("render_runbook", |b| {
        b.iter(|| std::hint::black_box(render(std::hint::black_box(&runbook), &state, &keys)));
    });

    group.bench_function("render_plain", |b| {
        b.iter(|| std::hint::black_box(render(std::hint::black_box(&plain), &state, &keys)));
    });

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
