use std::hint::black_box;

use codspeed_criterion_compat::{Criterion, Throughput, criterion_group, criterion_main};
use weft_tokenizer::{Tokenizer, make_tokens};

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for (name, source) in weft_benchmark::sources() {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(format!("raw/{name}"), &source, |b, s| {
            b.iter(|| black_box(Tokenizer::new(s).tokenize()));
        });
        group.bench_with_input(format!("tokens/{name}"), &source, |b, s| {
            b.iter(|| black_box(make_tokens(s)));
        });
    }
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
