use std::hint::black_box;

use codspeed_criterion_compat::{
    BatchSize, Criterion, Throughput, criterion_group, criterion_main,
};

fn bench_synchronize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synchronize");

    for (name, source) in weft_benchmark::sources() {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(format!("parse/{name}"), &source, |b, s| {
            b.iter(|| black_box(weft_parse::parse(s)));
        });
        group.bench_with_input(format!("link/{name}"), &source, |b, s| {
            b.iter_batched(
                || {
                    let tokens = weft_tokenizer::make_tokens(s).expect("benchmark source lexes");
                    let tree = weft_parse::parse(s).expect("benchmark source parses");
                    (tokens, tree)
                },
                |(tokens, tree)| black_box(weft_sync::synchronize(name, tokens, tree)),
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group!(benches, bench_synchronize);
criterion_main!(benches);
