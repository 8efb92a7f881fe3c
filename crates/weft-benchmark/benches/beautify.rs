use std::hint::black_box;

use codspeed_criterion_compat::{
    BatchSize, Criterion, Throughput, criterion_group, criterion_main,
};
use weft_fmt::{Options, beautify};
use weft_sync::link;

fn bench_passes(c: &mut Criterion) {
    let mut group = c.benchmark_group("passes");
    let options = Options::default();

    for (name, source) in weft_benchmark::sources() {
        let linked = link(name, &source).expect("benchmark source links");

        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(format!("beautify/{name}"), |b| {
            b.iter(|| black_box(beautify(&linked, &options)));
        });
        group.bench_function(format!("fstringify/{name}"), |b| {
            b.iter_batched(
                || linked.clone(),
                |mut linked| black_box(weft_fstring::rewrite_interpolations(&mut linked)),
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group!(benches, bench_passes);
criterion_main!(benches);
