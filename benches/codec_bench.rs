use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use itertools::Itertools;
use ordpath_rs::{
    Codec, DEFAULT_SETUP,
    bitbuf::BitBuf,
    testutil::{KINDS, SetupGen, mkcodec},
};
use std::hint::black_box;
use zerocopy::IntoBytes;

const LABELS: usize = 1024;

/// Random labels of up to 32 components for `codec`.
fn labels(codec: &Codec) -> Vec<Vec<i64>> {
    let mut setup_gen = SetupGen::new(42);
    (0..LABELS).map(|_| setup_gen.label(codec, 32)).collect_vec()
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for kind in KINDS {
        let codec = mkcodec(DEFAULT_SETUP, kind);
        let labels = labels(&codec);
        let components: usize = labels.iter().map(Vec::len).sum();
        let mut out = vec![0u64; codec.max_encoded_len(32) / 8];
        group.throughput(Throughput::Elements(components as u64));

        group.bench_function(BenchmarkId::new("encode_into", format!("{kind:?}")), |b| {
            b.iter(|| {
                for label in &labels {
                    black_box(codec.encode_into(label, out.as_mut_bytes()).unwrap());
                }
            })
        });
    }

    group.finish();
}

fn benchmark_decode_with<A: BitBuf>(c: &mut Criterion, backend: &str) {
    let mut group = c.benchmark_group("decode");

    for kind in KINDS {
        let codec = mkcodec(DEFAULT_SETUP, kind);
        let labels = labels(&codec);
        let encoded = labels
            .iter()
            .map(|label| codec.encode_to_bytes(label).unwrap())
            .collect_vec();
        let components: usize = labels.iter().map(Vec::len).sum();
        let mut out = [0i64; 32];
        group.throughput(Throughput::Elements(components as u64));

        group.bench_function(BenchmarkId::new(backend, format!("{kind:?}")), |b| {
            b.iter(|| {
                for label in &encoded {
                    let decoder = codec
                        .decoder_with::<A>(label.words().as_bytes(), label.bit_len())
                        .unwrap();
                    for (slot, value) in out.iter_mut().zip(decoder) {
                        *slot = value.unwrap();
                    }
                    black_box(&out);
                }
            })
        });
    }

    group.finish();
}

fn benchmark_memcpy(c: &mut Criterion) {
    let codec = Codec::new(DEFAULT_SETUP).unwrap();
    let labels = labels(&codec);
    let components: usize = labels.iter().map(Vec::len).sum();
    let mut out = [0i64; 32];
    let mut group = c.benchmark_group("baseline");
    group.throughput(Throughput::Elements(components as u64));

    // copying the labels is the floor for decoding them
    group.bench_function("memcpy", |b| {
        b.iter(|| {
            for label in &labels {
                out[..label.len()].copy_from_slice(label);
                black_box(&out);
            }
        })
    });

    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    benchmark_decode_with::<u64>(c, "u64");
    #[cfg(target_arch = "x86_64")]
    benchmark_decode_with::<ordpath_rs::bitbuf::Sse2>(c, "sse2");
}

criterion_group!(benches, benchmark_memcpy, benchmark_encode, benchmark_decode);
criterion_main!(benches);
