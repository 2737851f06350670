use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use pcd_stream::{lzf, AttributeBatch, DecodeOptions, PcdDecoder};

const NUM_POINTS: usize = 200_000;

fn binary_cloud(n: usize) -> Vec<u8> {
    let mut data = format!(
        "VERSION 0.7\nFIELDS x y z rgb intensity\nSIZE 4 4 4 4 4\nTYPE F F F U F\nCOUNT 1 1 1 1 1\nWIDTH {n}\nHEIGHT 1\nPOINTS {n}\nDATA binary\n"
    )
    .into_bytes();
    for i in 0..n {
        let f = i as f32;
        for v in [f, f * 0.5, -f] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&(i as u32 & 0x00ff_ffff).to_le_bytes());
        data.extend_from_slice(&(f / n as f32).to_le_bytes());
    }
    data
}

fn ascii_cloud(n: usize) -> Vec<u8> {
    let mut text = format!("FIELDS x y z intensity\nPOINTS {n}\nDATA ascii\n");
    for i in 0..n {
        let f = i as f32;
        text.push_str(&format!("{} {} {} {}\n", f, f * 0.5, -f, f / n as f32));
    }
    text.into_bytes()
}

// literal seed followed by maximal back-references
fn lzf_runs(output_len: usize) -> Vec<u8> {
    let mut stream = vec![0x03, 1, 2, 3, 4];
    let mut produced = 4;
    while produced < output_len {
        let run = (output_len - produced).min(264);
        if run < 3 {
            stream.push((run - 1) as u8);
            stream.extend(std::iter::repeat(9).take(run));
        } else if run - 2 < 7 {
            stream.extend([((run - 2) << 5) as u8, 3]);
        } else {
            stream.extend([0xe0, (run - 2 - 7) as u8, 3]);
        }
        produced += run;
    }
    stream
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let binary = binary_cloud(NUM_POINTS);
    let ascii = ascii_cloud(NUM_POINTS);

    for chunk_size in [64 * 1024, 2 * 1024 * 1024] {
        let decoder = PcdDecoder::new(DecodeOptions::default().with_chunk_size(chunk_size));

        group.throughput(Throughput::Bytes(binary.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("binary", chunk_size),
            &binary,
            |b, data| {
                b.iter(|| {
                    let mut points = 0;
                    decoder
                        .decode(black_box(data), &mut |batch: AttributeBatch| {
                            points += batch.num_points()
                        })
                        .unwrap();
                    black_box(points)
                })
            },
        );

        group.throughput(Throughput::Bytes(ascii.len() as u64));
        group.bench_with_input(BenchmarkId::new("ascii", chunk_size), &ascii, |b, data| {
            b.iter(|| {
                let mut points = 0;
                decoder
                    .decode(black_box(data), &mut |batch: AttributeBatch| {
                        points += batch.num_points()
                    })
                    .unwrap();
                black_box(points)
            })
        });
    }

    group.finish();
}

fn bench_lzf(c: &mut Criterion) {
    let mut group = c.benchmark_group("lzf");

    for output_len in [64 * 1024, 4 * 1024 * 1024] {
        let stream = lzf_runs(output_len);
        group.throughput(Throughput::Bytes(output_len as u64));
        group.bench_with_input(
            BenchmarkId::new("decompress", output_len),
            &stream,
            |b, stream| b.iter(|| lzf::decompress(black_box(stream), output_len).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_lzf);
criterion_main!(benches);
