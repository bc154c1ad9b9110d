//! Benchmarks comparing the bitwise and table-driven CRC implementations,
//! and the cost of pushing a frame through the receiver.
//!
//! Run with: cargo bench --bench crc_benchmark

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mbrtu::crc::{BitwiseCrc, Crc16, LookupCrc};
use mbrtu::{FrameReceiver, ManualClock, RtuConfig, StaticMemory};

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

fn bench_crc(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc16");
    for len in [8usize, 64, 256] {
        let data = payload(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("bitwise", len), &data, |b, data| {
            b.iter(|| BitwiseCrc::compute(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("lookup", len), &data, |b, data| {
            b.iter(|| LookupCrc::compute(black_box(data)))
        });
    }
    group.finish();
}

fn bench_receive(c: &mut Criterion) {
    let mut frame = payload(254);
    frame.extend_from_slice(&LookupCrc::to_wire(&frame));

    c.bench_function("receive_256_byte_frame", |b| {
        let mut memory = StaticMemory::<256, 1>::default();
        let mut rx: FrameReceiver<[u8; 256], ManualClock, LookupCrc> =
            match FrameReceiver::new(&mut memory, &RtuConfig::default(), ManualClock::new(0)) {
                Ok(rx) => rx,
                Err(e) => panic!("receiver setup failed: {e}"),
            };
        let mut t = 0u64;
        b.iter(|| {
            for &byte in &frame {
                let _ = rx.on_byte(byte, t);
                t += 1_000;
            }
            t += 10_000;
            black_box(rx.poll_at(t).map(|f| f.is_valid()))
        })
    });
}

criterion_group!(benches, bench_crc, bench_receive);
criterion_main!(benches);
