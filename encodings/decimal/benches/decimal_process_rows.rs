#![allow(clippy::unwrap_used)]

use colchunk_array::{Chunk, MantissaWidth, RollupVisitor, RowVisitor, ValueMode};
use colchunk_decimal::{DecimalChunk, DecimalHeader};
use divan::Bencher;
use rand::prelude::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    divan::main();
}

const WIDTHS: &[MantissaWidth] = &[MantissaWidth::W1, MantissaWidth::W2, MantissaWidth::W4];

fn chunk(width: MantissaWidth, len: usize) -> DecimalChunk {
    let mut rng = StdRng::seed_from_u64(0);
    let mantissas = (0..len)
        .map(|_| {
            rng.random_bool(0.95)
                .then(|| rng.random_range(width.min_value()..=width.max_value()))
        })
        .collect::<Vec<_>>();
    let header = DecimalHeader::try_new(1_000, -2, width).unwrap();
    DecimalChunk::from_mantissas(header, &mantissas).unwrap()
}

/// Sums expanded mantissas without ever decoding to `f64`.
#[derive(Default)]
struct MantissaSum {
    sum: i64,
    nas: usize,
}

impl RowVisitor for MantissaSum {
    fn value_mode(&self) -> ValueMode {
        ValueMode::Expanded
    }

    fn add_value(&mut self, _value: f64) {}

    fn add_expanded(&mut self, mantissa: i64, _exponent: i32) {
        self.sum = self.sum.wrapping_add(mantissa);
    }

    fn add_nas(&mut self, count: usize) {
        self.nas += count;
    }
}

#[divan::bench(args = WIDTHS)]
fn decoded_rollup(bencher: Bencher, width: MantissaWidth) {
    let chunk = chunk(width, 100_000);
    bencher.with_inputs(|| &chunk).bench_refs(|chunk| {
        let mut rollup = RollupVisitor::default();
        chunk.process_rows(&mut rollup, 0..chunk.len()).unwrap();
        rollup
    });
}

#[divan::bench(args = WIDTHS)]
fn expanded_sum(bencher: Bencher, width: MantissaWidth) {
    let chunk = chunk(width, 100_000);
    bencher.with_inputs(|| &chunk).bench_refs(|chunk| {
        let mut sum = MantissaSum::default();
        chunk.process_rows(&mut sum, 0..chunk.len()).unwrap();
        (sum.sum, sum.nas)
    });
}

#[divan::bench(args = WIDTHS)]
fn get_doubles(bencher: Bencher, width: MantissaWidth) {
    let chunk = chunk(width, 100_000);
    bencher
        .with_inputs(|| vec![0.0; chunk.len()])
        .bench_local_refs(|dest| chunk.get_doubles(dest, 0..chunk.len(), f64::NAN).unwrap());
}

#[divan::bench(args = WIDTHS)]
fn scalar_get_double(bencher: Bencher, width: MantissaWidth) {
    let chunk = chunk(width, 100_000);
    bencher.with_inputs(|| &chunk).bench_refs(|chunk| {
        (0..chunk.len())
            .map(|row| chunk.get_double(row))
            .filter(|v| !v.is_nan())
            .sum::<f64>()
    });
}
