use colchunk_array::{
    C1Chunk, C2Chunk, C4Chunk, Chunk, MantissaWidth, RowVisitor, ValueMode, expanded_to_f64, pow10,
};
use colchunk_decimal::{DecimalChunk, DecimalHeader};
use colchunk_error::{ChunkResult, chunk_bail, chunk_err};
use itertools::{Itertools, MinMaxResult};

use crate::EncodedChunk;

// Bounds of the f64 values that convert to i64 without saturating.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Row {
    Na,
    Expanded { mantissa: i64, exponent: i32 },
    Double(f64),
}

impl Row {
    /// The integer `k` such that this row equals `k * 10^exponent` exactly.
    fn rescale(self, exponent: i32) -> Option<i64> {
        match self {
            Row::Na => None,
            Row::Expanded {
                mantissa,
                exponent: from,
            } => rescale_mantissa(mantissa, from, exponent),
            Row::Double(value) => rescale_double(value, exponent),
        }
    }
}

fn rescale_mantissa(mantissa: i64, from: i32, to: i32) -> Option<i64> {
    if mantissa == 0 {
        return Some(0);
    }
    let shift = u32::try_from(i64::from(from).abs_diff(i64::from(to))).ok()?;
    let factor = 10i64.checked_pow(shift)?;
    if from >= to {
        mantissa.checked_mul(factor)
    } else {
        (mantissa % factor == 0).then(|| mantissa / factor)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn rescale_double(value: f64, exponent: i32) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let scaled = if exponent < 0 {
        value * pow10(exponent.unsigned_abs())
    } else {
        value / pow10(exponent.unsigned_abs())
    }
    .round();
    if !(I64_LOWER..I64_UPPER).contains(&scaled) {
        return None;
    }
    let candidate = scaled as i64;
    (expanded_to_f64(candidate, exponent).to_bits() == value.to_bits()).then_some(candidate)
}

/// A visitor that collects the rows of one or more chunks and re-encodes them.
///
/// Rows are collected in expanded `mantissa * 10^exponent` form whenever the source offers it.
#[derive(Debug, Clone, Default)]
pub struct ChunkBuilder {
    rows: Vec<Row>,
}

impl ChunkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append every row of `chunk`.
    pub fn extend_from_chunk<C: Chunk>(&mut self, chunk: &C) -> ChunkResult<()> {
        self.rows.reserve(chunk.len());
        chunk.process_rows(self, 0..chunk.len())
    }

    /// Scale every row to `10^scale_exponent` and encode the result in the narrowest mantissa
    /// width that holds the spread between the smallest and the largest value.
    pub fn finish_decimal(self, scale_exponent: i32) -> ChunkResult<DecimalChunk> {
        let scaled = self.scaled(scale_exponent)?;

        let (min, max) = match scaled.iter().flatten().minmax() {
            MinMaxResult::NoElements => (0, 0),
            MinMaxResult::OneElement(&value) => (value, value),
            MinMaxResult::MinMax(&min, &max) => (min, max),
        };
        let spread = max.abs_diff(min);
        let Some(width) = MantissaWidth::ALL
            .into_iter()
            .find(|width| spread <= width.span())
        else {
            log::debug!(
                "values between {}e{} and {}e{} do not fit 4-byte mantissas",
                min,
                scale_exponent,
                max,
                scale_exponent
            );
            chunk_bail!(NotImplemented: "no mantissa width holds a spread of {}", spread);
        };
        let bias = min.checked_sub(width.min_value()).ok_or_else(|| {
            chunk_err!(
                "minimum {} leaves no room for a {}-byte bias",
                min,
                width.byte_width()
            )
        })?;

        let header = DecimalHeader::try_new(bias, scale_exponent, width)?;
        let mantissas = scaled
            .iter()
            .map(|value| value.map(|value| value.wrapping_sub(bias)))
            .collect_vec();
        DecimalChunk::from_mantissas(header, &mantissas)
    }

    /// Encode every row as a plain integer of the given width.
    pub fn finish_plain(self, width: MantissaWidth) -> ChunkResult<EncodedChunk> {
        let values = self.scaled(0)?;
        Ok(match width {
            MantissaWidth::W1 => C1Chunk::from_values(&values)?.into(),
            MantissaWidth::W2 => C2Chunk::from_values(&values)?.into(),
            MantissaWidth::W4 => C4Chunk::from_values(&values)?.into(),
        })
    }

    fn scaled(&self, exponent: i32) -> ChunkResult<Vec<Option<i64>>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, row)| match row {
                Row::Na => Ok(None),
                _ => row.rescale(exponent).map(Some).ok_or_else(|| {
                    log::debug!("row {} rejected at exponent {}", idx, exponent);
                    chunk_err!(
                        "row {} cannot be represented exactly with exponent {}",
                        idx,
                        exponent
                    )
                }),
            })
            .collect()
    }
}

impl RowVisitor for ChunkBuilder {
    fn value_mode(&self) -> ValueMode {
        ValueMode::Expanded
    }

    fn add_value(&mut self, value: f64) {
        self.rows.push(if value.is_nan() {
            Row::Na
        } else {
            Row::Double(value)
        });
    }

    fn add_long(&mut self, value: i64) {
        self.add_expanded(value, 0);
    }

    fn add_expanded(&mut self, mantissa: i64, exponent: i32) {
        self.rows.push(Row::Expanded { mantissa, exponent });
    }

    fn add_nas(&mut self, count: usize) {
        self.rows.extend(std::iter::repeat_n(Row::Na, count));
    }
}

#[cfg(test)]
mod tests {
    use colchunk_error::ChunkError;
    use rand::prelude::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    use super::*;

    fn decimal(
        bias: i64,
        scale_exponent: i32,
        width: MantissaWidth,
        mantissas: &[Option<i64>],
    ) -> DecimalChunk {
        let header = DecimalHeader::try_new(bias, scale_exponent, width).unwrap();
        DecimalChunk::from_mantissas(header, mantissas).unwrap()
    }

    fn rebuild<C: Chunk>(chunk: &C) -> ChunkBuilder {
        let mut builder = ChunkBuilder::new();
        builder.extend_from_chunk(chunk).unwrap();
        builder
    }

    fn doubles<C: Chunk>(chunk: &C) -> Vec<f64> {
        let mut values = vec![0.0; chunk.len()];
        chunk.get_doubles(&mut values, 0..chunk.len(), f64::NAN).unwrap();
        values
    }

    fn assert_same_values<A: Chunk, B: Chunk>(a: &A, b: &B) {
        assert_eq!(a.len(), b.len());
        for (row, (x, y)) in doubles(a).into_iter().zip(doubles(b)).enumerate() {
            assert_eq!(a.is_na(row), b.is_na(row), "row {row}");
            if !x.is_nan() {
                assert_eq!(x.to_bits(), y.to_bits(), "row {row}");
            }
        }
    }

    #[rstest]
    #[case(MantissaWidth::W1)]
    #[case(MantissaWidth::W2)]
    #[case(MantissaWidth::W4)]
    fn rebuild_reproduces_values(#[case] width: MantissaWidth) {
        let mut rng = StdRng::seed_from_u64(0);
        let mantissas = (0..1_000)
            .map(|_| {
                rng.random_bool(0.8)
                    .then(|| rng.random_range(width.min_value()..=width.max_value()))
            })
            .collect_vec();
        let chunk = decimal(777, -3, width, &mantissas);

        let rebuilt = rebuild(&chunk).finish_decimal(-3).unwrap();
        assert_same_values(&chunk, &rebuilt);
        assert!(rebuilt.width() <= width);
    }

    #[test]
    fn narrowest_width() {
        let chunk = decimal(
            0,
            -2,
            MantissaWidth::W4,
            &[Some(100_000), None, Some(100_254)],
        );
        let rebuilt = rebuild(&chunk).finish_decimal(-2).unwrap();
        assert_eq!(rebuilt.width(), MantissaWidth::W1);
        assert_eq!(rebuilt.bias(), 100_000);
        assert_eq!(rebuilt.mantissa(2), 254);
        assert_same_values(&chunk, &rebuilt);

        let chunk = decimal(0, -2, MantissaWidth::W4, &[Some(0), Some(255)]);
        let rebuilt = rebuild(&chunk).finish_decimal(-2).unwrap();
        assert_eq!(rebuilt.width(), MantissaWidth::W2);
        assert_eq!(rebuilt.mantissa(0), MantissaWidth::W2.min_value());
        assert_same_values(&chunk, &rebuilt);
    }

    #[test]
    fn finer_exponent() {
        let chunk = decimal(1000, -2, MantissaWidth::W1, &[Some(50), None, Some(0)]);
        let rebuilt = rebuild(&chunk).finish_decimal(-4).unwrap();
        assert_eq!(rebuilt.scale_exponent(), -4);
        assert_eq!(rebuilt.get_double(0), 10.5);
        assert!(rebuilt.is_na(1));
        assert_eq!(rebuilt.get_double(2), 10.0);
    }

    #[test]
    fn coarser_exponent_loses_digits() {
        let chunk = decimal(1000, -2, MantissaWidth::W1, &[Some(50), Some(51)]);
        assert!(rebuild(&chunk).finish_decimal(-1).is_err());

        let chunk = decimal(1000, -2, MantissaWidth::W1, &[Some(50), Some(60)]);
        let rebuilt = rebuild(&chunk).finish_decimal(-1).unwrap();
        assert_eq!(rebuilt.get_double(1), 10.6);
    }

    #[test]
    fn spread_too_wide() {
        let mut builder = ChunkBuilder::new();
        builder.add_long(i64::from(i32::MIN));
        builder.add_long(i64::from(i32::MAX));
        assert!(matches!(
            builder.finish_decimal(-1),
            Err(ChunkError::NotImplemented(..))
        ));
    }

    #[test]
    fn plain_to_decimal_and_back() {
        let plain = C2Chunk::from_values(&[Some(-300), None, Some(1200)]).unwrap();
        let decimal = rebuild(&plain).finish_decimal(-1).unwrap();
        assert_same_values(&plain, &decimal);
        assert_eq!(decimal.width(), MantissaWidth::W2);

        let back = rebuild(&decimal).finish_plain(MantissaWidth::W2).unwrap();
        assert_eq!(back, EncodedChunk::C2(plain));
    }

    #[test]
    fn finish_plain_rejects_fractions_and_overflow() {
        let chunk = decimal(1000, -2, MantissaWidth::W1, &[Some(50)]);
        assert!(rebuild(&chunk).finish_plain(MantissaWidth::W4).is_err());

        let plain = C4Chunk::from_values(&[Some(300)]).unwrap();
        assert!(rebuild(&plain).finish_plain(MantissaWidth::W1).is_err());
        assert!(rebuild(&plain).finish_plain(MantissaWidth::W2).is_ok());
    }

    #[test]
    fn decoded_values() {
        let mut builder = ChunkBuilder::with_capacity(4);
        builder.add_value(0.25);
        builder.add_value(f64::NAN);
        builder.add_value(-1.5);
        builder.add_nas(1);
        assert_eq!(builder.len(), 4);

        let chunk = builder.clone().finish_decimal(-2).unwrap();
        assert_eq!(chunk.get_double(0), 0.25);
        assert!(chunk.is_na(1));
        assert_eq!(chunk.get_double(2), -1.5);
        assert!(chunk.is_na(3));

        assert!(builder.finish_decimal(-1).is_err());
    }

    #[test]
    fn negative_zero_is_rejected() {
        let mut builder = ChunkBuilder::new();
        builder.add_value(-0.0);
        assert!(builder.finish_decimal(-1).is_err());
    }

    #[test]
    fn empty() {
        let builder = ChunkBuilder::new();
        assert!(builder.is_empty());
        let chunk = builder.finish_decimal(-1).unwrap();
        assert!(chunk.is_empty());
        assert_eq!(chunk.width(), MantissaWidth::W1);
    }

    #[rstest]
    #[case(5, 0, -2, Some(500))]
    #[case(500, -2, 0, Some(5))]
    #[case(501, -2, 0, None)]
    #[case(-7, -1, -1, Some(-7))]
    #[case(0, 100, -100, Some(0))]
    #[case(1, 0, -19, None)]
    #[case(i64::MAX, 0, -1, None)]
    fn rescale(#[case] mantissa: i64, #[case] from: i32, #[case] to: i32, #[case] expected: Option<i64>) {
        assert_eq!(rescale_mantissa(mantissa, from, to), expected);
    }
}
