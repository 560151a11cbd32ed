use std::marker::PhantomData;
use std::ops::Range;

use colchunk_buffer::ChunkBuffer;
use colchunk_error::{ChunkResult, chunk_bail, chunk_err};
use static_assertions::assert_impl_all;

use crate::{
    Chunk, ChunkEncoding, Mantissa, MantissaWidth, RowVisitor, ValueMode, check_range, check_row,
    check_rows,
};

/// Unsigned 1-byte integers, `255` is missing.
pub type C1Chunk = PlainChunk<u8>;
/// Signed 2-byte integers, `i16::MIN` is missing.
pub type C2Chunk = PlainChunk<i16>;
/// Signed 4-byte integers, `i32::MIN` is missing.
pub type C4Chunk = PlainChunk<i32>;

assert_impl_all!(C1Chunk: Send, Sync);
assert_impl_all!(C4Chunk: Send, Sync);

/// A chunk of integers stored verbatim, one `T` per row, with no header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainChunk<T> {
    buffer: ChunkBuffer,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Mantissa> PlainChunk<T> {
    /// Wrap a buffer holding `buffer.len() / T::SIZE` rows.
    pub fn from_bytes(buffer: ChunkBuffer) -> ChunkResult<Self> {
        if buffer.len() % T::SIZE != 0 {
            chunk_bail!(
                "buffer of {} bytes is not a whole number of {}-byte rows",
                buffer.len(),
                T::SIZE
            );
        }
        let len = buffer.len() >> T::WIDTH.log2();
        log::trace!("materialized {} chunk with {} rows", T::WIDTH.byte_width(), len);
        Ok(Self {
            buffer,
            len,
            _marker: PhantomData,
        })
    }

    /// Build a chunk from optional values, `None` being a missing row.
    pub fn from_values(values: &[Option<i64>]) -> ChunkResult<Self> {
        let mut buffer = ChunkBuffer::zeroed(values.len() * T::SIZE);
        for (row, value) in values.iter().enumerate() {
            let stored = match value {
                None => T::NA,
                Some(v) => T::from_value(*v).ok_or_else(|| {
                    chunk_err!(
                        "value {} at row {} does not fit a {} chunk",
                        v,
                        row,
                        T::WIDTH.byte_width()
                    )
                })?,
            };
            buffer.put(row * T::SIZE, stored);
        }
        Self::from_bytes(buffer)
    }

    pub fn buffer(&self) -> &ChunkBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> ChunkBuffer {
        self.buffer
    }

    pub fn width(&self) -> MantissaWidth {
        T::WIDTH
    }

    #[inline(always)]
    fn mantissa(&self, row: usize) -> T {
        self.buffer.get::<T>(row * T::SIZE)
    }

    #[inline(always)]
    fn decode(value: T, na_fill: f64) -> f64 {
        if value.is_na() {
            na_fill
        } else {
            value.to_i64() as f64
        }
    }

    #[inline(always)]
    fn visit<V: RowVisitor + ?Sized>(visitor: &mut V, mode: ValueMode, value: T) {
        if value.is_na() {
            visitor.add_nas(1);
        } else {
            match mode {
                ValueMode::Expanded => visitor.add_expanded(value.to_i64(), 0),
                ValueMode::Decoded => visitor.add_long(value.to_i64()),
            }
        }
    }
}

impl<T: Mantissa> Chunk for PlainChunk<T> {
    fn encoding(&self) -> ChunkEncoding {
        match T::WIDTH {
            MantissaWidth::W1 => ChunkEncoding::C1,
            MantissaWidth::W2 => ChunkEncoding::C2,
            MantissaWidth::W4 => ChunkEncoding::C4,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn nbytes(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    fn is_na(&self, row: usize) -> bool {
        check_row(row, self.len);
        self.mantissa(row).is_na()
    }

    #[inline]
    fn get_double(&self, row: usize) -> f64 {
        check_row(row, self.len);
        Self::decode(self.mantissa(row), f64::NAN)
    }

    fn get_long(&self, row: usize) -> ChunkResult<i64> {
        check_row(row, self.len);
        let value = self.mantissa(row);
        if value.is_na() {
            chunk_bail!("value at row {} is missing", row);
        }
        Ok(value.to_i64())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn set_double(&mut self, row: usize, value: f64) -> bool {
        check_row(row, self.len);
        if value.is_nan() {
            return self.set_na(row);
        }
        let integral = value as i64;
        if integral as f64 != value {
            return false;
        }
        self.set_long(row, integral)
    }

    fn set_long(&mut self, row: usize, value: i64) -> bool {
        check_row(row, self.len);
        match T::from_value(value) {
            Some(stored) => {
                self.buffer.put(row * T::SIZE, stored);
                true
            }
            None => false,
        }
    }

    fn set_na(&mut self, row: usize) -> bool {
        check_row(row, self.len);
        self.buffer.put(row * T::SIZE, T::NA);
        true
    }

    fn get_doubles(&self, dest: &mut [f64], rows: Range<usize>, na_fill: f64) -> ChunkResult<()> {
        check_range(&rows, self.len, dest.len())?;
        for (out, row) in dest.iter_mut().zip(rows) {
            *out = Self::decode(self.mantissa(row), na_fill);
        }
        Ok(())
    }

    fn get_doubles_at(&self, dest: &mut [f64], rows: &[usize]) -> ChunkResult<()> {
        check_rows(rows, self.len, dest.len())?;
        for (out, &row) in dest.iter_mut().zip(rows) {
            *out = Self::decode(self.mantissa(row), f64::NAN);
        }
        Ok(())
    }

    fn process_rows<V: RowVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        rows: Range<usize>,
    ) -> ChunkResult<()> {
        check_range(&rows, self.len, rows.len())?;
        let mode = visitor.value_mode();
        for row in rows {
            Self::visit(visitor, mode, self.mantissa(row));
        }
        Ok(())
    }

    fn process_rows_at<V: RowVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        rows: &[usize],
    ) -> ChunkResult<()> {
        check_rows(rows, self.len, rows.len())?;
        let mode = visitor.value_mode();
        for &row in rows {
            Self::visit(visitor, mode, self.mantissa(row));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::prelude::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    use super::*;
    use crate::{DoublesVisitor, RollupVisitor};

    fn c2(values: &[Option<i64>]) -> C2Chunk {
        C2Chunk::from_values(values).unwrap()
    }

    #[test]
    fn c1_layout() {
        let chunk = C1Chunk::from_values(&[Some(0), None, Some(254)]).unwrap();
        assert_eq!(chunk.buffer().as_slice(), &[0, 255, 254]);
        assert_eq!(chunk.len(), 3);
        assert!(chunk.is_na(1));
        assert_eq!(chunk.get_double(2), 254.0);
        assert!(chunk.get_double(1).is_nan());
        assert_eq!(chunk.encoding(), ChunkEncoding::C1);
    }

    #[test]
    fn rehydrate_matches_build() {
        let chunk = c2(&[Some(-3), None, Some(32767)]);
        let rehydrated = C2Chunk::from_bytes(chunk.buffer().clone()).unwrap();
        assert_eq!(rehydrated, chunk);
        assert_eq!(rehydrated.len(), 3);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(7)]
    fn misaligned_buffer(#[case] len: usize) {
        assert!(C4Chunk::from_bytes(ChunkBuffer::zeroed(len)).is_err());
    }

    #[test]
    fn sentinel_cannot_be_stored_as_value() {
        assert!(C1Chunk::from_values(&[Some(255)]).is_err());
        assert!(C2Chunk::from_values(&[Some(i64::from(i16::MIN))]).is_err());
        assert!(C4Chunk::from_values(&[Some(i64::from(i32::MIN))]).is_err());
    }

    #[test]
    fn get_long_on_missing_row_fails() {
        let chunk = c2(&[None, Some(9)]);
        assert!(chunk.get_long(0).is_err());
        assert_eq!(chunk.get_long(1).unwrap(), 9);
    }

    #[test]
    fn in_place_writes() {
        let mut chunk = c2(&[Some(1), Some(2), Some(3)]);
        assert!(chunk.set_long(0, -32767));
        assert!(!chunk.set_long(0, -32768));
        assert!(!chunk.set_long(1, 40_000));
        assert!(chunk.set_double(1, 12.0));
        assert!(!chunk.set_double(1, 12.5));
        assert!(chunk.set_double(2, f64::NAN));
        assert!(chunk.set_float(2, 4.0));
        assert!(chunk.set_na(1));
        let mut values = [0.0; 3];
        chunk.get_doubles(&mut values, 0..3, -1.0).unwrap();
        assert_eq!(values, [-32767.0, -1.0, 4.0]);
    }

    #[rstest]
    #[case(12.5)]
    #[case(12.0)]
    #[case(f64::NAN)]
    #[should_panic]
    fn set_double_out_of_bounds(#[case] value: f64) {
        let mut chunk = c2(&[Some(1)]);
        chunk.set_double(1, value);
    }

    #[test]
    fn bulk_matches_scalar() {
        let mut rng = StdRng::seed_from_u64(0);
        let values = (0..1000)
            .map(|_| rng.random_bool(0.9).then(|| rng.random_range(-1000i64..1000)))
            .collect::<Vec<_>>();
        let chunk = C4Chunk::from_values(&values).unwrap();

        let mut bulk = vec![0.0; 500];
        chunk.get_doubles(&mut bulk, 250..750, -7.0).unwrap();
        for (i, row) in (250..750).enumerate() {
            let expected = if chunk.is_na(row) {
                -7.0
            } else {
                chunk.get_double(row)
            };
            assert_eq!(bulk[i], expected);
        }
    }

    #[test]
    fn bulk_out_of_bounds() {
        let chunk = c2(&[Some(1), Some(2)]);
        let mut dest = [0.0; 4];
        assert!(chunk.get_doubles(&mut dest, 0..3, 0.0).is_err());
        assert!(chunk.get_doubles(&mut dest[..1], 0..2, 0.0).is_err());
        assert!(chunk.get_doubles_at(&mut dest, &[1, 2]).is_err());
    }

    #[test]
    fn get_doubles_at_follows_caller_order() {
        let chunk = c2(&[Some(10), None, Some(30)]);
        let mut dest = [0.0; 4];
        chunk.get_doubles_at(&mut dest, &[2, 0, 2, 1]).unwrap();
        assert_eq!(&dest[..3], &[30.0, 10.0, 30.0]);
        assert!(dest[3].is_nan());
    }

    struct Expanded(Vec<Option<(i64, i32)>>);

    impl RowVisitor for Expanded {
        fn value_mode(&self) -> ValueMode {
            ValueMode::Expanded
        }

        fn add_value(&mut self, _value: f64) {
            unreachable!("expanded visitors receive expanded values")
        }

        fn add_expanded(&mut self, mantissa: i64, exponent: i32) {
            self.0.push(Some((mantissa, exponent)));
        }

        fn add_nas(&mut self, count: usize) {
            self.0.extend(std::iter::repeat_n(None, count));
        }
    }

    #[test]
    fn process_rows_modes() {
        let chunk = C1Chunk::from_values(&[Some(4), None, Some(6)]).unwrap();

        let mut decoded = DoublesVisitor::new(0.5);
        chunk.process_rows(&mut decoded, 0..3).unwrap();
        assert_eq!(decoded.values(), &[4.0, 0.5, 6.0]);

        let mut expanded = Expanded(Vec::new());
        chunk.process_rows_at(&mut expanded, &[2, 1, 0]).unwrap();
        assert_eq!(expanded.0, vec![Some((6, 0)), None, Some((4, 0))]);

        let mut rollup = RollupVisitor::default();
        chunk.process_rows(&mut rollup, 1..3).unwrap();
        assert_eq!(rollup.nas(), 1);
        assert_eq!(rollup.sum(), 6.0);
    }
}
