use std::ops::Range;

use colchunk_array::{
    Chunk, ChunkEncoding, Mantissa, MantissaWidth, RowVisitor, ValueMode, check_range, check_row,
    check_rows, match_each_mantissa_type,
};
use colchunk_buffer::ChunkBuffer;
use colchunk_error::{ChunkResult, chunk_bail, chunk_err};
use static_assertions::assert_impl_all;

use crate::{DecimalHeader, ScaledCodec};

/// A chunk of scaled fixed-point values.
///
/// The header is decoded once, when the chunk is constructed, and cached together with the
/// [`ScaledCodec`] derived from it. Only the mantissa region of the buffer is touched afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimalChunk {
    buffer: ChunkBuffer,
    header: DecimalHeader,
    codec: ScaledCodec,
    len: usize,
}

assert_impl_all!(DecimalChunk: Send, Sync);

impl DecimalChunk {
    /// Rehydrate a chunk from a buffer holding a header followed by its mantissas.
    pub fn from_bytes(buffer: ChunkBuffer) -> ChunkResult<Self> {
        let header = DecimalHeader::decode(&buffer)?;
        let chunk = Self::materialize(buffer, header)?;
        log::trace!(
            "materialized decimal chunk with {} rows, bias {}, exponent {}, {}-byte mantissas",
            chunk.len,
            header.bias(),
            header.scale_exponent(),
            header.width().byte_width()
        );
        Ok(chunk)
    }

    /// Build a chunk from raw mantissas, `None` being a missing row.
    pub fn from_mantissas(header: DecimalHeader, mantissas: &[Option<i64>]) -> ChunkResult<Self> {
        let width = header.width();
        let mut buffer = ChunkBuffer::zeroed(header.buffer_size(mantissas.len()));
        header.encode(&mut buffer)?;
        for (row, mantissa) in mantissas.iter().enumerate() {
            let raw = match *mantissa {
                None => width.na_sentinel(),
                Some(m) if width.contains(m) => m,
                Some(m) => chunk_bail!(
                    "mantissa {} at row {} does not fit {}-byte storage",
                    m,
                    row,
                    width.byte_width()
                ),
            };
            width.write(&mut buffer, header.mantissa_offset(row), raw)?;
        }
        Self::materialize(buffer, header)
    }

    /// Build a chunk from logical values, `NaN` being a missing row.
    ///
    /// Fails if any value is not exactly representable under `header`.
    pub fn from_doubles(header: DecimalHeader, values: &[f64]) -> ChunkResult<Self> {
        let codec = ScaledCodec::new(&header);
        let mantissas = values
            .iter()
            .enumerate()
            .map(|(row, &value)| {
                if value.is_nan() {
                    return Ok(None);
                }
                codec.encode_f64(value).map(Some).ok_or_else(|| {
                    chunk_err!(
                        "value {} at row {} is not representable with bias {} and exponent {}",
                        value,
                        row,
                        header.bias(),
                        header.scale_exponent()
                    )
                })
            })
            .collect::<ChunkResult<Vec<_>>>()?;
        Self::from_mantissas(header, &mantissas)
    }

    fn materialize(buffer: ChunkBuffer, header: DecimalHeader) -> ChunkResult<Self> {
        let len = header.row_count(buffer.len())?;
        Ok(Self {
            buffer,
            codec: ScaledCodec::new(&header),
            header,
            len,
        })
    }

    pub fn header(&self) -> &DecimalHeader {
        &self.header
    }

    pub fn codec(&self) -> &ScaledCodec {
        &self.codec
    }

    pub fn bias(&self) -> i64 {
        self.header.bias()
    }

    pub fn scale_exponent(&self) -> i32 {
        self.header.scale_exponent()
    }

    pub fn width(&self) -> MantissaWidth {
        self.header.width()
    }

    /// Distance between adjacent representable values.
    pub fn step(&self) -> f64 {
        self.codec.step()
    }

    pub fn buffer(&self) -> &ChunkBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> ChunkBuffer {
        self.buffer
    }

    /// The raw mantissa of `row`, possibly the sentinel.
    #[inline]
    pub fn mantissa(&self, row: usize) -> i64 {
        check_row(row, self.len);
        self.header
            .width()
            .read(&self.buffer, self.header.mantissa_offset(row))
    }

    fn visit<V: RowVisitor + ?Sized>(&self, visitor: &mut V, rows: impl Iterator<Item = usize>) {
        let codec = self.codec;
        match visitor.value_mode() {
            ValueMode::Expanded => {
                let bias = codec.bias();
                let exponent = codec.scale_exponent();
                match_each_mantissa_type!(codec.width(), |$T| {
                    for row in rows {
                        let mantissa = self.buffer.get::<$T>(self.header.mantissa_offset(row));
                        if mantissa.is_na() {
                            visitor.add_nas(1);
                        } else {
                            visitor.add_expanded(bias.wrapping_add(mantissa.to_i64()), exponent);
                        }
                    }
                })
            }
            ValueMode::Decoded => match_each_mantissa_type!(codec.width(), |$T| {
                for row in rows {
                    let mantissa = self.buffer.get::<$T>(self.header.mantissa_offset(row));
                    visitor.add_value(codec.decode(mantissa.to_i64(), f64::NAN));
                }
            }),
        }
    }
}

impl Chunk for DecimalChunk {
    fn encoding(&self) -> ChunkEncoding {
        ChunkEncoding::Decimal
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
        self.codec.is_na(self.mantissa(row))
    }

    #[inline]
    fn get_double(&self, row: usize) -> f64 {
        self.codec.decode(self.mantissa(row), f64::NAN)
    }

    fn get_long(&self, row: usize) -> ChunkResult<i64> {
        self.codec.to_long(self.mantissa(row))
    }

    // The header is fixed when the chunk is built, so writes are always refused and the caller
    // rebuilds the chunk through a `ChunkBuilder`.
    fn set_double(&mut self, row: usize, _value: f64) -> bool {
        check_row(row, self.len);
        false
    }

    fn set_float(&mut self, row: usize, _value: f32) -> bool {
        check_row(row, self.len);
        false
    }

    fn set_long(&mut self, row: usize, _value: i64) -> bool {
        check_row(row, self.len);
        false
    }

    fn set_na(&mut self, row: usize) -> bool {
        check_row(row, self.len);
        false
    }

    fn precision(&self) -> u8 {
        self.codec.precision()
    }

    fn has_float(&self) -> bool {
        true
    }

    fn get_doubles(&self, dest: &mut [f64], rows: Range<usize>, na_fill: f64) -> ChunkResult<()> {
        check_range(&rows, self.len, dest.len())?;
        let codec = self.codec;
        match_each_mantissa_type!(codec.width(), |$T| {
            for (out, row) in dest.iter_mut().zip(rows) {
                let mantissa = self.buffer.get::<$T>(self.header.mantissa_offset(row));
                *out = codec.decode(mantissa.to_i64(), na_fill);
            }
        });
        Ok(())
    }

    fn get_doubles_at(&self, dest: &mut [f64], rows: &[usize]) -> ChunkResult<()> {
        check_rows(rows, self.len, dest.len())?;
        let codec = self.codec;
        match_each_mantissa_type!(codec.width(), |$T| {
            for (out, &row) in dest.iter_mut().zip(rows) {
                let mantissa = self.buffer.get::<$T>(self.header.mantissa_offset(row));
                *out = codec.decode(mantissa.to_i64(), f64::NAN);
            }
        });
        Ok(())
    }

    fn process_rows<V: RowVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        rows: Range<usize>,
    ) -> ChunkResult<()> {
        check_range(&rows, self.len, rows.len())?;
        self.visit(visitor, rows);
        Ok(())
    }

    fn process_rows_at<V: RowVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        rows: &[usize],
    ) -> ChunkResult<()> {
        check_rows(rows, self.len, rows.len())?;
        self.visit(visitor, rows.iter().copied());
        Ok(())
    }
}
