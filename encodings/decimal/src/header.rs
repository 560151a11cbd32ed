use colchunk_array::MantissaWidth;
use colchunk_buffer::ChunkBuffer;
use colchunk_error::{ChunkResult, chunk_bail};

/// Size in bytes of the decimal chunk header.
pub const HEADER_SIZE: usize = 16;

const BIAS_OFFSET: usize = 0;
const EXPONENT_OFFSET: usize = 8;
const WIDTH_OFFSET: usize = 12;

/// The fixed-point parameters of a decimal chunk.
///
/// A header is always valid: the exponent is negative and the width is one of the supported
/// mantissa widths. Decoding the same bytes always yields an identical header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalHeader {
    bias: i64,
    scale_exponent: i32,
    width: MantissaWidth,
}

impl DecimalHeader {
    pub fn try_new(bias: i64, scale_exponent: i32, width: MantissaWidth) -> ChunkResult<Self> {
        if scale_exponent >= 0 {
            chunk_bail!(
                "decimal scale exponent must be negative, got {}",
                scale_exponent
            );
        }
        Ok(Self {
            bias,
            scale_exponent,
            width,
        })
    }

    /// Read and validate the header at the start of `buffer`.
    pub fn decode(buffer: &ChunkBuffer) -> ChunkResult<Self> {
        if buffer.len() < HEADER_SIZE {
            chunk_bail!(
                "decimal chunk buffer of {} bytes is shorter than its {}-byte header",
                buffer.len(),
                HEADER_SIZE
            );
        }
        let bias = buffer.try_get::<i64>(BIAS_OFFSET)?;
        let scale_exponent = buffer.try_get::<i32>(EXPONENT_OFFSET)?;
        let width = MantissaWidth::from_selector(buffer.try_get::<i32>(WIDTH_OFFSET)?)?;
        Self::try_new(bias, scale_exponent, width)
    }

    /// Write the header to the start of `buffer`.
    pub fn encode(&self, buffer: &mut ChunkBuffer) -> ChunkResult<()> {
        buffer.try_put(BIAS_OFFSET, self.bias)?;
        buffer.try_put(EXPONENT_OFFSET, self.scale_exponent)?;
        buffer.try_put(WIDTH_OFFSET, self.width.selector())
    }

    /// Number of rows held by a buffer of `nbytes` bytes with this header.
    pub fn row_count(&self, nbytes: usize) -> ChunkResult<usize> {
        let Some(body) = nbytes.checked_sub(HEADER_SIZE) else {
            chunk_bail!("decimal chunk buffer of {} bytes has no header", nbytes);
        };
        if body % self.width.byte_width() != 0 {
            chunk_bail!(
                "decimal chunk body of {} bytes is not a whole number of {}-byte mantissas",
                body,
                self.width.byte_width()
            );
        }
        Ok(body >> self.width.log2())
    }

    /// Size in bytes of a buffer holding `len` rows.
    pub fn buffer_size(&self, len: usize) -> usize {
        HEADER_SIZE + (len << self.width.log2())
    }

    /// Byte offset of the mantissa of `row`.
    #[inline(always)]
    pub fn mantissa_offset(&self, row: usize) -> usize {
        HEADER_SIZE + (row << self.width.log2())
    }

    #[inline]
    pub fn bias(&self) -> i64 {
        self.bias
    }

    #[inline]
    pub fn scale_exponent(&self) -> i32 {
        self.scale_exponent
    }

    #[inline]
    pub fn width(&self) -> MantissaWidth {
        self.width
    }
}
