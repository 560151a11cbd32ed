use std::ops::Range;

use colchunk_array::{C1Chunk, C2Chunk, C4Chunk, Chunk, ChunkEncoding, RowVisitor};
use colchunk_buffer::ChunkBuffer;
use colchunk_decimal::DecimalChunk;
use colchunk_error::{ChunkError, ChunkResult, chunk_err};

/// A chunk of any builtin encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedChunk {
    C1(C1Chunk),
    C2(C2Chunk),
    C4(C4Chunk),
    Decimal(DecimalChunk),
}

macro_rules! match_each_chunk {
    ($self:expr, | $chunk:ident | $body:expr) => {
        match $self {
            EncodedChunk::C1($chunk) => $body,
            EncodedChunk::C2($chunk) => $body,
            EncodedChunk::C4($chunk) => $body,
            EncodedChunk::Decimal($chunk) => $body,
        }
    };
}

impl EncodedChunk {
    /// Rehydrate a chunk of the given encoding from its buffer.
    pub fn from_bytes(encoding: ChunkEncoding, buffer: ChunkBuffer) -> ChunkResult<Self> {
        match encoding {
            ChunkEncoding::C1 => C1Chunk::from_bytes(buffer).map(Self::C1),
            ChunkEncoding::C2 => C2Chunk::from_bytes(buffer).map(Self::C2),
            ChunkEncoding::C4 => C4Chunk::from_bytes(buffer).map(Self::C4),
            ChunkEncoding::Decimal => DecimalChunk::from_bytes(buffer).map(Self::Decimal),
        }
        .map_err(|err| err.with_context(format!("rehydrating {encoding} chunk")))
    }

    pub fn buffer(&self) -> &ChunkBuffer {
        match_each_chunk!(self, |chunk| chunk.buffer())
    }

    pub fn into_buffer(self) -> ChunkBuffer {
        match_each_chunk!(self, |chunk| chunk.into_buffer())
    }

    pub fn as_decimal(&self) -> Option<&DecimalChunk> {
        match self {
            Self::Decimal(chunk) => Some(chunk),
            _ => None,
        }
    }
}

impl From<C1Chunk> for EncodedChunk {
    fn from(chunk: C1Chunk) -> Self {
        Self::C1(chunk)
    }
}

impl From<C2Chunk> for EncodedChunk {
    fn from(chunk: C2Chunk) -> Self {
        Self::C2(chunk)
    }
}

impl From<C4Chunk> for EncodedChunk {
    fn from(chunk: C4Chunk) -> Self {
        Self::C4(chunk)
    }
}

impl From<DecimalChunk> for EncodedChunk {
    fn from(chunk: DecimalChunk) -> Self {
        Self::Decimal(chunk)
    }
}

impl TryFrom<EncodedChunk> for DecimalChunk {
    type Error = ChunkError;

    fn try_from(chunk: EncodedChunk) -> ChunkResult<Self> {
        match chunk {
            EncodedChunk::Decimal(chunk) => Ok(chunk),
            other => Err(chunk_err!(MismatchedTypes: "colchunk.decimal", other.encoding())),
        }
    }
}

impl Chunk for EncodedChunk {
    fn encoding(&self) -> ChunkEncoding {
        match_each_chunk!(self, |chunk| chunk.encoding())
    }

    fn len(&self) -> usize {
        match_each_chunk!(self, |chunk| chunk.len())
    }

    fn nbytes(&self) -> usize {
        match_each_chunk!(self, |chunk| chunk.nbytes())
    }

    fn is_na(&self, row: usize) -> bool {
        match_each_chunk!(self, |chunk| chunk.is_na(row))
    }

    fn get_double(&self, row: usize) -> f64 {
        match_each_chunk!(self, |chunk| chunk.get_double(row))
    }

    fn get_long(&self, row: usize) -> ChunkResult<i64> {
        match_each_chunk!(self, |chunk| chunk.get_long(row))
    }

    fn set_double(&mut self, row: usize, value: f64) -> bool {
        match_each_chunk!(self, |chunk| chunk.set_double(row, value))
    }

    fn set_float(&mut self, row: usize, value: f32) -> bool {
        match_each_chunk!(self, |chunk| chunk.set_float(row, value))
    }

    fn set_long(&mut self, row: usize, value: i64) -> bool {
        match_each_chunk!(self, |chunk| chunk.set_long(row, value))
    }

    fn set_na(&mut self, row: usize) -> bool {
        match_each_chunk!(self, |chunk| chunk.set_na(row))
    }

    fn precision(&self) -> u8 {
        match_each_chunk!(self, |chunk| chunk.precision())
    }

    fn has_float(&self) -> bool {
        match_each_chunk!(self, |chunk| chunk.has_float())
    }

    fn get_doubles(&self, dest: &mut [f64], rows: Range<usize>, na_fill: f64) -> ChunkResult<()> {
        match_each_chunk!(self, |chunk| chunk.get_doubles(dest, rows, na_fill))
    }

    fn get_doubles_at(&self, dest: &mut [f64], rows: &[usize]) -> ChunkResult<()> {
        match_each_chunk!(self, |chunk| chunk.get_doubles_at(dest, rows))
    }

    fn process_rows<V: RowVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        rows: Range<usize>,
    ) -> ChunkResult<()> {
        match_each_chunk!(self, |chunk| chunk.process_rows(visitor, rows))
    }

    fn process_rows_at<V: RowVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        rows: &[usize],
    ) -> ChunkResult<()> {
        match_each_chunk!(self, |chunk| chunk.process_rows_at(visitor, rows))
    }
}
