use std::fmt::Debug;
use std::ops::Range;

use colchunk_error::{ChunkResult, chunk_bail, chunk_panic};

use crate::{ChunkEncoding, RowVisitor};

/// The logical interface of a column chunk.
///
/// A value of a type implementing `Chunk` is always materialized: its header (if any) has been
/// decoded and validated by the constructor, and never changes afterwards. Readers take `&self`
/// and may run concurrently; writers take `&mut self`.
///
/// Missing rows read as `NaN` through [`Chunk::get_double`]. Integral access through
/// [`Chunk::get_long`] fails on a missing row, callers are expected to test [`Chunk::is_na`]
/// first.
pub trait Chunk: Debug + Send + Sync {
    /// The encoding of the chunk's buffer.
    fn encoding(&self) -> ChunkEncoding;

    /// Number of rows in the chunk.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size in bytes of the backing buffer, header included.
    fn nbytes(&self) -> usize;

    /// Whether the row holds the missing-value sentinel.
    fn is_na(&self, row: usize) -> bool;

    /// The logical value of the row, `NaN` if it is missing.
    fn get_double(&self, row: usize) -> f64;

    /// The logical value of the row truncated toward zero.
    ///
    /// Fails with an invalid argument error if the row is missing.
    fn get_long(&self, row: usize) -> ChunkResult<i64>;

    /// Try to store `value` in place. Returns `false` if the encoding cannot hold it exactly, in
    /// which case the chunk is unchanged and must be rebuilt by the caller.
    fn set_double(&mut self, row: usize, value: f64) -> bool;

    /// As [`Chunk::set_double`], comparing at single precision.
    fn set_float(&mut self, row: usize, value: f32) -> bool {
        self.set_double(row, f64::from(value))
    }

    /// As [`Chunk::set_double`] for an integral value.
    fn set_long(&mut self, row: usize, value: i64) -> bool;

    /// Mark the row as missing.
    fn set_na(&mut self, row: usize) -> bool;

    /// Number of decimal digits after the point that the encoding can represent.
    fn precision(&self) -> u8 {
        0
    }

    /// Whether the encoding can hold non-integral values.
    fn has_float(&self) -> bool {
        false
    }

    /// Decode the rows in `rows` into the front of `dest`, writing `na_fill` for missing rows.
    fn get_doubles(&self, dest: &mut [f64], rows: Range<usize>, na_fill: f64) -> ChunkResult<()>;

    /// Decode the rows listed in `rows` into the front of `dest`, in the given order. Missing
    /// rows are written as `NaN`.
    fn get_doubles_at(&self, dest: &mut [f64], rows: &[usize]) -> ChunkResult<()>;

    /// Push every row in `rows`, in ascending order, into `visitor`.
    fn process_rows<V: RowVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        rows: Range<usize>,
    ) -> ChunkResult<()>;

    /// Push the rows listed in `rows`, in the given order, into `visitor`.
    fn process_rows_at<V: RowVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        rows: &[usize],
    ) -> ChunkResult<()>;
}

/// Panic unless `row` is a row of a chunk of length `len`.
#[inline(always)]
pub fn check_row(row: usize, len: usize) {
    if row >= len {
        chunk_panic!(OutOfBounds: row, 0, len);
    }
}

/// Validate a bulk request over `rows` of a chunk of length `len`, writing into a destination of
/// length `dest_len`.
pub fn check_range(rows: &Range<usize>, len: usize, dest_len: usize) -> ChunkResult<()> {
    if rows.start > rows.end {
        chunk_bail!("row range start {} is after its end {}", rows.start, rows.end);
    }
    if rows.end > len {
        chunk_bail!(OutOfBounds: rows.end, 0, len);
    }
    if dest_len < rows.len() {
        chunk_bail!(
            "destination holds {} values but {} rows were requested",
            dest_len,
            rows.len()
        );
    }
    Ok(())
}

/// Validate a bulk request over the explicit `rows` of a chunk of length `len`.
pub fn check_rows(rows: &[usize], len: usize, dest_len: usize) -> ChunkResult<()> {
    if let Some(&row) = rows.iter().find(|&&row| row >= len) {
        chunk_bail!(OutOfBounds: row, 0, len);
    }
    if dest_len < rows.len() {
        chunk_bail!(
            "destination holds {} values but {} rows were requested",
            dest_len,
            rows.len()
        );
    }
    Ok(())
}
