use std::fmt::{Debug, Formatter, Write};
use std::ops::Deref;

use bytes::{Bytes, BytesMut};
use colchunk_error::{ChunkResult, chunk_bail, chunk_panic};

use crate::LeScalar;

/// An owned, fixed-length byte buffer with bounds-checked typed access.
///
/// The length of a `ChunkBuffer` never changes after construction. Values are read and written
/// in place through [`ChunkBuffer::get`] and [`ChunkBuffer::put`], always in little-endian order.
#[derive(Clone, PartialEq, Eq)]
pub struct ChunkBuffer {
    bytes: BytesMut,
}

impl ChunkBuffer {
    /// Create a new buffer of `len` bytes, all set to zero.
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: BytesMut::zeroed(len),
        }
    }

    /// Returns the length of the buffer in bytes.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns whether the buffer is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Access the buffer as an immutable byte slice.
    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    /// Read a `T` starting at byte `offset`.
    ///
    /// ## Panics
    ///
    /// Panics if `offset + T::SIZE` exceeds the length of the buffer.
    #[inline(always)]
    pub fn get<T: LeScalar>(&self, offset: usize) -> T {
        match self.window(offset, T::SIZE) {
            Some(bytes) => T::read_le(bytes),
            None => chunk_panic!(OutOfBounds: offset.saturating_add(T::SIZE), 0, self.len()),
        }
    }

    /// Read a `T` starting at byte `offset`, returning an error if the read is out of bounds.
    pub fn try_get<T: LeScalar>(&self, offset: usize) -> ChunkResult<T> {
        match self.window(offset, T::SIZE) {
            Some(bytes) => Ok(T::read_le(bytes)),
            None => chunk_bail!(OutOfBounds: offset.saturating_add(T::SIZE), 0, self.len()),
        }
    }

    /// Write `value` starting at byte `offset`.
    ///
    /// ## Panics
    ///
    /// Panics if `offset + T::SIZE` exceeds the length of the buffer.
    #[inline(always)]
    pub fn put<T: LeScalar>(&mut self, offset: usize, value: T) {
        let len = self.len();
        match self.window_mut(offset, T::SIZE) {
            Some(bytes) => value.write_le(bytes),
            None => chunk_panic!(OutOfBounds: offset.saturating_add(T::SIZE), 0, len),
        }
    }

    /// Write `value` starting at byte `offset`, returning an error if the write is out of bounds.
    pub fn try_put<T: LeScalar>(&mut self, offset: usize, value: T) -> ChunkResult<()> {
        let len = self.len();
        match self.window_mut(offset, T::SIZE) {
            Some(bytes) => {
                value.write_le(bytes);
                Ok(())
            }
            None => chunk_bail!(OutOfBounds: offset.saturating_add(T::SIZE), 0, len),
        }
    }

    /// Freeze the buffer into an immutable, cheaply cloneable [`Bytes`].
    pub fn freeze(self) -> Bytes {
        self.bytes.freeze()
    }

    /// Returns the underlying mutable bytes.
    pub fn into_inner(self) -> BytesMut {
        self.bytes
    }

    #[inline(always)]
    fn window(&self, offset: usize, size: usize) -> Option<&[u8]> {
        let end = offset.checked_add(size)?;
        self.bytes.get(offset..end)
    }

    #[inline(always)]
    fn window_mut(&mut self, offset: usize, size: usize) -> Option<&mut [u8]> {
        let end = offset.checked_add(size)?;
        self.bytes.get_mut(offset..end)
    }
}

/// Bytes shown by `Debug`, enough to cover a chunk header.
const DEBUG_PREFIX: usize = 16;

impl Debug for ChunkBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut hex = String::with_capacity(2 * DEBUG_PREFIX + 3);
        for byte in self.bytes.iter().take(DEBUG_PREFIX) {
            write!(hex, "{byte:02x}")?;
        }
        if self.len() > DEBUG_PREFIX {
            hex.push_str("...");
        }
        f.debug_struct("ChunkBuffer")
            .field("length", &self.len())
            .field("bytes", &format_args!("{hex}"))
            .finish()
    }
}

impl Deref for ChunkBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for ChunkBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Vec<u8>> for ChunkBuffer {
    fn from(value: Vec<u8>) -> Self {
        Self::from(Bytes::from(value))
    }
}

impl From<&[u8]> for ChunkBuffer {
    fn from(value: &[u8]) -> Self {
        Self {
            bytes: BytesMut::from(value),
        }
    }
}

impl From<BytesMut> for ChunkBuffer {
    fn from(bytes: BytesMut) -> Self {
        Self { bytes }
    }
}

impl From<Bytes> for ChunkBuffer {
    /// Take ownership of `Bytes`, zero-copy if this is the only handle to the allocation.
    fn from(value: Bytes) -> Self {
        match value.try_into_mut() {
            Ok(bytes) => Self { bytes },
            Err(shared) => {
                #[cfg(feature = "warn-copy")]
                log::warn!(
                    "Copying {} shared bytes into an owned chunk buffer",
                    shared.len()
                );
                Self::from(&shared[..])
            }
        }
    }
}
