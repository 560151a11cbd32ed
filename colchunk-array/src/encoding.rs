use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Identifies the encoding of a chunk's byte buffer.
///
/// The tag is all a store needs, together with the buffer, to rehydrate a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ChunkEncoding {
    /// Unsigned 1-byte integers.
    C1 = 0,
    /// Signed 2-byte integers.
    C2 = 1,
    /// Signed 4-byte integers.
    C4 = 2,
    /// Scaled fixed-point values with a 1, 2 or 4-byte mantissa.
    Decimal = 3,
}

impl ChunkEncoding {
    /// A stable, human readable identifier.
    pub const fn id(self) -> &'static str {
        match self {
            ChunkEncoding::C1 => "colchunk.c1",
            ChunkEncoding::C2 => "colchunk.c2",
            ChunkEncoding::C4 => "colchunk.c4",
            ChunkEncoding::Decimal => "colchunk.decimal",
        }
    }
}

impl Display for ChunkEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
