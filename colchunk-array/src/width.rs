//! Mantissa storage widths and their missing-value sentinels.
//!
//! Every fixed-width encoding stores one raw integer per row. Each width reserves exactly one
//! raw value as the NA sentinel, and comparing against it is the only way a missing row is
//! recognised.

use colchunk_buffer::{ChunkBuffer, LeScalar};
use colchunk_error::{ChunkResult, chunk_bail, chunk_err};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Monomorphise `$body` over the native type backing a [`MantissaWidth`].
#[macro_export]
macro_rules! match_each_mantissa_type {
    ($self:expr, | $_:tt $T:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $T:ident ) => ( $($body)* )}
        match $self {
            $crate::MantissaWidth::W1 => __with__! { u8 },
            $crate::MantissaWidth::W2 => __with__! { i16 },
            $crate::MantissaWidth::W4 => __with__! { i32 },
        }
    })
}

/// Sentinel of the unsigned 1-byte width.
pub const C1_NA: u8 = u8::MAX;
/// Sentinel of the signed 2-byte width.
pub const C2_NA: i16 = i16::MIN;
/// Sentinel of the signed 4-byte width.
pub const C4_NA: i32 = i32::MIN;

/// The number of bytes used to store each mantissa.
///
/// The discriminant is the base-2 logarithm of the byte width, which is also the selector value
/// written into chunk headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MantissaWidth {
    /// One unsigned byte.
    W1 = 0,
    /// Two signed bytes.
    W2 = 1,
    /// Four signed bytes.
    W4 = 2,
}

impl MantissaWidth {
    /// All widths, narrowest first.
    pub const ALL: [MantissaWidth; 3] = [MantissaWidth::W1, MantissaWidth::W2, MantissaWidth::W4];

    /// Resolve a header selector into a width.
    pub fn from_selector(selector: i32) -> ChunkResult<Self> {
        u8::try_from(selector)
            .ok()
            .and_then(|s| MantissaWidth::try_from(s).ok())
            .ok_or_else(|| chunk_err!(NotImplemented: "unsupported mantissa width selector {}", selector))
    }

    /// The selector written into chunk headers.
    #[inline]
    pub fn selector(self) -> i32 {
        i32::from(self.log2())
    }

    /// Base-2 logarithm of [`Self::byte_width`].
    #[inline]
    pub fn log2(self) -> u8 {
        u8::from(self)
    }

    #[inline]
    pub const fn byte_width(self) -> usize {
        match self {
            MantissaWidth::W1 => 1,
            MantissaWidth::W2 => 2,
            MantissaWidth::W4 => 4,
        }
    }

    /// The raw value reserved for missing rows.
    #[inline]
    pub const fn na_sentinel(self) -> i64 {
        match self {
            MantissaWidth::W1 => C1_NA as i64,
            MantissaWidth::W2 => C2_NA as i64,
            MantissaWidth::W4 => C4_NA as i64,
        }
    }

    /// Smallest mantissa that is not the sentinel.
    #[inline]
    pub const fn min_value(self) -> i64 {
        match self {
            MantissaWidth::W1 => 0,
            MantissaWidth::W2 => i16::MIN as i64 + 1,
            MantissaWidth::W4 => i32::MIN as i64 + 1,
        }
    }

    /// Largest mantissa that is not the sentinel.
    #[inline]
    pub const fn max_value(self) -> i64 {
        match self {
            MantissaWidth::W1 => u8::MAX as i64 - 1,
            MantissaWidth::W2 => i16::MAX as i64,
            MantissaWidth::W4 => i32::MAX as i64,
        }
    }

    /// Whether `mantissa` can be stored as a non-missing value of this width.
    #[inline]
    pub const fn contains(self, mantissa: i64) -> bool {
        mantissa >= self.min_value() && mantissa <= self.max_value()
    }

    /// Number of distinct non-missing values this width can hold, minus one.
    #[inline]
    pub const fn span(self) -> u64 {
        self.max_value().abs_diff(self.min_value())
    }

    /// Read the raw mantissa stored at byte `offset`.
    #[inline]
    pub fn read(self, buffer: &ChunkBuffer, offset: usize) -> i64 {
        match_each_mantissa_type!(self, |$T| buffer.get::<$T>(offset).to_i64())
    }

    /// Write a raw mantissa (which may be the sentinel) at byte `offset`.
    pub fn write(self, buffer: &mut ChunkBuffer, offset: usize, raw: i64) -> ChunkResult<()> {
        match_each_mantissa_type!(self, |$T| {
            let Some(value) = <$T as Mantissa>::from_raw(raw) else {
                chunk_bail!("raw mantissa {} does not fit in {} byte(s)", raw, self.byte_width());
            };
            buffer.try_put(offset, value)
        })
    }
}

/// A native integer type used to store mantissas of one [`MantissaWidth`].
pub trait Mantissa: LeScalar + PartialEq {
    /// The width this type stores.
    const WIDTH: MantissaWidth;
    /// The sentinel marking a missing row.
    const NA: Self;

    /// Widen to `i64`.
    fn to_i64(self) -> i64;

    /// Narrow a raw value, accepting the sentinel.
    fn from_raw(raw: i64) -> Option<Self>;

    /// Narrow a non-missing value, rejecting the sentinel.
    #[inline]
    fn from_value(value: i64) -> Option<Self> {
        Self::from_raw(value).filter(|v| *v != Self::NA)
    }

    #[inline]
    fn is_na(self) -> bool {
        self == Self::NA
    }
}

macro_rules! mantissa {
    ($T:ty, $width:expr, $na:expr) => {
        impl Mantissa for $T {
            const WIDTH: MantissaWidth = $width;
            const NA: Self = $na;

            #[inline(always)]
            fn to_i64(self) -> i64 {
                i64::from(self)
            }

            #[inline(always)]
            fn from_raw(raw: i64) -> Option<Self> {
                <$T>::try_from(raw).ok()
            }
        }
    };
}

mantissa!(u8, MantissaWidth::W1, C1_NA);
mantissa!(i16, MantissaWidth::W2, C2_NA);
mantissa!(i32, MantissaWidth::W4, C4_NA);
