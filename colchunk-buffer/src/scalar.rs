use std::fmt::Debug;

/// A fixed-width value that can be read from and written to a byte buffer in little-endian order.
pub trait LeScalar: Copy + Debug + Send + Sync + 'static {
    /// The number of bytes occupied by the value.
    const SIZE: usize;

    /// Decode a value from exactly [`Self::SIZE`] bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode the value into exactly [`Self::SIZE`] bytes.
    fn write_le(self, bytes: &mut [u8]);
}

macro_rules! le_scalar {
    ($T:ty) => {
        impl LeScalar for $T {
            const SIZE: usize = size_of::<$T>();

            #[inline(always)]
            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; size_of::<$T>()];
                raw.copy_from_slice(bytes);
                <$T>::from_le_bytes(raw)
            }

            #[inline(always)]
            fn write_le(self, bytes: &mut [u8]) {
                bytes.copy_from_slice(&self.to_le_bytes());
            }
        }
    };
}

le_scalar!(u8);
le_scalar!(i8);
le_scalar!(u16);
le_scalar!(i16);
le_scalar!(u32);
le_scalar!(i32);
le_scalar!(u64);
le_scalar!(i64);
le_scalar!(f32);
le_scalar!(f64);
