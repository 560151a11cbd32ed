#![cfg(target_endian = "little")]
#![deny(missing_docs)]

//! An owned byte buffer for colchunk.
//!
//! Every chunk owns exactly one [`ChunkBuffer`]. The buffer exposes typed little-endian access at
//! byte offsets through the [`LeScalar`] trait, and every access is bounds-checked.

mod buffer;
mod scalar;

pub use buffer::*;
pub use scalar::*;
