#![cfg(target_endian = "little")]

//! Scaled fixed-point ("decimal") column chunks.
//!
//! A decimal chunk stores every row as a narrow integer mantissa. The logical value of a row is
//! `(bias + mantissa) / 10^(-scale_exponent)`, where the bias, the (always negative) exponent and
//! the mantissa width are recorded once in a 16-byte header at the start of the buffer:
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 8 | bias |
//! | 8 | 4 | scale exponent |
//! | 12 | 4 | width selector, `0`, `1` or `2` for 1, 2 or 4-byte mantissas |
//! | 16 | width × len | mantissas |
//!
//! All fields are little-endian.

pub use array::*;
pub use header::*;
pub use scaled::*;

mod array;
mod header;
mod scaled;
