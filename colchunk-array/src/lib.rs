#![cfg(target_endian = "little")]

//! Fixed-width column chunks.
//!
//! A chunk is a block of rows of a single column, stored in one [`ChunkBuffer`] using one
//! encoding. This crate defines the [`Chunk`] interface every encoding implements, the storage
//! widths and their missing-value sentinels, the plain 1/2/4-byte integer chunks, and the
//! [`RowVisitor`] protocol used to scan chunks in bulk.
//!
//! [`ChunkBuffer`]: colchunk_buffer::ChunkBuffer

pub use chunk::*;
pub use encoding::*;
pub use plain::*;
pub use visitor::*;
pub use width::*;

mod chunk;
mod encoding;
mod plain;
mod visitor;
mod width;
