//! Chunked prefix sum.
//!
//! Three stages, each a data-parallel dispatch:
//! 1. every chunk is scanned independently (inclusive) and its total recorded
//! 2. the zero-padded chunk totals are scanned (exclusive) in one workgroup
//! 3. each chunk's offset is added to every element of the chunk
//!
//! [`PrefixSum`] runs the stages on the device; [`host`] runs the same stages
//! on the rayon pool and exposes each one as a function.

mod config;
mod element;
mod gpu;
pub mod host;

pub use config::{ScanConfig, ScanLayout};
pub use element::ScanElement;
pub use gpu::{PrefixSum, compute_prefix_sum};

pub(crate) use gpu::ScanKernels;

/// Result of stage one.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkedScan<T> {
    /// Inclusive scan of each chunk, each starting from zero.
    pub local_scan: Vec<T>,
    /// Total of each chunk, one entry per chunk.
    pub chunk_sums: Vec<T>,
}

/// Device read-back of a full scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReadback<T> {
    /// Inclusive prefix sum, same length as the input.
    pub output: Vec<T>,
    /// Exclusive scan of the chunk totals, padded to a power of two.
    pub chunk_offsets: Vec<T>,
}
