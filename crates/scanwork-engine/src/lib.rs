//! scanwork engine crate.
//!
//! Chunked work-efficient prefix sum and an LSD radix sort built on it, run as
//! wgpu compute dispatches. A host path with the same stages runs on the rayon
//! pool for verification and for machines without an adapter.
//!
//! ```no_run
//! use scanwork_engine::{ComputeContext, ComputeInit, compute_prefix_sum, compute_radix_sort};
//!
//! # fn main() -> scanwork_engine::Result<()> {
//! let ctx = ComputeContext::new_blocking(ComputeInit::default())?;
//!
//! let sums = pollster::block_on(compute_prefix_sum(&ctx, &[5u32, 3, 8, 1, 9, 2]))?;
//! assert_eq!(sums, vec![5, 8, 16, 17, 26, 28]);
//!
//! let sorted = pollster::block_on(compute_radix_sort(&ctx, &[5, 3, 8, 1], &[0, 1, 2, 3]))?;
//! assert_eq!(sorted.keys, vec![1, 3, 5, 8]);
//! assert_eq!(sorted.ids, vec![3, 1, 0, 2]);
//! # Ok(())
//! # }
//! ```

pub mod device;
pub mod error;
pub mod logging;
pub mod scan;
pub mod sort;

pub use device::{ComputeContext, ComputeInit};
pub use error::{ComputeError, Result};
pub use scan::{PrefixSum, ScanConfig, ScanElement, ScanReadback, compute_prefix_sum};
pub use sort::{RadixConfig, RadixSorter, SortedPairs, compute_radix_sort};
