//! LSD radix sort built on the chunked prefix sum.
//!
//! One pass per digit, least significant first. A pass marks every key in a
//! bucket-major flag array, scans it, and scatters each (key, id) to its rank.
//! Keys and ids ping-pong between two buffers; see [`pingpong`].

mod config;
mod gpu;
pub mod host;
pub mod pingpong;

pub use config::RadixConfig;
pub use gpu::{RadixSorter, compute_radix_sort};

use crate::error::{ComputeError, Result};

/// Keys in ascending order with their ids permuted identically.
///
/// `ids[i]` is the id that was paired with the key now at position `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedPairs {
    pub keys: Vec<u32>,
    pub ids: Vec<u32>,
}

fn check_inputs(keys: &[u32], ids: &[u32], config: &RadixConfig) -> Result<()> {
    config.validate()?;
    if keys.len() != ids.len() {
        return Err(ComputeError::config(format!(
            "{} keys but {} ids",
            keys.len(),
            ids.len()
        )));
    }
    if u32::try_from(keys.len()).is_err() {
        return Err(ComputeError::config("more keys than a u32 index can address"));
    }
    Ok(())
}
