//! Host execution of the three-stage scan.
//!
//! Each chunk is scanned independently on the rayon pool with the same
//! up-sweep/down-sweep tree the device kernels walk, so float results
//! accumulate in the same order as on the GPU.

use rayon::prelude::*;

use super::{ChunkedScan, ScanConfig, ScanElement, ScanLayout};
use crate::error::{ComputeError, Result};

/// Stage one: inclusive scan of every chunk plus the chunk totals.
///
/// `chunk_sums` holds one entry per chunk (`ceil(len / chunk_size)`); stage
/// two pads it.
pub fn scan<T: ScanElement>(input: &[T], chunk_size: usize) -> Result<ChunkedScan<T>> {
    let layout = ScanLayout::new(input.len(), chunk_size)?;
    if !chunk_size.is_power_of_two() {
        return Err(ComputeError::config(format!(
            "chunk size must be a power of two, got {chunk_size}"
        )));
    }

    let mut local_scan = vec![T::ZERO; layout.len];
    let chunk_sums: Vec<T> = input
        .par_chunks(chunk_size)
        .zip(local_scan.par_chunks_mut(chunk_size))
        .map(|(src, dst)| scan_chunk(src, dst, chunk_size))
        .collect();

    Ok(ChunkedScan {
        local_scan,
        chunk_sums,
    })
}

/// Stage two: exclusive scan of `chunk_sums` zero-padded to `padded_size`.
///
/// `offsets[0] == 0` and `offsets[k]` is the sum of all chunks before `k`.
pub fn scan_chunk_sums<T: ScanElement>(chunk_sums: &[T], padded_size: usize) -> Result<Vec<T>> {
    if !padded_size.is_power_of_two() || padded_size < chunk_sums.len() {
        return Err(ComputeError::config(format!(
            "padded size {padded_size} must be a power of two of at least {}",
            chunk_sums.len()
        )));
    }

    let mut tile = vec![T::ZERO; padded_size];
    tile[..chunk_sums.len()].copy_from_slice(chunk_sums);
    blelloch_exclusive(&mut tile);
    Ok(tile)
}

/// Stage three: `output[i] = local_scan[i] + offsets[i / chunk_size]`.
pub fn propagate<T: ScanElement>(
    local_scan: &[T],
    offsets: &[T],
    chunk_size: usize,
) -> Result<Vec<T>> {
    let layout = ScanLayout::new(local_scan.len(), chunk_size)?;
    if offsets.len() < layout.chunk_count {
        return Err(ComputeError::config(format!(
            "{} offsets cannot cover {} chunks",
            offsets.len(),
            layout.chunk_count
        )));
    }

    Ok(local_scan
        .par_iter()
        .enumerate()
        .map(|(i, &v)| v.add(offsets[layout.chunk_of(i)]))
        .collect())
}

/// Full inclusive prefix sum through the three stages.
///
/// Enforces the same capacity bound as the device path.
pub fn prefix_sum<T: ScanElement>(input: &[T], config: &ScanConfig) -> Result<Vec<T>> {
    let layout = config.layout(input.len())?;
    let ChunkedScan {
        local_scan,
        chunk_sums,
    } = scan(input, layout.chunk_size)?;
    let offsets = scan_chunk_sums(&chunk_sums, layout.padded_chunk_count)?;
    propagate(&local_scan, &offsets, layout.chunk_size)
}

/// Scans one chunk into `dst` and returns its total.
///
/// Reads past the end of a short chunk are the neutral element.
fn scan_chunk<T: ScanElement>(src: &[T], dst: &mut [T], chunk_size: usize) -> T {
    let mut tile = vec![T::ZERO; chunk_size];
    tile[..src.len()].copy_from_slice(src);
    let total = blelloch_exclusive(&mut tile);

    // Exclusive plus the element itself gives the inclusive local value.
    for ((out, &excl), &v) in dst.iter_mut().zip(&tile).zip(src) {
        *out = excl.add(v);
    }
    total
}

/// Work-efficient exclusive scan of a power-of-two tile, in place.
///
/// Returns the tile total (the root of the up-sweep).
pub(crate) fn blelloch_exclusive<T: ScanElement>(tile: &mut [T]) -> T {
    let n = tile.len();
    debug_assert!(n.is_power_of_two());

    let mut stride = 1;
    while stride < n {
        for right in (2 * stride - 1..n).step_by(2 * stride) {
            tile[right] = tile[right].add(tile[right - stride]);
        }
        stride *= 2;
    }

    let total = tile[n - 1];
    tile[n - 1] = T::ZERO;

    while stride > 1 {
        stride /= 2;
        for right in (2 * stride - 1..n).step_by(2 * stride) {
            let left = tile[right - stride];
            tile[right - stride] = tile[right];
            tile[right] = tile[right].add(left);
        }
    }

    total
}
