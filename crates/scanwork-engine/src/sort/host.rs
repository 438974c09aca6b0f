//! Host execution of the radix sort.
//!
//! Runs exactly the device's per-pass steps (bucket-major flags, chunked
//! prefix sum, stable scatter) so it can serve as the reference for device
//! results and as the fallback when no adapter is present.

use rayon::prelude::*;

use super::pingpong::{BufferSlot, PingPong};
use super::{RadixConfig, SortedPairs};
use crate::error::Result;
use crate::scan::host as scan_host;

/// Sorts `keys` ascending and permutes `ids` identically. Stable.
pub fn radix_sort(keys: &[u32], ids: &[u32], config: &RadixConfig) -> Result<SortedPairs> {
    super::check_inputs(keys, ids, config)?;
    let n = keys.len();
    if n == 0 {
        return Ok(SortedPairs::default());
    }

    // Reject oversize flag arrays before doing any work.
    config.scan.layout(n * config.bucket_count())?;

    let mut key_pair = PingPong::new(keys.to_vec(), vec![0u32; n]);
    let mut id_pair = PingPong::new(ids.to_vec(), vec![0u32; n]);
    let mut flags = vec![0u32; n * config.bucket_count()];

    for pass in 0..config.digit_count() {
        let (keys_in, keys_out) = key_pair.split(pass);
        let (ids_in, ids_out) = id_pair.split(pass);

        write_flags(keys_in, &mut flags, config, pass);
        let ranks = scan_host::prefix_sum(&flags, &config.scan)?;
        scatter(keys_in, ids_in, &ranks, keys_out, ids_out, config, pass);

        log::trace!("host radix pass {pass} done");
    }

    let slot = BufferSlot::after_passes(config.digit_count());
    Ok(SortedPairs {
        keys: key_pair.into_slot(slot),
        ids: id_pair.into_slot(slot),
    })
}

/// `flags[b * n + i] = 1` iff digit `pass` of `keys[i]` is `b`.
fn write_flags(keys: &[u32], flags: &mut [u32], config: &RadixConfig, pass: usize) {
    let n = keys.len();
    flags
        .par_chunks_mut(n)
        .enumerate()
        .for_each(|(bucket, row)| {
            for (flag, &key) in row.iter_mut().zip(keys) {
                *flag = u32::from(config.digit_of(key, pass) == bucket);
            }
        });
}

/// Moves element `i` with digit `b` to `ranks[b * n + i] - 1`.
///
/// `ranks` is the inclusive scan of the bucket-major flags, so every lower
/// bucket lands first and equal digits keep their order.
fn scatter(
    keys_in: &[u32],
    ids_in: &[u32],
    ranks: &[u32],
    keys_out: &mut [u32],
    ids_out: &mut [u32],
    config: &RadixConfig,
    pass: usize,
) {
    let n = keys_in.len();
    for (i, (&key, &id)) in keys_in.iter().zip(ids_in).enumerate() {
        let bucket = config.digit_of(key, pass);
        let dest = (ranks[bucket * n + i] - 1) as usize;
        keys_out[dest] = key;
        ids_out[dest] = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComputeError;
    use rand::Rng;

    fn identity_ids(n: usize) -> Vec<u32> {
        (0..n as u32).collect()
    }

    fn assert_sorted_stable_permutation(keys: &[u32], sorted: &SortedPairs) {
        assert_eq!(sorted.keys.len(), keys.len());
        assert!(sorted.keys.windows(2).all(|w| w[0] <= w[1]), "not ordered");

        let mut seen = vec![false; keys.len()];
        for (pos, &id) in sorted.ids.iter().enumerate() {
            assert!(!seen[id as usize], "id {id} duplicated");
            seen[id as usize] = true;
            assert_eq!(keys[id as usize], sorted.keys[pos], "id does not follow its key");
        }

        for w in sorted.ids.windows(2) {
            if keys[w[0] as usize] == keys[w[1] as usize] {
                assert!(w[0] < w[1], "equal keys reordered");
            }
        }
    }

    #[test]
    fn worked_example() {
        let cfg = RadixConfig::new(4, 8);
        let out = radix_sort(&[5, 3, 8, 1], &[0, 1, 2, 3], &cfg).unwrap();
        assert_eq!(out.keys, vec![1, 3, 5, 8]);
        assert_eq!(out.ids, vec![3, 1, 0, 2]);
    }

    #[test]
    fn random_full_width_keys() {
        let mut rng = rand::thread_rng();
        let keys: Vec<u32> = (0..5000).map(|_| rng.r#gen()).collect();
        let out = radix_sort(&keys, &identity_ids(keys.len()), &RadixConfig::default()).unwrap();

        let mut expected = keys.clone();
        expected.sort_unstable();
        assert_eq!(out.keys, expected);
        assert_sorted_stable_permutation(&keys, &out);
    }

    #[test]
    fn many_duplicates_stay_stable() {
        let mut rng = rand::thread_rng();
        let keys: Vec<u32> = (0..3000).map(|_| rng.gen_range(0..8)).collect();
        for width in [1, 2, 4, 8] {
            let cfg = RadixConfig::new(width, 8);
            let out = radix_sort(&keys, &identity_ids(keys.len()), &cfg).unwrap();
            assert_sorted_stable_permutation(&keys, &out);
        }
    }

    #[test]
    fn odd_pass_count_reads_the_right_slot() {
        let keys = vec![0x3f_u32, 0x01, 0x2a, 0x15, 0x00, 0x3f];
        let cfg = RadixConfig::new(2, 6); // three passes
        let out = radix_sort(&keys, &identity_ids(keys.len()), &cfg).unwrap();
        assert_eq!(out.keys, vec![0x00, 0x01, 0x15, 0x2a, 0x3f, 0x3f]);
        assert_eq!(out.ids, vec![4, 1, 3, 2, 0, 5]);
    }

    #[test]
    fn sorted_input_is_identity() {
        let keys: Vec<u32> = (0..2048).map(|i| i * 3).collect();
        let ids = identity_ids(keys.len());
        let out = radix_sort(&keys, &ids, &RadixConfig::default()).unwrap();
        assert_eq!(out.keys, keys);
        assert_eq!(out.ids, ids);
    }

    #[test]
    fn high_bits_beyond_total_bits_are_ignored() {
        let keys = [0x100u32 | 2, 1, 0x200];
        let out = radix_sort(&keys, &[0, 1, 2], &RadixConfig::new(4, 8)).unwrap();
        assert_eq!(out.ids, vec![2, 1, 0]);
    }

    #[test]
    fn carries_arbitrary_payloads() {
        let keys = [30u32, 10, 20];
        let payload = [0xaaaa_u32, 0xbbbb, 0xcccc];
        let out = radix_sort(&keys, &payload, &RadixConfig::default()).unwrap();
        assert_eq!(out.ids, vec![0xbbbb, 0xcccc, 0xaaaa]);
    }

    #[test]
    fn empty_and_single() {
        let out = radix_sort(&[], &[], &RadixConfig::default()).unwrap();
        assert!(out.keys.is_empty() && out.ids.is_empty());

        let out = radix_sort(&[42], &[7], &RadixConfig::default()).unwrap();
        assert_eq!(out.keys, vec![42]);
        assert_eq!(out.ids, vec![7]);
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(matches!(
            radix_sort(&[1, 2], &[0], &RadixConfig::default()),
            Err(ComputeError::Configuration(_))
        ));
        assert!(matches!(
            radix_sort(&[1], &[0], &RadixConfig::new(5, 32)),
            Err(ComputeError::Configuration(_))
        ));
    }

    #[test]
    fn oversize_flag_array_is_a_capacity_error() {
        let mut cfg = RadixConfig::new(4, 8);
        cfg.scan.chunk_size = 4;
        cfg.scan.max_chunk_sums = 4;
        // 16 buckets * 2 keys = 32 flags > 16
        assert!(matches!(
            radix_sort(&[1, 2], &[0, 1], &cfg),
            Err(ComputeError::Capacity { .. })
        ));
    }
}
