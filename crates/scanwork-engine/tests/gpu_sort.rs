mod common;

use rand::Rng;
use scanwork_engine::sort::host;
use scanwork_engine::{
    ComputeError, ComputeInit, RadixConfig, RadixSorter, compute_prefix_sum, compute_radix_sort,
};

fn identity_ids(n: usize) -> Vec<u32> {
    (0..n as u32).collect()
}

#[test]
fn worked_example() {
    let Some(ctx) = common::context() else { return };
    let sorter = pollster::block_on(RadixSorter::new(&ctx, RadixConfig::new(4, 8))).unwrap();
    let out = pollster::block_on(sorter.sort(&ctx, &[5, 3, 8, 1], &[0, 1, 2, 3])).unwrap();
    assert_eq!(out.keys, vec![1, 3, 5, 8]);
    assert_eq!(out.ids, vec![3, 1, 0, 2]);
}

#[test]
fn random_keys_match_host_path() {
    let Some(ctx) = common::context() else { return };
    let sorter = pollster::block_on(RadixSorter::new(&ctx, RadixConfig::default())).unwrap();
    let mut rng = rand::thread_rng();

    for len in [1usize, 2, 1000, 4096, 5000] {
        let keys: Vec<u32> = (0..len).map(|_| rng.r#gen()).collect();
        let ids = identity_ids(len);

        let device = pollster::block_on(sorter.sort(&ctx, &keys, &ids)).unwrap();
        let reference = host::radix_sort(&keys, &ids, sorter.config()).unwrap();
        assert_eq!(device, reference, "len {len}");

        let mut expected = keys.clone();
        expected.sort_unstable();
        assert_eq!(device.keys, expected);
    }
}

#[test]
fn duplicates_keep_input_order() {
    let Some(ctx) = common::context() else { return };
    let mut rng = rand::thread_rng();
    let keys: Vec<u32> = (0..3000).map(|_| rng.gen_range(0..16)).collect();
    let ids = identity_ids(keys.len());

    let out = pollster::block_on(compute_radix_sort(&ctx, &keys, &ids)).unwrap();

    assert!(out.keys.windows(2).all(|w| w[0] <= w[1]));
    let mut seen = out.ids.clone();
    seen.sort_unstable();
    assert_eq!(seen, ids);
    for w in out.ids.windows(2) {
        if keys[w[0] as usize] == keys[w[1] as usize] {
            assert!(w[0] < w[1]);
        }
    }
}

#[test]
fn odd_pass_count() {
    let Some(ctx) = common::context() else { return };
    let sorter = pollster::block_on(RadixSorter::new(&ctx, RadixConfig::new(2, 6))).unwrap();
    let keys = [0x3f_u32, 0x01, 0x2a, 0x15, 0x00, 0x3f];
    let out = pollster::block_on(sorter.sort(&ctx, &keys, &identity_ids(keys.len()))).unwrap();
    assert_eq!(out.keys, vec![0x00, 0x01, 0x15, 0x2a, 0x3f, 0x3f]);
    assert_eq!(out.ids, vec![4, 1, 3, 2, 0, 5]);
}

#[test]
fn already_sorted_is_unchanged() {
    let Some(ctx) = common::context() else { return };
    let keys: Vec<u32> = (0..4096).collect();
    let ids = identity_ids(keys.len());
    let out = pollster::block_on(compute_radix_sort(&ctx, &keys, &ids)).unwrap();
    assert_eq!(out.keys, keys);
    assert_eq!(out.ids, ids);
}

#[test]
fn empty_and_mismatched() {
    let Some(ctx) = common::context() else { return };

    let out = pollster::block_on(compute_radix_sort(&ctx, &[], &[])).unwrap();
    assert!(out.keys.is_empty());

    assert!(matches!(
        pollster::block_on(compute_radix_sort(&ctx, &[1, 2], &[0])),
        Err(ComputeError::Configuration(_))
    ));
}

#[test]
fn too_few_storage_buffers_is_a_resource_error() {
    // Downlevel limits allow four storage buffers per stage; scatter binds five.
    let Some(ctx) = common::context_with(ComputeInit {
        required_limits: wgpu::Limits::downlevel_defaults(),
        ..ComputeInit::from_env()
    }) else {
        return;
    };

    match pollster::block_on(RadixSorter::new(&ctx, RadixConfig::default())) {
        Err(ComputeError::Resource(err)) => {
            assert!(err.to_string().contains("scanwork radix scatter"), "{err:#}");
        }
        Err(other) => panic!("expected a resource error, got {other}"),
        Ok(_) => panic!("scatter pipeline built under downlevel limits"),
    }

    // The scan kernels stay within the reduced limits.
    let out = pollster::block_on(compute_prefix_sum(&ctx, &[1u32, 2, 3])).unwrap();
    assert_eq!(out, vec![1, 3, 6]);
}
