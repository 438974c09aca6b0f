mod common;

use rand::Rng;
use scanwork_engine::scan::host;
use scanwork_engine::{ComputeError, ComputeInit, PrefixSum, ScanConfig, compute_prefix_sum};

fn sequential(input: &[u32]) -> Vec<u32> {
    input
        .iter()
        .scan(0u32, |acc, &v| {
            *acc = acc.wrapping_add(v);
            Some(*acc)
        })
        .collect()
}

#[test]
fn worked_example_with_offsets() {
    let Some(ctx) = common::context() else { return };

    let config = ScanConfig::with_chunk_size(4);
    let engine = pollster::block_on(PrefixSum::<u32>::new(&ctx, config)).unwrap();
    let out = pollster::block_on(engine.run_with_offsets(&ctx, &[5, 3, 8, 1, 9, 2])).unwrap();

    assert_eq!(out.output, vec![5, 8, 16, 17, 26, 28]);
    assert_eq!(out.chunk_offsets, vec![0, 17]);
    assert_eq!(out.output, sequential(&[5, 3, 8, 1, 9, 2]));
}

#[test]
fn matches_sequential_across_lengths() {
    let Some(ctx) = common::context() else { return };
    let engine = pollster::block_on(PrefixSum::<u32>::new(&ctx, ScanConfig::default())).unwrap();
    let mut rng = rand::thread_rng();

    for len in [1usize, 2, 3, 97, 511, 512, 513, 1024, 4099, 9973, 10_000] {
        let input: Vec<u32> = (0..len).map(|_| rng.gen_range(0..1000)).collect();
        let out = pollster::block_on(engine.run(&ctx, &input)).unwrap();
        assert_eq!(out, sequential(&input), "len {len}");
    }
}

#[test]
fn chunk_boundary_lengths_agree() {
    let Some(ctx) = common::context() else { return };
    let chunk = 64;
    let config = ScanConfig::with_chunk_size(chunk);
    let engine = pollster::block_on(PrefixSum::<u32>::new(&ctx, config)).unwrap();
    let mut rng = rand::thread_rng();

    for k in [1usize, 2, 5] {
        let long: Vec<u32> = (0..k * chunk + chunk / 2).map(|_| rng.gen_range(0..100)).collect();
        let exact = pollster::block_on(engine.run(&ctx, &long[..k * chunk])).unwrap();
        let extended = pollster::block_on(engine.run(&ctx, &long)).unwrap();
        assert_eq!(&extended[..k * chunk], &exact[..]);
        assert_eq!(extended, sequential(&long));
    }
}

#[test]
fn float_scan_matches_host_path() {
    let Some(ctx) = common::context() else { return };
    let mut rng = rand::thread_rng();

    // Integer-valued floats keep every partial sum exact.
    let input: Vec<f32> = (0..1024).map(|_| rng.gen_range(1..=100) as f32).collect();
    let device = pollster::block_on(compute_prefix_sum(&ctx, &input)).unwrap();
    let reference = host::prefix_sum(&input, &ScanConfig::default()).unwrap();
    assert_eq!(device, reference);
}

#[test]
fn signed_scan() {
    let Some(ctx) = common::context() else { return };
    let out = pollster::block_on(compute_prefix_sum(&ctx, &[4i32, -6, 3, -1, 10])).unwrap();
    assert_eq!(out, vec![4, -2, 1, 0, 10]);
}

#[test]
fn errors_surface_before_dispatch() {
    let Some(ctx) = common::context() else { return };

    let empty: [u32; 0] = [];
    assert!(matches!(
        pollster::block_on(compute_prefix_sum(&ctx, &empty)),
        Err(ComputeError::Configuration(_))
    ));

    let small = ScanConfig {
        chunk_size: 4,
        max_chunk_sums: 2,
    };
    let engine = pollster::block_on(PrefixSum::<u32>::new(&ctx, small)).unwrap();
    match pollster::block_on(engine.run(&ctx, &[1; 9])) {
        Err(ComputeError::Capacity { required, limit }) => assert_eq!((required, limit), (4, 2)),
        other => panic!("expected capacity error, got {other:?}"),
    }
}

#[test]
fn unbounded_readback_completes() {
    let Some(ctx) = common::context_with(ComputeInit {
        readback_timeout: None,
        ..ComputeInit::from_env()
    }) else {
        return;
    };

    let input: Vec<u32> = (1..=2000).collect();
    let out = pollster::block_on(compute_prefix_sum(&ctx, &input)).unwrap();
    assert_eq!(out, sequential(&input));
}
