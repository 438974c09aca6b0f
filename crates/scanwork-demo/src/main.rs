use anyhow::{Context, Result, bail};
use rand::Rng;
use scanwork_engine::logging::{LoggingConfig, init_logging};
use scanwork_engine::scan::host as scan_host;
use scanwork_engine::sort::host as sort_host;
use scanwork_engine::{ComputeContext, ComputeInit, PrefixSum, RadixConfig, RadixSorter, ScanConfig};

const DEFAULT_LEN: usize = 1024;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let len = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<usize>()
            .with_context(|| format!("element count must be a positive integer, got {arg:?}"))?,
        None => DEFAULT_LEN,
    };
    if len == 0 {
        bail!("element count must be at least 1");
    }

    let ctx = ComputeContext::new_blocking(ComputeInit::from_env())
        .context("no compute device available (try SCANWORK_FALLBACK_ADAPTER=1)")?;
    let info = ctx.adapter_info();

    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║        SCANWORK COMPUTE DEMO v0.1      ║");
    println!("  ║   chunked prefix sum  ·  radix sort    ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();
    println!("  adapter   {} ({:?})", info.name, info.backend);
    println!("  elements  {len}");
    println!();

    let mut rng = rand::thread_rng();
    let values: Vec<u32> = (0..len).map(|_| rng.gen_range(1..=100)).collect();

    // ── prefix sum (u32) ──────────────────────────────────────────────────
    let config = ScanConfig::default();
    let scan_u32 = pollster::block_on(PrefixSum::<u32>::new(&ctx, config))
        .context("building u32 scan pipelines")?;
    let device = pollster::block_on(scan_u32.run_with_offsets(&ctx, &values))
        .context("running u32 prefix sum")?;
    let host = scan_host::prefix_sum(&values, &config)?;
    report("prefix sum u32", device.output == host);
    println!(
        "      total {}  ·  {} chunk offsets, last {:?}",
        device.output[len - 1],
        device.chunk_offsets.len(),
        device.chunk_offsets.last()
    );

    // ── prefix sum (f32) ──────────────────────────────────────────────────
    let floats: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    let scan_f32 = pollster::block_on(PrefixSum::<f32>::new(&ctx, config))
        .context("building f32 scan pipelines")?;
    let device = pollster::block_on(scan_f32.run(&ctx, &floats)).context("running f32 prefix sum")?;
    let host = scan_host::prefix_sum(&floats, &config)?;
    report("prefix sum f32", device == host);
    println!("      total {}", device[len - 1]);

    // ── radix sort ────────────────────────────────────────────────────────
    let keys: Vec<u32> = (0..len).map(|_| rng.gen_range(1..=100)).collect();
    let ids: Vec<u32> = (0..len as u32).collect();

    let sorter = pollster::block_on(RadixSorter::new(&ctx, RadixConfig::default()))
        .context("building radix pipelines")?;
    let sorted = pollster::block_on(sorter.sort(&ctx, &keys, &ids)).context("running radix sort")?;
    let host = sort_host::radix_sort(&keys, &ids, sorter.config())?;
    report("radix sort", sorted == host);

    let preview = sorted.keys.len().min(8);
    println!("      keys {:?} ...", &sorted.keys[..preview]);
    println!("      ids  {:?} ...", &sorted.ids[..preview]);
    println!();

    Ok(())
}

fn report(name: &str, matches: bool) {
    let verdict = if matches { "OK" } else { "MISMATCH" };
    println!("  {name:<16} .. {verdict}");
    if !matches {
        log::error!("{name}: device result differs from host reference");
    }
}
