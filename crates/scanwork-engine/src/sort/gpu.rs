use bytemuck::{Pod, Zeroable};

use super::pingpong::{BufferSlot, PingPong};
use super::{RadixConfig, SortedPairs};
use crate::device::buffers;
use crate::device::kernel::{self, ComputeKernel};
use crate::device::ComputeContext;
use crate::error::Result;
use crate::scan::ScanKernels;

const FLAGS_WGSL: &str = include_str!("shaders/radix_flags.wgsl");
const SCATTER_WGSL: &str = include_str!("shaders/radix_scatter.wgsl");

const WORKGROUP_SIZE: usize = 256;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct RadixParams {
    len: u32,
    shift: u32,
    mask: u32,
    buckets: u32,
}

/// Device LSD radix sort of `u32` keys carrying `u32` ids.
///
/// Each pass records flags → three-stage scan → scatter; all passes of a call
/// go into one encoder and one submission.
pub struct RadixSorter {
    config: RadixConfig,
    scan: ScanKernels,
    flags: ComputeKernel,
    scatter: ComputeKernel,
}

impl RadixSorter {
    /// Compiles the flag, scan and scatter pipelines.
    ///
    /// Needs five storage buffers per shader stage; a device with fewer fails
    /// here with [`ComputeError::Resource`](crate::ComputeError::Resource).
    pub async fn new(ctx: &ComputeContext, config: RadixConfig) -> Result<Self> {
        config.validate()?;

        let scan = ScanKernels::new(ctx, config.scan, "u32", std::mem::size_of::<u32>()).await?;
        kernel::check_workgroup(ctx, "scanwork radix", WORKGROUP_SIZE as u32, 0)?;

        let workgroup = [("WORKGROUP_SIZE", WORKGROUP_SIZE.to_string())];

        let flags = ComputeKernel::new(
            ctx,
            "scanwork radix flags",
            kernel::specialize(FLAGS_WGSL, &workgroup),
            &[
                kernel::storage_entry(0, true),
                kernel::storage_entry(1, false),
                kernel::uniform_entry(2),
            ],
        )
        .await?;

        let scatter = ComputeKernel::new(
            ctx,
            "scanwork radix scatter",
            kernel::specialize(SCATTER_WGSL, &workgroup),
            &[
                kernel::storage_entry(0, true),
                kernel::storage_entry(1, true),
                kernel::storage_entry(2, true),
                kernel::storage_entry(3, false),
                kernel::storage_entry(4, false),
                kernel::uniform_entry(5),
            ],
        )
        .await?;

        Ok(Self {
            config,
            scan,
            flags,
            scatter,
        })
    }

    pub fn config(&self) -> &RadixConfig {
        &self.config
    }

    /// Sorts `keys` ascending and permutes `ids` identically. Stable.
    pub async fn sort(
        &self,
        ctx: &ComputeContext,
        keys: &[u32],
        ids: &[u32],
    ) -> Result<SortedPairs> {
        let config = &self.config;
        super::check_inputs(keys, ids, config)?;
        let n = keys.len();
        if n == 0 {
            return Ok(SortedPairs::default());
        }

        let buckets = config.bucket_count();
        let layout = config.scan.layout(n * buckets)?;
        let pass_count = config.digit_count();
        let workgroups = kernel::workgroups_for(n, WORKGROUP_SIZE);
        ctx.check_dispatch("scanwork radix", workgroups)?;

        log::debug!(
            "radix sort: {n} keys, {pass_count} passes of {} bits, {} flags in {} chunks",
            config.digit_width,
            layout.len,
            layout.chunk_count
        );

        let slot = BufferSlot::after_passes(pass_count);
        let (keys_staging, ids_staging) = ctx
            .capture("scanwork radix sort", || {
                let copy = wgpu::BufferUsages::COPY_SRC;
                let key_pair = PingPong::new(
                    buffers::upload_storage(ctx, "scanwork keys a", keys, copy)?,
                    buffers::zeroed_storage::<u32>(ctx, "scanwork keys b", n, copy)?,
                );
                let id_pair = PingPong::new(
                    buffers::upload_storage(ctx, "scanwork ids a", ids, copy)?,
                    buffers::zeroed_storage::<u32>(ctx, "scanwork ids b", n, copy)?,
                );
                let flags = buffers::zeroed_storage::<u32>(
                    ctx,
                    "scanwork radix flags",
                    layout.len,
                    wgpu::BufferUsages::empty(),
                )?;

                // Flags, scan intermediates and ranks are rewritten every pass;
                // each stage is their only writer while it runs.
                let scan = self.scan.prepare::<u32>(ctx, &flags, layout)?;

                let keys_staging =
                    buffers::staging::<u32>(ctx, "scanwork sorted keys read-back", n)?;
                let ids_staging =
                    buffers::staging::<u32>(ctx, "scanwork sorted ids read-back", n)?;

                let mut encoder = ctx
                    .device()
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("scanwork radix sort encoder"),
                    });

                for pass in 0..pass_count {
                    let params = buffers::uniform(
                        ctx,
                        "scanwork radix params",
                        &RadixParams {
                            len: n as u32,
                            shift: config.shift(pass),
                            mask: config.digit_mask(),
                            buckets: buckets as u32,
                        },
                    );

                    let flags_group = self
                        .flags
                        .bind(ctx, &[key_pair.input(pass), &flags, &params]);
                    let scatter_group = self.scatter.bind(
                        ctx,
                        &[
                            key_pair.input(pass),
                            id_pair.input(pass),
                            &scan.output,
                            key_pair.output(pass),
                            id_pair.output(pass),
                            &params,
                        ],
                    );

                    self.flags.dispatch(&mut encoder, &flags_group, workgroups);
                    self.scan.encode(&mut encoder, &scan);
                    self.scatter.dispatch(&mut encoder, &scatter_group, workgroups);

                    log::trace!("encoded radix pass {pass} (shift {})", config.shift(pass));
                }

                buffers::copy_elements::<u32>(
                    &mut encoder,
                    key_pair.get(slot),
                    &keys_staging,
                    n,
                );
                buffers::copy_elements::<u32>(&mut encoder, id_pair.get(slot), &ids_staging, n);
                ctx.queue().submit(std::iter::once(encoder.finish()));
                Ok((keys_staging, ids_staging))
            })
            .await?;
        log::debug!("radix sort submitted, result in slot {slot:?}");

        let keys = buffers::read_back::<u32>(ctx, &keys_staging, n).await?;
        let ids = buffers::read_back::<u32>(ctx, &ids_staging, n).await?;

        Ok(SortedPairs { keys, ids })
    }
}

/// Radix sort with the default [`RadixConfig`] (4-bit digits over 32 bits).
///
/// Compiles the pipelines for this call only; keep a [`RadixSorter`] around
/// for repeated sorts.
pub async fn compute_radix_sort(
    ctx: &ComputeContext,
    keys: &[u32],
    ids: &[u32],
) -> Result<SortedPairs> {
    let config = RadixConfig::default();
    super::check_inputs(keys, ids, &config)?;
    RadixSorter::new(ctx, config)
        .await?
        .sort(ctx, keys, ids)
        .await
}
