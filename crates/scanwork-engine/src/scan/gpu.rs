use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};

use super::{ScanConfig, ScanElement, ScanLayout, ScanReadback};
use crate::device::buffers;
use crate::device::kernel::{self, ComputeKernel};
use crate::device::ComputeContext;
use crate::error::Result;

const LOCAL_SCAN_WGSL: &str = include_str!("shaders/local_scan.wgsl");
const CHUNK_SUM_SCAN_WGSL: &str = include_str!("shaders/chunk_sum_scan.wgsl");
const PROPAGATE_WGSL: &str = include_str!("shaders/propagate.wgsl");

/// Invocations per workgroup for the tree kernels. Each invocation walks
/// several tree nodes per level when the chunk is larger than twice this.
const TREE_WORKGROUP_SIZE: usize = 256;

/// Invocations per workgroup for the elementwise add.
const PROPAGATE_WORKGROUP_SIZE: usize = 256;

// ── params uniform ────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ScanParams {
    len: u32,
    chunk_count: u32,
    padded_chunk_count: u32,
    _pad: u32, // 16-byte alignment
}

impl ScanParams {
    fn from_layout(layout: &ScanLayout) -> Self {
        Self {
            len: layout.len as u32,
            chunk_count: layout.chunk_count as u32,
            padded_chunk_count: layout.padded_chunk_count as u32,
            _pad: 0,
        }
    }
}

// ── kernels ───────────────────────────────────────────────────────────────

/// The three scan pipelines, specialized for one element type and config.
///
/// Shared by [`PrefixSum`] and the radix sorter, which scans its flag arrays
/// with the same stages.
pub(crate) struct ScanKernels {
    config: ScanConfig,
    local_scan: ComputeKernel,
    chunk_sum_scan: ComputeKernel,
    propagate: ComputeKernel,
}

/// Buffers and bind groups of one scan over a fixed layout.
///
/// `output` holds the inclusive scan once the encoded stages have run; it is
/// written by stage one and updated in place by stage three.
pub(crate) struct ScanBuffers {
    pub(crate) layout: ScanLayout,
    pub(crate) output: wgpu::Buffer,
    pub(crate) offsets: wgpu::Buffer,
    local_scan_group: wgpu::BindGroup,
    chunk_sum_group: wgpu::BindGroup,
    propagate_group: wgpu::BindGroup,
}

impl ScanKernels {
    pub(crate) async fn new(
        ctx: &ComputeContext,
        config: ScanConfig,
        elem: &str,
        elem_size: usize,
    ) -> Result<Self> {
        config.validate()?;

        let tree_workgroup = (config.chunk_size / 2).min(TREE_WORKGROUP_SIZE);
        let sums_workgroup = (config.max_chunk_sums / 2).clamp(1, TREE_WORKGROUP_SIZE);

        kernel::check_workgroup(
            ctx,
            "scanwork local scan",
            tree_workgroup as u32,
            (config.chunk_size * elem_size) as u64,
        )?;
        kernel::check_workgroup(
            ctx,
            "scanwork chunk-sum scan",
            sums_workgroup as u32,
            (config.max_chunk_sums * elem_size) as u64,
        )?;

        let local_scan = ComputeKernel::new(
            ctx,
            "scanwork local scan",
            kernel::specialize(
                LOCAL_SCAN_WGSL,
                &[
                    ("ELEM", elem.to_owned()),
                    ("CHUNK_SIZE", config.chunk_size.to_string()),
                    ("WORKGROUP_SIZE", tree_workgroup.to_string()),
                ],
            ),
            &[
                kernel::storage_entry(0, true),
                kernel::storage_entry(1, false),
                kernel::storage_entry(2, false),
                kernel::uniform_entry(3),
            ],
        )
        .await?;

        let chunk_sum_scan = ComputeKernel::new(
            ctx,
            "scanwork chunk-sum scan",
            kernel::specialize(
                CHUNK_SUM_SCAN_WGSL,
                &[
                    ("ELEM", elem.to_owned()),
                    ("MAX_CHUNK_SUMS", config.max_chunk_sums.to_string()),
                    ("WORKGROUP_SIZE", sums_workgroup.to_string()),
                ],
            ),
            &[
                kernel::storage_entry(0, true),
                kernel::storage_entry(1, false),
                kernel::uniform_entry(2),
            ],
        )
        .await?;

        let propagate = ComputeKernel::new(
            ctx,
            "scanwork propagate",
            kernel::specialize(
                PROPAGATE_WGSL,
                &[
                    ("ELEM", elem.to_owned()),
                    ("CHUNK_SIZE", config.chunk_size.to_string()),
                    ("WORKGROUP_SIZE", PROPAGATE_WORKGROUP_SIZE.to_string()),
                ],
            ),
            &[
                kernel::storage_entry(0, false),
                kernel::storage_entry(1, true),
                kernel::uniform_entry(2),
            ],
        )
        .await?;

        Ok(Self {
            config,
            local_scan,
            chunk_sum_scan,
            propagate,
        })
    }

    pub(crate) fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Allocates the intermediate buffers for scanning `input` with `layout`.
    ///
    /// `input` must be a storage buffer of at least `layout.len` elements.
    pub(crate) fn prepare<T: ScanElement>(
        &self,
        ctx: &ComputeContext,
        input: &wgpu::Buffer,
        layout: ScanLayout,
    ) -> Result<ScanBuffers> {
        ctx.check_dispatch("scanwork local scan", layout.chunk_count as u32)?;
        ctx.check_dispatch(
            "scanwork propagate",
            kernel::workgroups_for(layout.len, PROPAGATE_WORKGROUP_SIZE),
        )?;

        let output = buffers::zeroed_storage::<T>(
            ctx,
            "scanwork scan output",
            layout.len,
            wgpu::BufferUsages::COPY_SRC,
        )?;
        let chunk_sums = buffers::zeroed_storage::<T>(
            ctx,
            "scanwork chunk sums",
            layout.padded_chunk_count,
            wgpu::BufferUsages::empty(),
        )?;
        let offsets = buffers::zeroed_storage::<T>(
            ctx,
            "scanwork chunk offsets",
            layout.padded_chunk_count,
            wgpu::BufferUsages::COPY_SRC,
        )?;
        let params = buffers::uniform(
            ctx,
            "scanwork scan params",
            &ScanParams::from_layout(&layout),
        );

        let local_scan_group = self
            .local_scan
            .bind(ctx, &[input, &output, &chunk_sums, &params]);
        let chunk_sum_group = self.chunk_sum_scan.bind(ctx, &[&chunk_sums, &offsets, &params]);
        let propagate_group = self.propagate.bind(ctx, &[&output, &offsets, &params]);

        Ok(ScanBuffers {
            layout,
            output,
            offsets,
            local_scan_group,
            chunk_sum_group,
            propagate_group,
        })
    }

    /// Records the three stages. No host wait happens between them.
    pub(crate) fn encode(&self, encoder: &mut wgpu::CommandEncoder, scan: &ScanBuffers) {
        let layout = &scan.layout;
        self.local_scan
            .dispatch(encoder, &scan.local_scan_group, layout.chunk_count as u32);
        self.chunk_sum_scan.dispatch(encoder, &scan.chunk_sum_group, 1);
        self.propagate.dispatch(
            encoder,
            &scan.propagate_group,
            kernel::workgroups_for(layout.len, PROPAGATE_WORKGROUP_SIZE),
        );
    }
}

// ── public engine ─────────────────────────────────────────────────────────

/// Device prefix-sum engine for element type `T`.
///
/// Pipelines are compiled once in [`PrefixSum::new`]; every [`PrefixSum::run`]
/// allocates fresh buffers, records all stages into one encoder, submits once
/// and awaits a single read-back.
pub struct PrefixSum<T: ScanElement> {
    kernels: ScanKernels,
    _elem: PhantomData<T>,
}

impl<T: ScanElement> PrefixSum<T> {
    /// Compiles the three pipelines for `T`.
    pub async fn new(ctx: &ComputeContext, config: ScanConfig) -> Result<Self> {
        let kernels =
            ScanKernels::new(ctx, config, T::WGSL_TYPE, std::mem::size_of::<T>()).await?;
        Ok(Self {
            kernels,
            _elem: PhantomData,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        self.kernels.config()
    }

    /// Inclusive prefix sum of `input`.
    pub async fn run(&self, ctx: &ComputeContext, input: &[T]) -> Result<Vec<T>> {
        Ok(self.run_with_offsets(ctx, input).await?.output)
    }

    /// Inclusive prefix sum plus the scanned (padded) chunk offsets.
    pub async fn run_with_offsets(
        &self,
        ctx: &ComputeContext,
        input: &[T],
    ) -> Result<ScanReadback<T>> {
        let layout = self.config().layout(input.len())?;
        log::debug!(
            "prefix sum: {} elements, {} chunks of {}, {} padded chunk sums",
            layout.len,
            layout.chunk_count,
            layout.chunk_size,
            layout.padded_chunk_count
        );

        let (output_staging, offsets_staging) = ctx
            .capture("scanwork prefix sum", || {
                let input_buf = buffers::upload_storage(
                    ctx,
                    "scanwork scan input",
                    input,
                    wgpu::BufferUsages::empty(),
                )?;
                let scan = self.kernels.prepare::<T>(ctx, &input_buf, layout)?;

                let output_staging =
                    buffers::staging::<T>(ctx, "scanwork output read-back", layout.len)?;
                let offsets_staging = buffers::staging::<T>(
                    ctx,
                    "scanwork offsets read-back",
                    layout.padded_chunk_count,
                )?;

                let mut encoder = ctx
                    .device()
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("scanwork prefix sum encoder"),
                    });
                self.kernels.encode(&mut encoder, &scan);
                buffers::copy_elements::<T>(
                    &mut encoder,
                    &scan.output,
                    &output_staging,
                    layout.len,
                );
                buffers::copy_elements::<T>(
                    &mut encoder,
                    &scan.offsets,
                    &offsets_staging,
                    layout.padded_chunk_count,
                );
                ctx.queue().submit(std::iter::once(encoder.finish()));
                Ok((output_staging, offsets_staging))
            })
            .await?;
        log::debug!("prefix sum submitted");

        let output = buffers::read_back::<T>(ctx, &output_staging, layout.len).await?;
        let chunk_offsets =
            buffers::read_back::<T>(ctx, &offsets_staging, layout.padded_chunk_count).await?;

        Ok(ScanReadback {
            output,
            chunk_offsets,
        })
    }
}

/// Inclusive prefix sum with the default [`ScanConfig`].
///
/// Compiles the pipelines for this call only; keep a [`PrefixSum`] around for
/// repeated scans.
pub async fn compute_prefix_sum<T: ScanElement>(
    ctx: &ComputeContext,
    input: &[T],
) -> Result<Vec<T>> {
    // Reject bad input before compiling anything.
    ScanConfig::default().layout(input.len())?;
    PrefixSum::<T>::new(ctx, ScanConfig::default())
        .await?
        .run(ctx, input)
        .await
}
