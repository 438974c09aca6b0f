//! Compute pipeline construction shared by the scan and sort kernels.

use super::ComputeContext;
use crate::error::{ComputeError, Result};

/// Replaces `{{NAME}}` placeholders in a WGSL template.
///
/// The kernels size their workgroup arrays and workgroups from these values,
/// so they must be compile-time constants in the shader.
pub(crate) fn specialize(template: &str, substitutions: &[(&str, String)]) -> String {
    substitutions
        .iter()
        .fold(template.to_owned(), |src, (name, value)| {
            src.replace(&format!("{{{{{name}}}}}"), value)
        })
}

pub(crate) fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// One compute pipeline plus the bind group layout its `main` entry point uses.
pub(crate) struct ComputeKernel {
    label: &'static str,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl ComputeKernel {
    /// Compiles `source` and builds a pipeline with an explicit layout.
    ///
    /// `entries` must list the shader's `@group(0)` bindings in order. Shader
    /// compile errors and layouts the device cannot satisfy come back as
    /// [`ComputeError::Resource`].
    pub(crate) async fn new(
        ctx: &ComputeContext,
        label: &'static str,
        source: String,
        entries: &[wgpu::BindGroupLayoutEntry],
    ) -> Result<Self> {
        let device = ctx.device();

        let kernel = ctx
            .capture(label, || {
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(label),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                });

                let bind_group_layout =
                    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        label: Some(label),
                        entries,
                    });

                let pipeline_layout =
                    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some(label),
                        bind_group_layouts: &[&bind_group_layout],
                        immediate_size: 0,
                    });

                let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(label),
                    layout: Some(&pipeline_layout),
                    module: &shader,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    cache: None,
                });

                Ok(Self {
                    label,
                    pipeline,
                    bind_group_layout,
                })
            })
            .await?;

        log::debug!("created compute pipeline {label}");
        Ok(kernel)
    }

    /// Binds `buffers` to bindings `0..buffers.len()` in order.
    pub(crate) fn bind(&self, ctx: &ComputeContext, buffers: &[&wgpu::Buffer]) -> wgpu::BindGroup {
        let entries: Vec<wgpu::BindGroupEntry<'_>> = buffers
            .iter()
            .enumerate()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();

        ctx.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(self.label),
            layout: &self.bind_group_layout,
            entries: &entries,
        })
    }

    /// Records one compute pass dispatching `workgroups` groups along x.
    ///
    /// Each stage gets its own pass; wgpu orders passes of one encoder and
    /// makes earlier writes visible to later reads.
    pub(crate) fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        bind_group: &wgpu::BindGroup,
        workgroups: u32,
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(self.label),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(workgroups, 1, 1);
    }
}

/// Checks that a kernel's workgroup fits the device.
pub(crate) fn check_workgroup(
    ctx: &ComputeContext,
    label: &str,
    invocations: u32,
    shared_bytes: u64,
) -> Result<()> {
    let limits = ctx.limits();
    let max_invocations = limits
        .max_compute_invocations_per_workgroup
        .min(limits.max_compute_workgroup_size_x);
    if invocations > max_invocations {
        return Err(ComputeError::resource(format!(
            "{label}: workgroup of {invocations} invocations exceeds the device limit of {max_invocations}"
        )));
    }

    let max_shared = u64::from(limits.max_compute_workgroup_storage_size);
    if shared_bytes > max_shared {
        return Err(ComputeError::resource(format!(
            "{label}: {shared_bytes} bytes of workgroup storage exceed the device limit of {max_shared}"
        )));
    }

    Ok(())
}

/// Number of workgroups needed to cover `len` items with `group_size` each.
pub(crate) fn workgroups_for(len: usize, group_size: usize) -> u32 {
    len.div_ceil(group_size) as u32
}
