use std::time::Duration;

use anyhow::Context as _;

use super::ComputeInit;
use crate::error::{ComputeError, Result};

/// Owns the wgpu objects every scan and sort call runs on.
///
/// The context is constructed explicitly and passed by reference; there is no
/// process-wide instance. Cloning is cheap (wgpu handles are reference counted)
/// and yields a context on the same device.
#[derive(Clone)]
pub struct ComputeContext {
    /// Description of the selected adapter.
    adapter_info: wgpu::AdapterInfo,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue. Submissions execute in order.
    queue: wgpu::Queue,

    /// Limits granted by the device; checked before allocation and dispatch.
    limits: wgpu::Limits,

    /// Bound on the final read-back wait.
    readback_timeout: Option<Duration>,
}

impl ComputeContext {
    /// Acquires an adapter and a device.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu. Failures are
    /// reported as [`ComputeError::Resource`] with the full context chain.
    pub async fn new(init: ComputeInit) -> Result<Self> {
        Self::acquire(init).await.map_err(ComputeError::Resource)
    }

    /// Blocking variant of [`ComputeContext::new`] for synchronous callers.
    pub fn new_blocking(init: ComputeInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    async fn acquire(init: ComputeInit) -> anyhow::Result<Self> {
        let ComputeInit {
            backends,
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
            readback_timeout,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        log::info!(
            "using adapter {:?} ({:?}, {:?})",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("scanwork device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let limits = device.limits();
        log::debug!(
            "device limits: workgroup storage {} B, invocations {}, max buffer {} B",
            limits.max_compute_workgroup_storage_size,
            limits.max_compute_invocations_per_workgroup,
            limits.max_buffer_size
        );

        Ok(Self {
            adapter_info,
            device,
            queue,
            limits,
            readback_timeout,
        })
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Limits granted by the device.
    pub fn limits(&self) -> &wgpu::Limits {
        &self.limits
    }

    /// Information about the selected adapter.
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    pub fn readback_timeout(&self) -> Option<Duration> {
        self.readback_timeout
    }

    /// Fails with a resource error when a single buffer would exceed the
    /// device limits.
    pub(crate) fn check_buffer_size(&self, label: &str, bytes: u64) -> Result<()> {
        let max = self
            .limits
            .max_buffer_size
            .min(u64::from(self.limits.max_storage_buffer_binding_size));
        if bytes > max {
            return Err(ComputeError::resource(format!(
                "{label}: {bytes} bytes exceed the device buffer limit of {max} bytes"
            )));
        }
        Ok(())
    }

    /// Runs `create` inside validation and out-of-memory error scopes.
    ///
    /// wgpu reports these failures asynchronously and panics on any that are
    /// not captured; here they become [`ComputeError::Resource`] naming `label`.
    /// The scopes are thread-local, so `create` must not hand work to other
    /// threads.
    pub(crate) async fn capture<T>(
        &self,
        label: &str,
        create: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let oom_scope = self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let validation_scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let created = create();

        // Innermost scope first.
        let validation = validation_scope.pop();
        let oom = oom_scope.pop();

        if let Some(err) = validation.await {
            return Err(ComputeError::resource(format!("{label}: {err}")));
        }
        if let Some(err) = oom.await {
            return Err(ComputeError::resource(format!("{label}: {err}")));
        }
        created
    }

    /// Fails with a resource error when a 1D dispatch needs more workgroups
    /// than the device allows.
    pub(crate) fn check_dispatch(&self, label: &str, workgroups: u32) -> Result<()> {
        let max = self.limits.max_compute_workgroups_per_dimension;
        if workgroups > max {
            return Err(ComputeError::resource(format!(
                "{label}: {workgroups} workgroups exceed the device limit of {max}"
            )));
        }
        Ok(())
    }
}
