use std::time::Duration;

/// Initialization parameters for the compute context.
///
/// Keep this structure small. Add flags only when a concrete backend or
/// platform requirement exists.
#[derive(Debug, Clone)]
pub struct ComputeInit {
    /// Backends wgpu may pick an adapter from.
    pub backends: wgpu::Backends,

    /// Adapter preference. Discrete GPUs are preferred for throughput.
    pub power_preference: wgpu::PowerPreference,

    /// Force a software adapter (useful on CI machines without a GPU).
    pub force_fallback_adapter: bool,

    /// Required wgpu features.
    ///
    /// The kernels only need core WebGPU compute; leave empty for portability.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    ///
    /// The scatter kernel binds five storage buffers, so downlevel limits
    /// (four per stage) are not enough.
    pub required_limits: wgpu::Limits,

    /// Upper bound on the final read-back wait. `None` waits indefinitely.
    pub readback_timeout: Option<Duration>,
}

impl Default for ComputeInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            readback_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ComputeInit {
    /// Reads overrides from the environment.
    ///
    /// `WGPU_BACKEND` selects backends (e.g. "vulkan", "metal,gl") and
    /// `SCANWORK_FALLBACK_ADAPTER=1` forces a software adapter.
    pub fn from_env() -> Self {
        let mut init = Self::default();
        init.backends = wgpu::Backends::from_env().unwrap_or(init.backends);
        init.force_fallback_adapter = std::env::var("SCANWORK_FALLBACK_ADAPTER")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        init
    }
}
