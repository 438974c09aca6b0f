//! Compute device management.
//!
//! This module is responsible for:
//! - acquiring the wgpu Adapter/Device/Queue
//! - allocating storage, uniform and staging buffers within device limits
//! - building compute pipelines from specialized WGSL templates
//! - the single awaited read-back at the end of a call

pub(crate) mod buffers;
mod context;
mod init;
pub(crate) mod kernel;

pub use context::ComputeContext;
pub use init::ComputeInit;
