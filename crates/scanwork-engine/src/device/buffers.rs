//! Buffer allocation and read-back helpers.
//!
//! All sizes are checked against the device limits first so an oversized
//! request becomes a [`ComputeError::Resource`] instead of a validation panic.

use std::sync::mpsc;
use std::time::Duration;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use super::ComputeContext;
use crate::error::{ComputeError, Result};

fn byte_len<T>(len: usize) -> u64 {
    (len * std::mem::size_of::<T>()) as u64
}

/// Creates a storage buffer initialized with `data`.
pub(crate) fn upload_storage<T: Pod>(
    ctx: &ComputeContext,
    label: &str,
    data: &[T],
    extra_usage: wgpu::BufferUsages,
) -> Result<wgpu::Buffer> {
    ctx.check_buffer_size(label, byte_len::<T>(data.len()))?;

    Ok(ctx
        .device()
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::STORAGE | extra_usage,
        }))
}

/// Creates a zero-initialized storage buffer holding `len` elements of `T`.
pub(crate) fn zeroed_storage<T: Pod>(
    ctx: &ComputeContext,
    label: &str,
    len: usize,
    extra_usage: wgpu::BufferUsages,
) -> Result<wgpu::Buffer> {
    let size = byte_len::<T>(len.max(1));
    ctx.check_buffer_size(label, size)?;

    // wgpu zero-fills new buffers.
    Ok(ctx.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::STORAGE | extra_usage,
        mapped_at_creation: false,
    }))
}

/// Creates a uniform buffer holding `value`.
pub(crate) fn uniform<T: Pod>(ctx: &ComputeContext, label: &str, value: &T) -> wgpu::Buffer {
    ctx.device()
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(value),
            usage: wgpu::BufferUsages::UNIFORM,
        })
}

/// Creates a mappable buffer that device results are copied into.
pub(crate) fn staging<T: Pod>(
    ctx: &ComputeContext,
    label: &str,
    len: usize,
) -> Result<wgpu::Buffer> {
    let size = byte_len::<T>(len.max(1));
    ctx.check_buffer_size(label, size)?;

    Ok(ctx.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    }))
}

/// Records a copy of the first `len` elements of `src` into `dst`.
pub(crate) fn copy_elements<T: Pod>(
    encoder: &mut wgpu::CommandEncoder,
    src: &wgpu::Buffer,
    dst: &wgpu::Buffer,
    len: usize,
) {
    encoder.copy_buffer_to_buffer(src, 0, dst, 0, byte_len::<T>(len));
}

/// Waits for all submitted work, maps `staging` and copies `len` elements out.
///
/// This is the only host-side wait of a call, bounded by the context's
/// read-back timeout. The wait itself blocks the calling thread inside
/// `Device::poll`; the returned future completes without yielding.
pub(crate) async fn read_back<T: Pod>(
    ctx: &ComputeContext,
    staging: &wgpu::Buffer,
    len: usize,
) -> Result<Vec<T>> {
    if len == 0 {
        return Ok(Vec::new());
    }

    let slice = staging.slice(..byte_len::<T>(len));
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        // The receiver outlives the poll below; a failed send only means the
        // caller already bailed out.
        let _ = sender.send(res);
    });

    let timeout = ctx.readback_timeout();
    check_poll(
        ctx.device().poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout,
        }),
        timeout,
    )?;
    check_mapped(receiver.recv())?;

    let data = slice.get_mapped_range();
    let out = bytemuck::cast_slice::<u8, T>(&data).to_vec();
    drop(data);
    staging.unmap();

    Ok(out)
}

/// Maps the outcome of the blocking device poll.
fn check_poll(
    polled: std::result::Result<wgpu::PollStatus, wgpu::PollError>,
    timeout: Option<Duration>,
) -> Result<()> {
    match polled {
        Ok(status) => {
            log::trace!("read-back poll finished: {status:?}");
            Ok(())
        }
        Err(wgpu::PollError::Timeout) => Err(ComputeError::Timeout(timeout.unwrap_or_default())),
        Err(err) => Err(ComputeError::resource(format!("device poll failed: {err}"))),
    }
}

/// Maps the result delivered by the `map_async` callback.
fn check_mapped(
    received: std::result::Result<std::result::Result<(), wgpu::BufferAsyncError>, mpsc::RecvError>,
) -> Result<()> {
    match received {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(ComputeError::resource(format!(
            "failed to map read-back buffer: {err}"
        ))),
        Err(mpsc::RecvError) => Err(ComputeError::resource("buffer map callback was dropped")),
    }
}
