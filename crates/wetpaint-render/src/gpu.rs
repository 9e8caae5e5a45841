//! Adapter and device selection shared by the window and offscreen targets

use crate::error::RenderError;

/// Downlevel limits with the adapter's texture sizes
pub(crate) fn device_descriptor(label: &str, adapter_limits: wgpu::Limits) -> wgpu::DeviceDescriptor<'_> {
    wgpu::DeviceDescriptor {
        label: Some(label),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter_limits),
        memory_hints: wgpu::MemoryHints::Performance,
    }
}

pub(crate) fn instance() -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Pick an adapter (able to present to `surface` when given) and open a device
pub(crate) async fn open_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
    label: &str,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), RenderError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(RenderError::AdapterNotFound)?;

    let info = adapter.get_info();
    log::info!("{}: {} ({:?})", label, info.name, info.backend);

    let (device, queue) = adapter
        .request_device(&device_descriptor(label, adapter.limits()), None)
        .await
        .map_err(|e| RenderError::DeviceCreation(e.to_string()))?;
    Ok((adapter, device, queue))
}
