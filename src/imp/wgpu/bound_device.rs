// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use super::Error;
use super::pixel_format::{capabilities, wgpu_format};
use crate::device::{AllocationId, Capabilities, Device, DeviceAllocation, DeviceError};
use crate::textures::TextureDescriptor;
use std::sync::atomic::{AtomicU64, Ordering};
use wgpu::{Limits, Trace};

/// A texture allocated on a wgpu device.
#[derive(Debug)]
pub struct WgpuAllocation {
    id: AllocationId,
    byte_len: u64,
    texture: wgpu::Texture,
}

impl DeviceAllocation for WgpuAllocation {
    fn id(&self) -> AllocationId {
        self.id
    }
    fn byte_len(&self) -> u64 {
        self.byte_len
    }
}

/// [`Device`] backed by a `wgpu::Device`.
#[derive(Debug)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    capabilities: Capabilities,
    next_id: AtomicU64,
}

impl WgpuDevice {
    /// Wrap a device the application already created.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let capabilities = capabilities(&device);
        Self {
            device,
            queue,
            capabilities,
            next_id: AtomicU64::new(1),
        }
    }

    /// Pick a default adapter and create a headless device on it.
    pub async fn request() -> Result<Self, Error> {
        let descriptor = wgpu::InstanceDescriptor::from_env_or_default();
        let instance = wgpu::Instance::new(&descriptor);
        let options = wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: None,
        };
        let adapter = instance.request_adapter(&options).await?;
        logwise::info_sync!(
            "texture device adapter {info}",
            info = logwise::privacy::LogIt(&adapter.get_info())
        );
        let optional = wgpu::Features::TEXTURE_COMPRESSION_BC
            | wgpu::Features::TEXTURE_FORMAT_16BIT_NORM;
        let descriptor = wgpu::DeviceDescriptor {
            label: wgpu::Label::from("texture_arena device"),
            required_features: adapter.features() & optional,
            required_limits: Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: Trace::Off,
        };
        let (device, queue) = adapter.request_device(&descriptor).await?;
        Ok(Self::new(device, queue))
    }

    pub fn wgpu_device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn wgpu_queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

impl Device for WgpuDevice {
    type Allocation = WgpuAllocation;

    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn allocate(
        &self,
        descriptor: &TextureDescriptor,
        byte_len: u64,
    ) -> Result<WgpuAllocation, DeviceError> {
        let id = AllocationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let label = format!("texture {}", id.0);
        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        if !descriptor.format.is_color() {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: wgpu::Extent3d {
                width: descriptor.width,
                height: descriptor.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: descriptor.mip_level_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format(descriptor.format, descriptor.gamma_correction),
            usage,
            view_formats: &[],
        });
        let out_of_memory = test_executors::sleep_on(self.device.pop_error_scope());
        let validation = test_executors::sleep_on(self.device.pop_error_scope());

        if out_of_memory.is_some() {
            texture.destroy();
            return Err(DeviceError::OutOfMemory {
                requested: byte_len,
            });
        }
        if let Some(err) = validation {
            texture.destroy();
            return Err(DeviceError::Rejected(err.to_string()));
        }
        Ok(WgpuAllocation {
            id,
            byte_len,
            texture,
        })
    }

    fn free(&self, allocation: WgpuAllocation) {
        allocation.texture.destroy();
    }
}
