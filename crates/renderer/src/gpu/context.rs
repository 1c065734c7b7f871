use anyhow::{Context as AnyhowContext, Result};

use crate::adapter::SurfaceSize;

/// Colour format of the offscreen target; matches the PNG export layout.
pub(crate) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Adapter selection knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpuOptions {
    pub high_performance: bool,
    pub force_fallback_adapter: bool,
}

/// Description of the selected adapter, for logs and `FrameReport` consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: String,
    pub software: bool,
}

impl AdapterProfile {
    fn from_wgpu(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: format!("{:?}", info.backend),
            software: info.device_type == wgpu::DeviceType::Cpu,
        }
    }
}

pub(crate) struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub target: OffscreenTarget,
    pub profile: AdapterProfile,
    max_dimension: u32,
}

/// The texture frames render into, plus its view.
pub(crate) struct OffscreenTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: SurfaceSize,
}

impl OffscreenTarget {
    fn new(device: &wgpu::Device, size: SurfaceSize) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("site background target"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size,
        }
    }
}

impl GpuContext {
    pub(crate) fn new(size: SurfaceSize, options: GpuOptions) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let power_preference = if options.high_performance {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: None,
            force_fallback_adapter: options.force_fallback_adapter,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let profile = AdapterProfile::from_wgpu(&adapter.get_info());
        tracing::debug!(
            name = %profile.name,
            backend = %profile.backend,
            software = profile.software,
            "selected GPU adapter"
        );

        let limits = adapter.limits();
        let max_dimension = limits.max_texture_dimension_2d;
        check_dimensions(size, max_dimension)?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("lumenfolio device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(limits),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let target = OffscreenTarget::new(&device, size);
        Ok(Self {
            device,
            queue,
            target,
            profile,
            max_dimension,
        })
    }

    /// Recreates the target at the new size. Zero-sized requests are ignored.
    pub(crate) fn resize(&mut self, size: SurfaceSize) -> Result<()> {
        if size.is_empty() || size == self.target.size {
            return Ok(());
        }
        check_dimensions(size, self.max_dimension)?;
        self.target = OffscreenTarget::new(&self.device, size);
        Ok(())
    }
}

fn check_dimensions(size: SurfaceSize, max_dimension: u32) -> Result<()> {
    if size.is_empty() {
        anyhow::bail!("surface size must be non-zero, got {size}");
    }
    if size.width > max_dimension || size.height > max_dimension {
        anyhow::bail!("GPU max texture dimension is {max_dimension}, requested surface is {size}");
    }
    Ok(())
}
