use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

use crate::adapter::{FrameReport, Lifecycle, ReadyLatch, RenderAdapter, SurfaceSize};
use crate::programs::{ProgramState, ShaderProgram};

use super::context::{AdapterProfile, GpuContext, GpuOptions};
use super::export;
use super::pipeline::ShaderPipeline;
use super::uniforms::SiteUniforms;

struct GpuResources {
    context: GpuContext,
    pipeline: ShaderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
}

/// A shader background rendered offscreen with wgpu.
pub struct ShaderSurface {
    state: ProgramState,
    uniforms: SiteUniforms,
    latch: ReadyLatch,
    lifecycle: Lifecycle,
    frames: u64,
    profile: AdapterProfile,
    gpu: Option<GpuResources>,
}

impl ShaderSurface {
    /// Acquires a device and compiles `program`. Fails when no adapter is
    /// available or the program does not validate.
    pub fn mount(program: ShaderProgram, size: SurfaceSize, options: GpuOptions) -> Result<Self> {
        let context = GpuContext::new(size, options)?;
        let device = &context.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = ShaderPipeline::new(device, program);
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            anyhow::bail!("failed to build {program} pipeline: {error}");
        }

        let state = ProgramState::new(program);
        let uniforms = SiteUniforms::new(size.width, size.height, state.params());
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("site params"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("site params bind group"),
            layout: &pipeline.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let profile = context.profile.clone();
        info!(%program, %size, adapter = %profile.name, "mounted shader surface");
        Ok(Self {
            state,
            uniforms,
            latch: ReadyLatch::new(),
            lifecycle: Lifecycle::Mounted,
            frames: 0,
            profile,
            gpu: Some(GpuResources {
                context,
                pipeline,
                uniform_buffer,
                uniform_bind_group,
            }),
        })
    }

    pub fn adapter_profile(&self) -> &AdapterProfile {
        &self.profile
    }

    pub fn size(&self) -> Option<SurfaceSize> {
        self.gpu.as_ref().map(|gpu| gpu.context.target.size)
    }

    /// Writes the most recent frame as a PNG.
    pub fn export_png(&self, path: &Path) -> Result<()> {
        let gpu = self
            .gpu
            .as_ref()
            .context("shader surface has been disposed")?;
        if self.frames == 0 {
            anyhow::bail!("no frame has been rendered yet");
        }
        let pixels = export::read_target(&gpu.context)?;
        export::save_png(path, gpu.context.target.size, pixels)?;
        info!(path = %path.display(), frame = self.frames, "exported frame");
        Ok(())
    }

    fn render(&mut self) -> Result<FrameReport> {
        let gpu = self
            .gpu
            .as_ref()
            .context("shader surface has been disposed")?;
        let params = self.state.advance_frame();
        self.uniforms.apply(params);
        let target = &gpu.context.target;
        self.uniforms
            .set_resolution(target.size.width, target.size.height);
        gpu.context
            .queue
            .write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        let device = &gpu.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("site frame encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("site frame"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&gpu.pipeline.pipeline);
            pass.set_bind_group(0, &gpu.uniform_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        gpu.context.queue.submit(Some(encoder.finish()));
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            anyhow::bail!("frame rejected by GPU validation: {error}");
        }

        self.frames += 1;
        let first = self.latch.fire();
        if first {
            info!(program = %self.state.program(), "first frame rendered");
        }
        Ok(FrameReport {
            frame: self.frames,
            first,
            params,
        })
    }
}

impl RenderAdapter for ShaderSurface {
    fn program(&self) -> ShaderProgram {
        self.state.program()
    }

    fn on_ready(&mut self, callback: Box<dyn FnOnce() + Send>) {
        if self.lifecycle != Lifecycle::Disposed {
            self.latch.subscribe(callback);
        }
    }

    fn start(&mut self) {
        if self.lifecycle.start() {
            debug!(program = %self.state.program(), "shader surface started");
        }
    }

    fn resize(&mut self, size: SurfaceSize) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if let Err(err) = gpu.context.resize(size) {
            warn!(error = %err, %size, "ignoring shader surface resize");
        }
    }

    fn pointer_moved(&mut self, x: f32, y: f32) {
        if self.lifecycle == Lifecycle::Running {
            self.state.pointer_moved(x, y);
        }
    }

    fn frame(&mut self, _now: Instant) -> Result<Option<FrameReport>> {
        if self.lifecycle != Lifecycle::Running {
            return Ok(None);
        }
        self.render().map(Some)
    }

    fn dispose(&mut self) {
        if !self.lifecycle.dispose() {
            return;
        }
        self.latch.clear();
        if let Some(gpu) = self.gpu.take() {
            gpu.uniform_buffer.destroy();
            gpu.context.target.texture.destroy();
        }
        debug!(program = %self.state.program(), frames = self.frames, "disposed shader surface");
    }

    fn is_ready(&self) -> bool {
        self.latch.is_fired()
    }

    fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }
}

impl Drop for ShaderSurface {
    fn drop(&mut self) {
        self.dispose();
    }
}
