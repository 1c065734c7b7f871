//! Shader backgrounds for the site.
//!
//! The page talks to a background only through [`RenderAdapter`]:
//!
//! ```text
//!   Page ── mount ──▶ ShaderSurface (wgpu, offscreen) ─┐
//!     │                SimulatedSurface (no GPU)  ─────┤
//!     │                                                 ▼
//!     └── on_ready ◀── ReadyLatch ◀── first successful frame()
//! ```
//!
//! Both programs are plain GLSL bodies wrapped with a shared prelude that
//! declares the `SiteParams` uniform block, then compiled through naga.
//! Their per-frame parameter dynamics live in [`ProgramState`], so they behave
//! identically with or without a GPU.

mod adapter;
mod compile;
mod gpu;
mod programs;
mod simulated;

pub use adapter::{FrameReport, ReadyLatch, RenderAdapter, SurfaceSize};
pub use gpu::{AdapterProfile, GpuOptions, ShaderSurface};
pub use programs::{ProgramParams, ProgramState, ShaderProgram};
pub use simulated::SimulatedSurface;

use anyhow::Result;
use tracing::warn;

/// Mounts a GPU surface, or the simulated one when no GPU is usable.
///
/// The returned flag is `true` when the GPU surface was used.
pub fn mount_best_effort(
    program: ShaderProgram,
    size: SurfaceSize,
    options: GpuOptions,
) -> (Box<dyn RenderAdapter>, bool) {
    match try_mount(program, size, options) {
        Ok(surface) => (surface, true),
        Err(err) => {
            warn!(error = %err, %program, "GPU unavailable; using simulated surface");
            (Box::new(SimulatedSurface::mount(program, size)), false)
        }
    }
}

fn try_mount(
    program: ShaderProgram,
    size: SurfaceSize,
    options: GpuOptions,
) -> Result<Box<dyn RenderAdapter>> {
    Ok(Box::new(ShaderSurface::mount(program, size, options)?))
}
