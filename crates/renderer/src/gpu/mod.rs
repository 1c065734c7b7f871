//! Headless wgpu backing for [`crate::RenderAdapter`].
//!
//! - `context` picks an adapter, creates the device and the offscreen target.
//! - `pipeline` compiles a program's GLSL into a render pipeline.
//! - `uniforms` mirrors the `SiteParams` block written each frame.
//! - `export` copies the target back to the CPU and encodes PNGs.
//! - `state` ties them together as [`ShaderSurface`].

mod context;
mod export;
mod pipeline;
mod state;
mod uniforms;

pub use context::{AdapterProfile, GpuOptions};
pub use state::ShaderSurface;
