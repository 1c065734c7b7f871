use std::time::Instant;

use anyhow::Result;
use tracing::debug;

use crate::adapter::{FrameReport, Lifecycle, ReadyLatch, RenderAdapter, SurfaceSize};
use crate::programs::{ProgramState, ShaderProgram};

/// Adapter that runs the program dynamics without a GPU.
///
/// Used when no GPU adapter can be created or the GPU is disabled.
/// `fail_frames` makes the first N frames error, which models a surface that
/// is slow to come up or never does.
#[derive(Debug)]
pub struct SimulatedSurface {
    state: ProgramState,
    size: SurfaceSize,
    latch: ReadyLatch,
    lifecycle: Lifecycle,
    frames: u64,
    fail_frames: u32,
}

impl SimulatedSurface {
    pub fn mount(program: ShaderProgram, size: SurfaceSize) -> Self {
        debug!(%program, %size, "mounted simulated surface");
        Self {
            state: ProgramState::new(program),
            size,
            latch: ReadyLatch::new(),
            lifecycle: Lifecycle::Mounted,
            frames: 0,
            fail_frames: 0,
        }
    }

    pub fn with_failing_frames(mut self, count: u32) -> Self {
        self.fail_frames = count;
        self
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle == Lifecycle::Disposed
    }
}

impl RenderAdapter for SimulatedSurface {
    fn program(&self) -> ShaderProgram {
        self.state.program()
    }

    fn on_ready(&mut self, callback: Box<dyn FnOnce() + Send>) {
        if self.lifecycle != Lifecycle::Disposed {
            self.latch.subscribe(callback);
        }
    }

    fn start(&mut self) {
        self.lifecycle.start();
    }

    fn resize(&mut self, size: SurfaceSize) {
        if self.lifecycle == Lifecycle::Disposed || size.is_empty() {
            return;
        }
        self.size = size;
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
        if self.fail_frames > 0 {
            self.fail_frames -= 1;
            anyhow::bail!("simulated surface not ready");
        }
        let params = self.state.advance_frame();
        self.frames += 1;
        let first = self.latch.fire();
        Ok(Some(FrameReport {
            frame: self.frames,
            first,
            params,
        }))
    }

    fn dispose(&mut self) {
        if self.lifecycle.dispose() {
            self.latch.clear();
            debug!(program = %self.state.program(), frames = self.frames, "disposed simulated surface");
        }
    }

    fn is_ready(&self) -> bool {
        self.latch.is_fired()
    }

    fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }
}
