use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};

use crate::programs::{ProgramParams, ShaderProgram};

/// Pixel size of the host container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for SurfaceSize {
    type Err = anyhow::Error;

    /// Parses `WIDTHxHEIGHT`, e.g. `1920x1080`.
    fn from_str(value: &str) -> Result<Self> {
        let (width, height) = value
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got '{value}'"))?;
        let width: u32 = width
            .trim()
            .parse()
            .with_context(|| format!("invalid width in '{value}'"))?;
        let height: u32 = height
            .trim()
            .parse()
            .with_context(|| format!("invalid height in '{value}'"))?;
        let size = Self::new(width, height);
        if size.is_empty() {
            anyhow::bail!("surface size must be non-zero, got '{value}'");
        }
        Ok(size)
    }
}

/// What a successful frame produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Frames rendered so far, including this one.
    pub frame: u64,
    /// True only for the frame that fired the ready latch.
    pub first: bool,
    pub params: ProgramParams,
}

type ReadyCallback = Box<dyn FnOnce() + Send>;

/// One-shot readiness signal.
///
/// Callbacks subscribed before [`ReadyLatch::fire`] run on the first fire;
/// callbacks subscribed afterwards run immediately. Further fires do nothing.
#[derive(Default)]
pub struct ReadyLatch {
    fired: bool,
    pending: Vec<ReadyCallback>,
}

impl ReadyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }

    pub fn subscribe(&mut self, callback: ReadyCallback) {
        if self.fired {
            callback();
        } else {
            self.pending.push(callback);
        }
    }

    /// Returns `true` only on the call that actually fired the latch.
    pub fn fire(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        for callback in self.pending.drain(..) {
            callback();
        }
        true
    }

    /// Drops callbacks that never ran. The fired state is kept.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl fmt::Debug for ReadyLatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyLatch")
            .field("fired", &self.fired)
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Where an adapter is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    Mounted,
    Running,
    Disposed,
}

impl Lifecycle {
    /// Moves to `Running` unless disposed. Returns whether it changed.
    pub fn start(&mut self) -> bool {
        if *self == Lifecycle::Mounted {
            *self = Lifecycle::Running;
            true
        } else {
            false
        }
    }

    /// Moves to `Disposed`. Returns `false` when already disposed.
    pub fn dispose(&mut self) -> bool {
        if *self == Lifecycle::Disposed {
            false
        } else {
            *self = Lifecycle::Disposed;
            true
        }
    }
}

/// Contract between the page and a shader background.
///
/// An adapter renders continuously once started and signals readiness on its
/// first successful frame, exactly once. Resizes and pointer moves never
/// re-trigger readiness. `dispose` is idempotent and turns every later call
/// into a no-op.
pub trait RenderAdapter {
    fn program(&self) -> ShaderProgram;

    fn on_ready(&mut self, callback: Box<dyn FnOnce() + Send>);

    fn start(&mut self);

    fn resize(&mut self, size: SurfaceSize);

    /// Pointer position as a fraction of the container, `(0,0)` top-left.
    fn pointer_moved(&mut self, x: f32, y: f32);

    /// Renders one frame. `Ok(None)` when the adapter is not running.
    fn frame(&mut self, now: Instant) -> Result<Option<FrameReport>>;

    fn dispose(&mut self);

    fn is_ready(&self) -> bool;

    fn is_running(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> ReadyCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        let make = move || {
            let handle = Arc::clone(&handle);
            Box::new(move || {
                handle.fetch_add(1, Ordering::SeqCst);
            }) as ReadyCallback
        };
        (count, make)
    }

    #[test]
    fn latch_fires_once() {
        let (count, make) = counter();
        let mut latch = ReadyLatch::new();
        latch.subscribe(make());
        latch.subscribe(make());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(latch.fire());
        assert!(!latch.fire());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn late_subscriber_runs_immediately() {
        let (count, make) = counter();
        let mut latch = ReadyLatch::new();
        latch.fire();
        latch.subscribe(make());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cleared_callbacks_never_run() {
        let (count, make) = counter();
        let mut latch = ReadyLatch::new();
        latch.subscribe(make());
        latch.clear();
        latch.fire();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(latch.is_fired());
    }

    #[test]
    fn lifecycle_is_one_way() {
        let mut lifecycle = Lifecycle::Mounted;
        assert!(lifecycle.start());
        assert!(!lifecycle.start());
        assert!(lifecycle.dispose());
        assert!(!lifecycle.dispose());
        assert!(!lifecycle.start());
    }

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(
            "1920x1080".parse::<SurfaceSize>().unwrap(),
            SurfaceSize::new(1920, 1080)
        );
        assert_eq!(" 64X32 ".parse::<SurfaceSize>().unwrap().to_string(), "64x32");
        assert!("0x10".parse::<SurfaceSize>().is_err());
        assert!("wide".parse::<SurfaceSize>().is_err());
    }
}
