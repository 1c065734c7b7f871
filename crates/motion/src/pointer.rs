use std::collections::BTreeSet;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::keyframes::Keyframes;
use crate::listeners::{EventKind, ListenerId, ListenerRegistry};
use crate::scroll::Viewport;
use crate::spring::{Spring, SpringParams};
use crate::MotionError;

/// A pointer position in both coordinate spaces consumers use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointerSample {
    /// Percentage of the viewport, each axis in `[0, 100]`.
    pub percent: (f64, f64),
    /// Offset from the viewport centre, each axis in `[-0.5, 0.5]`.
    pub centered: (f64, f64),
}

impl PointerSample {
    pub const CENTER: PointerSample = PointerSample {
        percent: (50.0, 50.0),
        centered: (0.0, 0.0),
    };

    pub fn from_client(x: f64, y: f64, viewport: Viewport) -> Self {
        let fx = normalise(x, viewport.width);
        let fy = normalise(y, viewport.height);
        Self {
            percent: (fx * 100.0, fy * 100.0),
            centered: (fx - 0.5, fy - 0.5),
        }
    }
}

fn normalise(value: f64, extent: f64) -> f64 {
    if extent <= 0.0 || !value.is_finite() {
        return 0.5;
    }
    (value / extent).clamp(0.0, 1.0)
}

/// Identifies one consumer of pointer samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(pub &'static str);

/// Process-wide pointer position.
///
/// Only listens to pointer moves while at least one consumer holds interest.
/// The last sample is kept after the listener goes away, so consumers that
/// read it during a fade-out see a frozen position.
#[derive(Debug)]
pub struct PointerTracker {
    viewport: Viewport,
    latest: PointerSample,
    consumers: BTreeSet<ConsumerId>,
    listener: Option<ListenerId>,
}

impl PointerTracker {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            latest: PointerSample::CENTER,
            consumers: BTreeSet::new(),
            listener: None,
        }
    }

    pub fn sample(&self) -> PointerSample {
        self.latest
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    pub fn holds(&self, consumer: ConsumerId) -> bool {
        self.consumers.contains(&consumer)
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Registers interest. Returns `false` if the consumer already held it.
    pub fn acquire(&mut self, consumer: ConsumerId, registry: &mut ListenerRegistry) -> bool {
        if !self.consumers.insert(consumer) {
            return false;
        }
        if self.listener.is_none() {
            self.listener = Some(registry.attach(EventKind::PointerMove, "pointer-tracker"));
            debug!(consumer = consumer.0, "pointer tracking started");
        }
        true
    }

    /// Drops interest. Returns `false` if the consumer held none.
    pub fn release(&mut self, consumer: ConsumerId, registry: &mut ListenerRegistry) -> bool {
        if !self.consumers.remove(&consumer) {
            return false;
        }
        if self.consumers.is_empty() {
            if let Some(id) = self.listener.take() {
                registry.detach(id);
                debug!(consumer = consumer.0, "pointer tracking stopped");
            }
        }
        true
    }

    /// Applies a raw client-space move. Ignored while nobody is listening.
    pub fn on_pointer_move(&mut self, x: f64, y: f64) -> bool {
        if self.listener.is_none() {
            return false;
        }
        self.latest = PointerSample::from_client(x, y, self.viewport);
        true
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Releases every consumer and the listener. Idempotent.
    pub fn dispose(&mut self, registry: &mut ListenerRegistry) {
        self.consumers.clear();
        if let Some(id) = self.listener.take() {
            registry.detach(id);
        }
    }
}

/// Rotation in degrees for a 3D tilt.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Tilt {
    pub rotate_x: f32,
    pub rotate_y: f32,
}

/// Smoothed pointer-to-rotation mapping.
///
/// Vertical pointer offset tilts around X with the sign flipped, so the top
/// edge leans toward the viewer; horizontal offset tilts around Y.
#[derive(Debug, Clone)]
pub struct Parallax {
    x: Spring,
    y: Spring,
    rotate_x: Keyframes,
    rotate_y: Keyframes,
}

impl Parallax {
    pub fn new(max_degrees: f32, spring: SpringParams) -> Result<Self, MotionError> {
        Ok(Self {
            x: Spring::new(spring, 0.0),
            y: Spring::new(spring, 0.0),
            rotate_x: Keyframes::linear((-0.5, max_degrees), (0.5, -max_degrees))?,
            rotate_y: Keyframes::linear((-0.5, -max_degrees), (0.5, max_degrees))?,
        })
    }

    pub fn set_pointer(&mut self, sample: PointerSample) {
        self.x.set_target(sample.centered.0 as f32);
        self.y.set_target(sample.centered.1 as f32);
    }

    pub fn advance(&mut self, now: Instant) -> Tilt {
        let x = self.x.advance(now);
        let y = self.y.advance(now);
        Tilt {
            rotate_x: self.rotate_x.sample(y),
            rotate_y: self.rotate_y.sample(x),
        }
    }

    pub fn tilt(&self) -> Tilt {
        Tilt {
            rotate_x: self.rotate_x.sample(self.y.position()),
            rotate_y: self.rotate_y.sample(self.x.position()),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.x.is_settled() && self.y.is_settled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const GLOW: ConsumerId = ConsumerId("glow");
    const HERO: ConsumerId = ConsumerId("hero");

    fn viewport() -> Viewport {
        Viewport::new(1000.0, 500.0)
    }

    #[test]
    fn normalises_into_both_spaces() {
        let sample = PointerSample::from_client(800.0, 100.0, viewport());
        assert!((sample.percent.0 - 80.0).abs() < 1e-9);
        assert!((sample.percent.1 - 20.0).abs() < 1e-9);
        assert!((sample.centered.0 - 0.3).abs() < 1e-9);
        assert!((sample.centered.1 + 0.3).abs() < 1e-9);

        let outside = PointerSample::from_client(-50.0, 900.0, viewport());
        assert_eq!(outside.percent, (0.0, 100.0));
        let degenerate = PointerSample::from_client(10.0, 10.0, Viewport::new(0.0, 0.0));
        assert_eq!(degenerate, PointerSample::CENTER);
    }

    #[test]
    fn listens_only_while_interest_is_held() {
        let mut registry = ListenerRegistry::new();
        let mut tracker = PointerTracker::new(viewport());
        assert!(!tracker.on_pointer_move(100.0, 100.0));
        assert_eq!(tracker.sample(), PointerSample::CENTER);

        assert!(tracker.acquire(GLOW, &mut registry));
        assert!(!tracker.acquire(GLOW, &mut registry));
        assert!(tracker.acquire(HERO, &mut registry));
        assert_eq!(registry.count(EventKind::PointerMove), 1);

        assert!(tracker.on_pointer_move(250.0, 125.0));
        assert!(tracker.release(GLOW, &mut registry));
        assert!(tracker.is_listening());
        assert!(tracker.release(HERO, &mut registry));
        assert!(!tracker.release(HERO, &mut registry));
        assert!(!tracker.is_listening());
        assert_eq!(registry.total(), 0);

        assert!(!tracker.on_pointer_move(900.0, 400.0));
        assert!((tracker.sample().percent.0 - 25.0).abs() < 1e-9);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut registry = ListenerRegistry::new();
        let mut tracker = PointerTracker::new(viewport());
        tracker.acquire(GLOW, &mut registry);
        tracker.dispose(&mut registry);
        tracker.dispose(&mut registry);
        assert_eq!(registry.total(), 0);
        assert_eq!(tracker.consumer_count(), 0);
    }

    #[test]
    fn parallax_maps_edges_to_max_rotation() {
        let params = SpringParams::new(100.0, 20.0).unwrap();
        let mut parallax = Parallax::new(15.0, params).unwrap();
        let start = Instant::now();
        parallax.advance(start);
        parallax.set_pointer(PointerSample::from_client(1000.0, 0.0, viewport()));
        let tilt = parallax.advance(start + Duration::from_secs(3));
        assert!((tilt.rotate_x - 15.0).abs() < 0.05);
        assert!((tilt.rotate_y - 15.0).abs() < 0.05);

        parallax.set_pointer(PointerSample::from_client(0.0, 500.0, viewport()));
        let tilt = parallax.advance(start + Duration::from_secs(6));
        assert!((tilt.rotate_x + 15.0).abs() < 0.05);
        assert!((tilt.rotate_y + 15.0).abs() < 0.05);
        assert!(parallax.is_settled());
    }

    #[test]
    fn parallax_lags_behind_pointer() {
        let params = SpringParams::new(40.0, 20.0).unwrap();
        let mut parallax = Parallax::new(10.0, params).unwrap();
        let start = Instant::now();
        parallax.advance(start);
        parallax.set_pointer(PointerSample::from_client(1000.0, 250.0, viewport()));
        let early = parallax.advance(start + Duration::from_millis(50));
        assert!(early.rotate_y > 0.0 && early.rotate_y < 10.0);
        assert_eq!(parallax.tilt(), early);
    }
}
