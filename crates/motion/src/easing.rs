use std::time::{Duration, Instant};

use crate::MotionError;

/// Cubic bezier timing function with fixed endpoints at (0,0) and (1,1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl CubicBezier {
    /// The CSS `ease-in-out` keyword.
    pub const EASE_IN_OUT: CubicBezier = CubicBezier {
        x1: 0.42,
        y1: 0.0,
        x2: 0.58,
        y2: 1.0,
    };

    /// Fast start with a long settle, used for the intro burst overlay.
    pub const EXPO_OUT: CubicBezier = CubicBezier {
        x1: 0.16,
        y1: 1.0,
        x2: 0.3,
        y2: 1.0,
    };

    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self, MotionError> {
        let finite = [x1, y1, x2, y2].iter().all(|value| value.is_finite());
        if !finite || !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
            return Err(MotionError::InvalidBezier { x1, x2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    fn component(t: f32, p1: f32, p2: f32) -> f32 {
        let inv = 1.0 - t;
        3.0 * inv * inv * t * p1 + 3.0 * inv * t * t * p2 + t * t * t
    }

    fn slope(t: f32, p1: f32, p2: f32) -> f32 {
        let inv = 1.0 - t;
        3.0 * inv * inv * p1 + 6.0 * inv * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
    }

    /// Curve parameter whose x coordinate equals `x`.
    fn solve_t(&self, x: f32) -> f32 {
        let mut t = x;
        for _ in 0..8 {
            let error = Self::component(t, self.x1, self.x2) - x;
            if error.abs() < 1e-6 {
                return t;
            }
            let slope = Self::slope(t, self.x1, self.x2);
            if slope.abs() < 1e-6 {
                break;
            }
            t -= error / slope;
        }

        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        t = x;
        for _ in 0..32 {
            let value = Self::component(t, self.x1, self.x2);
            if (value - x).abs() < 1e-6 {
                break;
            }
            if value < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) * 0.5;
        }
        t
    }

    pub fn sample(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        if x <= 0.0 || x >= 1.0 {
            return x;
        }
        Self::component(self.solve_t(x), self.y1, self.y2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    Smoothstep,
    /// Quadratic ease in, ease out.
    EaseInOut,
    Bezier(CubicBezier),
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        let clamped = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => clamped,
            Easing::Smoothstep => clamped * clamped * (3.0 - 2.0 * clamped),
            Easing::EaseInOut => {
                if clamped < 0.5 {
                    2.0 * clamped * clamped
                } else {
                    -1.0 + (4.0 - 2.0 * clamped) * clamped
                }
            }
            Easing::Bezier(curve) => curve.sample(clamped),
        }
    }
}

fn progress(start: Instant, duration: Duration, now: Instant) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(start);
    (elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
}

/// Eased scalar transition that can be retargeted mid-flight.
#[derive(Debug, Clone)]
pub struct Tween {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    /// A tween resting at `value`.
    pub fn settled(value: f32, duration: Duration, easing: Easing, now: Instant) -> Self {
        Self {
            from: value,
            to: value,
            start: now,
            duration,
            easing,
        }
    }

    pub fn value(&self, now: Instant) -> f32 {
        let mix = self.easing.sample(progress(self.start, self.duration, now));
        self.from + (self.to - self.from) * mix
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        progress(self.start, self.duration, now) >= 1.0
    }

    /// Restarts toward `to` from wherever the tween currently is.
    pub fn retarget(&mut self, to: f32, now: Instant) {
        if (to - self.to).abs() <= f32::EPSILON {
            return;
        }
        self.from = self.value(now);
        self.to = to;
        self.start = now;
    }
}

/// Mix weights for fading from a previous value to the current one.
#[derive(Debug, Clone)]
pub struct FadeEnvelope {
    start: Instant,
    duration: Duration,
    easing: Easing,
}

impl FadeEnvelope {
    pub fn new(duration: Duration, easing: Easing, now: Instant) -> Option<Self> {
        if duration.is_zero() {
            None
        } else {
            Some(Self {
                start: now,
                duration,
                easing,
            })
        }
    }

    /// `(previous, current, finished)` weights.
    pub fn mixes(&self, now: Instant) -> (f32, f32, bool) {
        let progress = progress(self.start, self.duration, now);
        let mix = self.easing.sample(progress);
        (1.0 - mix, mix, progress >= 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_curve_increases_monotonically() {
        let curve = Easing::Linear;
        let mut last = 0.0;
        for step in 0..=10 {
            let sample = curve.sample(step as f32 / 10.0);
            assert!(sample >= last - f32::EPSILON);
            last = sample;
        }
    }

    #[test]
    fn smoothstep_matches_expected_values() {
        let curve = Easing::Smoothstep;
        assert!((curve.sample(0.0) - 0.0).abs() < 1e-6);
        assert!((curve.sample(0.5) - 0.5).abs() < 1e-6);
        assert!((curve.sample(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn css_ease_in_out_is_symmetric() {
        let curve = CubicBezier::EASE_IN_OUT;
        assert!((curve.sample(0.5) - 0.5).abs() < 1e-4);
        let early = curve.sample(0.25);
        let late = curve.sample(0.75);
        assert!(early < 0.25);
        assert!((early + late - 1.0).abs() < 1e-4);
    }

    #[test]
    fn expo_out_front_loads_progress() {
        let curve = Easing::Bezier(CubicBezier::EXPO_OUT);
        assert!(curve.sample(0.2) > 0.6);
        assert!((curve.sample(1.0) - 1.0).abs() < 1e-6);
        assert_eq!(curve.sample(-1.0), 0.0);
    }

    #[test]
    fn rejects_out_of_range_control_points() {
        assert!(CubicBezier::new(1.5, 0.0, 0.5, 1.0).is_err());
        assert!(CubicBezier::new(0.2, -3.0, 0.5, 4.0).is_ok());
    }

    #[test]
    fn tween_retargets_from_current_value() {
        let start = Instant::now();
        let mut tween = Tween::settled(0.0, Duration::from_secs(1), Easing::Linear, start);
        tween.retarget(1.0, start);
        let half = start + Duration::from_millis(500);
        assert!((tween.value(half) - 0.5).abs() < 1e-3);
        tween.retarget(0.0, half);
        assert!((tween.value(half) - 0.5).abs() < 1e-3);
        assert!((tween.value(half + Duration::from_millis(500)) - 0.25).abs() < 1e-3);
        assert!(tween.is_finished(half + Duration::from_secs(1)));
        assert_eq!(tween.value(half + Duration::from_secs(2)), 0.0);
    }

    #[test]
    fn fade_envelope_reports_mix_progress() {
        let start = Instant::now();
        let envelope =
            FadeEnvelope::new(Duration::from_millis(100), Easing::Linear, start).expect("envelope");
        let (_previous, current, finished) = envelope.mixes(start + Duration::from_millis(50));
        assert!((current - 0.5).abs() < 0.05);
        assert!(!finished);
        assert!(FadeEnvelope::new(Duration::ZERO, Easing::Linear, start).is_none());
    }
}
