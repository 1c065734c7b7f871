use std::time::Instant;

use crate::MotionError;

const REST_DELTA: f32 = 0.001;
const REST_SPEED: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    pub stiffness: f32,
    pub damping: f32,
}

impl SpringParams {
    pub fn new(stiffness: f32, damping: f32) -> Result<Self, MotionError> {
        if !(stiffness.is_finite() && stiffness > 0.0) || !(damping.is_finite() && damping >= 0.0) {
            return Err(MotionError::InvalidSpring { stiffness, damping });
        }
        Ok(Self { stiffness, damping })
    }

    /// Damping ratio ζ for a unit mass.
    pub fn damping_ratio(&self) -> f32 {
        self.damping / (2.0 * self.stiffness.sqrt())
    }
}

/// Damped harmonic oscillator with unit mass, advanced with the closed-form
/// solution so large or irregular frame gaps stay stable.
#[derive(Debug, Clone)]
pub struct Spring {
    params: SpringParams,
    position: f32,
    velocity: f32,
    target: f32,
    last: Option<Instant>,
}

impl Spring {
    pub fn new(params: SpringParams, initial: f32) -> Self {
        Self {
            params,
            position: initial,
            velocity: 0.0,
            target: initial,
            last: None,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn is_settled(&self) -> bool {
        (self.position - self.target).abs() < REST_DELTA && self.velocity.abs() < REST_SPEED
    }

    /// Advances to `now`. The first call only records the clock.
    pub fn advance(&mut self, now: Instant) -> f32 {
        if let Some(last) = self.last {
            let dt = now.saturating_duration_since(last).as_secs_f32();
            self.step(dt);
        }
        self.last = Some(now);
        self.position
    }

    /// Steps forward by `dt` seconds. Returns true once settled.
    pub fn step(&mut self, dt: f32) -> bool {
        if dt > 0.0 && !self.is_settled() {
            let (x, v) = self.solve(self.position - self.target, self.velocity, dt);
            self.position = self.target + x;
            self.velocity = v;
        }
        let settled = self.is_settled();
        if settled {
            self.position = self.target;
            self.velocity = 0.0;
        }
        settled
    }

    fn solve(&self, x: f32, v: f32, t: f32) -> (f32, f32) {
        let omega = self.params.stiffness.sqrt();
        let zeta = self.params.damping_ratio();

        if (zeta - 1.0).abs() < 1e-4 {
            // x(t) = (c1 + c2 t) e^(-ωt)
            let exp = (-omega * t).exp();
            let c1 = x;
            let c2 = v + omega * x;
            let position = (c1 + c2 * t) * exp;
            let velocity = (c2 - omega * (c1 + c2 * t)) * exp;
            (position, velocity)
        } else if zeta < 1.0 {
            let decay = zeta * omega;
            let omega_d = omega * (1.0 - zeta * zeta).sqrt();
            let exp = (-decay * t).exp();
            let (sin, cos) = (omega_d * t).sin_cos();
            let a = x;
            let b = (v + decay * x) / omega_d;
            let position = exp * (a * cos + b * sin);
            let velocity = exp * (v * cos - (decay * b + a * omega_d) * sin);
            (position, velocity)
        } else {
            let root = (zeta * zeta - 1.0).sqrt();
            let r1 = -omega * (zeta - root);
            let r2 = -omega * (zeta + root);
            let c2 = (v - r1 * x) / (r2 - r1);
            let c1 = x - c2;
            let (e1, e2) = ((r1 * t).exp(), (r2 * t).exp());
            (c1 * e1 + c2 * e2, r1 * c1 * e1 + r2 * c2 * e2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn run(spring: &mut Spring, seconds: f32) -> (f32, f32) {
        let mut min: f32 = spring.position();
        let mut max: f32 = spring.position();
        let frames = (seconds * 60.0) as usize;
        for _ in 0..frames {
            spring.step(1.0 / 60.0);
            min = min.min(spring.position());
            max = max.max(spring.position());
        }
        (min, max)
    }

    #[test]
    fn hero_parameters_are_critically_damped() {
        let params = SpringParams::new(100.0, 20.0).unwrap();
        assert!((params.damping_ratio() - 1.0).abs() < 1e-6);
        let mut spring = Spring::new(params, 0.0);
        spring.set_target(0.5);
        let (_, max) = run(&mut spring, 2.0);
        assert!(max <= 0.5 + 1e-4, "overshot to {max}");
        assert!(spring.is_settled());
        assert_eq!(spring.position(), 0.5);
    }

    #[test]
    fn overdamped_spring_converges_without_overshoot() {
        let params = SpringParams::new(40.0, 20.0).unwrap();
        assert!(params.damping_ratio() > 1.0);
        let mut spring = Spring::new(params, 0.0);
        spring.set_target(-0.5);
        let (min, _) = run(&mut spring, 5.0);
        assert!(min >= -0.5 - 1e-4);
        assert!((spring.position() + 0.5).abs() < 1e-3);
    }

    #[test]
    fn underdamped_spring_overshoots_then_settles() {
        let params = SpringParams::new(170.0, 6.0).unwrap();
        let mut spring = Spring::new(params, 0.0);
        spring.set_target(1.0);
        let (_, max) = run(&mut spring, 6.0);
        assert!(max > 1.0);
        assert!((spring.position() - 1.0).abs() < 1e-2);
    }

    #[test]
    fn large_step_matches_many_small_steps() {
        let params = SpringParams::new(100.0, 20.0).unwrap();
        let mut coarse = Spring::new(params, 0.0);
        let mut fine = Spring::new(params, 0.0);
        coarse.set_target(1.0);
        fine.set_target(1.0);
        coarse.step(0.1);
        for _ in 0..100 {
            fine.step(0.001);
        }
        assert!((coarse.position() - fine.position()).abs() < 1e-3);
    }

    #[test]
    fn advance_uses_wall_clock_deltas() {
        let params = SpringParams::new(100.0, 20.0).unwrap();
        let mut spring = Spring::new(params, 0.0);
        spring.set_target(1.0);
        let start = Instant::now();
        assert_eq!(spring.advance(start), 0.0);
        let moved = spring.advance(start + Duration::from_millis(100));
        assert!(moved > 0.0 && moved < 1.0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(SpringParams::new(0.0, 1.0).is_err());
        assert!(SpringParams::new(10.0, -1.0).is_err());
        assert!(SpringParams::new(f32::NAN, 1.0).is_err());
    }
}
