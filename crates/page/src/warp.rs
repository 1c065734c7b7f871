use motion::{Keyframes, MotionError};
use serde::Serialize;

/// Height of the divider strip in pixels.
pub const WARP_HEIGHT: f32 = 150.0;

const CURVE_STOPS: [f32; 4] = [0.0, 0.3, 0.7, 1.0];

/// One sampled divider frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WarpFrame {
    /// Depth of the curve's dip in pixels.
    pub curve_height: f32,
    pub red_offset: f32,
    pub blue_offset: f32,
    pub aberration_opacity: f32,
    pub edge_opacity: f32,
    pub flipped: bool,
}

impl WarpFrame {
    /// SVG path for one channel of the curve, shifted horizontally by `offset`.
    pub fn curve_path(&self, width: f32, offset: f32) -> String {
        let h = WARP_HEIGHT;
        let dip = self.curve_height.clamp(0.0, h);
        let mid = width / 2.0 + offset;
        if self.flipped {
            format!("M0,{h} L0,0 Q{mid},{dip} {width},0 L{width},{h} Z")
        } else {
            let y = h - dip;
            format!("M0,0 L0,{h} Q{mid},{y} {width},{h} L{width},0 Z")
        }
    }
}

/// Scroll-driven curved divider with chromatic fringes.
///
/// A flipped divider mirrors vertically but samples the same curves.
#[derive(Debug, Clone)]
pub struct WarpDivider {
    flipped: bool,
    curve: Keyframes,
    red: Keyframes,
    blue: Keyframes,
    aberration: Keyframes,
    edge: Keyframes,
}

impl WarpDivider {
    pub fn new(flipped: bool) -> Result<Self, MotionError> {
        Ok(Self {
            flipped,
            curve: Keyframes::from_stops(&CURVE_STOPS, &[0.0, 80.0, 100.0, 60.0])?,
            red: Keyframes::from_stops(&CURVE_STOPS, &[0.0, -6.0, -4.0, 0.0])?,
            blue: Keyframes::from_stops(&CURVE_STOPS, &[0.0, 6.0, 4.0, 0.0])?,
            aberration: Keyframes::from_stops(
                &[0.0, 0.2, 0.5, 0.8, 1.0],
                &[0.0, 0.2, 0.25, 0.15, 0.0],
            )?,
            edge: Keyframes::from_stops(&CURVE_STOPS, &[0.0, 0.15, 0.12, 0.0])?,
        })
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn sample(&self, progress: f64) -> WarpFrame {
        let p = progress as f32;
        WarpFrame {
            curve_height: self.curve.sample(p),
            red_offset: self.red.sample(p),
            blue_offset: self.blue.sample(p),
            aberration_opacity: self.aberration.sample(p),
            edge_opacity: self.edge.sample(p),
            flipped: self.flipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_every_curve_from_one_progress() {
        let divider = WarpDivider::new(false).unwrap();
        let frame = divider.sample(0.3);
        assert_eq!(frame.curve_height, 80.0);
        assert_eq!(frame.red_offset, -6.0);
        assert_eq!(frame.blue_offset, 6.0);
        assert_eq!(frame.edge_opacity, 0.15);
        assert!((frame.aberration_opacity - (0.2 + 0.05 / 3.0)).abs() < 1e-5);

        let mid = divider.sample(0.5);
        assert!((mid.curve_height - 90.0).abs() < 1e-4);
        assert!((mid.red_offset + 5.0).abs() < 1e-5);
        assert!((mid.aberration_opacity - 0.25).abs() < 1e-6);
    }

    #[test]
    fn clamps_outside_unit_range() {
        let divider = WarpDivider::new(false).unwrap();
        assert_eq!(divider.sample(-1.0).curve_height, 0.0);
        assert_eq!(divider.sample(2.0).curve_height, 60.0);
        assert_eq!(divider.sample(2.0).aberration_opacity, 0.0);
    }

    #[test]
    fn flipped_divider_shares_curves() {
        let normal = WarpDivider::new(false).unwrap().sample(0.7);
        let flipped = WarpDivider::new(true).unwrap().sample(0.7);
        assert_eq!(normal.curve_height, flipped.curve_height);
        assert!(flipped.flipped);
        assert_eq!(
            flipped.curve_path(200.0, 0.0),
            "M0,150 L0,0 Q100,100 200,0 L200,150 Z"
        );
        assert_eq!(
            normal.curve_path(200.0, -4.0),
            "M0,0 L0,150 Q96,50 200,150 L200,0 Z"
        );
    }
}
