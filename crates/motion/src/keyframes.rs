use crate::MotionError;

/// Piecewise-linear map over a sorted list of `(input, output)` knots.
///
/// Inputs outside the first/last knot clamp to the end outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframes {
    knots: Vec<(f32, f32)>,
}

impl Keyframes {
    pub fn new(knots: impl IntoIterator<Item = (f32, f32)>) -> Result<Self, MotionError> {
        let knots: Vec<(f32, f32)> = knots.into_iter().collect();
        if knots.is_empty() {
            return Err(MotionError::EmptyKeyframes);
        }
        for (index, (input, output)) in knots.iter().enumerate() {
            if !input.is_finite() || !output.is_finite() {
                return Err(MotionError::NonFinite { index });
            }
        }
        for (index, pair) in knots.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(MotionError::Unsorted { index: index + 1 });
            }
        }
        Ok(Self { knots })
    }

    /// Builds knots from parallel input/output stop lists.
    pub fn from_stops(inputs: &[f32], outputs: &[f32]) -> Result<Self, MotionError> {
        if inputs.len() != outputs.len() {
            return Err(MotionError::LengthMismatch {
                inputs: inputs.len(),
                outputs: outputs.len(),
            });
        }
        Self::new(inputs.iter().copied().zip(outputs.iter().copied()))
    }

    /// Straight line between two points.
    pub fn linear(from: (f32, f32), to: (f32, f32)) -> Result<Self, MotionError> {
        Self::new([from, to])
    }

    pub fn knots(&self) -> &[(f32, f32)] {
        &self.knots
    }

    pub fn sample(&self, input: f32) -> f32 {
        let (first_in, first_out) = self.knots[0];
        if input <= first_in || input.is_nan() {
            return first_out;
        }
        let (last_in, last_out) = self.knots[self.knots.len() - 1];
        if input >= last_in {
            return last_out;
        }
        for pair in self.knots.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if input <= x1 {
                let t = (input - x0) / (x1 - x0);
                return y0 + (y1 - y0) * t;
            }
        }
        last_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> Keyframes {
        Keyframes::new([(0.0, 0.0), (0.3, 80.0), (0.7, 100.0), (1.0, 60.0)]).unwrap()
    }

    #[test]
    fn interpolates_between_knots() {
        let curve = curve();
        assert_eq!(curve.sample(0.0), 0.0);
        assert!((curve.sample(0.15) - 40.0).abs() < 1e-4);
        assert!((curve.sample(0.5) - 90.0).abs() < 1e-4);
        assert!((curve.sample(0.85) - 80.0).abs() < 1e-4);
        assert_eq!(curve.sample(1.0), 60.0);
    }

    #[test]
    fn clamps_outside_range() {
        let curve = curve();
        assert_eq!(curve.sample(-3.0), 0.0);
        assert_eq!(curve.sample(4.0), 60.0);
        assert_eq!(curve.sample(f32::NAN), 0.0);
    }

    #[test]
    fn single_knot_is_constant() {
        let constant = Keyframes::new([(0.5, 7.0)]).unwrap();
        assert_eq!(constant.sample(0.0), 7.0);
        assert_eq!(constant.sample(1.0), 7.0);
    }

    #[test]
    fn rejects_bad_knots() {
        assert!(matches!(
            Keyframes::new(Vec::new()),
            Err(MotionError::EmptyKeyframes)
        ));
        assert!(matches!(
            Keyframes::new([(0.0, 0.0), (0.0, 1.0)]),
            Err(MotionError::Unsorted { index: 1 })
        ));
        assert!(matches!(
            Keyframes::new([(0.0, f32::INFINITY)]),
            Err(MotionError::NonFinite { index: 0 })
        ));
        assert!(matches!(
            Keyframes::from_stops(&[0.0, 1.0], &[0.0]),
            Err(MotionError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn descending_outputs_are_allowed() {
        let tilt = Keyframes::linear((-0.5, 15.0), (0.5, -15.0)).unwrap();
        assert!((tilt.sample(0.25) + 7.5).abs() < 1e-4);
    }
}
