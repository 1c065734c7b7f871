//! Interpolation pipeline shared by the page sections: easing and tweens,
//! scroll-driven keyframes, pointer smoothing, and the cursor-reactive glow.

pub mod easing;
pub mod glow;
pub mod keyframes;
pub mod listeners;
pub mod pointer;
pub mod scroll;
pub mod spring;

pub use easing::{CubicBezier, Easing, FadeEnvelope, Tween};
pub use glow::{
    composite, Background, GlowCompositor, GlowFrame, GlowLayer, GlowParseError, GlowSpec,
    GlowTimings, GradientLayer,
};
pub use keyframes::Keyframes;
pub use listeners::{EventKind, ListenerId, ListenerRegistry};
pub use pointer::{ConsumerId, Parallax, PointerSample, PointerTracker, Tilt};
pub use scroll::{scroll_progress, ElementBox, ScrollProgressDriver, Viewport};
pub use spring::{Spring, SpringParams};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MotionError {
    #[error("keyframes need at least one knot")]
    EmptyKeyframes,
    #[error("keyframe {index} is not a finite number")]
    NonFinite { index: usize },
    #[error("keyframe {index} does not increase on its input")]
    Unsorted { index: usize },
    #[error("{inputs} input stops but {outputs} output stops")]
    LengthMismatch { inputs: usize, outputs: usize },
    #[error("bezier x control points must lie in [0, 1] (got {x1}, {x2})")]
    InvalidBezier { x1: f32, x2: f32 },
    #[error("spring needs positive stiffness and non-negative damping (got {stiffness}, {damping})")]
    InvalidSpring { stiffness: f32, damping: f32 },
}
