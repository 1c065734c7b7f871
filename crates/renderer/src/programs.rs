use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

const HERO_TIME_STEP: f32 = 0.01;
const RINGS_TIME_STEP: f32 = 0.05;
const RINGS_START_TIME: f32 = 1.0;
/// Fraction of the remaining distance covered each frame when easing toward
/// pointer-driven targets.
const PARAM_LERP: f32 = 0.05;

/// The two background shaders the page mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderProgram {
    /// Three chromatic sine lines that bend with the pointer. Hero background.
    HeroWaves,
    /// Concentric chromatic rings expanding outward.
    RadialRings,
}

impl ShaderProgram {
    pub fn name(self) -> &'static str {
        match self {
            ShaderProgram::HeroWaves => "hero-waves",
            ShaderProgram::RadialRings => "radial-rings",
        }
    }

    pub(crate) fn fragment_body(self) -> &'static str {
        match self {
            ShaderProgram::HeroWaves => HERO_WAVES_GLSL,
            ShaderProgram::RadialRings => RADIAL_RINGS_GLSL,
        }
    }

    fn time_step(self) -> f32 {
        match self {
            ShaderProgram::HeroWaves => HERO_TIME_STEP,
            ShaderProgram::RadialRings => RINGS_TIME_STEP,
        }
    }
}

impl fmt::Display for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShaderProgram {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hero" | "hero-waves" => Ok(ShaderProgram::HeroWaves),
            "transition" | "radial-rings" | "rings" => Ok(ShaderProgram::RadialRings),
            other => bail!("unknown shader program '{other}' (expected hero or transition)"),
        }
    }
}

/// Values fed to the shader each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramParams {
    pub time: f32,
    pub x_scale: f32,
    pub y_scale: f32,
    pub distortion: f32,
}

impl ProgramParams {
    const HERO_REST: ProgramParams = ProgramParams {
        time: 0.0,
        x_scale: 1.0,
        y_scale: 0.5,
        distortion: 0.05,
    };
}

/// Per-frame parameter dynamics, independent of the GPU.
#[derive(Debug, Clone)]
pub struct ProgramState {
    program: ShaderProgram,
    params: ProgramParams,
    target: ProgramParams,
}

impl ProgramState {
    pub fn new(program: ShaderProgram) -> Self {
        let params = match program {
            ShaderProgram::HeroWaves => ProgramParams::HERO_REST,
            ShaderProgram::RadialRings => ProgramParams {
                time: RINGS_START_TIME,
                ..ProgramParams::HERO_REST
            },
        };
        Self {
            program,
            params,
            target: params,
        }
    }

    pub fn program(&self) -> ShaderProgram {
        self.program
    }

    pub fn params(&self) -> ProgramParams {
        self.params
    }

    /// Pointer position as a fraction of the viewport, `(0,0)` top-left.
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if self.program != ShaderProgram::HeroWaves {
            return;
        }
        let dx = x - 0.5;
        let dy = y - 0.5;
        let dist = (dx * dx + dy * dy).sqrt();
        self.target.distortion = 0.05 + dist * 0.1;
        self.target.x_scale = 1.0 + dx * 0.5;
        self.target.y_scale = 0.5 + dy * 0.5;
    }

    pub fn advance_frame(&mut self) -> ProgramParams {
        self.params.time += self.program.time_step();
        if self.program == ShaderProgram::HeroWaves {
            let lerp = |current: f32, target: f32| current + (target - current) * PARAM_LERP;
            self.params.distortion = lerp(self.params.distortion, self.target.distortion);
            self.params.x_scale = lerp(self.params.x_scale, self.target.x_scale);
            self.params.y_scale = lerp(self.params.y_scale, self.target.y_scale);
        }
        self.params
    }
}

const HERO_WAVES_GLSL: &str = r"
vec3 shade(vec2 fragCoord) {
    vec2 p = (fragCoord * 2.0 - params.resolution) / min(params.resolution.x, params.resolution.y);
    float d = length(p) * params.distortion;

    float rx = p.x * (1.0 + d);
    float gx = p.x;
    float bx = p.x * (1.0 - d);

    float r = 0.05 / abs(p.y + sin((rx + params.time) * params.x_scale) * params.y_scale);
    float g = 0.05 / abs(p.y + sin((gx + params.time) * params.x_scale) * params.y_scale);
    float b = 0.05 / abs(p.y + sin((bx + params.time) * params.x_scale) * params.y_scale);
    return vec3(r, g, b);
}
";

const RADIAL_RINGS_GLSL: &str = r"
#define WAVE_DENSITY 7.0
#define LINE_WIDTH 0.005

float ring_channel(vec2 uv, float t, float channel) {
    float acc = 0.0;
    for (int i = 0; i < 5; i++) {
        float fi = float(i);
        acc += LINE_WIDTH * fi * fi
            / abs(fract(t - 0.01 * channel + fi * 0.01) * WAVE_DENSITY - length(uv) + mod(uv.x + uv.y, 0.2));
    }
    return acc;
}

vec3 shade(vec2 fragCoord) {
    vec2 uv = (fragCoord * 2.0 - params.resolution) / min(params.resolution.x, params.resolution.y);
    float t = params.time * 0.05;
    return vec3(ring_channel(uv, t, 0.0), ring_channel(uv, t, 1.0), ring_channel(uv, t, 2.0));
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_program_names() {
        assert_eq!("hero".parse::<ShaderProgram>().unwrap(), ShaderProgram::HeroWaves);
        assert_eq!(
            "Transition".parse::<ShaderProgram>().unwrap(),
            ShaderProgram::RadialRings
        );
        assert!("spline".parse::<ShaderProgram>().is_err());
    }

    #[test]
    fn hero_time_advances_per_frame() {
        let mut state = ProgramState::new(ShaderProgram::HeroWaves);
        for _ in 0..100 {
            state.advance_frame();
        }
        assert!((state.params().time - 1.0).abs() < 1e-4);
    }

    #[test]
    fn rings_start_at_one_and_step_faster() {
        let mut state = ProgramState::new(ShaderProgram::RadialRings);
        assert_eq!(state.params().time, 1.0);
        state.advance_frame();
        assert!((state.params().time - 1.05).abs() < 1e-6);
        state.pointer_moved(1.0, 1.0);
        state.advance_frame();
        assert_eq!(state.params().distortion, 0.05);
    }

    #[test]
    fn hero_eases_toward_pointer_targets() {
        let mut state = ProgramState::new(ShaderProgram::HeroWaves);
        state.pointer_moved(1.0, 0.5);
        let first = state.advance_frame();
        // 5% of the way from 1.0 toward 1.25
        assert!((first.x_scale - 1.0125).abs() < 1e-6);
        assert!((first.y_scale - 0.5).abs() < 1e-6);
        for _ in 0..400 {
            state.advance_frame();
        }
        let settled = state.params();
        assert!((settled.x_scale - 1.25).abs() < 1e-3);
        assert!((settled.distortion - 0.1).abs() < 1e-3);
    }
}
