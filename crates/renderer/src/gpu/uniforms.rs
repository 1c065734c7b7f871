use bytemuck::{Pod, Zeroable};

use crate::programs::ProgramParams;

/// Mirrors the `SiteParams` std140 block declared in the shader prelude.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SiteUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub x_scale: f32,
    pub y_scale: f32,
    pub distortion: f32,
    pub fade: f32,
    pub padding0: f32,
}

unsafe impl Zeroable for SiteUniforms {}
unsafe impl Pod for SiteUniforms {}

impl SiteUniforms {
    pub fn new(width: u32, height: u32, params: ProgramParams) -> Self {
        let mut uniforms = Self {
            resolution: [width as f32, height as f32],
            fade: 1.0,
            ..Self::zeroed()
        };
        uniforms.apply(params);
        uniforms
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = [width as f32, height as f32];
    }

    pub fn apply(&mut self, params: ProgramParams) {
        self.time = params.time;
        self.x_scale = params.x_scale;
        self.y_scale = params.y_scale;
        self.distortion = params.distortion;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::{ProgramState, ShaderProgram};

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(std::mem::size_of::<SiteUniforms>(), 32);
        assert_eq!(std::mem::align_of::<SiteUniforms>(), 16);
        let uniforms = SiteUniforms::new(
            1280,
            720,
            ProgramState::new(ShaderProgram::HeroWaves).params(),
        );
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniforms));
        assert_eq!(&floats[..2], &[1280.0, 720.0]);
        assert_eq!(floats[3], 1.0); // x_scale
        assert_eq!(floats[5], 0.05); // distortion
        assert_eq!(floats[6], 1.0); // fade
    }
}
