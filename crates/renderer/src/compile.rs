use std::borrow::Cow;

use wgpu::naga::ShaderStage;

use crate::programs::ShaderProgram;

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Wraps the program body with the shared prelude and compiles it as GLSL.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    program: ShaderProgram,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(program.name()),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrap_fragment(program)),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Produces a self-contained fragment shader: [`HEADER`], the program's
/// `shade` function, then [`FOOTER`].
pub(crate) fn wrap_fragment(program: ShaderProgram) -> String {
    format!(
        "{HEADER}\n#line 1\n{body}{FOOTER}",
        body = program.fragment_body()
    )
}

/// Uniform block layout must match `SiteUniforms` in `gpu/uniforms.rs`.
const HEADER: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform SiteParams {
    vec2 resolution;
    float time;
    float x_scale;
    float y_scale;
    float distortion;
    float fade;
    float _padding0;
} params;
";

/// Flips to a bottom-left origin so the programs see the same coordinates a
/// WebGL canvas would, then scales by the fade.
const FOOTER: &str = r"
void main() {
    vec2 fragCoord = vec2(gl_FragCoord.x, params.resolution.y - gl_FragCoord.y);
    vec3 color = shade(fragCoord);
    outColor = vec4(color * params.fade, 1.0);
}
";

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";
