//! Minimal GL surface used by [`crate::scene::Scene`].
//!
//! The method set mirrors the subset of `WebGLRenderingContext` that drawing a
//! single flat-shaded triangle needs, so the browser binding can forward each
//! call one-to-one while native targets use [`crate::raster::SoftwareGl`].

use core::fmt;

/// Pipeline stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn label(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized RGBA color, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Quantize to 8-bit channels the way a default framebuffer stores them.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn q(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// Backend a [`crate::scene::Scene`] draws through.
///
/// Calls take `&self`: GL contexts are stateful handles, and callers never
/// hold more than a shared reference to one.
pub trait GlBackend {
    type Shader;
    type Program;
    type Buffer;

    fn create_shader(&self, stage: ShaderStage) -> Option<Self::Shader>;
    fn shader_source(&self, shader: &Self::Shader, source: &str);
    fn compile_shader(&self, shader: &Self::Shader);
    fn shader_compiled(&self, shader: &Self::Shader) -> bool;
    fn shader_info_log(&self, shader: &Self::Shader) -> Option<String>;
    fn delete_shader(&self, shader: &Self::Shader);

    fn create_program(&self) -> Option<Self::Program>;
    fn attach_shader(&self, program: &Self::Program, shader: &Self::Shader);
    fn link_program(&self, program: &Self::Program);
    fn program_linked(&self, program: &Self::Program) -> bool;
    fn program_info_log(&self, program: &Self::Program) -> Option<String>;
    fn use_program(&self, program: Option<&Self::Program>);
    fn delete_program(&self, program: &Self::Program);

    fn create_buffer(&self) -> Option<Self::Buffer>;
    fn bind_array_buffer(&self, buffer: Option<&Self::Buffer>);
    /// Upload static vertex data into the currently bound array buffer.
    fn array_buffer_data(&self, data: &[f32]);
    fn delete_buffer(&self, buffer: &Self::Buffer);
    /// Float attribute with `size` tightly packed components, offset 0.
    fn vertex_attrib_pointer(&self, index: u32, size: i32);
    fn enable_vertex_attrib_array(&self, index: u32);

    fn clear_color(&self, color: Rgba);
    fn clear_color_buffer(&self);
    fn draw_triangles(&self, first: i32, count: i32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_quantization_clamps() {
        assert_eq!(Rgba::RED.to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(Rgba::new(2.0, -1.0, 0.5, 1.0).to_rgba8(), [255, 0, 128, 255]);
    }
}
