//! The triangle scene: one flat red triangle on a black background.

use std::cell::RefCell;
use std::fmt;

use thiserror::Error;

use crate::gl::{GlBackend, Rgba, ShaderStage};

pub const VERTEX_SHADER: &str = r#"
attribute vec4 position;
void main() {
    gl_Position = position;
}
"#;

pub const FRAGMENT_SHADER: &str = r#"
void main() {
    gl_FragColor = vec4(1.0, 0.0, 0.0, 1.0);
}
"#;

/// Clip-space positions, three components per vertex.
#[rustfmt::skip]
pub const TRIANGLE: [f32; 9] = [
    -0.7, -0.7, 0.0,
    0.7, -0.7, 0.0,
    0.0, 0.7, 0.0,
];

pub const CLEAR_COLOR: Rgba = Rgba::BLACK;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("Unable to create shader object")]
    CreateShader,
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("Unable to create program object")]
    CreateProgram,
    #[error("program failed to link: {0}")]
    Link(String),
    #[error("failed to create buffer")]
    CreateBuffer,
}

struct Pipeline<B: GlBackend> {
    program: B::Program,
    buffer: B::Buffer,
}

/// Owns the backend and, after the first successful draw, the linked
/// program and the uploaded vertex buffer. Both are released on drop.
pub struct Scene<B: GlBackend> {
    gl: B,
    pipeline: RefCell<Option<Pipeline<B>>>,
}

impl<B: GlBackend> Scene<B> {
    pub fn new(gl: B) -> Self {
        Self {
            gl,
            pipeline: RefCell::new(None),
        }
    }

    pub fn backend(&self) -> &B {
        &self.gl
    }

    /// Clear and draw the triangle.
    ///
    /// The first call compiles, links and uploads; later calls reuse that
    /// program and buffer, so drawing twice yields the same frame without
    /// allocating new GL objects.
    pub fn draw(&self) -> Result<(), SceneError> {
        let mut slot = self.pipeline.borrow_mut();
        let pipeline = match slot.take() {
            Some(pipeline) => pipeline,
            None => self.build()?,
        };

        self.gl.use_program(Some(&pipeline.program));
        self.gl.bind_array_buffer(Some(&pipeline.buffer));
        self.gl.vertex_attrib_pointer(0, 3);
        self.gl.enable_vertex_attrib_array(0);

        self.gl.clear_color(CLEAR_COLOR);
        self.gl.clear_color_buffer();

        self.gl.draw_triangles(0, (TRIANGLE.len() / 3) as i32);
        *slot = Some(pipeline);
        Ok(())
    }

    /// Shaders are deleted once linked; every error path releases what it
    /// created.
    fn build(&self) -> Result<Pipeline<B>, SceneError> {
        let vertex_shader = compile_shader(&self.gl, ShaderStage::Vertex, VERTEX_SHADER)?;
        let fragment_shader =
            match compile_shader(&self.gl, ShaderStage::Fragment, FRAGMENT_SHADER) {
                Ok(shader) => shader,
                Err(e) => {
                    self.gl.delete_shader(&vertex_shader);
                    return Err(e);
                }
            };
        let program = link_program(&self.gl, &vertex_shader, &fragment_shader);
        self.gl.delete_shader(&vertex_shader);
        self.gl.delete_shader(&fragment_shader);
        let program = program?;

        let Some(buffer) = self.gl.create_buffer() else {
            self.gl.delete_program(&program);
            return Err(SceneError::CreateBuffer);
        };
        self.gl.bind_array_buffer(Some(&buffer));
        self.gl.array_buffer_data(&TRIANGLE);
        Ok(Pipeline { program, buffer })
    }
}

impl<B: GlBackend> Drop for Scene<B> {
    fn drop(&mut self) {
        if let Some(pipeline) = self.pipeline.get_mut().take() {
            self.gl.delete_buffer(&pipeline.buffer);
            self.gl.delete_program(&pipeline.program);
        }
    }
}

impl<B: GlBackend + fmt::Debug> fmt::Debug for Scene<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("gl", &self.gl)
            .field("ready", &self.pipeline.borrow().is_some())
            .finish()
    }
}

fn compile_shader<B: GlBackend>(
    gl: &B,
    stage: ShaderStage,
    source: &str,
) -> Result<B::Shader, SceneError> {
    let shader = gl.create_shader(stage).ok_or(SceneError::CreateShader)?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.shader_compiled(&shader) {
        return Ok(shader);
    }
    let log = gl
        .shader_info_log(&shader)
        .unwrap_or_else(|| "Unknown error creating shader".into());
    gl.delete_shader(&shader);
    Err(SceneError::Compile { stage, log })
}

fn link_program<B: GlBackend>(
    gl: &B,
    vertex_shader: &B::Shader,
    fragment_shader: &B::Shader,
) -> Result<B::Program, SceneError> {
    let program = gl.create_program().ok_or(SceneError::CreateProgram)?;
    gl.attach_shader(&program, vertex_shader);
    gl.attach_shader(&program, fragment_shader);
    gl.link_program(&program);

    if gl.program_linked(&program) {
        return Ok(program);
    }
    let log = gl
        .program_info_log(&program)
        .unwrap_or_else(|| "Unknown error creating program object".into());
    gl.delete_program(&program);
    Err(SceneError::Link(log))
}
