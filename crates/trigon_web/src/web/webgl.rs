use trigon::gl::{GlBackend, Rgba, ShaderStage};
use web_sys::{WebGlBuffer, WebGlProgram, WebGlRenderingContext as Gl, WebGlShader};

/// [`GlBackend`] over a browser WebGL 1 context.
pub(super) struct WebGl {
    ctx: Gl,
}

impl WebGl {
    pub(super) fn new(ctx: Gl) -> Self {
        Self { ctx }
    }
}

impl GlBackend for WebGl {
    type Shader = WebGlShader;
    type Program = WebGlProgram;
    type Buffer = WebGlBuffer;

    fn create_shader(&self, stage: ShaderStage) -> Option<WebGlShader> {
        let kind = match stage {
            ShaderStage::Vertex => Gl::VERTEX_SHADER,
            ShaderStage::Fragment => Gl::FRAGMENT_SHADER,
        };
        self.ctx.create_shader(kind)
    }

    fn shader_source(&self, shader: &WebGlShader, source: &str) {
        self.ctx.shader_source(shader, source);
    }

    fn compile_shader(&self, shader: &WebGlShader) {
        self.ctx.compile_shader(shader);
    }

    fn shader_compiled(&self, shader: &WebGlShader) -> bool {
        self.ctx
            .get_shader_parameter(shader, Gl::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn shader_info_log(&self, shader: &WebGlShader) -> Option<String> {
        self.ctx.get_shader_info_log(shader)
    }

    fn delete_shader(&self, shader: &WebGlShader) {
        self.ctx.delete_shader(Some(shader));
    }

    fn create_program(&self) -> Option<WebGlProgram> {
        self.ctx.create_program()
    }

    fn attach_shader(&self, program: &WebGlProgram, shader: &WebGlShader) {
        self.ctx.attach_shader(program, shader);
    }

    fn link_program(&self, program: &WebGlProgram) {
        self.ctx.link_program(program);
    }

    fn program_linked(&self, program: &WebGlProgram) -> bool {
        self.ctx
            .get_program_parameter(program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn program_info_log(&self, program: &WebGlProgram) -> Option<String> {
        self.ctx.get_program_info_log(program)
    }

    fn use_program(&self, program: Option<&WebGlProgram>) {
        self.ctx.use_program(program);
    }

    fn delete_program(&self, program: &WebGlProgram) {
        self.ctx.delete_program(Some(program));
    }

    fn create_buffer(&self) -> Option<WebGlBuffer> {
        self.ctx.create_buffer()
    }

    fn bind_array_buffer(&self, buffer: Option<&WebGlBuffer>) {
        self.ctx.bind_buffer(Gl::ARRAY_BUFFER, buffer);
    }

    fn array_buffer_data(&self, data: &[f32]) {
        // Copy into a JS-owned array; a view into wasm memory would be
        // invalidated by any allocation that grows the heap.
        let array = js_sys::Float32Array::from(data);
        self.ctx
            .buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, Gl::STATIC_DRAW);
    }

    fn delete_buffer(&self, buffer: &WebGlBuffer) {
        self.ctx.delete_buffer(Some(buffer));
    }

    fn vertex_attrib_pointer(&self, index: u32, size: i32) {
        self.ctx
            .vertex_attrib_pointer_with_i32(index, size, Gl::FLOAT, false, 0, 0);
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.ctx.enable_vertex_attrib_array(index);
    }

    fn clear_color(&self, color: Rgba) {
        self.ctx.clear_color(color.r, color.g, color.b, color.a);
    }

    fn clear_color_buffer(&self) {
        self.ctx.clear(Gl::COLOR_BUFFER_BIT);
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        self.ctx.draw_arrays(Gl::TRIANGLES, first, count);
    }
}
