//! Software GL backend.
//!
//! Implements [`GlBackend`] on top of an in-memory RGBA8 framebuffer so the
//! scene can be drawn, inspected and exported on native targets. Objects are
//! addressed by index handles, and misuse is recorded as a [`GlError`] instead
//! of panicking, the way a real context sets its error flag.

use std::cell::RefCell;
use std::fmt::Write as _;

use crate::gl::{GlBackend, Rgba, ShaderStage};
use crate::shader::{self, CompiledShader};

/// Attribute slot the scene's `position` input is bound to.
const POSITION_ATTRIB: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferId(usize);

/// Error flags raised by invalid calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlError {
    InvalidValue(&'static str),
    InvalidOperation(&'static str),
}

/// RGBA8 framebuffer, row-major with the origin at the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// Number of pixels exactly equal to `rgba`.
    pub fn count(&self, rgba: [u8; 4]) -> usize {
        self.pixels.iter().filter(|&&p| p == rgba).count()
    }

    /// Binary PPM (P6); alpha is dropped.
    pub fn to_ppm(&self) -> Vec<u8> {
        let mut header = String::new();
        let _ = write!(header, "P6\n{} {}\n255\n", self.width, self.height);
        let mut out = Vec::with_capacity(header.len() + self.pixels.len() * 3);
        out.extend_from_slice(header.as_bytes());
        for p in &self.pixels {
            out.extend_from_slice(&p[..3]);
        }
        out
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn fill(&mut self, rgba: [u8; 4]) {
        self.pixels.fill(rgba);
    }

    /// Fill every pixel whose center lies inside the triangle (either winding).
    fn fill_triangle(&mut self, tri: [(f32, f32); 3], rgba: [u8; 4]) {
        let [a, b, c] = tri;
        let area = edge(a, b, c);
        if area == 0.0 || !area.is_finite() {
            return;
        }

        let min_x = a.0.min(b.0).min(c.0).floor().max(0.0) as u32;
        let min_y = a.1.min(b.1).min(c.1).floor().max(0.0) as u32;
        let max_x = (a.0.max(b.0).max(c.0).ceil().max(0.0) as u32).min(self.width);
        let max_y = (a.1.max(b.1).max(c.1).ceil().max(0.0) as u32).min(self.height);

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b, c, p);
                let w1 = edge(c, a, p);
                let w2 = edge(a, b, p);
                let inside = if area > 0.0 {
                    w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
                } else {
                    w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
                };
                if inside {
                    let i = self.index(x, y);
                    self.pixels[i] = rgba;
                }
            }
        }
    }
}

fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

/// Object table with slot reuse; freed handles are recycled by later creates.
#[derive(Debug)]
struct Slots<T> {
    items: Vec<Option<T>>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Slots<T> {
    fn insert(&mut self, item: T) -> usize {
        match self.items.iter().position(Option::is_none) {
            Some(i) => {
                self.items[i] = Some(item);
                i
            }
            None => {
                self.items.push(Some(item));
                self.items.len() - 1
            }
        }
    }

    fn get(&self, i: usize) -> Option<&T> {
        self.items.get(i).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        self.items.get_mut(i).and_then(Option::as_mut)
    }

    fn contains(&self, i: usize) -> bool {
        self.get(i).is_some()
    }

    fn remove(&mut self, i: usize) -> Option<T> {
        self.items.get_mut(i).and_then(Option::take)
    }

    fn live(&self) -> usize {
        self.items.iter().filter(|s| s.is_some()).count()
    }
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: Option<CompiledShader>,
    log: Option<String>,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<ShaderId>,
    fill: Option<Rgba>,
    log: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct AttribPointer {
    size: i32,
    buffer: BufferId,
}

/// Live object counts, for leak checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectCounts {
    pub shaders: usize,
    pub programs: usize,
    pub buffers: usize,
}

#[derive(Debug)]
struct State {
    frame: Frame,
    clear_color: Rgba,
    shaders: Slots<ShaderObject>,
    programs: Slots<ProgramObject>,
    buffers: Slots<Vec<f32>>,
    current_program: Option<ProgramId>,
    array_buffer: Option<BufferId>,
    position: Option<AttribPointer>,
    position_enabled: bool,
    errors: Vec<GlError>,
    draw_calls: usize,
}

impl State {
    fn error(&mut self, e: GlError) {
        tracing::debug!(error = ?e, "software gl error");
        self.errors.push(e);
    }

    fn draw(&mut self, first: i32, count: i32) {
        if first < 0 || count < 0 {
            return self.error(GlError::InvalidValue("negative first or count"));
        }
        let Some(fill) = self
            .current_program
            .and_then(|id| self.programs.get(id.0))
            .and_then(|p| p.fill)
        else {
            return self.error(GlError::InvalidOperation("no linked program in use"));
        };
        if !self.position_enabled {
            return self.error(GlError::InvalidOperation("position attribute disabled"));
        }
        let Some(attrib) = self.position else {
            return self.error(GlError::InvalidOperation("position attribute has no pointer"));
        };

        let size = attrib.size as usize;
        let end = (first as usize + count as usize) * size;
        let available = self.buffers.get(attrib.buffer.0).map_or(0, Vec::len);
        if available < end {
            return self.error(GlError::InvalidOperation("vertex buffer too small"));
        }
        let Some(data) = self.buffers.get(attrib.buffer.0) else {
            return;
        };

        let (w, h) = (self.frame.width as f32, self.frame.height as f32);
        let to_window = |v: usize| -> (f32, f32) {
            let base = v * size;
            let x = data[base];
            let y = if size > 1 { data[base + 1] } else { 0.0 };
            let clip_w = if size > 3 { data[base + 3] } else { 1.0 };
            let (x, y) = (x / clip_w, y / clip_w);
            ((x + 1.0) * 0.5 * w, (1.0 - y) * 0.5 * h)
        };

        let first = first as usize;
        let triangles: Vec<[(f32, f32); 3]> = (0..count as usize / 3)
            .map(|t| {
                let v = first + t * 3;
                [to_window(v), to_window(v + 1), to_window(v + 2)]
            })
            .collect();

        let rgba = fill.to_rgba8();
        for tri in triangles {
            self.frame.fill_triangle(tri, rgba);
        }
        self.draw_calls += 1;
    }
}

/// GL context rendering into a [`Frame`].
#[derive(Debug)]
pub struct SoftwareGl {
    state: RefCell<State>,
}

impl SoftwareGl {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: RefCell::new(State {
                frame: Frame::new(width, height),
                clear_color: Rgba::TRANSPARENT,
                shaders: Slots::default(),
                programs: Slots::default(),
                buffers: Slots::default(),
                current_program: None,
                array_buffer: None,
                position: None,
                position_enabled: false,
                errors: Vec::new(),
                draw_calls: 0,
            }),
        }
    }

    /// Snapshot of the framebuffer.
    pub fn frame(&self) -> Frame {
        self.state.borrow().frame.clone()
    }

    /// Drain recorded errors, oldest first.
    pub fn take_errors(&self) -> Vec<GlError> {
        std::mem::take(&mut self.state.borrow_mut().errors)
    }

    pub fn draw_calls(&self) -> usize {
        self.state.borrow().draw_calls
    }

    pub fn object_counts(&self) -> ObjectCounts {
        let s = self.state.borrow();
        ObjectCounts {
            shaders: s.shaders.live(),
            programs: s.programs.live(),
            buffers: s.buffers.live(),
        }
    }
}

impl GlBackend for SoftwareGl {
    type Shader = ShaderId;
    type Program = ProgramId;
    type Buffer = BufferId;

    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderId> {
        let mut s = self.state.borrow_mut();
        let id = s.shaders.insert(ShaderObject {
            stage,
            source: String::new(),
            compiled: None,
            log: None,
        });
        Some(ShaderId(id))
    }

    fn shader_source(&self, shader: &ShaderId, source: &str) {
        let mut s = self.state.borrow_mut();
        match s.shaders.get_mut(shader.0) {
            Some(obj) => obj.source = source.to_string(),
            None => s.error(GlError::InvalidValue("unknown shader")),
        }
    }

    fn compile_shader(&self, shader: &ShaderId) {
        let mut s = self.state.borrow_mut();
        let Some(obj) = s.shaders.get_mut(shader.0) else {
            return s.error(GlError::InvalidValue("unknown shader"));
        };
        match shader::compile(obj.stage, &obj.source) {
            Ok(compiled) => {
                obj.compiled = Some(compiled);
                obj.log = None;
            }
            Err(log) => {
                obj.compiled = None;
                obj.log = Some(log);
            }
        }
    }

    fn shader_compiled(&self, shader: &ShaderId) -> bool {
        self.state
            .borrow()
            .shaders
            .get(shader.0)
            .is_some_and(|obj| obj.compiled.is_some())
    }

    fn shader_info_log(&self, shader: &ShaderId) -> Option<String> {
        self.state
            .borrow()
            .shaders
            .get(shader.0)
            .and_then(|obj| obj.log.clone())
    }

    /// Linked programs keep their fill color, so deleting shaders after
    /// linking leaves the program usable.
    fn delete_shader(&self, shader: &ShaderId) {
        let mut s = self.state.borrow_mut();
        if s.shaders.remove(shader.0).is_none() {
            return s.error(GlError::InvalidValue("unknown shader"));
        }
        for p in s.programs.items.iter_mut().flatten() {
            p.attached.retain(|id| id != shader);
        }
    }

    fn create_program(&self) -> Option<ProgramId> {
        let mut s = self.state.borrow_mut();
        Some(ProgramId(s.programs.insert(ProgramObject::default())))
    }

    fn attach_shader(&self, program: &ProgramId, shader: &ShaderId) {
        let mut s = self.state.borrow_mut();
        if !s.shaders.contains(shader.0) {
            return s.error(GlError::InvalidValue("unknown shader"));
        }
        match s.programs.get_mut(program.0) {
            Some(p) if !p.attached.contains(shader) => p.attached.push(*shader),
            Some(_) => s.error(GlError::InvalidOperation("shader already attached")),
            None => s.error(GlError::InvalidValue("unknown program")),
        }
    }

    fn link_program(&self, program: &ProgramId) {
        let mut s = self.state.borrow_mut();
        let Some(attached) = s.programs.get(program.0).map(|p| p.attached.clone()) else {
            return s.error(GlError::InvalidValue("unknown program"));
        };

        let mut vertex = false;
        let mut fill = None;
        let mut log = None;
        for id in attached {
            let Some(obj) = s.shaders.get(id.0) else {
                continue;
            };
            match obj.compiled {
                Some(CompiledShader::Vertex) => vertex = true,
                Some(CompiledShader::Fragment { color }) => fill = Some(color),
                None => log = Some(format!("{} shader is not compiled", obj.stage)),
            }
        }
        if log.is_none() && !vertex {
            log = Some("missing vertex shader".to_string());
        }
        if log.is_none() && fill.is_none() {
            log = Some("missing fragment shader".to_string());
        }

        let Some(p) = s.programs.get_mut(program.0) else {
            return;
        };
        if log.is_some() {
            p.fill = None;
            p.log = log;
        } else {
            p.fill = fill;
            p.log = None;
        }
    }

    fn program_linked(&self, program: &ProgramId) -> bool {
        self.state
            .borrow()
            .programs
            .get(program.0)
            .is_some_and(|p| p.fill.is_some())
    }

    fn program_info_log(&self, program: &ProgramId) -> Option<String> {
        self.state
            .borrow()
            .programs
            .get(program.0)
            .and_then(|p| p.log.clone())
    }

    fn use_program(&self, program: Option<&ProgramId>) {
        let mut s = self.state.borrow_mut();
        match program {
            Some(id) if s.programs.get(id.0).is_some_and(|p| p.fill.is_some()) => {
                s.current_program = Some(*id)
            }
            Some(_) => s.error(GlError::InvalidOperation("program is not linked")),
            None => s.current_program = None,
        }
    }

    fn delete_program(&self, program: &ProgramId) {
        let mut s = self.state.borrow_mut();
        if s.programs.remove(program.0).is_none() {
            return s.error(GlError::InvalidValue("unknown program"));
        }
        if s.current_program == Some(*program) {
            s.current_program = None;
        }
    }

    fn create_buffer(&self) -> Option<BufferId> {
        let mut s = self.state.borrow_mut();
        Some(BufferId(s.buffers.insert(Vec::new())))
    }

    fn bind_array_buffer(&self, buffer: Option<&BufferId>) {
        let mut s = self.state.borrow_mut();
        match buffer {
            Some(id) if s.buffers.contains(id.0) => s.array_buffer = Some(*id),
            Some(_) => s.error(GlError::InvalidValue("unknown buffer")),
            None => s.array_buffer = None,
        }
    }

    fn array_buffer_data(&self, data: &[f32]) {
        let mut s = self.state.borrow_mut();
        let Some(id) = s.array_buffer else {
            return s.error(GlError::InvalidOperation("no array buffer bound"));
        };
        if let Some(buf) = s.buffers.get_mut(id.0) {
            *buf = data.to_vec();
        }
    }

    fn delete_buffer(&self, buffer: &BufferId) {
        let mut s = self.state.borrow_mut();
        if s.buffers.remove(buffer.0).is_none() {
            return s.error(GlError::InvalidValue("unknown buffer"));
        }
        if s.array_buffer == Some(*buffer) {
            s.array_buffer = None;
        }
        if s.position.is_some_and(|p| p.buffer == *buffer) {
            s.position = None;
        }
    }

    fn vertex_attrib_pointer(&self, index: u32, size: i32) {
        let mut s = self.state.borrow_mut();
        if !(1..=4).contains(&size) {
            return s.error(GlError::InvalidValue("attribute size must be 1..=4"));
        }
        let Some(buffer) = s.array_buffer else {
            return s.error(GlError::InvalidOperation("no array buffer bound"));
        };
        if index == POSITION_ATTRIB {
            s.position = Some(AttribPointer { size, buffer });
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        if index == POSITION_ATTRIB {
            self.state.borrow_mut().position_enabled = true;
        }
    }

    fn clear_color(&self, color: Rgba) {
        self.state.borrow_mut().clear_color = color;
    }

    fn clear_color_buffer(&self) {
        let mut s = self.state.borrow_mut();
        let rgba = s.clear_color.to_rgba8();
        s.frame.fill(rgba);
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        self.state.borrow_mut().draw(first, count);
    }
}
