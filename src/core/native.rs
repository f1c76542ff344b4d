//! In-process module: the scene drawn by [`SoftwareGl`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::bootstrap::{LoadError, Loader};
use crate::math;
use crate::module::{CallError, Drawable, SceneModule};
use crate::raster::{Frame, SoftwareGl};
use crate::scene::Scene;

/// Default size of an HTML canvas without explicit dimensions.
pub const DEFAULT_WIDTH: u32 = 300;
pub const DEFAULT_HEIGHT: u32 = 150;

/// Largest accepted canvas edge, in pixels. Frames are allocated up front,
/// 4 bytes per pixel.
pub const MAX_DIMENSION: u32 = 8192;

/// Module handle backed by the software rasterizer.
///
/// Keeps the frame produced by the most recent draw so callers can inspect or
/// export it after the scene itself is gone.
#[derive(Debug)]
pub struct NativeModule {
    width: u32,
    height: u32,
    last_frame: Rc<RefCell<Option<Frame>>>,
}

impl NativeModule {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            last_frame: Rc::new(RefCell::new(None)),
        }
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.last_frame.borrow().clone()
    }
}

#[derive(Debug)]
pub struct NativeScene {
    scene: Scene<SoftwareGl>,
    last_frame: Rc<RefCell<Option<Frame>>>,
}

impl NativeScene {
    pub fn frame(&self) -> Frame {
        self.scene.backend().frame()
    }
}

impl Drawable for NativeScene {
    fn draw(&self) -> Result<(), CallError> {
        self.scene.draw()?;
        let frame = self.scene.backend().frame();
        tracing::debug!(
            width = frame.width(),
            height = frame.height(),
            draw_calls = self.scene.backend().draw_calls(),
            "software frame ready"
        );
        *self.last_frame.borrow_mut() = Some(frame);
        Ok(())
    }
}

impl SceneModule for NativeModule {
    type Scene = NativeScene;

    fn new_scene(&self) -> Result<NativeScene, CallError> {
        if self.width == 0 || self.height == 0 {
            return Err(CallError::Construct(format!(
                "canvas has no area ({}x{})",
                self.width, self.height
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(CallError::Construct(format!(
                "canvas {}x{} exceeds {MAX_DIMENSION}x{MAX_DIMENSION}",
                self.width, self.height
            )));
        }
        Ok(NativeScene {
            scene: Scene::new(SoftwareGl::new(self.width, self.height)),
            last_frame: Rc::clone(&self.last_frame),
        })
    }

    fn add(&self, a: i32, b: i32) -> Result<i32, CallError> {
        Ok(math::add(a, b))
    }
}

/// Loader for [`NativeModule`]; never fails.
#[derive(Debug, Clone, Copy)]
pub struct NativeLoader {
    pub width: u32,
    pub height: u32,
}

impl Default for NativeLoader {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl Loader for NativeLoader {
    type Module = NativeModule;

    async fn load(&self) -> Result<NativeModule, LoadError> {
        Ok(NativeModule::new(self.width, self.height))
    }
}
