//! Capability set a loaded module exposes.
//!
//! Anything that can build a drawable scene and add two integers can stand in
//! for the compiled module: the in-process [`crate::native::NativeModule`], a
//! wasm instance driven by a host runtime, or a test double.

use thiserror::Error;

use crate::gl::GlBackend;
use crate::scene::{Scene, SceneError};

/// Failure of a call into an already loaded module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("module does not export `{0}`")]
    MissingExport(String),
    #[error("export `{name}` has an unexpected signature: {reason}")]
    Signature { name: String, reason: String },
    #[error("module trapped: {0}")]
    Trap(String),
    #[error("scene construction failed: {0}")]
    Construct(String),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Value returned by the module's zero-argument scene factory.
pub trait Drawable {
    fn draw(&self) -> Result<(), CallError>;
}

pub trait SceneModule {
    type Scene: Drawable;

    /// Zero-argument factory.
    fn new_scene(&self) -> Result<Self::Scene, CallError>;

    fn add(&self, a: i32, b: i32) -> Result<i32, CallError>;
}

impl<B: GlBackend> Drawable for Scene<B> {
    fn draw(&self) -> Result<(), CallError> {
        Scene::draw(self).map_err(CallError::from)
    }
}
