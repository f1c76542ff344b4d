//! # trigon
//!
//! A red triangle drawn through a small GL surface, plus the two-phase startup
//! that loads a compiled module and calls into it.
//!
//! ## Quick Start
//!
//! ```
//! use trigon::prelude::*;
//!
//! let loader = NativeLoader::default();
//! let booted = pollster::block_on(boot(&loader, Call::Add(2, 3), &TracingConsole)).unwrap();
//! assert_eq!(booted.outcome, Outcome::Sum(5));
//! ```
//!
//! ## Modules
//!
//! - [`gl`]: backend trait the scene draws through
//! - [`scene`]: shader sources, vertex data and the draw sequence
//! - [`raster`]: software backend and framebuffer
//! - [`module`]: capability set of a loaded module
//! - [`bootstrap`]: loader, caller and diagnostics
//! - [`native`]: in-process module over the software backend

#[path = "core/gl.rs"]
pub mod gl;

#[path = "core/math.rs"]
pub mod math;

#[path = "core/shader.rs"]
mod shader;

#[path = "core/raster.rs"]
pub mod raster;

#[path = "core/scene.rs"]
pub mod scene;

#[path = "core/module.rs"]
pub mod module;

#[path = "core/bootstrap.rs"]
pub mod bootstrap;

#[path = "core/native.rs"]
pub mod native;

/// Prelude module for convenient imports.
///
/// ```
/// use trigon::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bootstrap::{
        boot, invoke, BootError, Booted, Call, Console, LoadError, Loader, Outcome,
        TracingConsole,
    };
    pub use crate::gl::{GlBackend, Rgba, ShaderStage};
    pub use crate::module::{CallError, Drawable, SceneModule};
    pub use crate::native::{NativeLoader, NativeModule};
    pub use crate::raster::{Frame, SoftwareGl};
    pub use crate::scene::{Scene, SceneError};
}
