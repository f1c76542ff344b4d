//! Packaging for the browser build.
//!
//! A [`BuildDescriptor`] names one entry script, one output file and the
//! static assets copied next to it. [`bundle`] writes exactly those files.

pub mod bundle;
pub mod descriptor;
pub mod overrides;

pub use bundle::{bundle, BuildReport, Emitted};
pub use descriptor::{BuildDescriptor, Output, PackError};
pub use overrides::Overrides;
