//! Native host for compiled trigon modules.
//!
//! Reads a `.wasm` file, checks it is a core wasm binary, instantiates it with
//! wasmtime and exposes its `add` / `scene_new` / `scene_draw` exports through
//! [`trigon::module::SceneModule`], so the shared bootstrap can drive it.

pub mod artifact;
pub mod runtime;

pub use runtime::{HostOptions, WasmLoader, WasmModule, WasmScene, DEFAULT_MODULE_PATH};
