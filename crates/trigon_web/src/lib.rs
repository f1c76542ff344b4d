//! Browser build of the triangle scene.
//!
//! Exports `Scene.new()`, `scene.draw()` and `add(a, b)` through wasm-bindgen.
//! This crate is a stub by default so the workspace builds on native targets
//! without a wasm toolchain.
//!
//! Enable the real exports with: `--features web` (and a wasm32 target).
//! A page that runs as-is in a browser is built in two steps:
//!
//! ```text
//! wasm-pack build crates/trigon_web --target web --out-dir dist/pkg -- --features web
//! trigon-pack --config crates/trigon_web/pack.json
//! ```
//!
//! `static/boot.js` (packaged as `dist/main.js`) waits for the page `load`
//! event, initializes `./pkg/trigon_web.js` and draws. `static/main.js` and
//! `static/add.js` use `import('../pkg')` instead and need a bundler that
//! resolves the directory import.

#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
pub use trigon::math::add;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use web::{add, Scene};

#[cfg(all(test, not(all(feature = "web", target_arch = "wasm32"))))]
mod tests {
    #[test]
    fn native_stub_still_adds() {
        assert_eq!(super::add(2, 3), 5);
    }

    #[test]
    fn web_build_enables_console_logging() {
        let manifest = include_str!("../Cargo.toml");
        let features = manifest
            .split_once("web-sys = ")
            .map(|(_, rest)| rest)
            .unwrap_or_default();
        assert!(features.contains("\"console\""));
        assert!(include_str!("web.rs").contains("console::error_1"));
    }
}
