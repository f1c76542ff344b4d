use js_sys::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{console, HtmlCanvasElement, WebGlRenderingContext};

mod webgl;

use webgl::WebGl;

/// Element id of the canvas the scene draws into.
const CANVAS_ID: &str = "canvas";

/// Log to the browser console, then hand the message back as a JS `Error`.
fn fail(message: &str) -> JsValue {
    console::error_1(&JsValue::from_str(message));
    Error::new(message).into()
}

#[wasm_bindgen]
pub struct Scene {
    inner: trigon::scene::Scene<WebGl>,
}

#[wasm_bindgen]
impl Scene {
    pub fn new() -> Result<Scene, JsValue> {
        let document = web_sys::window()
            .ok_or_else(|| fail("Can't get window"))?
            .document()
            .ok_or_else(|| fail("Can't get document"))?;
        let canvas = document
            .get_element_by_id(CANVAS_ID)
            .ok_or_else(|| fail("Can't get canvas element"))?;
        let canvas = canvas
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| fail("Can't cast element to HtmlCanvasElement"))?;

        let ctx = canvas
            .get_context("webgl")
            .map_err(|e| {
                console::error_1(&e);
                e
            })?
            .ok_or_else(|| fail("Can't get webgl context"))?
            .dyn_into::<WebGlRenderingContext>()
            .map_err(|_| fail("Can't cast context to WebGlRenderingContext"))?;

        Ok(Scene {
            inner: trigon::scene::Scene::new(WebGl::new(ctx)),
        })
    }

    pub fn draw(&self) -> Result<(), JsValue> {
        self.inner.draw().map_err(|e| fail(&e.to_string()))
    }
}

#[wasm_bindgen]
pub fn add(a: i32, b: i32) -> i32 {
    trigon::math::add(a, b)
}
