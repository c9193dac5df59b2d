use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlContextAttributes, XrRenderStateInit, XrSession, XrWebGlLayer};

use snowxr_shared::color::hex_to_rgb;

use crate::scene::Background;
use crate::scenes::BuiltScene;

/// Clear color shown while the equirectangular sky is not drawn.
const SKY_FALLBACK: u32 = 0x9fb4c7;

/// XR-compatible WebGL2 context bound to the canvas, and to the session's
/// base layer while one is running.
pub struct WebGlRenderer {
    canvas: HtmlCanvasElement,
    gl: Gl,
    layer: Option<XrWebGlLayer>,
}

impl WebGlRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let attributes = WebGlContextAttributes::new();
        attributes.set_antialias(true);
        attributes.set_xr_compatible(true);
        let gl = canvas
            .get_context_with_context_options("webgl2", &attributes)?
            .ok_or_else(|| JsValue::from_str("WebGL2 is not available"))?
            .dyn_into::<Gl>()?;
        Ok(Self {
            canvas,
            gl,
            layer: None,
        })
    }

    pub fn bind_session(&mut self, session: &XrSession) -> Result<(), JsValue> {
        let layer = XrWebGlLayer::new_with_web_gl2_rendering_context(session, &self.gl)?;
        let state = XrRenderStateInit::new();
        state.set_base_layer(Some(&layer));
        session.update_render_state_with_state(&state);
        self.layer = Some(layer);
        log::info!("renderer bound to XR session");
        Ok(())
    }

    pub fn unbind(&mut self) {
        if self.layer.take().is_some() {
            log::info!("renderer released XR session");
        }
    }

    pub fn is_presenting(&self) -> bool {
        self.layer.is_some()
    }

    /// Match the drawing buffer to the canvas' CSS size.
    pub fn resize(&self, width: u32, height: u32, pixel_ratio: f64) {
        self.canvas.set_width((width as f64 * pixel_ratio) as u32);
        self.canvas.set_height((height as f64 * pixel_ratio) as u32);
    }

    pub fn aspect(&self) -> f32 {
        let height = self.canvas.height().max(1);
        self.canvas.width() as f32 / height as f32
    }

    pub fn render(&self, scene: &BuiltScene) {
        let (width, height) = match &self.layer {
            Some(layer) => {
                self.gl.bind_framebuffer(Gl::FRAMEBUFFER, layer.framebuffer().as_ref());
                (layer.framebuffer_width(), layer.framebuffer_height())
            }
            None => {
                self.gl.bind_framebuffer(Gl::FRAMEBUFFER, None);
                (self.canvas.width(), self.canvas.height())
            }
        };
        self.gl.viewport(0, 0, width as i32, height as i32);

        let [r, g, b] = match &scene.scene.background {
            Background::Color(hex) => hex_to_rgb(*hex),
            Background::Equirectangular(_) => hex_to_rgb(SKY_FALLBACK),
        };
        self.gl.clear_color(r, g, b, 1.0);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
    }
}
