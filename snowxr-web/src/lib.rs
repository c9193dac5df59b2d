//! SnowXR WASM runtime
//!
//! Builds a snow scene with a highlightable sphere and torch-carrying VR
//! controllers, streams its models behind a loading bar, and offers an
//! immersive-vr session through a DOM button. The scene graph, controller
//! and session state machines are plain Rust and tested natively; the
//! browser glue only compiles for `wasm32`.

pub mod assets;
pub mod config;
pub mod controller;
pub mod error;
pub mod handle;
pub mod input;
pub mod locomotion;
pub mod progress;
pub mod scene;
pub mod scenes;
pub mod session;
pub mod torch;
pub mod transform;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod fetch;
#[cfg(target_arch = "wasm32")]
mod render;
#[cfg(target_arch = "wasm32")]
mod xr;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Called when the WASM module loads.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let level = config::AppConfig::embedded()
        .map(|c| c.log_level())
        .unwrap_or(log::Level::Info);
    if console_log::init_with_level(level).is_err() {
        log::warn!("logger was already initialized");
    }
    log::info!("SnowXR runtime initialized");
}

/// Build the scene selected by `?scene=` and start rendering into the
/// canvas with id `canvas_id`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn launch(canvas_id: String) -> Result<(), JsValue> {
    app::launch(&canvas_id).await.map_err(|err| {
        log::error!("{err}");
        JsValue::from(err)
    })
}
