//! Shared math and light parameters for SnowXR.
//!
//! Kept free of browser bindings so both the wasm runtime and any renderer
//! backend (and native tests) can depend on it.

pub mod color;
pub mod math;
pub mod spotlight;

pub use glam;
