//! WebXR host: capability probing, session requests, and per-frame reads of
//! controller poses and gamepads.

use std::cell::Cell;
use std::rc::Rc;

use glam::Mat4;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Window, XrFrame, XrHandedness, XrInputSource, XrReferenceSpace, XrReferenceSpaceType, XrSession, XrSessionInit,
    XrSessionMode, XrTargetRayMode,
};

use crate::controller::{ControllerEvent, Handedness, TargetRayMode};
use crate::error::describe_js;
use crate::input::{FrameInput, GamepadSnapshot};
use crate::session::Capability;

fn has_xr(window: &Window) -> bool {
    js_sys::Reflect::has(&window.navigator(), &JsValue::from_str("xr")).unwrap_or(false)
}

/// Ask the browser whether immersive-vr sessions can be created.
pub async fn probe_capability(window: &Window) -> Capability {
    if !has_xr(window) {
        return Capability::Unavailable {
            secure_context: window.is_secure_context(),
        };
    }
    match JsFuture::from(window.navigator().xr().is_session_supported(XrSessionMode::ImmersiveVr)).await {
        Ok(supported) if supported.as_bool() == Some(true) => Capability::Supported,
        Ok(_) => Capability::Unsupported,
        Err(err) => Capability::NotAllowed(describe_js(&err)),
    }
}

/// Track `sessiongranted` (fired when the page was navigated to from another
/// immersive page). The flag flips once and stays set.
pub fn watch_session_granted(window: &Window) -> Rc<Cell<bool>> {
    let granted = Rc::new(Cell::new(false));
    if !has_xr(window) {
        return granted;
    }
    let user_agent = window.navigator().user_agent().unwrap_or_default();
    // WebXRViewer aborts script execution on this listener.
    if user_agent.contains("WebXRViewer/") {
        return granted;
    }

    let flag = granted.clone();
    let on_granted = Closure::<dyn FnMut()>::new(move || flag.set(true));
    if let Err(err) = window
        .navigator()
        .xr()
        .add_event_listener_with_callback("sessiongranted", on_granted.as_ref().unchecked_ref())
    {
        log::warn!("could not listen for sessiongranted: {}", describe_js(&err));
    }
    on_granted.forget();
    granted
}

/// Start an immersive-vr request. Must run synchronously inside the user
/// gesture; only awaiting the promise may be deferred.
pub fn request_session(window: &Window, optional_features: &[String]) -> js_sys::Promise {
    let features: js_sys::Array = optional_features.iter().map(|f| JsValue::from_str(f)).collect();
    let init = XrSessionInit::new();
    init.set_optional_features(&features);
    window
        .navigator()
        .xr()
        .request_session_with_options(XrSessionMode::ImmersiveVr, &init)
}

/// `local-floor` when the session granted it, `local` otherwise.
pub async fn reference_space(session: &XrSession) -> Result<XrReferenceSpace, JsValue> {
    match JsFuture::from(session.request_reference_space(XrReferenceSpaceType::LocalFloor)).await {
        Ok(space) => space.dyn_into(),
        Err(err) => {
            log::info!("local-floor unavailable ({}), using local", describe_js(&err));
            JsFuture::from(session.request_reference_space(XrReferenceSpaceType::Local))
                .await?
                .dyn_into()
        }
    }
}

pub fn handedness(value: XrHandedness) -> Handedness {
    match value {
        XrHandedness::Left => Handedness::Left,
        XrHandedness::Right => Handedness::Right,
        _ => Handedness::None,
    }
}

pub fn target_ray_mode(value: XrTargetRayMode) -> TargetRayMode {
    match value {
        XrTargetRayMode::Gaze => TargetRayMode::Gaze,
        XrTargetRayMode::Screen => TargetRayMode::Screen,
        _ => TargetRayMode::TrackedPointer,
    }
}

/// The running session and which input source sits in which controller slot.
pub struct XrBinding {
    pub session: XrSession,
    pub reference_space: Option<XrReferenceSpace>,
    sources: Vec<Option<XrInputSource>>,
}

impl XrBinding {
    pub fn new(session: XrSession, slot_count: usize) -> Self {
        Self {
            session,
            reference_space: None,
            sources: vec![None; slot_count],
        }
    }

    pub fn slot_of(&self, source: &XrInputSource) -> Option<usize> {
        self.sources.iter().position(|s| s.as_ref() == Some(source))
    }

    /// Put a new input source in the first free slot.
    pub fn connect(&mut self, source: XrInputSource) -> Option<(usize, ControllerEvent)> {
        if self.slot_of(&source).is_some() {
            return None;
        }
        let Some(slot) = self.sources.iter().position(Option::is_none) else {
            log::warn!("no free controller slot for {:?} input source", source.handedness());
            return None;
        };
        let event = ControllerEvent::Connected {
            handedness: handedness(source.handedness()),
            target_ray_mode: target_ray_mode(source.target_ray_mode()),
        };
        self.sources[slot] = Some(source);
        Some((slot, event))
    }

    pub fn disconnect(&mut self, source: &XrInputSource) -> Option<(usize, ControllerEvent)> {
        let slot = self.slot_of(source)?;
        self.sources[slot] = None;
        Some((slot, ControllerEvent::Disconnected))
    }

    /// Every occupied slot, emptied. Used when the session goes away.
    pub fn disconnect_all(&mut self) -> Vec<(usize, ControllerEvent)> {
        self.sources
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, source)| source.take().map(|_| (slot, ControllerEvent::Disconnected)))
            .collect()
    }

    /// Fill `input` with this frame's controller poses and gamepads.
    pub fn gather_input(&self, frame: &XrFrame, input: &mut FrameInput) {
        input.session_active = true;
        let Some(space) = &self.reference_space else {
            return;
        };

        for (slot, source) in self.sources.iter().enumerate() {
            let Some(source) = source else { continue };

            if let Some(pose) = frame.get_pose(&source.target_ray_space(), space) {
                let matrix = pose.transform().matrix();
                if matrix.len() == 16 {
                    input.controller_poses.push((slot, Mat4::from_cols_slice(&matrix)));
                }
            }

            if let Some(gamepad) = source.gamepad() {
                input.gamepads.push(GamepadSnapshot {
                    handedness: handedness(source.handedness()),
                    axes: gamepad
                        .axes()
                        .iter()
                        .map(|a| a.as_f64().unwrap_or(0.0) as f32)
                        .collect(),
                });
            }
        }
    }
}
