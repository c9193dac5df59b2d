//! Browser runtime: start-up, the animation-frame loops, and the glue between
//! DOM/WebXR events and the pure state machines.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{HtmlCanvasElement, Window, XrFrame, XrInputSource, XrInputSourceEvent, XrInputSourcesChangeEvent, XrSession};

use crate::assets::{self, AssetManifest, AssetRegistry, ModelAsset};
use crate::config::AppConfig;
use crate::controller::ControllerEvent;
use crate::dom::{LoadingBar, VrButton};
use crate::error::{describe_js, SceneError, SessionError};
use crate::fetch::FetchLoader;
use crate::input::{FrameClock, FrameInput};
use crate::progress::{LoadingProgress, ProgressDisplay};
use crate::render::WebGlRenderer;
use crate::scenes::{ActiveScene, SceneContext, SceneKind};
use crate::session::{ButtonEvent, SessionButton, SessionCommand};
use crate::xr::{self, XrBinding};

type Shared = Rc<RefCell<Runtime>>;

/// Everything the page keeps alive between frames.
pub struct Runtime {
    config: AppConfig,
    window: Window,
    active: ActiveScene,
    renderer: WebGlRenderer,
    button: SessionButton<XrSession>,
    button_el: VrButton,
    binding: Option<XrBinding>,
    clock: FrameClock,
    input: FrameInput,
    // Held until its fade-out listener has run.
    _loading: Option<LoadingBar>,
}

impl Runtime {
    fn frame(&mut self, time: f64, frame: Option<&XrFrame>) {
        self.input.clear();
        self.input.dt = self.clock.tick(time);
        self.input.session_active = false;
        if let (Some(frame), Some(binding)) = (frame, &self.binding) {
            binding.gather_input(frame, &mut self.input);
        }
        self.active.update(&self.input);
        self.renderer.render(self.active.built());
    }

    fn forward(&mut self, events: impl IntoIterator<Item = (usize, ControllerEvent)>) {
        if let Some(rig) = self.active.controllers_mut() {
            for (slot, event) in events {
                rig.push_event(slot, event);
            }
        }
    }

    fn fit_to_window(&mut self) {
        if self.renderer.is_presenting() {
            return;
        }
        let width = self.window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(0.0);
        let height = self.window.inner_height().ok().and_then(|h| h.as_f64()).unwrap_or(0.0);
        self.renderer
            .resize(width as u32, height as u32, self.window.device_pixel_ratio());
        let aspect = self.renderer.aspect();
        self.active.built_mut().set_aspect(aspect);
    }
}

/// Build the selected scene and start rendering into `canvas_id`.
pub async fn launch(canvas_id: &str) -> Result<(), SceneError> {
    let config = AppConfig::embedded()?;
    let window = web_sys::window().ok_or_else(|| SceneError::Host("no window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| SceneError::Host("no document".into()))?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| SceneError::Host(format!("canvas `{canvas_id}` not found")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| SceneError::Host(format!("`{canvas_id}` is not a canvas")))?;

    let granted = xr::watch_session_granted(&window);
    let query = window.location().search().unwrap_or_default();
    let kind = SceneKind::from_name(&config.scene_from_query(&query))?;

    let renderer = WebGlRenderer::new(canvas)?;
    let aspect = renderer.aspect();

    let (active, loading) = if kind.needs_assets() {
        let mut progress = LoadingProgress::new(LoadingBar::new(&document)?);
        progress.display_mut().show();
        let manifest = AssetManifest::new(config.assets.models_dir.clone(), config.assets.models.iter().cloned());
        let loader = FetchLoader::new(config.assets.base_path.clone());
        let registry = assets::load_all(&loader, &manifest, &mut progress).await?;
        let active = ActiveScene::create(
            kind,
            &SceneContext {
                config: &config,
                assets: &registry,
                aspect,
            },
        )?;
        let mut bar = progress.into_display();
        bar.hide();
        (active, Some(bar))
    } else {
        let active = ActiveScene::create(
            kind,
            &SceneContext {
                config: &config,
                assets: &AssetRegistry::<ModelAsset>::default(),
                aspect,
            },
        )?;
        (active, None)
    };

    let capability = xr::probe_capability(&window).await;
    let button_el = VrButton::create(&document, &capability)?;
    let (button, commands) = SessionButton::new(capability, granted.get());
    button_el.set_label(button.label());
    let enabled = button.is_enabled();

    let shared: Shared = Rc::new(RefCell::new(Runtime {
        config,
        window: window.clone(),
        active,
        renderer,
        button,
        button_el,
        binding: None,
        clock: FrameClock::default(),
        input: FrameInput::default(),
        _loading: loading,
    }));

    {
        let mut rt = shared.borrow_mut();
        rt.fit_to_window();
        let label = rt.button.label();
        if enabled {
            let target = shared.clone();
            rt.button_el.enable(move || dispatch(&target, ButtonEvent::Click))?;
        } else {
            rt.button_el.disable(label)?;
        }
    }

    let on_resize_target = shared.clone();
    let on_resize = Closure::<dyn FnMut()>::new(move || on_resize_target.borrow_mut().fit_to_window());
    window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
    on_resize.forget();

    run_commands(&shared, commands);
    start_window_loop(&shared, &window)?;
    log::info!("{kind:?} scene running");
    Ok(())
}

/// Feed one button event through the state machine and carry out its commands.
fn dispatch(shared: &Shared, event: ButtonEvent<XrSession>) {
    let commands = {
        let mut rt = shared.borrow_mut();
        let commands = rt.button.dispatch(event);
        let label = rt.button.label();
        rt.button_el.set_label(label);
        commands
    };
    run_commands(shared, commands);
}

fn run_commands(shared: &Shared, commands: Vec<SessionCommand<XrSession>>) {
    for command in commands {
        match command {
            SessionCommand::RequestSession => {
                let promise = {
                    let rt = shared.borrow();
                    xr::request_session(&rt.window, &rt.config.session.optional_features)
                };
                let target = shared.clone();
                spawn_local(async move {
                    let event = match JsFuture::from(promise).await.and_then(|s| s.dyn_into::<XrSession>()) {
                        Ok(session) => ButtonEvent::Resolved(session),
                        Err(err) => ButtonEvent::Rejected(SessionError::RequestRejected(describe_js(&err))),
                    };
                    dispatch(&target, event);
                });
            }
            SessionCommand::BindRenderer(session) => {
                if let Err(err) = bind_session(shared, &session) {
                    log::error!("could not start XR rendering: {}", describe_js(&err));
                    let _ = session.end();
                }
            }
            SessionCommand::EndSession(session) => {
                let _ = session.end();
            }
            SessionCommand::UnbindRenderer => {
                let mut rt = shared.borrow_mut();
                rt.renderer.unbind();
                if let Some(mut binding) = rt.binding.take() {
                    let events = binding.disconnect_all();
                    rt.forward(events);
                }
                rt.fit_to_window();
            }
        }
    }
}

fn bind_session(shared: &Shared, session: &XrSession) -> Result<(), JsValue> {
    {
        let mut rt = shared.borrow_mut();
        rt.renderer.bind_session(session)?;
        let slots = rt
            .active
            .controllers_mut()
            .map(|rig| rig.slots().len())
            .unwrap_or(0);
        rt.binding = Some(XrBinding::new(session.clone(), slots));
    }
    listen_session_events(shared, session)?;

    let sources = session.input_sources();
    let present: Vec<XrInputSource> = (0..sources.length()).filter_map(|i| sources.get(i)).collect();
    connect_sources(shared, present);

    let target = shared.clone();
    let session = session.clone();
    spawn_local(async move {
        match xr::reference_space(&session).await {
            Ok(space) => {
                let mut rt = target.borrow_mut();
                match rt.binding.as_mut() {
                    Some(binding) if binding.session == session => binding.reference_space = Some(space),
                    _ => return,
                }
            }
            Err(err) => log::error!("no XR reference space: {}", describe_js(&err)),
        }
        start_xr_loop(&target, &session);
    });
    Ok(())
}

fn connect_sources(shared: &Shared, sources: impl IntoIterator<Item = XrInputSource>) {
    let mut rt = shared.borrow_mut();
    let Some(binding) = rt.binding.as_mut() else { return };
    let events: Vec<_> = sources.into_iter().filter_map(|s| binding.connect(s)).collect();
    rt.forward(events);
}

fn listen_session_events(shared: &Shared, session: &XrSession) -> Result<(), JsValue> {
    let target = shared.clone();
    let on_end = Closure::<dyn FnMut()>::new(move || dispatch(&target, ButtonEvent::SessionEnded));
    session.add_event_listener_with_callback("end", on_end.as_ref().unchecked_ref())?;
    on_end.forget();

    for (name, select) in [("selectstart", ControllerEvent::SelectStart), ("selectend", ControllerEvent::SelectEnd)] {
        let target = shared.clone();
        let on_select = Closure::<dyn FnMut(XrInputSourceEvent)>::new(move |event: XrInputSourceEvent| {
            let mut rt = target.borrow_mut();
            let slot = rt.binding.as_ref().and_then(|b| b.slot_of(&event.input_source()));
            if let Some(slot) = slot {
                rt.forward([(slot, select)]);
            }
        });
        session.add_event_listener_with_callback(name, on_select.as_ref().unchecked_ref())?;
        on_select.forget();
    }

    let target = shared.clone();
    let on_change = Closure::<dyn FnMut(XrInputSourcesChangeEvent)>::new(move |event: XrInputSourcesChangeEvent| {
        {
            let mut rt = target.borrow_mut();
            let removed: Vec<_> = match rt.binding.as_mut() {
                Some(binding) => event
                    .removed()
                    .iter()
                    .filter_map(|s| s.dyn_into::<XrInputSource>().ok())
                    .filter_map(|s| binding.disconnect(&s))
                    .collect(),
                None => Vec::new(),
            };
            rt.forward(removed);
        }
        let added = event
            .added()
            .iter()
            .filter_map(|s| s.dyn_into::<XrInputSource>().ok());
        connect_sources(&target, added);
    });
    session.add_event_listener_with_callback("inputsourceschange", on_change.as_ref().unchecked_ref())?;
    on_change.forget();
    Ok(())
}

/// Session-driven frames. Stops as soon as the session is no longer bound.
fn start_xr_loop(shared: &Shared, session: &XrSession) {
    let next: Rc<RefCell<Option<Closure<dyn FnMut(f64, XrFrame)>>>> = Rc::new(RefCell::new(None));
    let this = next.clone();
    let target = shared.clone();
    *this.borrow_mut() = Some(Closure::new(move |time: f64, frame: XrFrame| {
        let session = frame.session();
        {
            let mut rt = target.borrow_mut();
            let bound = rt.binding.as_ref().map(|b| b.session == session).unwrap_or(false);
            if !bound {
                return;
            }
            rt.frame(time, Some(&frame));
        }
        if let Some(callback) = next.borrow().as_ref() {
            session.request_animation_frame(callback.as_ref().unchecked_ref());
        }
    }));
    if let Some(callback) = this.borrow().as_ref() {
        session.request_animation_frame(callback.as_ref().unchecked_ref());
    }
}

/// Page frames while no session is bound.
fn start_window_loop(shared: &Shared, window: &Window) -> Result<(), JsValue> {
    let next: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let this = next.clone();
    let target = shared.clone();
    let frame_window = window.clone();
    *this.borrow_mut() = Some(Closure::new(move |time: f64| {
        {
            let mut rt = target.borrow_mut();
            if rt.binding.is_none() {
                rt.frame(time, None);
            }
        }
        if let Some(callback) = next.borrow().as_ref() {
            if let Err(err) = frame_window.request_animation_frame(callback.as_ref().unchecked_ref()) {
                log::error!("requestAnimationFrame failed: {}", describe_js(&err));
            }
        }
    }));
    if let Some(callback) = this.borrow().as_ref() {
        window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    }
    Ok(())
}
