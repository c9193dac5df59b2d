//! DOM overlays: the loading bar and the VR entry button.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlAnchorElement, HtmlButtonElement, HtmlElement};

use crate::progress::ProgressDisplay;
use crate::session::{Capability, LABEL_NEEDS_HTTPS, LABEL_NOT_AVAILABLE, OPACITY_HOVER, OPACITY_IDLE};

const IMMERSIVE_WEB_URL: &str = "https://immersiveweb.dev/";

fn create(document: &Document, tag: &str) -> Result<HtmlElement, JsValue> {
    document.create_element(tag)?.dyn_into::<HtmlElement>().map_err(JsValue::from)
}

fn set_styles(element: &HtmlElement, styles: &[(&str, &str)]) -> Result<(), JsValue> {
    let style = element.style();
    for (name, value) in styles {
        style.set_property(name, value)?;
    }
    Ok(())
}

fn warn_on_err(result: Result<(), JsValue>, what: &str) {
    if let Err(err) = result {
        log::warn!("{what}: {err:?}");
    }
}

// ── Loading bar ──

/// Full-page overlay with a progress bar and a status line.
pub struct LoadingBar {
    document: Document,
    root: HtmlElement,
    level: HtmlElement,
    text: HtmlElement,
    fade: Option<Closure<dyn FnMut()>>,
}

impl LoadingBar {
    pub fn new(document: &Document) -> Result<Self, JsValue> {
        let root = create(document, "div")?;
        root.set_id("loadingDiv");
        set_styles(
            &root,
            &[
                ("position", "fixed"),
                ("left", "0"),
                ("top", "0"),
                ("height", "100vh"),
                ("width", "100%"),
                ("pointer-events", "none"),
                ("opacity", "1"),
                ("background-color", "black"),
                ("transition", "opacity 1.5s ease"),
            ],
        )?;

        let center = create(document, "div")?;
        set_styles(
            &center,
            &[
                ("display", "flex"),
                ("align-items", "center"),
                ("justify-content", "center"),
                ("min-height", "100%"),
                ("text-align", "center"),
            ],
        )?;

        let container = create(document, "div")?;
        set_styles(&container, &[("color", "rgba(66, 135, 245, 1)"), ("text-align", "center")])?;

        let heading = create(document, "h3")?;
        heading.set_text_content(Some("Please hang tight.."));
        set_styles(&heading, &[("font-size", "1.125rem"), ("line-height", "1.5rem"), ("font-weight", "500")])?;

        let track = create(document, "div")?;
        set_styles(
            &track,
            &[
                ("width", "100%"),
                ("background-color", "gray"),
                ("border-radius", "9999px"),
                ("height", "0.625rem"),
            ],
        )?;

        let level = create(document, "div")?;
        set_styles(
            &level,
            &[
                ("width", "0%"),
                ("background-color", "blue"),
                ("height", "0.625rem"),
                ("border-radius", "9999px"),
            ],
        )?;

        let text = create(document, "p")?;

        track.append_child(&level)?;
        container.append_child(&heading)?;
        container.append_child(&track)?;
        container.append_child(&text)?;
        center.append_child(&container)?;
        root.append_child(&center)?;

        Ok(Self {
            document: document.clone(),
            root,
            level,
            text,
            fade: None,
        })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.root
    }
}

impl ProgressDisplay for LoadingBar {
    fn show(&mut self) {
        match self.document.body() {
            Some(body) => {
                if let Err(err) = body.append_child(&self.root) {
                    log::warn!("could not show loading bar: {err:?}");
                }
            }
            None => log::warn!("document has no body; loading bar not shown"),
        }
    }

    /// Fade out, then detach once the opacity transition finishes.
    fn hide(&mut self) {
        let root = self.root.clone();
        let on_end = Closure::<dyn FnMut()>::new(move || root.remove());
        warn_on_err(
            self.root
                .add_event_listener_with_callback("transitionend", on_end.as_ref().unchecked_ref()),
            "loading bar transitionend listener",
        );
        warn_on_err(self.root.style().set_property("opacity", "0"), "loading bar fade");
        self.fade = Some(on_end);
    }

    fn set_progress(&mut self, percent: &str) {
        warn_on_err(self.level.style().set_property("width", percent), "loading bar width");
    }

    fn set_text(&mut self, text: &str) {
        self.text.set_text_content(Some(text));
    }
}

// ── VR button ──

const BUTTON_STYLES: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("bottom", "20px"),
    ("padding", "12px 6px"),
    ("border", "1px solid #fff"),
    ("border-radius", "4px"),
    ("background", "rgba(0,0,0,0.1)"),
    ("color", "#fff"),
    ("font", "normal 13px sans-serif"),
    ("text-align", "center"),
    ("opacity", OPACITY_IDLE),
    ("outline", "none"),
    ("z-index", "999"),
];

/// The VR entry element: a button, or a help link when WebXR is missing.
pub struct VrButton {
    element: HtmlElement,
    handlers: Vec<Closure<dyn FnMut()>>,
}

impl VrButton {
    pub fn create(document: &Document, capability: &Capability) -> Result<Self, JsValue> {
        let element = match capability {
            Capability::Unavailable { secure_context } => {
                let link = document.create_element("a")?.dyn_into::<HtmlAnchorElement>()?;
                if *secure_context {
                    link.set_href(IMMERSIVE_WEB_URL);
                    link.set_text_content(Some(LABEL_NOT_AVAILABLE));
                } else {
                    let href = document.location().map(|l| l.href()).transpose()?.unwrap_or_default();
                    link.set_href(&href.replacen("http:", "https:", 1));
                    link.set_text_content(Some(LABEL_NEEDS_HTTPS));
                }
                let element: HtmlElement = link.unchecked_into();
                set_styles(&element, &[("left", "calc(50% - 90px)"), ("width", "180px"), ("text-decoration", "none")])?;
                element
            }
            _ => {
                let button = document.create_element("button")?.dyn_into::<HtmlButtonElement>()?;
                button.set_id("VRButton");
                button.unchecked_into()
            }
        };
        set_styles(&element, BUTTON_STYLES)?;

        if let Some(body) = document.body() {
            body.append_child(&element)?;
        }

        Ok(Self {
            element,
            handlers: Vec::new(),
        })
    }

    pub fn set_label(&self, label: &str) {
        self.element.set_text_content(Some(label));
    }

    /// Clickable with hover highlighting.
    pub fn enable(&mut self, on_click: impl FnMut() + 'static) -> Result<(), JsValue> {
        set_styles(&self.element, &[("cursor", "pointer"), ("left", "calc(50% - 50px)"), ("width", "100px")])?;

        let hover_target = self.element.clone();
        let on_enter = Closure::<dyn FnMut()>::new(move || {
            warn_on_err(hover_target.style().set_property("opacity", OPACITY_HOVER), "button hover");
        });
        let leave_target = self.element.clone();
        let on_leave = Closure::<dyn FnMut()>::new(move || {
            warn_on_err(leave_target.style().set_property("opacity", OPACITY_IDLE), "button hover");
        });
        let on_click = Closure::<dyn FnMut()>::new(on_click);

        self.element.set_onmouseenter(Some(on_enter.as_ref().unchecked_ref()));
        self.element.set_onmouseleave(Some(on_leave.as_ref().unchecked_ref()));
        self.element.set_onclick(Some(on_click.as_ref().unchecked_ref()));
        self.handlers = vec![on_enter, on_leave, on_click];
        Ok(())
    }

    /// Inert, showing `label`.
    pub fn disable(&mut self, label: &str) -> Result<(), JsValue> {
        if self.element.tag_name().eq_ignore_ascii_case("button") {
            set_styles(&self.element, &[("cursor", "auto"), ("left", "calc(50% - 75px)"), ("width", "150px")])?;
        }
        self.element.set_onmouseenter(None);
        self.element.set_onmouseleave(None);
        self.element.set_onclick(None);
        self.handlers.clear();
        self.set_label(label);
        Ok(())
    }
}
