use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use linking::Navigator;
use preview::{ElementId, ImageError, ImageProbe, MetaField, PageEnv, PageSurface};
use runtime::{Task, TaskScheduler};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, HtmlIFrameElement, HtmlImageElement, Window};

pub(crate) fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

pub(crate) fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

pub(crate) fn js_message(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    format!("{err:?}")
}

/// Read the current location and user agent.
pub fn page_env() -> Result<PageEnv, JsValue> {
    let window = window()?;
    let location = window.location();
    Ok(PageEnv {
        href: location.href()?,
        origin: location.origin()?,
        search: location.search()?,
        user_agent: window.navigator().user_agent()?,
    })
}

/// Writes into the page template by element id.
pub struct DomSurface {
    document: Document,
}

impl DomSurface {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn element(&self, id: &str) -> Option<web_sys::Element> {
        let found = self.document.get_element_by_id(id);
        if found.is_none() {
            tracing::debug!(id, "element missing from page");
        }
        found
    }

    fn html_element(&self, id: ElementId) -> Option<HtmlElement> {
        self.element(id.dom_id())?.dyn_into::<HtmlElement>().ok()
    }
}

impl PageSurface for DomSurface {
    fn set_text(&self, id: ElementId, text: &str) {
        if let Some(el) = self.element(id.dom_id()) {
            el.set_text_content(Some(text));
        }
    }

    fn set_icon_text(&self, id: ElementId, icon_class: &str, text: &str) {
        let Some(el) = self.element(id.dom_id()) else {
            return;
        };
        el.set_text_content(None);
        let appended = self.document.create_element("i").and_then(|icon| {
            icon.set_class_name(icon_class);
            el.append_child(&icon)?;
            el.append_child(&self.document.create_text_node(&format!(" {text}")))?;
            Ok(())
        });
        if let Err(err) = appended {
            tracing::warn!("failed to write {}: {}", id.dom_id(), js_message(&err));
        }
    }

    fn set_meta(&self, field: MetaField, content: &str) {
        if let Some(el) = self.element(field.dom_id()) {
            if let Err(err) = el.set_attribute("content", content) {
                tracing::warn!("failed to set {}: {}", field.dom_id(), js_message(&err));
            }
        }
    }

    fn set_visible(&self, id: ElementId, visible: bool) {
        let Some(el) = self.html_element(id) else {
            return;
        };
        let display = if visible { "block" } else { "none" };
        if let Err(err) = el.style().set_property("display", display) {
            tracing::warn!("failed to toggle {}: {}", id.dom_id(), js_message(&err));
        }
    }

    fn set_image_src(&self, id: ElementId, src: &str) {
        let image = self
            .element(id.dom_id())
            .and_then(|el| el.dyn_into::<HtmlImageElement>().ok());
        if let Some(image) = image {
            image.set_src(src);
        }
    }
}

/// Hands app URLs to the browser.
pub struct BrowserNavigator {
    window: Window,
}

impl BrowserNavigator {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    fn try_open_hidden_frame(&self, url: &str) -> Result<(), JsValue> {
        let document = self
            .window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let frame = document
            .create_element("iframe")?
            .dyn_into::<HtmlIFrameElement>()?;
        frame.style().set_property("display", "none")?;
        frame.set_src(url);
        document
            .body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&frame)?;
        Ok(())
    }
}

impl Navigator for BrowserNavigator {
    fn open_hidden_frame(&self, url: &str) {
        if let Err(err) = self.try_open_hidden_frame(url) {
            tracing::warn!("hidden frame attempt failed: {}", js_message(&err));
        }
    }

    fn navigate(&self, url: &str) {
        if let Err(err) = self.window.location().set_href(url) {
            tracing::warn!("redirect attempt failed: {}", js_message(&err));
        }
    }
}

/// Runs tasks on `setTimeout`. Timers are never cancelled.
#[derive(Default)]
pub struct TimeoutScheduler;

impl TaskScheduler for TimeoutScheduler {
    fn schedule(&self, task: Task) {
        let millis = u32::try_from(task.delay.as_millis()).unwrap_or(u32::MAX);
        tracing::debug!(label = task.label, millis, "scheduling task");
        let run = task.run;
        Timeout::new(millis, run).forget();
    }
}

/// Shared one-shot completion used by callbacks that race (load vs. error).
pub(crate) struct OneShot<T> {
    done: Rc<RefCell<Option<Box<dyn FnOnce(T)>>>>,
}

impl<T> Clone for OneShot<T> {
    fn clone(&self) -> Self {
        Self {
            done: self.done.clone(),
        }
    }
}

impl<T> OneShot<T> {
    pub(crate) fn new(done: Box<dyn FnOnce(T)>) -> Self {
        Self {
            done: Rc::new(RefCell::new(Some(done))),
        }
    }

    pub(crate) fn finish(&self, value: T) {
        let done = self.done.borrow_mut().take();
        if let Some(done) = done {
            done(value);
        }
    }
}

/// Probes image URLs with a detached `<img>`.
#[derive(Default)]
pub struct ImageElementProbe;

impl ImageProbe for ImageElementProbe {
    fn probe(&self, url: &str, done: Box<dyn FnOnce(Result<(), ImageError>)>) {
        let image = match HtmlImageElement::new() {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!("cannot create image element: {}", js_message(&err));
                done(Err(ImageError::NotFound(url.to_string())));
                return;
            }
        };

        let once = OneShot::new(done);
        let on_load = once.clone();
        let on_error = once;
        let missing = url.to_string();

        image.set_onload(Some(
            Closure::once_into_js(move || on_load.finish(Ok(()))).unchecked_ref(),
        ));
        image.set_onerror(Some(
            Closure::once_into_js(move || on_error.finish(Err(ImageError::NotFound(missing))))
                .unchecked_ref(),
        ));
        image.set_src(url);
    }
}
