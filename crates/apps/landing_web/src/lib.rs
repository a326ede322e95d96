//! Browser entry point for the deep-link landing page.
//!
//! The page loads this module and calls [`start_landing`] with its entity
//! type; everything else comes from the current URL.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use console_error_panic_hook::set_once;
use linking::EntityType;
use preview::{DisplayZone, ElementId, LandingConfig, LandingPage, LandingServices};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

mod dom;
mod maplibre;

pub use dom::{BrowserNavigator, DomSurface, ImageElementProbe, TimeoutScheduler, page_env};
pub use maplibre::{CanvasIconLoader, FetchStyleFetcher, MapLibreEngine};

thread_local! {
    static PAGE: RefCell<Option<Rc<LandingPage>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    set_once();
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build(),
    );
}

/// The viewer's time zone as the browser reports it.
struct BrowserZone;

impl DisplayZone for BrowserZone {
    fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
        let date = js_sys::Date::new(&JsValue::from_f64(instant.timestamp_millis() as f64));
        // getTimezoneOffset is minutes *behind* UTC.
        let minutes = date.get_timezone_offset();
        FixedOffset::west_opt((minutes * 60.0) as i32).unwrap_or_else(|| Utc.fix())
    }
}

/// Run the landing page for `entity_type` (`pin`, `event`, `art`, `camp`, ...).
///
/// `config_json` may override any part of [`LandingConfig`].
#[wasm_bindgen]
pub fn start_landing(entity_type: &str, config_json: Option<String>) -> Result<(), JsValue> {
    let config = LandingConfig::from_json(config_json.as_deref().unwrap_or(""))
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let window = dom::window()?;
    let document = dom::document()?;
    let services = LandingServices {
        surface: Rc::new(DomSurface::new(document.clone())),
        navigator: Rc::new(BrowserNavigator::new(window)),
        scheduler: Rc::new(TimeoutScheduler),
        images: Rc::new(ImageElementProbe),
        map_engine: Rc::new(MapLibreEngine),
        style_fetcher: Rc::new(FetchStyleFetcher),
        icon_loader: Rc::new(CanvasIconLoader),
    };

    let page = LandingPage::new(
        EntityType::parse(entity_type),
        page_env()?,
        config,
        Rc::new(BrowserZone),
        services,
    );
    tracing::info!(entity_type, uid = page.intent().uid.as_deref().unwrap_or(""), "landing page");

    bind_open_app_button(&document, &page)?;
    page.start();

    PAGE.with(|slot| *slot.borrow_mut() = Some(page));
    Ok(())
}

/// Re-fire the deep-link sequence from the open-app button.
fn bind_open_app_button(document: &web_sys::Document, page: &Rc<LandingPage>) -> Result<(), JsValue> {
    let Some(button) = document.get_element_by_id(ElementId::OpenAppButton.dom_id()) else {
        tracing::debug!("page has no open-app button");
        return Ok(());
    };
    let button = button.dyn_into::<web_sys::HtmlElement>()?;

    let page = Rc::downgrade(page);
    let on_click = Closure::<dyn FnMut()>::new(move || {
        if let Some(page) = page.upgrade() {
            page.open_app();
        }
    });
    button.set_onclick(Some(on_click.as_ref().unchecked_ref()));
    // The button lives as long as the page.
    on_click.forget();
    Ok(())
}
