use std::cell::RefCell;
use std::rc::Rc;

use gloo_net::http::Request;
use mapview::{
    IconError, IconImage, IconLoader, MapEngine, MapError, MapHandle, MapOptions, MarkerSpec,
    StyleFetcher, scaled_size,
};
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::dom::{OneShot, document, js_message};

// MapLibre GL JS and the pmtiles protocol are loaded by the page as globals.
#[wasm_bindgen(inline_js = r#"
export function landing_register_protocol(name) {
    if (!window.maplibregl) throw new Error('maplibregl is not loaded');
    if (!window.pmtiles) throw new Error('pmtiles is not loaded');
    const protocol = new window.pmtiles.Protocol();
    window.maplibregl.addProtocol(name, protocol.tile);
}

export function landing_create_map(options) {
    if (!window.maplibregl) throw new Error('maplibregl is not loaded');
    return new window.maplibregl.Map(options);
}

export function landing_add_navigation(map, position) {
    map.addControl(new window.maplibregl.NavigationControl(), position);
}

export function landing_add_marker(map, lngLat, color, popupHtml) {
    const marker = new window.maplibregl.Marker({ color }).setLngLat(lngLat);
    if (popupHtml) {
        marker.setPopup(new window.maplibregl.Popup().setHTML(popupHtml));
    }
    marker.addTo(map);
}

export function landing_error_message(ev) {
    if (ev && ev.error && ev.error.message) return String(ev.error.message);
    return String(ev);
}
"#)]
extern "C" {
    #[wasm_bindgen(catch)]
    fn landing_register_protocol(name: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn landing_create_map(options: &JsValue) -> Result<JsMap, JsValue>;

    #[wasm_bindgen(catch)]
    fn landing_add_navigation(map: &JsMap, position: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn landing_add_marker(
        map: &JsMap,
        lng_lat: &JsValue,
        color: &str,
        popup_html: Option<String>,
    ) -> Result<(), JsValue>;

    fn landing_error_message(event: &JsValue) -> String;

    type JsMap;

    #[wasm_bindgen(method)]
    fn once(this: &JsMap, event: &str, listener: &JsValue);

    #[wasm_bindgen(method)]
    fn on(this: &JsMap, event: &str, listener: &JsValue);

    #[wasm_bindgen(method)]
    fn off(this: &JsMap, event: &str, listener: &JsValue);

    #[wasm_bindgen(method, js_name = remove)]
    fn destroy(this: &JsMap);

    #[wasm_bindgen(method, catch, js_name = addSource)]
    fn add_source(this: &JsMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = addLayer)]
    fn add_layer(this: &JsMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = hasImage)]
    fn has_image(this: &JsMap, name: &str) -> bool;

    #[wasm_bindgen(method, catch, js_name = addImage)]
    fn add_image(this: &JsMap, name: &str, image: &JsValue) -> Result<(), JsValue>;
}

fn to_js(value: &Value) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&text)
}

fn set(target: &js_sys::Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    js_sys::Reflect::set(target, &JsValue::from_str(key), value)?;
    Ok(())
}

/// MapLibre GL JS behind the [`MapEngine`] seam.
#[derive(Default)]
pub struct MapLibreEngine;

impl MapEngine for MapLibreEngine {
    fn register_protocol(&self, name: &str) -> Result<(), MapError> {
        landing_register_protocol(name).map_err(|e| MapError::Protocol(js_message(&e)))
    }

    fn create_map(&self, options: &MapOptions) -> Result<Rc<dyn MapHandle>, MapError> {
        let construct = |e: JsValue| MapError::Construct(js_message(&e));

        let js_options = js_sys::Object::new();
        set(&js_options, "container", &JsValue::from_str(&options.container)).map_err(construct)?;
        set(&js_options, "style", &to_js(&options.style).map_err(construct)?).map_err(construct)?;
        set(&js_options, "center", &lng_lat(options.center)).map_err(construct)?;
        set(&js_options, "zoom", &JsValue::from_f64(options.zoom)).map_err(construct)?;
        set(
            &js_options,
            "attributionControl",
            &JsValue::from_bool(options.attribution_control),
        )
        .map_err(construct)?;

        let map = landing_create_map(&js_options).map_err(construct)?;
        Ok(Rc::new(MapLibreMap {
            map,
            listeners: RefCell::new(Vec::new()),
        }))
    }
}

fn lng_lat(position: foundation::LngLat) -> JsValue {
    let [lng, lat] = position.to_array();
    let array = js_sys::Array::new();
    array.push(&JsValue::from_f64(lng));
    array.push(&JsValue::from_f64(lat));
    array.into()
}

/// A live `maplibregl.Map`.
pub struct MapLibreMap {
    map: JsMap,
    /// Error listeners stay registered until the map is removed.
    listeners: RefCell<Vec<Closure<dyn FnMut(JsValue)>>>,
}

impl MapHandle for MapLibreMap {
    fn add_navigation_control(&self, position: &str) -> Result<(), MapError> {
        landing_add_navigation(&self.map, position).map_err(|e| MapError::Construct(js_message(&e)))
    }

    fn on_load(&self, callback: Box<dyn FnOnce()>) {
        self.map.once("load", &Closure::once_into_js(move || callback()));
    }

    fn on_error(&self, mut callback: Box<dyn FnMut(MapError)>) {
        let listener = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            callback(MapError::Runtime(landing_error_message(&event)));
        });
        self.map.on("error", listener.as_ref());
        self.listeners.borrow_mut().push(listener);
    }

    fn add_marker(&self, marker: &MarkerSpec) -> Result<(), MapError> {
        landing_add_marker(
            &self.map,
            &lng_lat(marker.position),
            &marker.color,
            marker.popup_html.clone(),
        )
        .map_err(|e| MapError::Layer(js_message(&e)))
    }

    fn add_source(&self, id: &str, source: &Value) -> Result<(), MapError> {
        let layer_err = |e: JsValue| MapError::Layer(js_message(&e));
        self.map
            .add_source(id, &to_js(source).map_err(layer_err)?)
            .map_err(layer_err)
    }

    fn add_layer(&self, layer: &Value) -> Result<(), MapError> {
        let layer_err = |e: JsValue| MapError::Layer(js_message(&e));
        self.map
            .add_layer(&to_js(layer).map_err(layer_err)?)
            .map_err(layer_err)
    }

    fn has_image(&self, name: &str) -> bool {
        self.map.has_image(name)
    }

    fn add_image(&self, name: &str, image: &IconImage) -> Result<(), MapError> {
        let layer_err = |e: JsValue| MapError::Layer(js_message(&e));
        let js_image = js_sys::Object::new();
        set(&js_image, "width", &JsValue::from(image.width)).map_err(layer_err)?;
        set(&js_image, "height", &JsValue::from(image.height)).map_err(layer_err)?;
        set(&js_image, "data", &js_sys::Uint8Array::from(&image.data[..])).map_err(layer_err)?;
        self.map.add_image(name, &js_image).map_err(layer_err)
    }

    fn remove(&self) {
        // The closures are freed with the handle, after MapLibre lets go of them.
        for listener in self.listeners.borrow().iter() {
            self.map.off("error", listener.as_ref());
        }
        self.map.destroy();
    }
}

/// Style documents over `fetch`.
#[derive(Default)]
pub struct FetchStyleFetcher;

async fn fetch_json(url: &str) -> Result<Value, MapError> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| MapError::Fetch(e.to_string()))?;
    if !resp.ok() {
        return Err(MapError::Fetch(format!("{url}: HTTP {}", resp.status())));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| MapError::Fetch(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| MapError::Fetch(e.to_string()))
}

impl StyleFetcher for FetchStyleFetcher {
    fn fetch_json(&self, url: &str, done: Box<dyn FnOnce(Result<Value, MapError>)>) {
        let url = url.to_string();
        spawn_local(async move {
            done(fetch_json(&url).await);
        });
    }
}

/// Loads icons through an `<img>` and resamples them on a canvas.
#[derive(Default)]
pub struct CanvasIconLoader;

fn rasterize(image: &HtmlImageElement, target_size: u32) -> Result<IconImage, IconError> {
    let decode = |e: JsValue| IconError::Decode(js_message(&e));
    let (width, height) = scaled_size(image.natural_width(), image.natural_height(), target_size)?;

    let canvas = document()
        .and_then(|d| d.create_element("canvas"))
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().map_err(JsValue::from))
        .map_err(decode)?;
    canvas.set_width(width);
    canvas.set_height(height);

    let ctx = canvas
        .get_context("2d")
        .map_err(decode)?
        .ok_or_else(|| IconError::Decode("no 2d context".to_string()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|e| decode(e.into()))?;
    ctx.draw_image_with_html_image_element_and_dw_and_dh(
        image,
        0.0,
        0.0,
        f64::from(width),
        f64::from(height),
    )
    .map_err(decode)?;

    let pixels = ctx
        .get_image_data(0.0, 0.0, f64::from(width), f64::from(height))
        .map_err(decode)?;
    Ok(IconImage::new(width, height, pixels.data().0))
}

impl IconLoader for CanvasIconLoader {
    fn load(&self, url: &str, target_size: u32, done: Box<dyn FnOnce(Result<IconImage, IconError>)>) {
        let image = match HtmlImageElement::new() {
            Ok(image) => image,
            Err(err) => {
                done(Err(IconError::Fetch(js_message(&err))));
                return;
            }
        };
        image.set_cross_origin(Some("anonymous"));

        let once = OneShot::new(done);
        let on_load = once.clone();
        let on_error = once;
        let loaded = image.clone();
        let failed_url = url.to_string();

        image.set_onload(Some(
            Closure::once_into_js(move || on_load.finish(rasterize(&loaded, target_size)))
                .unchecked_ref(),
        ));
        image.set_onerror(Some(
            Closure::once_into_js(move || on_error.finish(Err(IconError::Fetch(failed_url))))
                .unchecked_ref(),
        ));
        image.set_src(url);
    }
}
