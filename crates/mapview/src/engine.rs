use std::rc::Rc;

use foundation::LngLat;
use serde_json::Value;

use crate::icons::{IconError, IconImage};
use crate::style::StyleError;

#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    Protocol(String),
    Fetch(String),
    Style(StyleError),
    Construct(String),
    /// Reported asynchronously through the map's error channel.
    Runtime(String),
    Layer(String),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::Protocol(msg) => write!(f, "tile protocol registration failed: {msg}"),
            MapError::Fetch(msg) => write!(f, "style fetch failed: {msg}"),
            MapError::Style(e) => write!(f, "{e}"),
            MapError::Construct(msg) => write!(f, "map construction failed: {msg}"),
            MapError::Runtime(msg) => write!(f, "map error: {msg}"),
            MapError::Layer(msg) => write!(f, "layer setup failed: {msg}"),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Style(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StyleError> for MapError {
    fn from(e: StyleError) -> Self {
        MapError::Style(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub container: String,
    pub style: Value,
    pub center: LngLat,
    pub zoom: f64,
    pub attribution_control: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: LngLat,
    pub color: String,
    /// Popup markup; already escaped.
    pub popup_html: Option<String>,
}

impl MarkerSpec {
    /// Colored marker whose popup shows `label` in bold.
    pub fn labeled(position: LngLat, color: &str, label: &str) -> Self {
        Self {
            position,
            color: color.to_string(),
            popup_html: Some(format!("<b>{}</b>", escape_html(label))),
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Entry point into the rendering library.
pub trait MapEngine {
    /// Install the tile-archive protocol handler under `name`.
    fn register_protocol(&self, name: &str) -> Result<(), MapError>;
    fn create_map(&self, options: &MapOptions) -> Result<Rc<dyn MapHandle>, MapError>;
}

/// A constructed map instance.
pub trait MapHandle {
    fn add_navigation_control(&self, position: &str) -> Result<(), MapError>;
    /// Runs once, after the style has loaded.
    fn on_load(&self, callback: Box<dyn FnOnce()>);
    /// May fire any number of times.
    fn on_error(&self, callback: Box<dyn FnMut(MapError)>);
    fn add_marker(&self, marker: &MarkerSpec) -> Result<(), MapError>;
    fn add_source(&self, id: &str, source: &Value) -> Result<(), MapError>;
    fn add_layer(&self, layer: &Value) -> Result<(), MapError>;
    fn has_image(&self, name: &str) -> bool;
    fn add_image(&self, name: &str, image: &IconImage) -> Result<(), MapError>;
    /// Destroy the map and detach its listeners.
    fn remove(&self);
}

/// Fetches a JSON document over the network.
pub trait StyleFetcher {
    fn fetch_json(&self, url: &str, done: Box<dyn FnOnce(Result<Value, MapError>)>);
}

/// Loads a raster icon and resamples it so its longest edge is `target_size`.
pub trait IconLoader {
    fn load(&self, url: &str, target_size: u32, done: Box<dyn FnOnce(Result<IconImage, IconError>)>);
}
