use foundation::LngLat;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    NotAnObject,
    InvalidJson(String),
}

impl std::fmt::Display for StyleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StyleError::NotAnObject => write!(f, "style document is not a json object"),
            StyleError::InvalidJson(msg) => write!(f, "style document is not valid json: {msg}"),
        }
    }
}

impl std::error::Error for StyleError {}

pub fn style_url(year: &str, style_name: &str) -> String {
    format!("/data/{year}/map/styles/{style_name}.json")
}

pub fn parse_style(raw: &str) -> Result<Value, StyleError> {
    serde_json::from_str(raw).map_err(|e| StyleError::InvalidJson(e.to_string()))
}

/// Make a fetched style usable from this page.
///
/// The sprite reference is dropped because pin icons are registered one by
/// one, and a root-relative glyph URL is made absolute against `origin`.
pub fn prepare_style(mut style: Value, origin: &str) -> Result<Value, StyleError> {
    let obj = style.as_object_mut().ok_or(StyleError::NotAnObject)?;

    if obj.remove("sprite").is_some() {
        tracing::debug!("removed sprite reference from style");
    }

    if let Some(Value::String(glyphs)) = obj.get_mut("glyphs") {
        if !glyphs.starts_with("http") {
            *glyphs = format!("{origin}{glyphs}");
        }
    }

    Ok(style)
}

/// Style with no sources and a single solid background layer.
pub fn flat_style(background_color: &str) -> Value {
    json!({
        "version": 8,
        "sources": {},
        "layers": [
            {
                "id": "background",
                "type": "background",
                "paint": { "background-color": background_color }
            }
        ]
    })
}

/// GeoJSON source holding a single point feature.
pub fn point_source(center: LngLat) -> Value {
    json!({
        "type": "geojson",
        "data": {
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": center.to_array()
            }
        }
    })
}

pub fn circle_layer(id: &str, source: &str, radius: f64, color: &str) -> Value {
    json!({
        "id": id,
        "type": "circle",
        "source": source,
        "paint": {
            "circle-radius": radius,
            "circle-color": color
        }
    })
}
