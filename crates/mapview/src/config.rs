use foundation::LngLat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// DOM id of the element the map renders into.
    pub container: String,
    /// Style document name under `/data/<year>/map/styles/`.
    pub style_name: String,
    pub tile_protocol: String,
    pub zoom: f64,
    pub navigation_position: String,
    /// Playa dust, used by the flat fallback.
    pub background_color: String,
    pub marker_color: String,
    pub circle_radius: f64,
    pub circle_color: String,
    /// Longest edge, in pixels, icons are resampled to.
    pub icon_size: u32,
    pub icon_base_path: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container: "map".to_string(),
            style_name: "iburn-light".to_string(),
            tile_protocol: "pmtiles".to_string(),
            zoom: 14.0,
            navigation_position: "top-right".to_string(),
            background_color: "#E8E0D8".to_string(),
            marker_color: "#ff0000".to_string(),
            circle_radius: 10.0,
            circle_color: "#ff0000".to_string(),
            icon_size: 40,
            icon_base_path: "/assets/images/pins".to_string(),
        }
    }
}

/// What the preview should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapViewState {
    pub center: LngLat,
    pub zoom: f64,
    pub marker_label: Option<String>,
}

impl MapViewState {
    pub fn new(center: LngLat, zoom: f64, marker_label: Option<String>) -> Self {
        Self {
            center,
            zoom,
            marker_label,
        }
    }
}
