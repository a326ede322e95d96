use std::rc::Rc;

use chrono::FixedOffset;
use linking::{ConfigError, LinkConfig};
use mapview::MapConfig;
use serde::{Deserialize, Serialize};

use crate::event_time::DisplayZone;

/// Everything a landing page can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    pub link: LinkConfig,
    pub map: MapConfig,
    /// Offset used to render event times. `None` means the viewer's local offset.
    pub display_utc_offset_minutes: Option<i32>,
}

impl LandingConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|e| ConfigError::InvalidJson(e.to_string()))
    }

    /// The pinned display offset, or `local` when none is set or it is out of range.
    pub fn display_zone(&self, local: Rc<dyn DisplayZone>) -> Rc<dyn DisplayZone> {
        match self
            .display_utc_offset_minutes
            .and_then(|m| FixedOffset::east_opt(m * 60))
        {
            Some(pinned) => Rc::new(pinned),
            None => local,
        }
    }
}
