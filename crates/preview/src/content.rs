use foundation::{format_fixed, parse_float_prefix};
use linking::{EntityType, LinkIntent};
use serde::Serialize;

use crate::event_time::{DisplayZone, format_event_time};
use crate::surface::{ElementId, PageSurface};

pub const HOST_ICON_CLASS: &str = "fa fa-users";
pub const TIME_ICON_CLASS: &str = "fa fa-clock-o";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDetails {
    pub host_line: Option<String>,
    pub time_line: Option<String>,
    /// Shown only for a host or a start time; an end or all-day flag alone
    /// fills in the time line but leaves the block hidden.
    pub visible: bool,
}

/// Text shown in the revealed preview, derived only from the intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewContent {
    pub title: String,
    pub description: Option<String>,
    /// `None` hides the location block.
    pub location: Option<String>,
    pub event: Option<EventDetails>,
}

impl PreviewContent {
    pub fn from_intent(intent: &LinkIntent, zone: &dyn DisplayZone) -> Self {
        let title = match intent.meta("title") {
            Some(t) => t.to_string(),
            None => format!(
                "{} {}",
                intent.entity_type,
                intent.uid.as_deref().unwrap_or("")
            )
            .trim()
            .to_string(),
        };

        let location = match (intent.meta("addr"), intent.meta("lat"), intent.meta("lng")) {
            (Some(addr), _, _) => Some(addr.to_string()),
            (None, Some(lat), Some(lng)) => Some(format!(
                "{}, {}",
                format_fixed(parse_float_prefix(lat), 4),
                format_fixed(parse_float_prefix(lng), 4)
            )),
            _ => None,
        };

        let event = (intent.entity_type == EntityType::Event).then(|| EventDetails {
            host_line: intent.meta("host").map(|h| format!("Hosted by {h}")),
            time_line: format_event_time(
                intent.meta("start"),
                intent.meta("end"),
                intent.meta("all_day"),
                zone,
            ),
            visible: intent.has_meta("host") || intent.has_meta("start"),
        });

        Self {
            title,
            description: intent.meta("desc").map(str::to_string),
            location,
            event,
        }
    }

    /// Write the content into the page. Blocks without data keep the template's defaults.
    pub fn apply(&self, surface: &dyn PageSurface) {
        surface.set_text(ElementId::ContentTitle, &self.title);

        if let Some(desc) = &self.description {
            surface.set_text(ElementId::ContentDescription, desc);
        }

        match &self.location {
            Some(loc) => surface.set_text(ElementId::LocationText, loc),
            None => surface.set_visible(ElementId::ContentLocation, false),
        }

        if let Some(event) = &self.event {
            if let Some(host) = &event.host_line {
                surface.set_icon_text(ElementId::EventHost, HOST_ICON_CLASS, host);
            }
            if let Some(time) = &event.time_line {
                surface.set_icon_text(ElementId::EventTime, TIME_ICON_CLASS, time);
            }
            if event.visible {
                surface.set_visible(ElementId::EventDetails, true);
            }
        }
    }
}
