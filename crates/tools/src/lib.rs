//! Offline inspection of landing-page links.

use std::rc::Rc;

use chrono::{Offset, Utc};
use linking::{
    DeepLink, EntityType, LinkIntent, Platform, TriggerPlan, app_banner_content, intent_url,
};
use mapview::{MapViewState, StyleError, parse_style, prepare_style};
use preview::{
    DEFAULT_MARKER_LABEL, LandingConfig, PageMeta, PreviewContent, absolute_url,
    preview_image_id, preview_image_path,
};
use serde::Serialize;

/// Everything the landing page would derive from one URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkReport {
    pub intent: LinkIntent,
    pub platform: Platform,
    pub deep_link: DeepLink,
    pub intent_url: String,
    pub app_banner: Option<String>,
    pub trigger_plan: TriggerPlan,
    pub page_meta: PageMeta,
    pub preview: PreviewContent,
    pub image_url: Option<String>,
    pub map: Option<MapViewState>,
}

pub struct ResolveRequest<'a> {
    pub entity_type: &'a str,
    pub query: &'a str,
    pub page_url: &'a str,
    pub origin: &'a str,
    pub user_agent: &'a str,
}

pub fn resolve_report(req: &ResolveRequest<'_>, config: &LandingConfig) -> LinkReport {
    let link = &config.link;
    let intent = LinkIntent::resolve(EntityType::parse(req.entity_type), req.query, link);
    let platform = Platform::from_user_agent(req.user_agent);
    let deep_link = DeepLink::build(&intent, link);

    let zone = config.display_zone(Rc::new(Utc.fix()));
    let image_url = preview_image_id(&intent)
        .map(|id| absolute_url(req.origin, &preview_image_path(&intent.year, id)));
    let map = intent.coordinates().map(|center| {
        let label = intent.meta("title").unwrap_or(DEFAULT_MARKER_LABEL);
        MapViewState::new(center, config.map.zoom, Some(label.to_string()))
    });

    LinkReport {
        intent_url: intent_url(&deep_link, req.page_url, link),
        app_banner: app_banner_content(&intent, link),
        trigger_plan: TriggerPlan::build(&intent, platform, req.page_url, link),
        page_meta: PageMeta::from_intent(&intent, req.page_url, link),
        preview: PreviewContent::from_intent(&intent, zone.as_ref()),
        image_url,
        map,
        deep_link,
        platform,
        intent,
    }
}

/// Parse a style document and apply the same rewrites the page does.
pub fn prepare_style_text(raw: &str, origin: &str) -> Result<serde_json::Value, StyleError> {
    prepare_style(parse_style(raw)?, origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linking::TriggerMethod;
    use pretty_assertions::assert_eq;

    fn request<'a>(entity_type: &'a str, query: &'a str, user_agent: &'a str) -> ResolveRequest<'a> {
        ResolveRequest {
            entity_type,
            query,
            page_url: "https://iburn.app/camp/?uid=c1",
            origin: "https://iburn.app",
            user_agent,
        }
    }

    #[test]
    fn camp_report_on_android() {
        let report = resolve_report(
            &request("camp", "uid=c1&title=Dusty+Diner", "Mozilla/5.0 (Linux; Android 14)"),
            &LandingConfig::default(),
        );
        assert_eq!(report.deep_link.as_str(), "iburn://camp/c1?title=Dusty+Diner");
        assert_eq!(report.platform, Platform::Android);
        assert_eq!(report.trigger_plan.steps.len(), 3);
        assert_eq!(report.trigger_plan.steps[2].method, TriggerMethod::Redirect);
        assert_eq!(
            report.image_url.as_deref(),
            Some("https://iburn.app/data/2025/images/c1.jpg")
        );
        assert_eq!(report.page_meta.title, "Dusty Diner");
        assert_eq!(report.map, None);
    }

    #[test]
    fn pin_report_has_map_and_no_image() {
        let report = resolve_report(
            &request("pin", "lat=40.7864&lng=-119.2065", ""),
            &LandingConfig::default(),
        );
        assert_eq!(
            report.deep_link.as_str(),
            "iburn://pin?lat=40.7864&lng=-119.2065"
        );
        assert_eq!(report.image_url, None);
        assert_eq!(report.trigger_plan.steps.len(), 2);
        let map = report.map.expect("coordinates present");
        assert_eq!(map.marker_label.as_deref(), Some("Location"));
        assert_eq!(map.zoom, 14.0);
    }

    #[test]
    fn report_serializes_to_json() {
        let report = resolve_report(
            &request("art", "uid=a1", ""),
            &LandingConfig::default(),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["deep_link"], "iburn://art/a1");
        assert_eq!(json["intent"]["entity_type"], "art");
        assert_eq!(json["platform"], "other");
    }

    #[test]
    fn style_text_is_prepared() {
        let raw = r#"{"version":8,"sprite":"/sprites/x","glyphs":"/fonts/{fontstack}/{range}.pbf","layers":[]}"#;
        let style = prepare_style_text(raw, "https://iburn.app").unwrap();
        assert_eq!(style.get("sprite"), None);
        assert_eq!(style["glyphs"], "https://iburn.app/fonts/{fontstack}/{range}.pbf");
        assert!(prepare_style_text("[1]", "https://iburn.app").is_err());
    }
}
