use linking::{LinkConfig, LinkIntent, app_banner_content};
use serde::Serialize;

use crate::surface::{ElementId, MetaField, PageSurface};

/// Title, description and share-card fields written at page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub url: String,
    pub app_banner: Option<String>,
}

impl PageMeta {
    pub fn from_intent(intent: &LinkIntent, page_url: &str, config: &LinkConfig) -> Self {
        let title = intent
            .meta("title")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", config.site_name, intent.entity_type));
        let description = intent
            .meta("desc")
            .unwrap_or(&config.default_description)
            .to_string();

        Self {
            title,
            description,
            url: page_url.to_string(),
            app_banner: app_banner_content(intent, config),
        }
    }

    pub fn apply(&self, surface: &dyn PageSurface) {
        surface.set_text(ElementId::PageTitle, &self.title);
        surface.set_meta(MetaField::Description, &self.description);
        surface.set_meta(MetaField::OgTitle, &self.title);
        surface.set_meta(MetaField::OgDescription, &self.description);
        surface.set_meta(MetaField::OgUrl, &self.url);
        surface.set_meta(MetaField::TwitterTitle, &self.title);
        surface.set_meta(MetaField::TwitterDescription, &self.description);
        if let Some(banner) = &self.app_banner {
            surface.set_meta(MetaField::IosAppBanner, banner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linking::EntityType;
    use pretty_assertions::assert_eq;

    fn meta(t: &str, q: &str) -> PageMeta {
        let cfg = LinkConfig::default();
        let intent = LinkIntent::resolve(EntityType::parse(t), q, &cfg);
        PageMeta::from_intent(&intent, "https://iburn.app/x", &cfg)
    }

    #[test]
    fn uses_metadata_when_present() {
        let m = meta("art", "uid=a1&title=Temple+of+Glass&desc=A+quiet+place");
        assert_eq!(
            m,
            PageMeta {
                title: "Temple of Glass".to_string(),
                description: "A quiet place".to_string(),
                url: "https://iburn.app/x".to_string(),
                app_banner: Some("app-id=388169740, app-argument=iburn://art/a1".to_string()),
            }
        );
    }

    #[test]
    fn falls_back_to_site_defaults() {
        let m = meta("camp", "");
        assert_eq!(m.title, "iBurn camp");
        assert_eq!(m.description, "View on iBurn - Offline Map and Guide for Burning Man");
        assert_eq!(m.app_banner, None);
    }
}
