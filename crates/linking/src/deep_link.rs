use foundation::encode_uri_component;
use serde::Serialize;

use crate::config::LinkConfig;
use crate::entity::EntityType;
use crate::intent::LinkIntent;

/// A custom-scheme URL that opens a screen in the native app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeepLink(String);

impl DeepLink {
    /// Build the app URL for an intent.
    ///
    /// - `pin`: `scheme://pin?<every original param>`
    /// - with a uid: `scheme://<type>/<uid>[?<params other than uid/id>]`
    /// - otherwise the scheme root, which opens the app without a target.
    pub fn build(intent: &LinkIntent, config: &LinkConfig) -> Self {
        let mut url = config.scheme_prefix();

        if intent.entity_type == EntityType::Pin {
            url.push_str("pin?");
            url.push_str(&intent.params.to_query_string());
        } else if let Some(uid) = &intent.uid {
            url.push_str(intent.entity_type.as_str());
            url.push('/');
            url.push_str(uid);

            let rest = intent.params.without_keys(&["uid", "id"]);
            if !rest.is_empty() {
                url.push('?');
                url.push_str(&rest.to_query_string());
            }
        }

        DeepLink(url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URL with the `scheme://` prefix removed.
    pub fn without_scheme<'a>(&'a self, config: &LinkConfig) -> &'a str {
        let prefix = config.scheme_prefix();
        self.0.strip_prefix(prefix.as_str()).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for DeepLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Android intent URL that falls back to `page_url` when the app is missing.
pub fn intent_url(deep_link: &DeepLink, page_url: &str, config: &LinkConfig) -> String {
    format!(
        "intent://{}#Intent;scheme={};package={};S.browser_fallback_url={};end",
        deep_link.without_scheme(config),
        config.scheme,
        config.android_package,
        encode_uri_component(page_url),
    )
}

/// Content for the iOS smart app banner meta tag, when the intent names an entity.
pub fn app_banner_content(intent: &LinkIntent, config: &LinkConfig) -> Option<String> {
    let uid = intent.uid.as_deref()?;
    Some(format!(
        "app-id={}, app-argument={}{}/{}",
        config.ios_app_id,
        config.scheme_prefix(),
        intent.entity_type,
        uid
    ))
}
