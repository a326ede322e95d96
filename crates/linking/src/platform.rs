use serde::Serialize;

/// Mobile platform family, as far as the user agent tells us.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Android,
    Ios,
    #[default]
    Other,
}

impl Platform {
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("android") {
            Platform::Android
        } else if ["iphone", "ipad", "ipod"].iter().any(|d| ua.contains(d)) {
            Platform::Ios
        } else {
            Platform::Other
        }
    }

    /// Whether the browser understands `intent://` URLs with a fallback.
    pub fn supports_intent_urls(self) -> bool {
        self == Platform::Android
    }
}
