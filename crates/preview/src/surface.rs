/// Elements of the landing page template this code writes into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementId {
    PageTitle,
    LoadingState,
    ContentPreview,
    ContentTitle,
    ContentDescription,
    ContentLocation,
    LocationText,
    EventDetails,
    EventHost,
    EventTime,
    PreviewImage,
    ImagePlaceholder,
    MapContainer,
    Map,
    OpenAppButton,
}

impl ElementId {
    pub fn dom_id(self) -> &'static str {
        match self {
            ElementId::PageTitle => "page-title",
            ElementId::LoadingState => "loading-state",
            ElementId::ContentPreview => "content-preview",
            ElementId::ContentTitle => "content-title",
            ElementId::ContentDescription => "content-description",
            ElementId::ContentLocation => "content-location",
            ElementId::LocationText => "location-text",
            ElementId::EventDetails => "event-details",
            ElementId::EventHost => "event-host",
            ElementId::EventTime => "event-time",
            ElementId::PreviewImage => "preview-image",
            ElementId::ImagePlaceholder => "image-placeholder",
            ElementId::MapContainer => "map-container",
            ElementId::Map => "map",
            ElementId::OpenAppButton => "open-app-btn",
        }
    }
}

/// `<meta>` tags whose `content` attribute is rewritten per entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetaField {
    Description,
    OgTitle,
    OgDescription,
    OgUrl,
    OgImage,
    TwitterTitle,
    TwitterDescription,
    TwitterImage,
    IosAppBanner,
}

impl MetaField {
    pub fn dom_id(self) -> &'static str {
        match self {
            MetaField::Description => "meta-description",
            MetaField::OgTitle => "og-title",
            MetaField::OgDescription => "og-description",
            MetaField::OgUrl => "og-url",
            MetaField::OgImage => "og-image",
            MetaField::TwitterTitle => "twitter-title",
            MetaField::TwitterDescription => "twitter-description",
            MetaField::TwitterImage => "twitter-image",
            MetaField::IosAppBanner => "ios-app-banner",
        }
    }
}

/// Writable view of the page template.
///
/// Implementations ignore ids missing from the markup.
pub trait PageSurface {
    fn set_text(&self, id: ElementId, text: &str);
    /// Text preceded by an icon glyph with the given CSS classes.
    fn set_icon_text(&self, id: ElementId, icon_class: &str, text: &str);
    fn set_meta(&self, field: MetaField, content: &str);
    fn set_visible(&self, id: ElementId, visible: bool);
    fn set_image_src(&self, id: ElementId, src: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    NotFound(String),
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageError::NotFound(url) => write!(f, "image not found: {url}"),
        }
    }
}

impl std::error::Error for ImageError {}

/// Checks whether an image URL loads.
pub trait ImageProbe {
    fn probe(&self, url: &str, done: Box<dyn FnOnce(Result<(), ImageError>)>);
}

/// Facts about the page that come from the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageEnv {
    /// Full current URL.
    pub href: String,
    /// Scheme, host and port, without a trailing slash.
    pub origin: String,
    /// Query string, with or without the leading `?`.
    pub search: String,
    pub user_agent: String,
}
