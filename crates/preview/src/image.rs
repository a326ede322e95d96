use linking::{EntityType, LinkIntent};

/// Id of the image to preview, if this kind of entity has one.
///
/// Events show their host camp's image; pins have none.
pub fn preview_image_id(intent: &LinkIntent) -> Option<&str> {
    match intent.entity_type {
        EntityType::Pin => None,
        EntityType::Event => intent.meta("host_id").or(intent.uid.as_deref()),
        _ => intent.uid.as_deref(),
    }
}

pub fn preview_image_path(year: &str, image_id: &str) -> String {
    format!("/data/{year}/images/{image_id}.jpg")
}

pub fn absolute_url(origin: &str, path: &str) -> String {
    format!("{}{path}", origin.trim_end_matches('/'))
}
