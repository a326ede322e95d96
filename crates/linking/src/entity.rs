use serde::{Serialize, Serializer};

/// Category of point of interest a link refers to.
///
/// Unknown names are carried through verbatim so newer app screens keep
/// working without a page update.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityType {
    Pin,
    Event,
    Art,
    Camp,
    Other(String),
}

impl EntityType {
    pub fn parse(s: &str) -> Self {
        match s {
            "pin" => EntityType::Pin,
            "event" => EntityType::Event,
            "art" => EntityType::Art,
            "camp" => EntityType::Camp,
            other => EntityType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EntityType::Pin => "pin",
            EntityType::Event => "event",
            EntityType::Art => "art",
            EntityType::Camp => "camp",
            EntityType::Other(s) => s,
        }
    }
}

impl Default for EntityType {
    fn default() -> Self {
        EntityType::Other("unknown".to_string())
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EntityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::EntityType;

    #[test]
    fn known_types_round_trip() {
        for name in ["pin", "event", "art", "camp"] {
            assert_eq!(EntityType::parse(name).as_str(), name);
        }
    }

    #[test]
    fn unknown_types_pass_through() {
        let t = EntityType::parse("mutant-vehicle");
        assert_eq!(t, EntityType::Other("mutant-vehicle".to_string()));
        assert_eq!(t.to_string(), "mutant-vehicle");
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert_eq!(EntityType::parse("Event"), EntityType::Other("Event".to_string()));
    }
}
