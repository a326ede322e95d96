use std::collections::BTreeMap;

use foundation::{LngLat, QueryParams, decode_uri_component};
use serde::Serialize;

use crate::config::LinkConfig;
use crate::entity::EntityType;

/// Everything a landing page knows about the entity it links to.
///
/// Built once from the page's query string and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkIntent {
    pub entity_type: EntityType,
    pub uid: Option<String>,
    pub year: String,
    /// Original parameters, in order, duplicates included.
    #[serde(skip)]
    pub params: QueryParams,
    /// Decoded values keyed by parameter name; a repeated key keeps its last value.
    pub metadata: BTreeMap<String, String>,
}

impl LinkIntent {
    pub fn resolve(entity_type: EntityType, query: &str, config: &LinkConfig) -> Self {
        Self::from_params(entity_type, QueryParams::parse(query), config)
    }

    pub fn from_params(entity_type: EntityType, params: QueryParams, config: &LinkConfig) -> Self {
        let uid = params
            .get_non_empty("uid")
            .or_else(|| params.get_non_empty("id"))
            .map(str::to_string);
        let year = params
            .get_non_empty("year")
            .unwrap_or(&config.default_year)
            .to_string();

        let mut metadata = BTreeMap::new();
        for (key, value) in params.iter() {
            // Values are decoded once more, since share links are often double-encoded.
            let decoded = decode_uri_component(value).unwrap_or_else(|| {
                tracing::debug!(key, "metadata value is not a valid uri component; keeping raw");
                value.to_string()
            });
            metadata.insert(key.to_string(), decoded);
        }

        tracing::debug!(
            entity_type = %entity_type,
            uid = uid.as_deref().unwrap_or(""),
            year = %year,
            params = params.len(),
            "resolved link intent"
        );

        Self {
            entity_type,
            uid,
            year,
            params,
            metadata,
        }
    }

    /// Metadata value for `key`, treating empty values as absent.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn has_meta(&self, key: &str) -> bool {
        self.meta(key).is_some()
    }

    /// Coordinates when both `lat` and `lng` parse as finite numbers.
    pub fn coordinates(&self) -> Option<LngLat> {
        LngLat::parse(self.meta("lat")?, self.meta("lng")?)
    }
}
