use serde::Serialize;
use url::form_urlencoded;

/// Ordered query-string parameters with `URLSearchParams` semantics.
///
/// Pairs keep their original order and duplicates are preserved, so a parsed
/// query can be serialized back without losing anything.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse a query string. A single leading `?` is ignored.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value for `key`.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Copy of these params without any pair whose key is in `keys`.
    pub fn without_keys(&self, keys: &[&str]) -> Self {
        let pairs = self
            .pairs
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .cloned()
            .collect();
        Self { pairs }
    }

    /// Serialize as `application/x-www-form-urlencoded` (no leading `?`).
    pub fn to_query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.pairs {
            ser.append_pair(k, v);
        }
        ser.finish()
    }
}

impl std::fmt::Display for QueryParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::QueryParams;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_decodes_plus_and_percent() {
        let q = QueryParams::parse("?title=Dust+Storm&addr=6%3A00%20%26%20Esplanade");
        assert_eq!(q.get("title"), Some("Dust Storm"));
        assert_eq!(q.get("addr"), Some("6:00 & Esplanade"));
    }

    #[test]
    fn get_returns_first_duplicate() {
        let q = QueryParams::parse("a=1&a=2");
        assert_eq!(q.get("a"), Some("1"));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn get_non_empty_skips_blank_values() {
        let q = QueryParams::parse("uid=&id=abc");
        assert_eq!(q.get("uid"), Some(""));
        assert_eq!(q.get_non_empty("uid"), None);
        assert_eq!(q.get_non_empty("id"), Some("abc"));
    }

    #[test]
    fn serializes_in_original_order() {
        let q = QueryParams::parse("lng=-119.2065&lat=40.7864&title=The%20Man");
        assert_eq!(q.to_query_string(), "lng=-119.2065&lat=40.7864&title=The+Man");
    }

    #[test]
    fn without_keys_drops_every_match() {
        let q = QueryParams::parse("uid=1&title=x&id=2&uid=3");
        assert_eq!(q.without_keys(&["uid", "id"]).to_query_string(), "title=x");
    }

    #[test]
    fn empty_query_is_empty() {
        assert!(QueryParams::parse("").is_empty());
        assert!(QueryParams::parse("?").is_empty());
    }
}
