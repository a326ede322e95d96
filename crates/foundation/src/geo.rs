use serde::{Deserialize, Serialize};

/// WGS84 position in degrees. Map engines take `[lng, lat]`, so that order is kept.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Parse from loosely formatted text fields. Both must be finite.
    pub fn parse(lat: &str, lng: &str) -> Option<Self> {
        let lat = parse_float_prefix(lat).filter(|v| v.is_finite())?;
        let lng = parse_float_prefix(lng).filter(|v| v.is_finite())?;
        Some(Self { lng, lat })
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Lenient number parsing: leading whitespace is skipped and the longest
/// decimal prefix is used, so `"40.78N"` parses as `40.78`.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0usize;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Fixed-point formatting that renders unparseable input as `NaN`.
pub fn format_fixed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "NaN".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_coordinates() {
        let p = LngLat::parse("40.7864", "-119.2065").expect("coords");
        assert_eq!(p, LngLat::new(-119.2065, 40.7864));
    }

    #[test]
    fn prefix_parsing_ignores_trailing_text() {
        assert_eq!(parse_float_prefix("  40.78N"), Some(40.78));
        assert_eq!(parse_float_prefix("-.5"), Some(-0.5));
        assert_eq!(parse_float_prefix("1e3x"), Some(1000.0));
        assert_eq!(parse_float_prefix("2e"), Some(2.0));
    }

    #[test]
    fn prefix_parsing_rejects_non_numbers() {
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("north"), None);
        assert_eq!(parse_float_prefix("-."), None);
        assert!(LngLat::parse("abc", "-119.2").is_none());
    }

    #[test]
    fn format_fixed_rounds_to_four_places() {
        assert_eq!(format_fixed(Some(40.78641234), 4), "40.7864");
        assert_eq!(format_fixed(Some(-119.2), 4), "-119.2000");
        assert_eq!(format_fixed(None, 4), "NaN");
    }
}
