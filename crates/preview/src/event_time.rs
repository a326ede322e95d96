use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

pub const ALL_DAY_TEXT: &str = "All Day Event";
pub const INVALID_DATE_TEXT: &str = "Invalid Date";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Time zone event times are rendered in.
///
/// Offsets can change across the year, so each instant asks for its own.
pub trait DisplayZone {
    fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset;
}

/// A pinned offset.
impl DisplayZone for FixedOffset {
    fn offset_at(&self, _instant: DateTime<Utc>) -> FixedOffset {
        *self
    }
}

/// Wall-clock time in `zone`, using the offset in effect at that time.
fn from_local(naive: &NaiveDateTime, zone: &dyn DisplayZone) -> Option<DateTime<FixedOffset>> {
    let guess = zone.offset_at(Utc.from_utc_datetime(naive));
    let utc = naive.checked_sub_signed(Duration::seconds(i64::from(guess.local_minus_utc())))?;
    zone.offset_at(Utc.from_utc_datetime(&utc))
        .from_local_datetime(naive)
        .single()
}

fn in_zone(instant: DateTime<Utc>, zone: &dyn DisplayZone) -> DateTime<FixedOffset> {
    instant.with_timezone(&zone.offset_at(instant))
}

/// Parse an event timestamp.
///
/// Offsets are honored when present. A bare date is midnight UTC; a date and
/// time without an offset is wall-clock time in `zone`.
pub fn parse_event_timestamp(raw: &str, zone: &dyn DisplayZone) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(in_zone(dt.with_timezone(&Utc), zone));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return from_local(&naive, zone);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(in_zone(Utc.from_utc_datetime(&midnight), zone));
    }
    None
}

/// Human-readable time range for an event, rendered in `zone`.
///
/// `all_day == "true"` wins over any timestamps. Otherwise the start renders
/// as `Sat, Aug 30, 2:00 PM` and an end appends ` - 5:00 PM`. Returns `None`
/// when there is nothing to show.
pub fn format_event_time(
    start: Option<&str>,
    end: Option<&str>,
    all_day: Option<&str>,
    zone: &dyn DisplayZone,
) -> Option<String> {
    if all_day == Some("true") {
        return Some(ALL_DAY_TEXT.to_string());
    }
    if start.is_none() && end.is_none() {
        return None;
    }

    let mut text = String::new();
    if let Some(start) = start {
        match parse_event_timestamp(start, zone) {
            Some(dt) => text.push_str(&dt.format("%a, %b %-d, %-I:%M %p").to_string()),
            None => text.push_str(INVALID_DATE_TEXT),
        }
    }
    if let Some(end) = end {
        text.push_str(" - ");
        match parse_event_timestamp(end, zone) {
            Some(dt) => text.push_str(&dt.format("%-I:%M %p").to_string()),
            None => text.push_str(INVALID_DATE_TEXT),
        }
    }
    Some(text)
}
