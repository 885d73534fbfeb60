use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a feed timestamp. Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM:SS[.f]`
/// (read as UTC) and a bare date.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(ts, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Humanized age with a single unit: `"30s ago"`, `"1m ago"`, `"2h ago"`, `"3d ago"`.
///
/// Missing or unreadable timestamps yield an empty string. Timestamps in the
/// future count as zero seconds old.
pub fn format_relative(ts: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(ts) = ts.filter(|s| !s.trim().is_empty()) else {
        return String::new();
    };
    let Some(then) = parse_timestamp(ts) else {
        return String::new();
    };
    let d = now.signed_duration_since(then).num_seconds().max(0);
    if d < 60 {
        format!("{d}s ago")
    } else if d < 3600 {
        format!("{}m ago", d / 60)
    } else if d < 86400 {
        format!("{}h ago", d / 3600)
    } else {
        format!("{}d ago", d / 86400)
    }
}
