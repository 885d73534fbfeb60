use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One entry of the pull request feed.
///
/// The feed is produced elsewhere and is not trusted to be well-formed, so
/// every field is optional and a field of the wrong type reads as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PullRequestRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub author: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub number: Option<i64>,
    #[serde(deserialize_with = "lenient_string")]
    pub url: Option<String>,
    /// RFC 3339 or similar text; numeric epoch milliseconds are converted on read.
    #[serde(deserialize_with = "lenient_timestamp")]
    pub ts: Option<String>,
}

impl PullRequestRecord {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn author(&self) -> &str {
        self.author.as_deref().unwrap_or("")
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().trim_start_matches('#').parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(s: &str) -> Option<Theme> {
        match s {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn button_label(&self) -> &'static str {
        match self {
            Theme::Dark => "🌙 Dark",
            Theme::Light => "☀️ Light",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tolerates_missing_and_mistyped_fields() {
        let record: PullRequestRecord =
            serde_json::from_str(r#"{"title": 42, "author": null, "number": "17", "extra": true}"#)
                .unwrap();
        assert_eq!(record.title.as_deref(), Some("42"));
        assert_eq!(record.author(), "");
        assert_eq!(record.number, Some(17));
        assert!(record.url.is_none());
        assert!(record.ts.is_none());
    }

    #[test]
    fn record_reads_full_entry() {
        let record: PullRequestRecord = serde_json::from_str(
            r#"{"title":"Fix login","author":"anika","number":842,"url":"https://example.com/pr/842","ts":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(record.title(), "Fix login");
        assert_eq!(record.author(), "anika");
        assert_eq!(record.number, Some(842));
        assert_eq!(record.url(), "https://example.com/pr/842");
        assert_eq!(record.ts.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn numeric_timestamp_reads_as_epoch_millis() {
        let record: PullRequestRecord =
            serde_json::from_str(r#"{"ts": 1714557600000}"#).unwrap();
        assert_eq!(record.ts.as_deref(), Some("2024-05-01T10:00:00.000Z"));

        let record: PullRequestRecord =
            serde_json::from_str(r#"{"ts": 1714557600500.0}"#).unwrap();
        assert_eq!(record.ts.as_deref(), Some("2024-05-01T10:00:00.500Z"));

        let record: PullRequestRecord = serde_json::from_str(r#"{"ts": true}"#).unwrap();
        assert!(record.ts.is_none());
    }

    #[test]
    fn theme_toggle_flips_between_two_values() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
        assert_eq!(Theme::parse("light"), Some(Theme::Light));
        assert_eq!(Theme::parse("sepia"), None);
        assert_eq!(Theme::default(), Theme::Dark);
    }
}
