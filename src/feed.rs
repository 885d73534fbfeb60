use crate::demo::{generate_demo_records, next_demo_tick};
use crate::model::PullRequestRecord;
use chrono::Utc;
use serde_json::Value;
use std::path::PathBuf;

pub const DEFAULT_FEED: &str = "data/prs.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Http(String),
    File(PathBuf),
    Demo,
}

impl FeedSource {
    /// `http(s)://` locations are fetched over the network, anything else is a local path.
    pub fn parse(location: &str) -> FeedSource {
        if location.starts_with("http://") || location.starts_with("https://") {
            FeedSource::Http(location.to_string())
        } else {
            FeedSource::File(PathBuf::from(location))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FeedSource::Http(url) => url.clone(),
            FeedSource::File(path) => path.display().to_string(),
            FeedSource::Demo => "demo".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("feed responded with HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to read feed file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("feed is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Append a cache-defeating query value so intermediaries never answer from cache.
pub fn cache_busted(url: &str, stamp: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{stamp}")
}

/// Decode a feed body. Valid JSON that is not an array is an empty feed;
/// non-object array entries are skipped.
pub fn parse_feed(body: &[u8]) -> Result<Vec<PullRequestRecord>, FeedError> {
    let value: Value = serde_json::from_slice(body)?;
    let Value::Array(items) = value else {
        log::debug!("Feed payload is not an array; treating as empty");
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect())
}

#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    source: FeedSource,
}

impl FeedClient {
    pub fn new(source: FeedSource) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("prparty/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, source })
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    /// One full read of the feed. No retry and no timeout beyond the transport's own.
    pub async fn fetch(&self) -> Result<Vec<PullRequestRecord>, FeedError> {
        match &self.source {
            FeedSource::Http(url) => {
                let url = cache_busted(url, Utc::now().timestamp_millis());
                log::debug!("GET {url}");
                let response = self.http.get(&url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FeedError::Status(status));
                }
                let body = response.bytes().await?;
                parse_feed(&body)
            }
            FeedSource::File(path) => {
                let body = tokio::fs::read(path).await.map_err(|source| FeedError::Read {
                    path: path.clone(),
                    source,
                })?;
                parse_feed(&body)
            }
            FeedSource::Demo => Ok(generate_demo_records(Utc::now(), next_demo_tick())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn source_parse_splits_urls_and_paths() {
        assert_eq!(
            FeedSource::parse("https://example.com/data/prs.json"),
            FeedSource::Http("https://example.com/data/prs.json".to_string())
        );
        assert_eq!(
            FeedSource::parse(DEFAULT_FEED),
            FeedSource::File(PathBuf::from("data/prs.json"))
        );
    }

    #[test]
    fn cache_bust_appends_stamp() {
        assert_eq!(cache_busted("http://h/data/prs.json", 42), "http://h/data/prs.json?42");
        assert_eq!(cache_busted("http://h/feed?team=web", 42), "http://h/feed?team=web&42");
    }

    #[test]
    fn non_array_payload_is_empty() {
        assert!(parse_feed(br#"{"title":"x"}"#).unwrap().is_empty());
        assert!(parse_feed(b"null").unwrap().is_empty());
        assert!(parse_feed(b"17").unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = parse_feed(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }

    #[test]
    fn array_entries_that_are_not_objects_are_skipped() {
        let records = parse_feed(br#"[1, "two", {"title":"Three","author":"c"}, null]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title(), "Three");
    }

    #[tokio::test]
    async fn http_fetch_reads_array_and_busts_cache() {
        let mock_server = MockServer::start().await;
        let body = serde_json::json!([
            {"title": "Fix idempotency", "author": "anika", "number": 842, "url": "https://example.com/842", "ts": "2024-05-01T10:00:00Z"},
            {"title": "Add keyboard nav", "author": "santiago", "number": 1932, "url": "https://example.com/1932", "ts": "2024-05-01T11:00:00Z"}
        ]);
        Mock::given(method("GET"))
            .and(path("/data/prs.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let client = FeedClient::new(FeedSource::Http(format!(
            "{}/data/prs.json",
            mock_server.uri()
        )))
        .unwrap();
        let records = client.fetch().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].author(), "santiago");

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let query = requests[0].url.query().unwrap_or("");
        assert!(!query.is_empty());
        assert!(query.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn http_fetch_reports_bad_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/prs.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = FeedClient::new(FeedSource::Http(format!(
            "{}/data/prs.json",
            mock_server.uri()
        )))
        .unwrap();
        let err = client.fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Status(s) if s.as_u16() == 503));
    }

    #[tokio::test]
    async fn http_fetch_treats_object_body_as_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/prs.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"prs": []})))
            .mount(&mock_server)
            .await;

        let client = FeedClient::new(FeedSource::Http(format!(
            "{}/data/prs.json",
            mock_server.uri()
        )))
        .unwrap();
        assert!(client.fetch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_fetch_reads_local_feed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"title":"Local","author":"me","number":1}}]"#).unwrap();

        let client = FeedClient::new(FeedSource::File(file.path().to_path_buf())).unwrap();
        let records = client.fetch().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title(), "Local");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = FeedClient::new(FeedSource::File(dir.path().join("nope.json"))).unwrap();
        assert!(matches!(client.fetch().await.unwrap_err(), FeedError::Read { .. }));
    }
}
