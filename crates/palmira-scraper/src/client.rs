//! Feed client shared by all source adapters.
//!
//! A feed is where one registry's native records come from: an HTTP(S)
//! endpoint answering with a JSON array, or a local JSON file with the same
//! shape.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

/// Location of a source's raw records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    Http(String),
    File(PathBuf),
}

impl Feed {
    /// `http://` and `https://` values become [`Feed::Http`]; anything else is
    /// treated as a file path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Feed::Http(trimmed.to_owned())
        } else {
            Feed::File(PathBuf::from(trimmed))
        }
    }
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feed::Http(url) => f.write_str(url),
            Feed::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// HTTP/file reader for source feeds.
///
/// HTTP requests carry a timeout and user agent, and transient failures
/// (network errors, 429, 5xx) are retried with exponential backoff up to
/// `max_retries` additional attempts. Cloning is cheap; the underlying
/// connection pool is shared.
#[derive(Debug, Clone)]
pub struct SourceClient {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl SourceClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_config(config: &palmira_core::AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            config.scraper_max_retries,
            config.scraper_retry_backoff_base_secs,
        )
    }

    /// Reads every record from `feed`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidFeed`]: the URL does not parse.
    /// - [`ScraperError::RateLimited`] / [`ScraperError::Http`]: after retries.
    /// - [`ScraperError::NotFound`] / [`ScraperError::UnexpectedStatus`]: non-2xx.
    /// - [`ScraperError::FeedIo`]: the file cannot be read.
    /// - [`ScraperError::Deserialize`]: the body is not a JSON array of `T`.
    pub async fn fetch_records<T: DeserializeOwned>(
        &self,
        feed: &Feed,
    ) -> Result<Vec<T>, ScraperError> {
        match feed {
            Feed::Http(url) => self.fetch_http(url).await,
            Feed::File(path) => {
                let body = tokio::fs::read_to_string(path).await.map_err(|e| {
                    ScraperError::FeedIo {
                        path: path.display().to_string(),
                        source: e,
                    }
                })?;
                parse_records(&body, &path.display().to_string())
            }
        }
    }

    async fn fetch_http<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, ScraperError> {
        reqwest::Url::parse(url).map_err(|e| ScraperError::InvalidFeed {
            feed: url.to_owned(),
            reason: e.to_string(),
        })?;

        let body = retry_with_backoff(self.max_retries, self.backoff_base_secs, move || async move {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(ScraperError::RateLimited {
                    url: url.to_owned(),
                    retry_after_secs,
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ScraperError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            Ok(response.text().await?)
        })
        .await?;

        parse_records(&body, url)
    }
}

fn parse_records<T: DeserializeOwned>(body: &str, context: &str) -> Result<Vec<T>, ScraperError> {
    serde_json::from_str::<Vec<T>>(body).map_err(|e| ScraperError::Deserialize {
        context: format!("records from {context}"),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_recognizes_http_urls() {
        assert_eq!(
            Feed::parse("https://www.ccpalmira.org.co/api/empresas"),
            Feed::Http("https://www.ccpalmira.org.co/api/empresas".to_owned())
        );
        assert_eq!(
            Feed::parse(" HTTP://localhost:8080/x "),
            Feed::Http("HTTP://localhost:8080/x".to_owned())
        );
    }

    #[test]
    fn parse_treats_everything_else_as_file() {
        assert_eq!(
            Feed::parse("./fixtures/dane.json"),
            Feed::File(PathBuf::from("./fixtures/dane.json"))
        );
    }

    #[test]
    fn parse_records_requires_json_array() {
        let result = parse_records::<serde_json::Value>(r#"{"data": []}"#, "test");
        assert!(matches!(result, Err(ScraperError::Deserialize { .. })));
    }

    #[tokio::test]
    async fn fetch_records_reads_file_feed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        std::fs::write(&path, r#"[{"id": "a"}, {"id": "b"}]"#).unwrap();

        let client = SourceClient::new(5, "palmira-test/0.1", 0, 0).unwrap();
        let records: Vec<serde_json::Value> =
            client.fetch_records(&Feed::File(path)).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn fetch_records_reports_missing_file() {
        let client = SourceClient::new(5, "palmira-test/0.1", 0, 0).unwrap();
        let result = client
            .fetch_records::<serde_json::Value>(&Feed::File(PathBuf::from("/nonexistent/feed.json")))
            .await;
        assert!(matches!(result, Err(ScraperError::FeedIo { .. })));
    }

    #[tokio::test]
    async fn fetch_records_rejects_unparseable_url() {
        let client = SourceClient::new(5, "palmira-test/0.1", 0, 0).unwrap();
        let result = client
            .fetch_records::<serde_json::Value>(&Feed::Http("http://".to_owned()))
            .await;
        assert!(matches!(result, Err(ScraperError::InvalidFeed { .. })));
    }
}
