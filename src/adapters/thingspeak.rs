use crate::domain::ports::RecordSource;
use crate::utils::error::{IngestError, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_FEED_URL: &str = "https://api.thingspeak.com/channels/12397/feeds.json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Polls a ThingSpeak channel feed and yields its `feeds` entries.
#[derive(Debug, Clone)]
pub struct ThingSpeakSource {
    url: Url,
    client: Client,
}

impl ThingSpeakSource {
    /// `results` is the number of most recent entries requested per poll.
    pub fn new(feed_url: &str, results: usize) -> Result<Self> {
        let mut url = Url::parse(feed_url).map_err(|e| IngestError::InvalidConfigValueError {
            field: "source.url".to_string(),
            value: feed_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        // 覆蓋網址上原有的 results 參數
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "results")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("results", &results.to_string());

        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl RecordSource for ThingSpeakSource {
    async fn fetch(&self) -> Result<Vec<Value>> {
        tracing::debug!("Making API request to: {}", self.url);
        let response = self.client.get(self.url.clone()).send().await?;

        tracing::debug!("API response status: {}", response.status());
        if !response.status().is_success() {
            return Err(IngestError::SourceError {
                message: format!("ThingSpeak responded with status {}", response.status()),
            });
        }

        let body: Value = response.json().await?;
        match body.get("feeds") {
            Some(Value::Array(feeds)) => {
                tracing::debug!("Fetched {} feed entries", feeds.len());
                Ok(feeds.clone())
            }
            Some(other) => Err(IngestError::SourceError {
                message: format!("'feeds' is not an array: {}", other),
            }),
            None => {
                tracing::warn!("Response has no 'feeds' field");
                Ok(Vec::new())
            }
        }
    }
}
