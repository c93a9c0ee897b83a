//! Blocking HTTP feed client
//!
//! Session headers (cookie, user agent, app id...) come verbatim from the
//! config file; this client never interprets them.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{FeedClient, FeedSelector, FetchError};
use crate::config::ClientConfig;

pub struct HttpFeedClient {
    client: Client,
    base_url: Url,
}

impl HttpFeedClient {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        // No timeout unless one is configured: a hung call blocks the crawl
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;

        // Url::join drops the last segment unless the base ends with '/'
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
        })
    }

    fn url_for(&self, selector: &FeedSelector) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(&selector.path())
            .map_err(|e| FetchError::Network(format!("invalid url: {}", e)))?;
        if let Some((key, value)) = selector.query() {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }
}

impl FeedClient for HttpFeedClient {
    fn get(&self, selector: &FeedSelector) -> Result<Value, FetchError> {
        let url = self.url_for(selector)?;
        debug!(url = %url, "GET");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        // Error-shaped JSON bodies (e.g. rate limiting) are surfaced to the
        // caller as documents; only non-JSON failures become status errors.
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
            Err(e) => Err(FetchError::Decode(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn client(base_url: &str) -> HttpFeedClient {
        let config = ClientConfig {
            base_url: base_url.to_string(),
            timeout_secs: Some(5),
            headers: BTreeMap::from([("user-agent".to_string(), "storyscout".to_string())]),
        };
        HttpFeedClient::new(&config).unwrap()
    }

    #[test]
    fn test_url_keeps_base_path() {
        let http = client("https://i.instagram.com/api/v1");
        let url = http
            .url_for(&FeedSelector::UserReel("42".to_string()))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://i.instagram.com/api/v1/feed/user/42/reel_media/"
        );
    }

    #[test]
    fn test_place_search_query_is_encoded() {
        let http = client("https://i.instagram.com/api/v1/");
        let url = http
            .url_for(&FeedSelector::PlaceSearch("New York".to_string()))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://i.instagram.com/api/v1/fbsearch/places/?query=New+York"
        );
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let config = ClientConfig {
            base_url: "https://example.com".to_string(),
            timeout_secs: None,
            headers: BTreeMap::from([("bad header".to_string(), "x".to_string())]),
        };
        assert!(HttpFeedClient::new(&config).is_err());
    }
}
