use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Response};
use shared::metadata::{EntityType, MetadataResult};
use std::{str::FromStr, sync::OnceLock, time::Duration};
use tracing::debug;
use url::Url;

use crate::{
    error::ServiceError,
    traits::{FetchOptions, MetadataFetcher},
};

/// Timeout applied when the caller does not pass one (seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn spotify_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"spotify\.com/(track|album|playlist|artist)/([a-zA-Z0-9]+)")
            .expect("Spotify URL pattern is valid")
    })
}

/// Extracts the entity type and id from a `spotify:<type>:<id>` URI or an
/// `open.spotify.com` URL. Returns `None` for anything else.
pub fn parse_spotify_url(url: &str) -> Option<(EntityType, String)> {
    if let Some(rest) = url.strip_prefix("spotify:") {
        let mut parts = rest.split(':');
        let kind = EntityType::from_str(parts.next()?).ok()?;
        let id = parts.next().filter(|id| !id.is_empty())?;
        return match kind {
            EntityType::Unknown => None,
            _ => Some((kind, id.to_string())),
        };
    }

    let captures = spotify_url_pattern().captures(url)?;
    let kind = EntityType::from_str(captures.get(1)?.as_str()).ok()?;
    Some((kind, captures.get(2)?.as_str().to_string()))
}

/// HTTP client for a SpotFetch-compatible metadata API, which serves
/// payloads at `{base}/{type}/{id}`.
#[derive(Debug, Clone)]
pub struct SpotFetchClient {
    base_url: Url,
    api_key: Option<String>,
    client: Client,
    default_timeout: Duration,
}

#[derive(Default)]
pub struct SpotFetchClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    default_timeout: Option<Duration>,
}

impl SpotFetchClientBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<SpotFetchClient, ServiceError> {
        let base_url_str = self.base_url.ok_or(ServiceError::NotConfigured)?;
        // trailing slash so that joins append instead of replacing the last segment
        let base_url = Url::parse(&format!("{}/", base_url_str.trim_end_matches('/')))?;

        Ok(SpotFetchClient {
            base_url,
            api_key: self.api_key,
            client: Client::new(),
            default_timeout: self
                .default_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

impl SpotFetchClient {
    fn endpoint(&self, spotify_url: &str) -> Result<(EntityType, Url), ServiceError> {
        let (kind, id) = parse_spotify_url(spotify_url)
            .ok_or_else(|| ServiceError::InvalidUrl(spotify_url.to_string()))?;
        let url = self.base_url.join(&format!("{kind}/{id}"))?;
        Ok((kind, url))
    }

    async fn handle_response(response: Response) -> Result<MetadataResult, ServiceError> {
        let status = response.status();
        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| ServiceError::Decoding(e.to_string()))?;
            MetadataResult::from_json(&text).map_err(|e| ServiceError::Decoding(e.to_string()))
        } else {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            Err(ServiceError::Http {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}

fn request_error(e: reqwest::Error, timeout: Duration) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout(timeout.as_secs())
    } else if e.is_decode() {
        ServiceError::Decoding(e.to_string())
    } else {
        ServiceError::Network(e.to_string())
    }
}

#[async_trait]
impl MetadataFetcher for SpotFetchClient {
    fn id(&self) -> &'static str {
        "spotfetch"
    }

    fn name(&self) -> &'static str {
        "SpotFetch API"
    }

    async fn fetch_metadata(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<MetadataResult, ServiceError> {
        let (kind, endpoint) = self.endpoint(url)?;
        let timeout = options.timeout.unwrap_or(self.default_timeout);
        debug!("Request: GET {} (timeout {}s)", endpoint, timeout.as_secs());

        let mut request = self
            .client
            .get(endpoint)
            .query(&[
                ("high_fidelity", options.high_fidelity.to_string()),
                ("quality_factor", options.quality_factor.to_string()),
            ])
            .timeout(timeout);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| request_error(e, timeout))?;
        let data = Self::handle_response(response).await?;

        if data.entity_type() != kind {
            return Err(ServiceError::Decoding(format!(
                "expected {} payload, got {}",
                kind,
                data.entity_type()
            )));
        }
        Ok(data)
    }
}
