//! HTTP client for the integration gateway.
//!
//! One gateway fronts both platforms. It serves record listings and pattern
//! expansions, and applies sync requests. `GatewayClient` implements the
//! [`RecordSource`], [`SyncService`] and [`PatternLookup`] contracts on top of
//! it.

use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::models::{Platform, Record, SyncRequest, SyncResult};
use crate::services::{PatternLookup, RecordFilter, RecordSource, SyncService};
use crate::util::compact_text;

#[derive(Clone)]
pub struct GatewayClient {
    base_url: Url,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("GatewayClient")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let config = config.clone().normalized()?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|error| Error::Config(format!("invalid gateway base_url: {error}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(
                "gateway base_url cannot carry a path".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            api_token: config.api_token.clone(),
            client: reqwest::Client::builder()
                .timeout(config.timeout())
                .build()?,
        })
    }

    /// Absolute URL for `segments` below the base URL; segments are percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send `builder` and return the body of a successful response
    async fn send(&self, builder: RequestBuilder) -> Result<String> {
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(parse_api_error(status, &body)));
        }

        Ok(response.text().await?)
    }
}

impl RecordSource for GatewayClient {
    async fn fetch_records(&self, platform: Platform, filter: &RecordFilter) -> Result<Vec<Record>> {
        let mut query = vec![("platform", platform.as_str().to_string())];
        if let Some(text) = filter.search_text() {
            query.push(("q", text.to_string()));
        }
        if let Some(limit) = filter.limit {
            query.push(("limit", limit.to_string()));
        }

        let url = self.endpoint(&["records"]);
        tracing::debug!(%platform, url = %url, "Fetching records");
        let body = self.send(self.request(Method::GET, url).query(&query)).await?;
        decode_records(&body, Some(platform))
    }
}

impl SyncService for GatewayClient {
    async fn sync(&self, request: &SyncRequest) -> Result<SyncResult> {
        let url = self.endpoint(&["sync"]);
        tracing::debug!(
            direction = %request.direction,
            mappings = request.mappings.len(),
            "Posting sync request"
        );
        let body = self
            .send(self.request(Method::POST, url).json(request))
            .await?;
        decode_sync_result(&body)
    }
}

impl PatternLookup for GatewayClient {
    async fn expand(&self, pattern_id: &str) -> Result<Vec<Record>> {
        let pattern_id = pattern_id.trim();
        if pattern_id.is_empty() {
            return Err(Error::InvalidInput(
                "pattern id must not be empty".to_string(),
            ));
        }

        let url = self.endpoint(&["patterns", pattern_id, "records"]);
        let response = self.request(Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("pattern {pattern_id}")));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(parse_api_error(status, &body)));
        }

        let body = response.text().await?;
        decode_records(&body, None)
    }
}

/// Decode a record listing. With `platform` set, every record must belong to it.
fn decode_records(body: &str, platform: Option<Platform>) -> Result<Vec<Record>> {
    let records = serde_json::from_str::<Vec<Record>>(body).map_err(|error| {
        Error::MalformedResponse(format!(
            "record listing did not parse: {error}; body: {}",
            compact_text(body)
        ))
    })?;

    for record in &records {
        if record.id.trim().is_empty() {
            return Err(Error::MalformedResponse(
                "record listing contains a record without id".to_string(),
            ));
        }
        if let Some(expected) = platform {
            if record.platform != expected {
                return Err(Error::MalformedResponse(format!(
                    "asked for {expected} records but got {}",
                    record.key()
                )));
            }
        }
    }

    Ok(records)
}

fn decode_sync_result(body: &str) -> Result<SyncResult> {
    serde_json::from_str::<SyncResult>(body).map_err(|error| {
        Error::MalformedResponse(format!(
            "sync result did not parse: {error}; body: {}",
            compact_text(body)
        ))
    })
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<GatewayErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
