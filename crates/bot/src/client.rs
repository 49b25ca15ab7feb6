//! Thin reqwest client for the catalog REST API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiClientError {
    /// Error body returned by the API; the message is surfaced to the user
    /// verbatim on publish failures.
    #[error("{0}")]
    Api(String),
    #[error("api unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
pub struct SaveChannelRequest<'a> {
    pub channel_id: i64,
    pub title: &'a str,
    pub username: Option<&'a str>,
    pub subscribers_count: i32,
    pub photo_url: Option<&'a str>,
    pub owner_telegram_id: i64,
    pub is_published: bool,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatsRequest<'a> {
    pub channel_id: i64,
    pub title: &'a str,
    pub username: Option<&'a str>,
    pub description: Option<&'a str>,
    pub subscribers_count: i32,
    pub photo_url: Option<&'a str>,
    pub categories: &'a [String],
    pub thematic_tags: &'a [String],
    pub format_tags: &'a [String],
    pub owner_telegram_id: i64,
    pub owner_username: Option<&'a str>,
    pub is_published: bool,
}

/// Subset of the channel row the bot cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelRecord {
    pub channel_id: i64,
    pub title: String,
    pub username: Option<String>,
    pub subscribers_count: i32,
    pub is_published: bool,
}

#[derive(Debug, Deserialize)]
struct ChannelsEnvelope {
    channels: Vec<ChannelRecord>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub async fn save_channel(
        &self,
        request: &SaveChannelRequest<'_>,
    ) -> Result<(), ApiClientError> {
        let resp = self
            .http
            .post(format!("{}/channels/save", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    pub async fn publish_channel(
        &self,
        request: &UpdateStatsRequest<'_>,
    ) -> Result<(), ApiClientError> {
        let resp = self
            .http
            .post(format!("{}/channels/update-stats", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    pub async fn delete_channel(&self, channel_id: i64) -> Result<(), ApiClientError> {
        let resp = self
            .http
            .delete(format!("{}/channels/{}", self.base_url, channel_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    pub async fn channels_for_owner(
        &self,
        user_id: u64,
    ) -> Result<Vec<ChannelRecord>, ApiClientError> {
        let resp = self
            .http
            .get(format!("{}/channels/user/{}", self.base_url, user_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let resp = check(resp).await?;
        let envelope: ChannelsEnvelope = resp.json().await?;
        Ok(envelope.channels)
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let message = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| extract_error_message(&body))
        .unwrap_or_else(|| format!("HTTP {}", status));
    Err(ApiClientError::Api(message))
}

/// Pull a human-readable message out of an API error body.
fn extract_error_message(body: &serde_json::Value) -> Option<String> {
    body.pointer("/error/message")
        .or_else(|| body.get("message"))
        .or_else(|| body.get("error"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_structured_error_message() {
        let body = json!({"error": {"code": "invalid_request", "message": "rating must be between 1 and 5", "request_id": "req_1"}});
        assert_eq!(
            extract_error_message(&body).as_deref(),
            Some("rating must be between 1 and 5")
        );
    }

    #[test]
    fn extracts_flat_error_string() {
        let body = json!({"error": "Unauthorized"});
        assert_eq!(extract_error_message(&body).as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn missing_message_yields_none() {
        let body = json!({"success": false});
        assert!(extract_error_message(&body).is_none());
    }
}
