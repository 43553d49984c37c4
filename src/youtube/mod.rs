//! YouTube Data API client
//!
//! Covers the single `channels.list` call the gateway makes. The handler talks
//! to it through [`ChannelSource`] so tests can swap in a stub.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;
use url::Url;

/// Default base URL of the Data API v3
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Errors talking to the upstream API
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("error creating YouTube client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("error making YouTube API call: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("YouTube API returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("error decoding YouTube API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("channel {channel_id} is missing the {part} part")]
    MissingPart {
        channel_id: String,
        part: &'static str,
    },
}

/// Resource parts a `channels.list` call can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Snippet,
    ContentDetails,
    Statistics,
}

impl Part {
    pub fn as_str(&self) -> &'static str {
        match self {
            Part::Snippet => "snippet",
            Part::ContentDetails => "contentDetails",
            Part::Statistics => "statistics",
        }
    }
}

/// A `channels.list` lookup by channel id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelQuery {
    pub parts: Vec<Part>,
    pub id: String,
}

impl ChannelQuery {
    /// Lookup of the parts the stats endpoint needs
    pub fn stats(channel_id: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Snippet, Part::ContentDetails, Part::Statistics],
            id: channel_id.into(),
        }
    }

    fn part_param(&self) -> String {
        self.parts
            .iter()
            .map(Part::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Response body of `channels.list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelListResponse {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub etag: String,
    /// Absent upstream when nothing matched
    #[serde(default)]
    pub items: Vec<Channel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: Option<ChannelSnippet>,
    #[serde(default)]
    pub content_details: Option<ChannelContentDetails>,
    #[serde(default)]
    pub statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub custom_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    #[serde(default)]
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPlaylists {
    #[serde(default)]
    pub likes: Option<String>,
    #[serde(default)]
    pub uploads: Option<String>,
}

/// Counters are int64 values that the API encodes as JSON strings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(default, deserialize_with = "deserialize_count")]
    pub view_count: u64,
    /// Zero when the channel hides its subscriber count
    #[serde(default, deserialize_with = "deserialize_count")]
    pub subscriber_count: u64,
    #[serde(default)]
    pub hidden_subscriber_count: bool,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub video_count: u64,
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Anything that can answer a `channels.list` lookup
#[async_trait]
pub trait ChannelSource: Send + Sync {
    async fn list_channels(&self, query: &ChannelQuery)
        -> Result<ChannelListResponse, UpstreamError>;
}

/// reqwest-backed client for the Data API
#[derive(Clone)]
pub struct YoutubeClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl YoutubeClient {
    /// Create a new client against `base_url`
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, UpstreamError> {
        let endpoint = Url::parse(&format!("{}/channels", base_url.trim_end_matches('/')))?;

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(UpstreamError::Build)?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, query: &ChannelQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("part", &query.part_param())
            .append_pair("id", &query.id)
            .append_pair("key", &self.api_key);
        url
    }
}

impl std::fmt::Debug for YoutubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoutubeClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChannelSource for YoutubeClient {
    async fn list_channels(
        &self,
        query: &ChannelQuery,
    ) -> Result<ChannelListResponse, UpstreamError> {
        tracing::debug!(
            channel_id = %query.id,
            parts = %query.part_param(),
            "Calling channels.list"
        );

        // Request URLs carry the API key, so they are stripped from errors.
        let response = self
            .client
            .get(self.request_url(query))
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_string());
            return Err(UpstreamError::Api { status, message });
        }

        let channels: ChannelListResponse = serde_json::from_slice(&body)?;

        tracing::debug!(
            channel_id = %query.id,
            items = channels.items.len(),
            "channels.list returned"
        );

        Ok(channels)
    }
}
