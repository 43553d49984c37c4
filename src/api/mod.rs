//! Channel stats API module
//!
//! Provides the `GET /youtube/channel/stats` endpoint.

use crate::error::StatsError;
use crate::youtube::{Channel, ChannelQuery, ChannelSource, UpstreamError};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Path of the stats endpoint
pub const STATS_PATH: &str = "/youtube/channel/stats";

/// State shared across handlers
///
/// Built once at startup; nothing in it changes while serving.
#[derive(Clone)]
pub struct StatsState {
    pub source: Arc<dyn ChannelSource>,
    pub channel_id: String,
}

impl StatsState {
    pub fn new(source: Arc<dyn ChannelSource>, channel_id: impl Into<String>) -> Self {
        Self {
            source,
            channel_id: channel_id.into(),
        }
    }
}

/// Reduced view of a channel returned to callers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub subscribers: u64,
    pub channel_name: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub minutes_watched: u64,
    pub views: u64,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl TryFrom<Channel> for ChannelStats {
    type Error = UpstreamError;

    fn try_from(channel: Channel) -> Result<Self, Self::Error> {
        let snippet = channel.snippet.ok_or_else(|| UpstreamError::MissingPart {
            channel_id: channel.id.clone(),
            part: "snippet",
        })?;
        let statistics = channel.statistics.ok_or_else(|| UpstreamError::MissingPart {
            channel_id: channel.id.clone(),
            part: "statistics",
        })?;

        Ok(Self {
            subscribers: statistics.subscriber_count,
            channel_name: snippet.title,
            minutes_watched: 0,
            views: statistics.view_count,
        })
    }
}

/// Create the stats router
pub fn create_api_router(state: Arc<StatsState>) -> Router {
    Router::new()
        .route(STATS_PATH, get(get_channel_stats))
        .with_state(state)
}

/// Look up the configured channel and return its stats
async fn get_channel_stats(State(state): State<Arc<StatsState>>) -> Result<Response, StatsError> {
    let query = ChannelQuery::stats(state.channel_id.as_str());
    let response = state.source.list_channels(&query).await?;

    let channel = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| StatsError::NotFound(state.channel_id.clone()))?;
    let stats = ChannelStats::try_from(channel)?;

    // Encode fully before any status or header is produced.
    let body = serde_json::to_vec(&stats)?;

    tracing::debug!(
        channel_id = %state.channel_id,
        subscribers = stats.subscribers,
        views = stats.views,
        "Serving channel stats"
    );

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::{ChannelListResponse, ChannelSnippet, ChannelStatistics};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct StubSource {
        response: ChannelListResponse,
        queries: Mutex<Vec<ChannelQuery>>,
    }

    #[async_trait]
    impl ChannelSource for StubSource {
        async fn list_channels(
            &self,
            query: &ChannelQuery,
        ) -> Result<ChannelListResponse, UpstreamError> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(self.response.clone())
        }
    }

    fn channel(title: &str, subscribers: u64, views: u64) -> Channel {
        Channel {
            id: "UC123".to_string(),
            snippet: Some(ChannelSnippet {
                title: title.to_string(),
                ..Default::default()
            }),
            content_details: None,
            statistics: Some(ChannelStatistics {
                view_count: views,
                subscriber_count: subscribers,
                ..Default::default()
            }),
        }
    }

    fn app_with(items: Vec<Channel>) -> (Router, Arc<StubSource>) {
        let source = Arc::new(StubSource {
            response: ChannelListResponse {
                items,
                ..Default::default()
            },
            queries: Mutex::new(Vec::new()),
        });
        let state = Arc::new(StatsState::new(source.clone(), "UC123"));
        (create_api_router(state), source)
    }

    async fn fetch_stats(app: Router) -> (StatusCode, Option<String>, Vec<u8>) {
        let request = Request::builder()
            .uri(STATS_PATH)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, body.to_vec())
    }

    #[test]
    fn test_stats_serialization_omits_zero_minutes() {
        let stats = ChannelStats {
            subscribers: 10,
            channel_name: "Rust".to_string(),
            minutes_watched: 0,
            views: 20,
        };
        assert_eq!(
            serde_json::to_string(&stats).unwrap(),
            r#"{"subscribers":10,"channelName":"Rust","views":20}"#
        );

        let stats = ChannelStats {
            minutes_watched: 5,
            ..stats
        };
        assert_eq!(
            serde_json::to_string(&stats).unwrap(),
            r#"{"subscribers":10,"channelName":"Rust","minutesWatched":5,"views":20}"#
        );
    }

    #[test]
    fn test_missing_statistics_part() {
        let mut incomplete = channel("Rust", 1, 2);
        incomplete.statistics = None;

        let err = ChannelStats::try_from(incomplete).unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::MissingPart {
                part: "statistics",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_uses_first_item() {
        let (app, source) = app_with(vec![
            channel("First", 100, 2000),
            channel("Second", 1, 1),
        ]);

        let (status, content_type, body) = fetch_stats(app).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["channelName"], "First");
        assert_eq!(json["subscribers"], 100);
        assert_eq!(json["views"], 2000);
        assert!(json.get("minutesWatched").is_none());

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.as_slice(), &[ChannelQuery::stats("UC123")]);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_found() {
        let (app, _) = app_with(Vec::new());

        let (status, _, body) = fetch_stats(app).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Not Found");
    }

    #[tokio::test]
    async fn test_incomplete_channel_is_internal_error() {
        let mut incomplete = channel("Rust", 1, 2);
        incomplete.snippet = None;
        let (app, _) = app_with(vec![incomplete]);

        let (status, _, body) = fetch_stats(app).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"Internal Server Error");
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let (app, source) = app_with(vec![channel("Rust", 1, 2)]);

        let request = Request::builder()
            .method(Method::POST)
            .uri(STATS_PATH)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(source.queries.lock().unwrap().is_empty());
    }
}
