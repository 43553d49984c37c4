//! Error types for the stats endpoint and the server lifecycle

use crate::config::ConfigError;
use crate::youtube::UpstreamError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

/// Failures while answering a stats request
///
/// Callers only ever see the status code and its canonical reason; the
/// detail goes to the log.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("no channel found for id {0}")]
    NotFound(String),

    #[error("error encoding JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StatsError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) | Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StatsError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Channel stats request failed");
        } else {
            tracing::warn!(error = %self, "Channel stats not found");
        }

        (status, status.canonical_reason().unwrap_or("Error")).into_response()
    }
}

/// Failures owning the listener
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fatal http server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("HTTP server shutdown error: in-flight requests still running after {0:?}")]
    DrainTimeout(Duration),
}

/// Failures before or while running the gateway
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] UpstreamError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            StatsError::NotFound("UC123".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );

        let upstream = UpstreamError::Api {
            status: StatusCode::FORBIDDEN,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(
            StatsError::from(upstream).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_response_hides_detail() {
        let err = StatsError::from(UpstreamError::Api {
            status: StatusCode::FORBIDDEN,
            message: "API key not valid".to_string(),
        });

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Internal Server Error");
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = StatsError::NotFound("UC123".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Not Found");
    }
}
