//! Channel Stats Gateway - HTTP endpoint for YouTube channel statistics
//!
//! A Rust application providing:
//! - A single `GET /youtube/channel/stats` endpoint
//! - A typed client for the YouTube Data API `channels.list` call
//! - Graceful shutdown with a bounded drain of in-flight requests

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod youtube;

pub use api::{create_api_router, ChannelStats, StatsState};
pub use config::{AppConfig, Credentials};
pub use error::{ServerError, StartupError, StatsError};
pub use server::{build_state, run};
pub use youtube::{ChannelSource, UpstreamError, YoutubeClient};

/// Application result type
pub type Result<T> = anyhow::Result<T>;
