//! Channel Stats Gateway - Main Application
//!
//! Serves subscriber and view counts for one YouTube channel.

use channel_stats_gateway::{
    config::{API_KEY_ENV, CHANNEL_ID_ENV},
    server::run,
    AppConfig,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Channel Stats Gateway - YouTube channel statistics over HTTP
#[derive(Parser)]
#[command(name = "channel-stats-gateway")]
#[command(about = "Reports subscriber and view counts for a YouTube channel")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Server host
    #[arg(long, env = "STATS_GATEWAY_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short, long, env = "STATS_GATEWAY_PORT")]
    port: Option<u16>,

    /// YouTube Data API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Channel to report on
    #[arg(long, env = CHANNEL_ID_ENV)]
    channel_id: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up .env before clap reads the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("channel_stats_gateway={},tower_http={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let loaded = if std::path::Path::new(&cli.config).exists() {
        AppConfig::load_from_file(&cli.config)
    } else {
        AppConfig::load()
    };
    let mut config = loaded.map_err(|e| {
        tracing::error!(error = %e, config = %cli.config, "Failed to load configuration");
        e
    })?;

    // Override with CLI args
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(api_key) = cli.api_key {
        config.youtube.api_key = Some(api_key);
    }
    if let Some(channel_id) = cli.channel_id {
        config.youtube.channel_id = Some(channel_id);
    }

    match cli.command {
        Some(Commands::Serve) | None => {
            run(&config).await.map_err(|e| {
                tracing::error!(error = %e, "Gateway failed");
                e
            })?;
        }
        Some(Commands::Config) => {
            // Show current configuration
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        }
    }

    Ok(())
}
