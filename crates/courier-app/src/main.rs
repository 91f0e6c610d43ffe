mod app;
mod cli;

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use courier_api::ApiClient;
use courier_common::SessionHandle;
use courier_realtime::{RealtimeClient, RealtimeConfig};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("courier=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "courier=info".parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("Courier v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => courier_config::load_from_path(std::path::Path::new(path)),
        None => courier_config::load_config(),
    }
    .unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        courier_config::CourierConfig::default()
    });

    let base_url = args.server.unwrap_or_else(|| config.server.url.clone());
    tracing::info!("Server: {base_url}");

    let session = SessionHandle::new();
    let api = ApiClient::new(base_url.clone(), session.clone());
    let realtime = RealtimeClient::new(
        RealtimeConfig {
            base_url,
            reconnect_delay: Duration::from_millis(config.realtime.reconnect_delay_ms),
            connect_timeout: Duration::from_millis(config.realtime.connect_timeout_ms),
        },
        session.clone(),
    );

    if let Err(e) = app::run(api, realtime, session, &config).await {
        tracing::error!("Fatal: {e}");
        std::process::exit(1);
    }
    tracing::info!("Shutdown complete");
}
