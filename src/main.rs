use api_rest::{build_router, AppState};
use intake_core::{IntakeConfig, TransportMode};
use intake_transport::{LocalChannel, SharedPublisher};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the intake relay
///
/// Starts the relay REST server. With `INTAKE_TRANSPORT=local` the relay also serves dashboards
/// over its own Pusher-protocol websocket at `/app/{key}`.
///
/// # Environment Variables
/// - `INTAKE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `INTAKE_TRANSPORT`: `pusher` (default) or `local`
/// - `PUSHER_APP_ID`, `PUSHER_KEY`, `PUSHER_SECRET`, `PUSHER_CLUSTER`: channel credentials
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intake=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = IntakeConfig::from_env()?;

    let state = match cfg.transport() {
        TransportMode::Pusher => {
            // Credentials are checked on first publish, not here.
            AppState::hosted(Arc::new(SharedPublisher::new(cfg.pusher().clone())))
        }
        TransportMode::Local => {
            tracing::info!("++ Using in-process channel; dashboards connect to /app/local");
            AppState::local(LocalChannel::default())
        }
    };

    tracing::info!("++ Starting intake relay on {}", cfg.rest_addr());

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(cfg.rest_addr()).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("-- Shutting down intake relay");
        })
        .await?;

    Ok(())
}
