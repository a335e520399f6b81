//! Frontdesk Server Entry Point

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use frontdesk_config::{load_settings, Settings};
use frontdesk_core::{AssistantProfile, VoiceType};
use frontdesk_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("FRONTDESK_ENV").ok();
    let config = load_settings(env.as_deref())?;

    init_tracing(&config);

    tracing::info!("Starting Frontdesk Server v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config.clone());
    seed_demo_profile(&state).await?;

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Seed a demo assistant so the in-memory stores answer something.
///
/// The profile id is logged at startup; the carrier webhook must point its
/// media-stream URL at `{ws_path}/{assistant_id}`.
async fn seed_demo_profile(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    let profile = AssistantProfile::new("Maya", "Lakeside Dental")
        .hours("09:00", "17:00")
        .slot_minutes(30)
        .voice(VoiceType::Female);

    let assistant_id = profile.id;
    state.persistence.profiles.upsert_profile(profile).await?;
    tracing::info!(%assistant_id, "Seeded demo assistant profile");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Initialize tracing with an env-filter and a console or JSON format layer
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("frontdesk={},tower_http=debug", level).into()
    });

    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
