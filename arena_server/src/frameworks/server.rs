// Framework bootstrap for the arena server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::{
    create_match_handler, remove_match_handler, spawn_match_serializer, ws_handler,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{MatchRegistry, MatchSettings};

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::net::SocketAddr;
use std::{collections::HashSet, io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state().await?;
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/matches", post(create_match_handler))
        .route("/matches/{match_id}", delete(remove_match_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn build_state() -> Result<Arc<AppState>> {
    let tuning = config::match_tuning();
    let seed = config::match_seed();
    tracing::debug!(
        game_duration = tuning.arena.game_duration,
        sudden_death_time = tuning.arena.sudden_death_time,
        ?seed,
        "match rules configured"
    );

    let match_registry = Arc::new(MatchRegistry::new(MatchSettings {
        command_channel_capacity: config::COMMAND_CHANNEL_CAPACITY,
        update_broadcast_capacity: config::UPDATE_BROADCAST_CAPACITY,
        tick_interval: config::TICK_INTERVAL,
        tuning,
        seed,
    }));

    // Open match that clients land in when they don't name one.
    let default_match = match_registry
        .create_match(config::DEFAULT_MATCH_ID.to_string(), HashSet::new())
        .await
        .map_err(|e| std::io::Error::other(format!("failed to create default match: {e:?}")))?;
    spawn_match_serializer(&default_match);

    Ok(Arc::new(AppState {
        match_registry,
        default_match_id: Arc::from(config::DEFAULT_MATCH_ID),
    }))
}
