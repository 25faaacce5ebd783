//! Server startup and HTTP surface.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::{ConnectInfo, State, WebSocketUpgrade},
        response::{IntoResponse, Json},
        routing::get,
    },
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
};

use parley_config::ParleyConfig;
use parley_engine::EngineConfig;

use crate::{state::GatewayState, ws::handle_connection};

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_upgrade_handler))
        .layer(cors)
        .with_state(state)
}

/// Translate config timing knobs into an engine config.
pub fn engine_config_from(config: &ParleyConfig) -> EngineConfig {
    EngineConfig {
        bot_fallback: std::time::Duration::from_millis(config.matching.bot_fallback_ms),
        bot_reply_delay: std::time::Duration::from_millis(config.matching.bot_reply_delay_ms),
    }
}

/// Start the gateway HTTP + WebSocket server.
pub async fn start_gateway(bind: &str, port: u16, config: &ParleyConfig) -> anyhow::Result<()> {
    let state = GatewayState::new(engine_config_from(config));
    let app = build_gateway_app(Arc::clone(&state));

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Startup banner.
    let lines = [
        format!("parley gateway v{}", state.version),
        format!("listening on {addr}"),
        format!(
            "bot fallback {}ms, bot reply {}ms",
            config.matching.bot_fallback_ms, config.matching.bot_reply_delay_ms
        ),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    // Run the server with ConnectInfo for remote IP logging.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let counts = state.engine.counts().await;
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "connections": counts.clients,
        "waiting": counts.waiting,
        "pairings": counts.pairings,
    }))
}

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<GatewayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state, addr))
}
