//! # Lecture Room Gateway
//!
//! ミーティング参加用トークンを発行する署名Gateway。
//!
//! ## 役割
//! - 共有シークレットによる参加トークン（HS256 JWT）の発行
//! - ページがベンダーSDKを読み込むための公開情報の提供
//! - セキュリティヘッダとCORSの付与
//!
//! ## API エンドポイント
//! - `POST /api/zoom/signature` — 参加トークン発行
//! - `GET /.well-known/meeting-sdk-info` — SDK情報公開
//! - `GET /health` — 死活確認

mod config;
mod endpoints;
mod error;
mod security;

use std::sync::Arc;

use lecture_types::DEFAULT_SIGNATURE_PATH;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::{GatewayConfig, GatewayState};

/// ルーターを構築する。
fn build_router(state: Arc<GatewayState>) -> axum::Router {
    let cors = security::cors_layer(&state.config.allowed_origins);

    let router = axum::Router::new()
        .route(
            DEFAULT_SIGNATURE_PATH,
            axum::routing::post(endpoints::handle_signature),
        )
        .route(
            "/.well-known/meeting-sdk-info",
            axum::routing::get(endpoints::handle_sdk_info),
        )
        .route("/health", axum::routing::get(endpoints::handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    security::with_security_headers(router)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "シグナルハンドラの登録に失敗");
    }
    tracing::info!("Gatewayを停止します");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env();
    if config.client_id.is_none() {
        tracing::warn!("ZOOM_CLIENT_ID が未設定です。署名リクエストは失敗します");
    }
    if config.client_secret.is_none() {
        tracing::warn!("ZOOM_CLIENT_SECRET が未設定です。署名リクエストは失敗します");
    }

    let addr = config.bind_addr.clone();
    tracing::info!(
        sdk_version = %config.sdk_version,
        allowed_origins = ?config.allowed_origins,
        "設定を読み込みました"
    );

    let app = build_router(Arc::new(GatewayState::new(config)));

    tracing::info!("Gatewayを {} で起動します", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------
