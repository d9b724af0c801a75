/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (Negotiate/Trace/Timeout)
 * - axum::serve() で起動 (session lifetime 用に connect-info 付き)
 */
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{Router, http::StatusCode};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::{
    api,
    config::Config,
    services::auth::{GssCredentialProvider, SpnegoFilter},
    state::AppState,
};

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config);

    // MIT krb5 は keytab を環境変数で受け取る。起動直後 (worker 起動前) に
    // 設定するので単一スレッドであることが前提。
    if let Some(keytab) = &config.keytab {
        unsafe { std::env::set_var("KRB5_KTNAME", keytab) };
    }

    let provider = Arc::new(GssCredentialProvider::new(config.service_principal.clone()));
    let filter = SpnegoFilter::new(provider, config.context_lifetime);
    let state = AppState::new(filter, &config.basic_realm);

    let app = build_router(state).layer(request_timeout(config.request_timeout));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, lifetime = ?config.context_lifetime, "listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// タイムアウト時は 408 を返す。
fn request_timeout(timeout: std::time::Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

fn init_tracing(config: &Config) {
    let default = if config.app_env.is_production() {
        "info"
    } else {
        "debug"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
