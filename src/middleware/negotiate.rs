//! Negotiate/Basic 認証 middleware (filter と axum の境界)
//!
//! - `Authorization` header を読み、filter にネゴシエーションを委譲する
//! - GSS 呼び出しはブロッキングなので spawn_blocking に逃がす
//! - 成否に関わらず `WWW-Authenticate: Negotiate` → `Basic` の 2 つの
//!   challenge を必ずレスポンスに付ける (クライアントの再試行用)
//! - 確立した Principal を request extensions に入れて下流へ渡す

use std::net::SocketAddr;

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::config::ContextLifetime;
use crate::state::AppState;

/// 認証を掛けたい範囲の Router に middleware を適用する。
///
/// 例：
/// ```ignore
/// let protected = Router::new().route("/hello", get(hello));
/// let protected = middleware::negotiate::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, negotiate_middleware))
}

async fn negotiate_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    // session lifetime の継続 key。connect-info が無い環境 (テスト等) では
    // request lifetime と同じ動きになる
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let resumed = match (state.filter.lifetime(), peer) {
        (ContextLifetime::Session, Some(peer)) => state.sessions.take(peer),
        _ => None,
    };

    let filter = state.filter.clone();
    let outcome = match tokio::task::spawn_blocking(move || {
        filter.negotiate(header.as_deref(), resumed)
    })
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(error = %err, "negotiation task failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if let (Some(pending), Some(peer)) = (outcome.pending, peer) {
        state.sessions.park(peer, pending);
    }

    match outcome.principal {
        Some(principal) => {
            // middleware → extractor への受け渡し
            req.extensions_mut().insert(principal);
            let mut response = next.run(req).await;
            append_challenges(
                response.headers_mut(),
                &outcome.output_token,
                &state.basic_realm,
            );
            response
        }
        None => {
            let mut response = StatusCode::UNAUTHORIZED.into_response();
            append_challenges(
                response.headers_mut(),
                &outcome.output_token,
                &state.basic_realm,
            );
            response
        }
    }
}

/// ChallengeSet: `Negotiate[ <token>]` を先、`Basic realm="..."` を後に。
/// 順序はクライアント互換のため固定。
fn append_challenges(headers: &mut HeaderMap, output_token: &str, realm: &str) {
    let negotiate = if output_token.is_empty() {
        "Negotiate".to_string()
    } else {
        format!("Negotiate {}", output_token)
    };
    headers.append(
        header::WWW_AUTHENTICATE,
        // token は Base64、realm は config で ASCII 検証済み
        HeaderValue::from_str(&negotiate).expect("challenge value is ascii"),
    );
    headers.append(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm))
            .expect("challenge value is ascii"),
    );
}
