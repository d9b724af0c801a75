/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health は認証なし、/hello は Negotiate middleware の内側
 * - 認証が必要な範囲はここで決める (process-global な scheme 登録はしない)
 */
use axum::{Router, routing::get};

use crate::middleware::negotiate;
use crate::state::AppState;

use crate::api::v1::handlers::{health::health, hello::hello};

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = negotiate::apply(Router::new().route("/hello", get(hello)), state);

    Router::new().route("/health", get(health)).merge(protected)
}
