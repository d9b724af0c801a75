/*
 * Responsibility
 * - GET /hello: 認証済み principal に挨拶を返すデモリソース
 * - Principal は middleware が extensions に入れたものを extractor で受け取る
 */
use axum::response::IntoResponse;

use crate::api::v1::extractors::PrincipalExtractor;

pub async fn hello(PrincipalExtractor(principal): PrincipalExtractor) -> impl IntoResponse {
    format!("Hello {}!", principal.name())
}
