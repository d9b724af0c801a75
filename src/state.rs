/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - filter: SPNEGO Negotiation Filter (credential provider を内包)
 *   - sessions: session lifetime 時の未確立コンテキスト置き場
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::{SessionStore, SpnegoFilter};

#[derive(Clone)]
pub struct AppState {
    pub filter: Arc<SpnegoFilter>,
    pub sessions: SessionStore,
    pub basic_realm: Arc<str>,
}

impl AppState {
    pub fn new(filter: SpnegoFilter, basic_realm: &str) -> Self {
        Self {
            filter: Arc::new(filter),
            sessions: SessionStore::new(),
            basic_realm: Arc::from(basic_realm),
        }
    }
}
