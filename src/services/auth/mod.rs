/*
 * Responsibility
 * - SPNEGO/Negotiate 認証の service 層の公開ポイント
 * - middleware からは filter (orchestrator) と session store だけを見せる
 */
pub mod context;
pub mod credential;
pub mod error;
pub mod filter;
pub mod session;
pub mod token_codec;

pub use credential::GssCredentialProvider;
pub use filter::SpnegoFilter;
pub use session::SessionStore;

#[cfg(test)]
pub mod test_support;
