/*
 * Responsibility
 * - リクエスト 1 件分のネゴシエーション状態遷移 (Negotiation Filter の中核)
 * - Authorization header の scheme 分岐 → codec / engine 呼び出し → 判定
 * - credential の取得と解放をこの層で必ず対にする
 * - HTTP (axum) には依存しない。header 文字列 in / Negotiation out
 */
use std::sync::Arc;

use crate::api::v1::extractors::Principal;
use crate::config::ContextLifetime;
use crate::services::auth::context::SecurityContext;
use crate::services::auth::credential::{CredentialProvider, ServerCredential};
use crate::services::auth::error::AuthError;
use crate::services::auth::token_codec;

/// Basic 側の固定テスト credential。`user:pass` 全体を大文字小文字無視で比較する。
const BASIC_TEST_CREDENTIALS: &str = "basic:basic";
const BASIC_TEST_PRINCIPAL: &str = "basic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    NoHeader,
    NegotiateInProgress,
    NegotiateEstablished,
    BasicChecked,
    Rejected,
    Admitted,
}

/// 1 リクエスト分のネゴシエーション結果。
///
/// - `state` は終端状態 (`Admitted` / `Rejected`)
/// - `leg` は終端に至る直前の状態 (ログ/テスト用)
/// - `output_token` は Negotiate challenge のパラメータ (Base64、無ければ空)
/// - `pending` は session lifetime 時に継続させる未確立コンテキスト
pub struct Negotiation {
    pub state: NegotiationState,
    pub leg: NegotiationState,
    pub principal: Option<Principal>,
    pub output_token: String,
    pub pending: Option<Box<dyn SecurityContext>>,
}

impl Negotiation {
    fn rejected(leg: NegotiationState, output_token: String) -> Self {
        Self {
            state: NegotiationState::Rejected,
            leg,
            principal: None,
            output_token,
            pending: None,
        }
    }

    fn admitted(leg: NegotiationState, principal: Principal, output_token: String) -> Self {
        Self {
            state: NegotiationState::Admitted,
            leg,
            principal: Some(principal),
            output_token,
            pending: None,
        }
    }
}

enum Scheme<'a> {
    None,
    Negotiate(&'a str),
    Basic(&'a str),
    Other,
}

fn parse_authorization(header: Option<&str>) -> Scheme<'_> {
    match header {
        None => Scheme::None,
        Some(value) => {
            if let Some(token) = value.strip_prefix("Negotiate ") {
                Scheme::Negotiate(token)
            } else if let Some(token) = value.strip_prefix("Basic ") {
                Scheme::Basic(token)
            } else {
                Scheme::Other
            }
        }
    }
}

pub struct SpnegoFilter {
    provider: Arc<dyn CredentialProvider>,
    lifetime: ContextLifetime,
}

impl SpnegoFilter {
    pub fn new(provider: Arc<dyn CredentialProvider>, lifetime: ContextLifetime) -> Self {
        Self { provider, lifetime }
    }

    pub fn lifetime(&self) -> ContextLifetime {
        self.lifetime
    }

    /// リクエスト 1 件分のネゴシエーションを実行する。
    ///
    /// credential は毎回 acquire され、どの経路でも (取得に成功した限り)
    /// 必ず release される。認証ドメインのエラーは全てここで 401 相当の
    /// `Rejected` に畳み込まれ、上位に伝播しない。
    pub fn negotiate(
        &self,
        header: Option<&str>,
        resumed: Option<Box<dyn SecurityContext>>,
    ) -> Negotiation {
        let credential = match self.provider.acquire() {
            Ok(credential) => credential,
            Err(err) => {
                tracing::error!(error = %err, "server credential acquisition failed");
                return Negotiation::rejected(NegotiationState::NoHeader, String::new());
            }
        };

        let outcome = self.run(credential.as_ref(), header, resumed);
        self.provider.release(credential);

        tracing::debug!(
            state = ?outcome.state,
            leg = ?outcome.leg,
            principal = outcome.principal.as_ref().map(|p| p.name()),
            "negotiation complete"
        );
        outcome
    }

    fn run(
        &self,
        credential: &dyn ServerCredential,
        header: Option<&str>,
        resumed: Option<Box<dyn SecurityContext>>,
    ) -> Negotiation {
        match parse_authorization(header) {
            Scheme::None => Negotiation::rejected(NegotiationState::NoHeader, String::new()),
            Scheme::Negotiate(token) => self.negotiate_leg(credential, token, resumed),
            Scheme::Basic(token) => check_basic(token),
            Scheme::Other => {
                tracing::debug!("unsupported authorization scheme");
                Negotiation::rejected(NegotiationState::NoHeader, String::new())
            }
        }
    }

    fn negotiate_leg(
        &self,
        credential: &dyn ServerCredential,
        raw_token: &str,
        resumed: Option<Box<dyn SecurityContext>>,
    ) -> Negotiation {
        let token = match token_codec::decode(raw_token) {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(error = %err, "could not decode negotiate token");
                return Negotiation::rejected(NegotiationState::NegotiateInProgress, String::new());
            }
        };

        // 空 token は engine に渡さない。challenge パラメータも空のまま返す
        if token.is_empty() {
            return Negotiation::rejected(NegotiationState::NegotiateInProgress, String::new());
        }

        let mut context = match resumed {
            Some(context) => context,
            None => match credential.create_context() {
                Ok(context) => context,
                Err(err) => {
                    tracing::error!(error = %err, "could not create security context");
                    return Negotiation::rejected(
                        NegotiationState::NegotiateInProgress,
                        String::new(),
                    );
                }
            },
        };

        let output_token = match context.accept_token(&token) {
            Ok(output) => token_codec::encode(&output),
            Err(err) => {
                // not established 扱い。challenge は出すのでクライアントは
                // 新しい credential で再試行できる
                tracing::warn!(error = %err, "security context rejected token");
                return Negotiation::rejected(NegotiationState::NegotiateInProgress, String::new());
            }
        };

        if context.is_established() {
            match context.source_principal() {
                Ok(principal) => {
                    tracing::info!(principal = principal.name(), "authenticated via SPNEGO");
                    Negotiation::admitted(
                        NegotiationState::NegotiateEstablished,
                        principal,
                        output_token,
                    )
                }
                Err(err) => {
                    tracing::warn!(error = %err, "could not resolve source principal");
                    Negotiation::rejected(NegotiationState::NegotiateInProgress, output_token)
                }
            }
        } else {
            let pending = match self.lifetime {
                ContextLifetime::Session => Some(context),
                ContextLifetime::Request => None,
            };
            Negotiation {
                state: NegotiationState::Rejected,
                leg: NegotiationState::NegotiateInProgress,
                principal: None,
                output_token,
                pending,
            }
        }
    }
}

fn check_basic(raw_token: &str) -> Negotiation {
    match verify_basic(raw_token) {
        Ok(()) => {
            tracing::info!(principal = BASIC_TEST_PRINCIPAL, "authenticated via Basic");
            Negotiation::admitted(
                NegotiationState::BasicChecked,
                Principal::new(BASIC_TEST_PRINCIPAL.to_string()),
                String::new(),
            )
        }
        Err(err) => {
            tracing::debug!(error = %err, "basic authentication failed");
            Negotiation::rejected(NegotiationState::BasicChecked, String::new())
        }
    }
}

fn verify_basic(raw_token: &str) -> Result<(), AuthError> {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    let bytes = STANDARD
        .decode(raw_token)
        .map_err(|e| AuthError::MalformedToken(e.into()))?;
    let credentials = String::from_utf8(bytes).map_err(|e| AuthError::MalformedToken(e.into()))?;

    if credentials.eq_ignore_ascii_case(BASIC_TEST_CREDENTIALS) {
        Ok(())
    } else {
        Err(AuthError::BasicMismatch)
    }
}
