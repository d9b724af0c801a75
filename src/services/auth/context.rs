/*
 * Responsibility
 * - GSS accept-security-context 1 leg 分のラッパ (Security Context Engine)
 * - established 判定と source principal の取り出し
 */
use libgssapi::context::{SecurityContext as GssContextExt, ServerCtx};
use libgssapi::credential::Cred;

use crate::api::v1::extractors::Principal;
use crate::services::auth::error::AuthError;

/// 1 回のネゴシエーション試行を表すコンテキスト。
///
/// `accept_token` は GSS 交換の 1 leg を進め、クライアントへ返すべき
/// 出力 token (不要なら空) を返す。メカニズムエラーは
/// `AuthError::SecurityContext` となり、呼び出し側は "not established"
/// として扱う。
pub trait SecurityContext: Send {
    fn accept_token(&mut self, token: &[u8]) -> Result<Vec<u8>, AuthError>;
    fn is_established(&self) -> bool;
    /// established になった後でのみ有効。
    fn source_principal(&mut self) -> Result<Principal, AuthError>;
}

pub struct GssSecurityContext {
    ctx: ServerCtx,
}

impl GssSecurityContext {
    pub(crate) fn new(cred: Cred) -> Self {
        Self {
            ctx: ServerCtx::new(cred),
        }
    }
}

impl SecurityContext for GssSecurityContext {
    fn accept_token(&mut self, token: &[u8]) -> Result<Vec<u8>, AuthError> {
        let output = self
            .ctx
            .step(token)
            .map_err(|e| AuthError::SecurityContext(e.into()))?;
        Ok(output.map(|buf| buf.to_vec()).unwrap_or_default())
    }

    fn is_established(&self) -> bool {
        self.ctx.is_complete()
    }

    fn source_principal(&mut self) -> Result<Principal, AuthError> {
        let name = self
            .ctx
            .source_name()
            .map_err(|e| AuthError::SecurityContext(e.into()))?;
        Ok(Principal::new(name.to_string()))
    }
}
