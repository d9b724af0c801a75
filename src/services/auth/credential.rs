/*
 * Responsibility
 * - サーバ側 Kerberos credential の取得/解放 (Credential Provider)
 * - accept-only + SPNEGO mechanism OID に制限した GSS credential を作る
 * - trait seam にして、テストでは取得/解放回数を数えられるようにする
 */
use std::sync::Mutex;

use libgssapi::{
    credential::{Cred, CredUsage},
    name::Name,
    oid::{GSS_MECH_SPNEGO, GSS_NT_KRB5_PRINCIPAL, OidSet},
};

use crate::services::auth::context::{GssSecurityContext, SecurityContext};
use crate::services::auth::error::AuthError;

/// 1 リクエスト分の accept 用サーバ credential。
///
/// `create_context` は取得済み credential を新規コンテキストに引き渡す。
/// credential 1 つにつき 1 回だけ呼べる (2 回目はエラー)。
pub trait ServerCredential: Send {
    fn create_context(&self) -> Result<Box<dyn SecurityContext>, AuthError>;
}

/// credential の取得と解放。リクエスト毎に acquire → 使用 → release され、
/// リクエストをまたいでキャッシュされることはない。
pub trait CredentialProvider: Send + Sync {
    fn acquire(&self) -> Result<Box<dyn ServerCredential>, AuthError>;
    fn release(&self, credential: Box<dyn ServerCredential>);
}

/// libgssapi 実装。keytab は起動時に `KRB5_KTNAME` で渡される前提。
pub struct GssCredentialProvider {
    service_principal: Option<String>,
}

impl GssCredentialProvider {
    pub fn new(service_principal: Option<String>) -> Self {
        Self { service_principal }
    }
}

impl CredentialProvider for GssCredentialProvider {
    fn acquire(&self) -> Result<Box<dyn ServerCredential>, AuthError> {
        let name = match &self.service_principal {
            Some(principal) => Some(
                Name::new(principal.as_bytes(), Some(&GSS_NT_KRB5_PRINCIPAL))
                    .and_then(|n| n.canonicalize(Some(&GSS_MECH_SPNEGO)))
                    .map_err(|e| AuthError::LoginFailure(e.into()))?,
            ),
            None => None,
        };

        let mechs = {
            let mut s = OidSet::new().map_err(|e| AuthError::LoginFailure(e.into()))?;
            s.add(&GSS_MECH_SPNEGO)
                .map_err(|e| AuthError::LoginFailure(e.into()))?;
            s
        };

        let cred = Cred::acquire(name.as_ref(), None, CredUsage::Accept, Some(&mechs))
            .map_err(|e| AuthError::LoginFailure(e.into()))?;

        Ok(Box::new(GssServerCredential {
            cred: Mutex::new(Some(cred)),
        }))
    }

    fn release(&self, credential: Box<dyn ServerCredential>) {
        // GSS credential handle は drop で解放される (logout 相当)
        drop(credential);
    }
}

struct GssServerCredential {
    // `ServerCtx::new` が `Cred` を値で取るので、ここから move する
    cred: Mutex<Option<Cred>>,
}

impl ServerCredential for GssServerCredential {
    fn create_context(&self) -> Result<Box<dyn SecurityContext>, AuthError> {
        let cred = self
            .cred
            .lock()
            .map_err(|_| AuthError::SecurityContext("credential lock poisoned".into()))?
            .take()
            .ok_or_else(|| {
                AuthError::SecurityContext("credential already handed to a context".into())
            })?;
        Ok(Box::new(GssSecurityContext::new(cred)))
    }
}
