/*
 * Responsibility
 * - 認証ドメインのエラー型 (module-owned)
 * - 全て filter 境界で 401 + ChallengeSet に変換される前提 (5xx にはしない)
 */
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// トークンが hex としても Base64 としても解釈できない。
    /// 認証失敗として扱う (サーバエラーではない)。
    #[error("malformed security token")]
    MalformedToken(#[source] BoxError),

    /// サーバ側 credential の取得 (Kerberos login) に失敗。
    /// そのリクエストに対しては致命的。リトライしない。
    #[error("kerberos login failed")]
    LoginFailure(#[source] BoxError),

    /// GSS accept-security-context のメカニズムレベル失敗。
    /// "not established" として扱い、クライアントの再試行を許す。
    #[error("security context negotiation failed")]
    SecurityContext(#[source] BoxError),

    /// Basic の固定テスト credential と不一致。静かに認証失敗扱い。
    #[error("basic credentials did not match")]
    BasicMismatch,
}
