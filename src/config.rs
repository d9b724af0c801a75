/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, SERVICE_PRINCIPAL, KRB5_KEYTAB など)
 * - 設定値のバリデーション (不正なら起動失敗)
 * - Kerberos 設定は名前付きログイン設定ではなく、明示的な
 *   module options (principal / keytab / realm) として受け取る
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// GSS コンテキストの生存期間 (リクエスト単位 or ハンドシェイク継続)。
///
/// - `Request`: リクエスト毎に新規コンテキスト。multi-leg の継続不可。
/// - `Session`: 未確立コンテキストを peer アドレス単位で保持し、
///   次のリクエストで続きから accept する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextLifetime {
    Request,
    Session,
}

// 全ての設定値にデフォルトがあるので "missing" は起きない。
// 不正値のみ起動失敗にする
#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,

    /// accept 用サーバ principal (例: `HTTP/host.example.com@EXAMPLE.COM`)。
    /// 未指定ならデフォルトの acceptor credential を使う。
    pub service_principal: Option<String>,
    pub keytab: Option<String>,

    pub basic_realm: String,
    pub context_lifetime: ContextLifetime,

    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8182);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let service_principal = std::env::var("SERVICE_PRINCIPAL")
            .ok()
            .filter(|s| !s.is_empty());

        let keytab = std::env::var("KRB5_KEYTAB").ok().filter(|s| !s.is_empty());

        let basic_realm =
            std::env::var("BASIC_REALM").unwrap_or_else(|_| "Test Realm".to_string());

        // realm は challenge header にそのまま埋め込むので、ここで弾いておく
        if !basic_realm.is_ascii() || basic_realm.contains('"') {
            return Err(ConfigError::Invalid("BASIC_REALM"));
        }

        let context_lifetime = match std::env::var("CONTEXT_LIFETIME")
            .unwrap_or_else(|_| "request".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "request" => ContextLifetime::Request,
            "session" => ContextLifetime::Session,
            _ => return Err(ConfigError::Invalid("CONTEXT_LIFETIME")),
        };

        let request_timeout = Duration::from_secs(
            std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        );

        Ok(Self {
            addr,
            app_env,
            service_principal,
            keytab,
            basic_realm,
            context_lifetime,
            request_timeout,
        })
    }
}
