use crate::auth::federated::FederatedConfig;
use crate::auth::jwt::JwtConfig;
use crate::storage::StorageConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development except
/// `JWT_SECRET`. Federation and image signing switch on only when their
/// variables are present.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Local token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Shared secret identifying the automation caller. With no key set,
    /// locally issued service tokens are never accepted.
    pub service_api_key: Option<String>,
    /// Identity provider settings; `None` disables federated tokens.
    pub federated: Option<FederatedConfig>,
    /// Blob storage settings; `None` disables image URLs in listings.
    pub storage: Option<StorageConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SERVICE_API_KEY`      | unset                      |
    ///
    /// See [`JwtConfig::from_env`], [`FederatedConfig::from_env`] and
    /// [`StorageConfig::from_env`] for the rest.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let service_api_key = std::env::var("SERVICE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            service_api_key,
            federated: FederatedConfig::from_env(),
            storage: StorageConfig::from_env(),
        }
    }
}
