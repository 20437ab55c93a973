//! Locally issued access tokens.
//!
//! Both interactive sessions and the automation caller use HS256-signed JWTs
//! carrying [`Claims`]. For a person `sub` is the user id; for the automation
//! caller `service` is set and `sub` holds the shared API key, which is
//! compared against the configured key on every request.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use mediadesk_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims embedded in every locally issued token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id (as a string) or, for service tokens, the service API key.
    pub sub: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for audit.
    pub jti: String,
    /// Marks a token issued to the automation caller.
    #[serde(default)]
    pub service: bool,
}

/// Configuration for local token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Session token lifetime in hours (default: 24).
    pub access_token_expiry_hours: i64,
    /// Service token lifetime in days (default: 7).
    pub service_token_expiry_days: i64,
}

/// Default session token expiry in hours.
const DEFAULT_ACCESS_EXPIRY_HOURS: i64 = 24;
/// Default service token expiry in days.
const DEFAULT_SERVICE_EXPIRY_DAYS: i64 = 7;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                     | Required | Default |
    /// |-----------------------------|----------|---------|
    /// | `JWT_SECRET`                | **yes**  | --      |
    /// | `ACCESS_TOKEN_EXPIRE_HOURS` | no       | `24`    |
    /// | `SERVICE_TOKEN_EXPIRE_DAYS` | no       | `7`     |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_hours: i64 = std::env::var("ACCESS_TOKEN_EXPIRE_HOURS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_HOURS.to_string())
            .parse()
            .expect("ACCESS_TOKEN_EXPIRE_HOURS must be a valid i64");

        let service_token_expiry_days: i64 = std::env::var("SERVICE_TOKEN_EXPIRE_DAYS")
            .unwrap_or_else(|_| DEFAULT_SERVICE_EXPIRY_DAYS.to_string())
            .parse()
            .expect("SERVICE_TOKEN_EXPIRE_DAYS must be a valid i64");

        Self {
            secret,
            access_token_expiry_hours,
            service_token_expiry_days,
        }
    }
}

/// Generate an HS256 session token for the given user.
pub fn generate_access_token(
    user_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    sign(
        user_id.to_string(),
        config.access_token_expiry_hours * 3600,
        false,
        config,
    )
}

/// Generate an HS256 token identifying the automation caller.
pub fn generate_service_token(
    api_key: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    sign(
        api_key.to_string(),
        config.service_token_expiry_days * 86_400,
        true,
        config,
    )
}

/// Validate and decode a local token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration automatically.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

fn sign(
    sub: String,
    ttl_secs: i64,
    service: bool,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub,
        exp: now + ttl_secs,
        iat: now,
        jti: Uuid::new_v4().to_string(),
        service,
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}
