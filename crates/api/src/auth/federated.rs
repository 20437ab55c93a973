//! Verification of tokens issued by the federated identity provider.
//!
//! Tokens are RS256-signed; the signing key is located by the header `kid`
//! through a [`KeyCache`]. Audience and issuer must match configuration.
//! Callers authenticated with client credentials (`appidacr == "1"`) are the
//! automation identity; everyone else is an interactive user known only by
//! the provider's object id.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use mediadesk_core::identity::{Identity, InteractiveUser, UserRef};
use serde::Deserialize;

use super::key_cache::{JwksHttpSource, KeyCache, SystemClock, DEFAULT_MIN_REFRESH};
use super::AuthError;

/// `appidacr` value the provider sets for client-credential (app-only) tokens.
const CLIENT_CREDENTIAL_ACR: &str = "1";

/// Identity provider settings.
#[derive(Debug, Clone)]
pub struct FederatedConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub jwks_url: String,
    pub audience: String,
    pub issuer: String,
    /// `None` keeps keys until restart.
    pub cache_ttl: Option<Duration>,
    /// Shortest gap between two key-set fetches.
    pub min_refresh: Duration,
}

impl FederatedConfig {
    /// Load provider settings from environment variables.
    ///
    /// Returns `None` (federation disabled) unless both `AZURE_TENANT_ID` and
    /// `AZURE_APP_CLIENT_ID` are set.
    ///
    /// | Env Var                 | Default                                      |
    /// |-------------------------|----------------------------------------------|
    /// | `AZURE_JWKS_URL`        | provider discovery keys URL for the tenant   |
    /// | `AZURE_AUDIENCE`        | `api://{client}`                             |
    /// | `AZURE_ISSUER`          | `https://sts.windows.net/{tenant}/`          |
    /// | `JWKS_CACHE_TTL_SECS`   | unset (never expire)                         |
    /// | `JWKS_MIN_REFRESH_SECS` | `60`                                         |
    pub fn from_env() -> Option<Self> {
        let tenant_id = non_empty_env("AZURE_TENANT_ID")?;
        let client_id = non_empty_env("AZURE_APP_CLIENT_ID")?;

        let jwks_url = non_empty_env("AZURE_JWKS_URL").unwrap_or_else(|| {
            format!(
                "https://login.microsoftonline.com/{tenant_id}/discovery/keys?appid={client_id}"
            )
        });
        let audience =
            non_empty_env("AZURE_AUDIENCE").unwrap_or_else(|| format!("api://{client_id}"));
        let issuer = non_empty_env("AZURE_ISSUER")
            .unwrap_or_else(|| format!("https://sts.windows.net/{tenant_id}/"));
        let cache_ttl = non_empty_env("JWKS_CACHE_TTL_SECS").map(|v| {
            Duration::from_secs(v.parse().expect("JWKS_CACHE_TTL_SECS must be a valid u64"))
        });
        let min_refresh = non_empty_env("JWKS_MIN_REFRESH_SECS")
            .map(|v| {
                Duration::from_secs(v.parse().expect("JWKS_MIN_REFRESH_SECS must be a valid u64"))
            })
            .unwrap_or(DEFAULT_MIN_REFRESH);

        Some(Self {
            tenant_id,
            client_id,
            jwks_url,
            audience,
            issuer,
            cache_ttl,
            min_refresh,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Claims read from a federated token. Signature, `exp`, `aud` and `iss` are
/// checked by [`Validation`] before these are trusted.
#[derive(Debug, Deserialize)]
struct FederatedClaims {
    oid: Option<String>,
    sub: Option<String>,
    name: Option<String>,
    preferred_username: Option<String>,
    upn: Option<String>,
    email: Option<String>,
    appidacr: Option<String>,
}

impl FederatedClaims {
    fn into_identity(self) -> Result<Identity, AuthError> {
        if self.appidacr.as_deref() == Some(CLIENT_CREDENTIAL_ACR) {
            return Ok(Identity::Service);
        }

        let object_id = self
            .oid
            .or(self.sub)
            .ok_or_else(|| AuthError::TokenInvalid("token names no subject".into()))?;

        Ok(Identity::Interactive(InteractiveUser {
            id: UserRef::Federated(object_id),
            name: self.name,
            email: self.preferred_username.or(self.upn).or(self.email),
            is_admin: false,
        }))
    }
}

/// Verifies provider-issued tokens against cached signing keys.
pub struct FederatedVerifier {
    keys: KeyCache,
    audience: String,
    issuer: String,
}

impl FederatedVerifier {
    /// Verifier backed by the provider's JWKS endpoint and the system clock.
    pub fn from_config(config: &FederatedConfig) -> Result<Self, reqwest::Error> {
        let source = JwksHttpSource::new(&config.jwks_url)?;
        let keys = KeyCache::new(Arc::new(source), Arc::new(SystemClock), config.cache_ttl)
            .with_min_refresh(config.min_refresh);
        Ok(Self::new(keys, &config.audience, &config.issuer))
    }

    pub fn new(keys: KeyCache, audience: &str, issuer: &str) -> Self {
        Self {
            keys,
            audience: audience.to_string(),
            issuer: issuer.to_string(),
        }
    }

    pub async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let header = decode_header(token)?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::TokenInvalid("token header carries no key id".into()))?;

        let jwk = self.keys.get(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<FederatedClaims>(token, &key, &validation)?;
        data.claims.into_identity()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use jsonwebtoken::jwk::JwkSet;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    use super::*;
    use crate::auth::key_cache::tests::{ManualClock, StaticSource};

    const PRIVATE_KEY: &str = include_str!("testdata/rsa_private.pem");
    const MODULUS: &str = include_str!("testdata/rsa_modulus.txt");
    const KID: &str = "test-key";
    const AUDIENCE: &str = "api://client-123";
    const ISSUER: &str = "https://sts.windows.net/tenant-abc/";

    fn key_set() -> JwkSet {
        serde_json::from_value(json!({
            "keys": [{
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": KID,
                "n": MODULUS.trim(),
                "e": "AQAB",
            }]
        }))
        .unwrap()
    }

    fn verifier() -> (FederatedVerifier, Arc<StaticSource>) {
        let source = Arc::new(StaticSource::new(key_set()));
        let cache = KeyCache::new(source.clone(), Arc::new(ManualClock::new()), None);
        (FederatedVerifier::new(cache, AUDIENCE, ISSUER), source)
    }

    fn token(kid: &str, claims: serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
        encode(&header, &claims, &key).unwrap()
    }

    fn claims(extra: serde_json::Value) -> serde_json::Value {
        let now = chrono::Utc::now().timestamp();
        let mut base = json!({
            "aud": AUDIENCE,
            "iss": ISSUER,
            "iat": now,
            "exp": now + 600,
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        base
    }

    #[tokio::test]
    async fn interactive_user_token() {
        let (verifier, source) = verifier();
        let jwt = token(
            KID,
            claims(json!({
                "oid": "obj-1",
                "name": "Dana Scully",
                "preferred_username": "dana@example.com",
                "appidacr": "0",
            })),
        );

        let identity = verifier.verify(&jwt).await.unwrap();
        assert_eq!(
            identity,
            Identity::Interactive(InteractiveUser {
                id: UserRef::Federated("obj-1".into()),
                name: Some("Dana Scully".into()),
                email: Some("dana@example.com".into()),
                is_admin: false,
            })
        );

        verifier.verify(&jwt).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn client_credential_token_is_service() {
        let (verifier, _) = verifier();
        let jwt = token(KID, claims(json!({ "oid": "app-1", "appidacr": "1" })));
        assert_eq!(verifier.verify(&jwt).await.unwrap(), Identity::Service);
    }

    #[tokio::test]
    async fn wrong_audience_is_rejected() {
        let (verifier, _) = verifier();
        let mut c = claims(json!({ "oid": "obj-1" }));
        c["aud"] = json!("api://someone-else");
        let err = verifier.verify(&token(KID, c)).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
    }

    #[tokio::test]
    async fn wrong_issuer_is_rejected() {
        let (verifier, _) = verifier();
        let mut c = claims(json!({ "oid": "obj-1" }));
        c["iss"] = json!("https://evil.example/");
        assert!(verifier.verify(&token(KID, c)).await.is_err());
    }

    #[tokio::test]
    async fn expired_token_is_reported() {
        let (verifier, _) = verifier();
        let now = chrono::Utc::now().timestamp();
        let mut c = claims(json!({ "oid": "obj-1" }));
        c["exp"] = json!(now - 600);
        let err = verifier.verify(&token(KID, c)).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn unknown_kid_is_rejected() {
        let (verifier, _) = verifier();
        let jwt = token("rotated-away", claims(json!({ "oid": "obj-1" })));
        assert!(matches!(
            verifier.verify(&jwt).await.unwrap_err(),
            AuthError::TokenInvalid(_)
        ));
    }

    #[tokio::test]
    async fn token_without_subject_is_rejected() {
        let (verifier, _) = verifier();
        let jwt = token(KID, claims(json!({ "appidacr": "0" })));
        assert!(matches!(
            verifier.verify(&jwt).await.unwrap_err(),
            AuthError::TokenInvalid(_)
        ));
    }
}
