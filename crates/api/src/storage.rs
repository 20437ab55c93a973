//! Time-limited read URLs for submission images.
//!
//! Images live in a blob container; listings hand out a shared-access
//! signature (SAS) URL per image instead of proxying bytes. The signer is a
//! trait so handlers never depend on the storage vendor.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Storage service version the string-to-sign layout below follows.
const SAS_VERSION: &str = "2020-12-06";

/// Produces a signed, expiring read URL for an image reference.
pub trait ImageUrlSigner: Send + Sync {
    fn signed_url(&self, blob_name: &str) -> String;
}

/// Blob storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub account_name: String,
    /// Base64-encoded account key.
    pub account_key: String,
    pub container: String,
    pub url_expiry_hours: i64,
}

impl StorageConfig {
    /// Load storage settings from environment variables.
    ///
    /// Returns `None` (image URLs disabled) unless `STORAGE_ACCOUNT_NAME`,
    /// `STORAGE_ACCOUNT_KEY` and `IMAGE_CONTAINER` are all set.
    /// `IMAGE_URL_EXPIRE_HOURS` defaults to `24`.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let account_name = var("STORAGE_ACCOUNT_NAME")?;
        let account_key = var("STORAGE_ACCOUNT_KEY")?;
        let container = var("IMAGE_CONTAINER")?;
        let url_expiry_hours: i64 = var("IMAGE_URL_EXPIRE_HOURS")
            .unwrap_or_else(|| "24".into())
            .parse()
            .expect("IMAGE_URL_EXPIRE_HOURS must be a valid i64");

        Some(Self {
            account_name,
            account_key,
            container,
            url_expiry_hours,
        })
    }
}

/// Why a signer could not be built from its configuration.
#[derive(Debug, thiserror::Error)]
pub enum StorageKeyError {
    #[error("account key is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("account key has an unusable length")]
    Length(#[from] hmac::digest::InvalidLength),
}

/// Signs blob read URLs with the storage account key (service SAS).
pub struct AzureSasSigner {
    account_name: String,
    container: String,
    expiry: Duration,
    /// Keyed MAC, cloned for every signature.
    mac: HmacSha256,
}

impl AzureSasSigner {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageKeyError> {
        let key = STANDARD.decode(config.account_key.trim())?;
        Ok(Self {
            account_name: config.account_name.clone(),
            container: config.container.clone(),
            expiry: Duration::hours(config.url_expiry_hours),
            mac: HmacSha256::new_from_slice(&key)?,
        })
    }

    /// Signed read URL for `blob_name` valid until `expires_at`.
    pub fn sign_until(&self, blob_name: &str, expires_at: DateTime<Utc>) -> String {
        let expiry = expires_at.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let signature = self.signature(blob_name, &expiry);

        let base = format!(
            "https://{}.blob.core.windows.net/{}/{}",
            self.account_name, self.container, blob_name
        );
        match reqwest::Url::parse(&base) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("sp", "r")
                    .append_pair("se", &expiry)
                    .append_pair("sv", SAS_VERSION)
                    .append_pair("sr", "b")
                    .append_pair("sig", &signature);
                url.to_string()
            }
            // Blob names come from stored submissions; an unparsable one still
            // gets a URL rather than failing the listing.
            Err(_) => format!("{base}?sp=r&se={expiry}&sv={SAS_VERSION}&sr=b&sig={signature}"),
        }
    }

    fn signature(&self, blob_name: &str, expiry: &str) -> String {
        let resource = format!("/blob/{}/{}/{}", self.account_name, self.container, blob_name);
        // sp, st, se, resource, si, sip, spr, sv, sr, snapshot, ses,
        // rscc, rscd, rsce, rscl, rsct
        let string_to_sign = [
            "r",
            "",
            expiry,
            resource.as_str(),
            "",
            "",
            "",
            SAS_VERSION,
            "b",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ]
        .join("\n");

        let mut mac = self.mac.clone();
        mac.update(string_to_sign.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }
}

impl ImageUrlSigner for AzureSasSigner {
    fn signed_url(&self, blob_name: &str) -> String {
        self.sign_until(blob_name, Utc::now() + self.expiry)
    }
}
