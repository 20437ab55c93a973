use std::sync::Arc;

use crate::auth::federated::FederatedVerifier;
use crate::config::ServerConfig;
use crate::storage::ImageUrlSigner;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: mediadesk_db::DbPool,
    /// Server configuration (JWT secret, service key, CORS).
    pub config: Arc<ServerConfig>,
    /// Verifier for identity-provider tokens, when federation is configured.
    pub federated: Option<Arc<FederatedVerifier>>,
    /// Image URL signer, when blob storage is configured.
    pub image_signer: Option<Arc<dyn ImageUrlSigner>>,
}
