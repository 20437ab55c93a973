use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediadesk_api::auth::federated::FederatedVerifier;
use mediadesk_api::config::ServerConfig;
use mediadesk_api::router::build_app_router;
use mediadesk_api::state::AppState;
use mediadesk_api::storage::{AzureSasSigner, ImageUrlSigner};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediadesk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = mediadesk_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    mediadesk_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    mediadesk_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Federated identity ---
    let federated = config.federated.as_ref().map(|cfg| {
        let verifier =
            FederatedVerifier::from_config(cfg).expect("Failed to build JWKS HTTP client");
        tracing::info!(
            tenant = %cfg.tenant_id,
            audience = %cfg.audience,
            cache_ttl = ?cfg.cache_ttl,
            min_refresh = ?cfg.min_refresh,
            "Federated token verification enabled"
        );
        Arc::new(verifier)
    });
    if config.federated.is_none() {
        tracing::info!("Federated token verification disabled");
    }
    if config.service_api_key.is_none() {
        tracing::warn!("SERVICE_API_KEY not set; service tokens will be rejected");
    }

    // --- Image storage ---
    let image_signer = config.storage.as_ref().map(|cfg| {
        let signer = AzureSasSigner::new(cfg).expect("Invalid STORAGE_ACCOUNT_KEY");
        tracing::info!(
            account = %cfg.account_name,
            container = %cfg.container,
            "Image URL signing enabled"
        );
        Arc::new(signer) as Arc<dyn ImageUrlSigner>
    });

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        federated,
        image_signer,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
