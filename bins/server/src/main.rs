//! Auditflow API Server
//!
//! Main entry point for the Auditflow attestation service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auditflow_api::{AppState, create_router};
use auditflow_core::workflow::{DigitalSignatureService, Ed25519Primitive, WorkflowOrchestrator};
use auditflow_db::{SeaOrmWorkflowStore, connect_with_pool};
use auditflow_shared::{AppConfig, AppError, SigningConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auditflow=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().map_err(AppError::from)?;

    // Connect to database
    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");

    // Signing key
    let primitive = load_signing_key(&config.signing)?;
    info!(
        key_id = %config.signing.key_id,
        public_key = %primitive.verifying_key_base64(),
        "Signing key loaded"
    );
    let signatures = DigitalSignatureService::new(Arc::new(primitive));

    // Create application state
    let orchestrator = WorkflowOrchestrator::new(SeaOrmWorkflowStore::new(db), signatures);
    let state = AppState::new(orchestrator);

    // Create router
    let app = create_router(state);

    // Start server
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Loads the Ed25519 key from configuration, or generates a throwaway one.
fn load_signing_key(config: &SigningConfig) -> Result<Ed25519Primitive, AppError> {
    match config.seed_base64.as_deref() {
        Some(seed) => Ed25519Primitive::from_base64_seed(seed.trim())
            .map_err(|e| AppError::SigningKey(e.to_string())),
        None => {
            warn!(
                key_id = %config.key_id,
                "No signing seed configured; using an ephemeral key. Signatures will not verify after restart"
            );
            Ok(Ed25519Primitive::generate())
        }
    }
}
