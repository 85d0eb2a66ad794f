//! Shared application state.

use std::sync::Arc;

use eventhub_core::QrSigner;
use eventhub_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use crate::payment_gateway::PaymentGateway;
use crate::qr_service::QrCodeService;

/// State shared by every request handler and background task.
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub jwt: JwtManager,
    pub qr_signer: QrSigner,
    pub qr_codes: QrCodeService,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Builds the state from an open database and loaded config.
    pub fn new(db: Database, config: ApiConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_lifetime_secs);
        let qr_signer = QrSigner::new(config.qr_signing_secret.as_bytes());

        AppState {
            db,
            config,
            jwt,
            qr_signer,
            qr_codes: QrCodeService::new(),
            gateway,
        }
    }
}
