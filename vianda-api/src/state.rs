use std::sync::Arc;

use vianda_catalog::PricingConfig;
use vianda_core::payment::{BackUrls, PaymentGateway};
use vianda_core::receipt::ReceiptStore;
use vianda_order::repository::OrderRepository;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderRepository>,
    pub receipts: Arc<dyn ReceiptStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub auth: AuthConfig,
    pub back_urls: BackUrls,
    pub pricing: PricingConfig,
}
