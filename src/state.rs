use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{catalog::CatalogReader, config::OrderPolicy, payment::PaymentGateway};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub catalog: Arc<dyn CatalogReader>,
    pub payments: Arc<dyn PaymentGateway>,
    pub orders: Arc<OrderPolicy>,
}
