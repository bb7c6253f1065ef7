#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use travel_checkout::{
    catalog::SeaOrmCatalog,
    config::OrderPolicy,
    db::create_schema,
    entity::{flights, hotels},
    payment::{MockPaymentGateway, PaymentGateway},
    state::AppState,
};
use uuid::Uuid;

/// Fresh in-memory database with the full schema.
pub async fn sqlite_conn() -> anyhow::Result<DatabaseConnection> {
    // One connection: every pooled connection to `:memory:` is its own database.
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(opts).await?;
    create_schema(&orm).await?;
    Ok(orm)
}

/// State backed by the real catalog and a payment gateway that must not be
/// called.
pub async fn test_state() -> anyhow::Result<AppState> {
    let orm = sqlite_conn().await?;
    Ok(state_with(orm, OrderPolicy::default(), MockPaymentGateway::new()))
}

pub fn state_with(
    orm: DatabaseConnection,
    policy: OrderPolicy,
    payments: impl PaymentGateway + 'static,
) -> AppState {
    AppState {
        catalog: Arc::new(SeaOrmCatalog::new(orm.clone())),
        payments: Arc::new(payments),
        orders: Arc::new(policy),
        orm,
    }
}

pub fn with_gateway(state: &AppState, payments: impl PaymentGateway + 'static) -> AppState {
    AppState {
        payments: Arc::new(payments),
        ..state.clone()
    }
}

pub async fn insert_flight(
    orm: &DatabaseConnection,
    name: &str,
    price: i64,
) -> anyhow::Result<Uuid> {
    let flight = flights::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        airline: Set("Test Air".into()),
        origin: Set("EZE".into()),
        destination: Set("BRC".into()),
        price: Set(price),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(flight.id)
}

pub async fn insert_hotel(
    orm: &DatabaseConnection,
    name: &str,
    price: i64,
) -> anyhow::Result<Uuid> {
    let hotel = hotels::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        city: Set("Bariloche".into()),
        price: Set(price),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(hotel.id)
}
