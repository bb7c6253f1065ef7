//! Read-only access to priced travel products.
//!
//! Cart and order lines point at catalog rows through a `(type_item, item_id)`
//! pair. [`ProductRef`] is the typed form of that pair and [`CatalogReader`]
//! resolves it to a name and a unit price.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::{Cars, Flights, Hotels, Packages},
    error::AppResult,
};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    #[sea_orm(string_value = "flight")]
    Flight,
    #[sea_orm(string_value = "hotel")]
    Hotel,
    #[sea_orm(string_value = "package")]
    Package,
    #[sea_orm(string_value = "car")]
    Car,
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProductKind::Flight => "flight",
            ProductKind::Hotel => "hotel",
            ProductKind::Package => "package",
            ProductKind::Car => "car",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductRef {
    pub kind: ProductKind,
    pub id: Uuid,
}

impl ProductRef {
    pub fn new(kind: ProductKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    /// Label used when neither the caller nor the catalog supplies a name.
    pub fn fallback_label(&self) -> String {
        format!("{} {}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub unit_price: i64,
}

#[automock]
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Current name and unit price of a product, `None` when it is gone.
    async fn price_of(&self, product: ProductRef) -> AppResult<Option<CatalogEntry>>;
}

#[derive(Debug, Clone)]
pub struct SeaOrmCatalog {
    orm: DatabaseConnection,
}

impl SeaOrmCatalog {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }
}

#[async_trait]
impl CatalogReader for SeaOrmCatalog {
    async fn price_of(&self, product: ProductRef) -> AppResult<Option<CatalogEntry>> {
        let entry = match product.kind {
            ProductKind::Flight => Flights::find_by_id(product.id)
                .one(&self.orm)
                .await?
                .map(|m| CatalogEntry {
                    name: m.name,
                    unit_price: m.price,
                }),
            ProductKind::Hotel => Hotels::find_by_id(product.id)
                .one(&self.orm)
                .await?
                .map(|m| CatalogEntry {
                    name: m.name,
                    unit_price: m.price,
                }),
            ProductKind::Package => Packages::find_by_id(product.id)
                .one(&self.orm)
                .await?
                .map(|m| CatalogEntry {
                    name: m.name,
                    unit_price: m.price,
                }),
            ProductKind::Car => Cars::find_by_id(product.id)
                .one(&self.orm)
                .await?
                .map(|m| CatalogEntry {
                    name: m.name,
                    unit_price: m.price,
                }),
        };

        if entry.is_none() {
            tracing::debug!(kind = %product.kind, id = %product.id, "catalog lookup missed");
        }

        Ok(entry)
    }
}
