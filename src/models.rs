use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    catalog::ProductKind,
    entity::{cart_items, carts, order_items, orders},
    order_status::OrderStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub type_item: ProductKind,
    pub item_id: Uuid,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub note: Option<String>,
    /// Sum of `price * quantity` over the order's items, computed on read.
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub type_item: ProductKind,
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

impl From<carts::Model> for Cart {
    fn from(model: carts::Model) -> Self {
        Cart {
            id: model.id,
            user_id: model.user_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        CartItem {
            id: model.id,
            cart_id: model.cart_id,
            type_item: model.type_item,
            item_id: model.item_id,
            amount: model.amount,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        OrderItem {
            id: model.id,
            order_id: model.order_id,
            type_item: model.type_item,
            item_id: model.item_id,
            name: model.name,
            quantity: model.quantity,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl Order {
    pub fn from_entity(model: orders::Model, items: &[OrderItem]) -> Self {
        Order {
            id: model.id,
            user_id: model.user_id,
            status: model.status,
            note: model.note,
            total_price: total_price(items),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Order total: `sum(price * quantity)`, zero for an empty order.
///
/// Writes are rejected before a stored order can overflow, so saturating here
/// only matters for rows written outside this service.
pub fn total_price(items: &[OrderItem]) -> i64 {
    checked_total(items.iter().map(|item| (item.price, item.quantity))).unwrap_or(i64::MAX)
}

/// `sum(price * quantity)` over `(price, quantity)` pairs, `None` on overflow.
pub fn checked_total<I>(lines: I) -> Option<i64>
where
    I: IntoIterator<Item = (i64, i32)>,
{
    lines.into_iter().try_fold(0i64, |total, (price, quantity)| {
        price.checked_mul(i64::from(quantity))?.checked_add(total)
    })
}
