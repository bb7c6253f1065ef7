use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    catalog::ProductKind,
    models::{Order, OrderItem},
    order_status::OrderStatus,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub note: Option<String>,
    pub items: Option<Vec<NewOrderItem>>,
}

/// Order line payload. `price` and `name` fall back to the catalog when omitted.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewOrderItem {
    pub type_item: Option<ProductKind>,
    pub item_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub price: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
