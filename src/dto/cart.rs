use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    catalog::ProductKind,
    models::{Cart, CartItem},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub cart_id: Option<Uuid>,
    pub type_item: Option<ProductKind>,
    pub item_id: Option<Uuid>,
    /// Defaults to 1.
    pub amount: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub amount: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartWithItems {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}
