use anyhow::anyhow;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::{
    audit::audit_best_effort,
    catalog::ProductKind,
    dto::cart::{AddToCartRequest, CartWithItems, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
    },
    error::{AppError, AppResult},
    models::{Cart, CartItem},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Return the user's cart with its lines, creating the cart on first use.
pub async fn get_or_create_cart(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<CartWithItems>> {
    let cart = ensure_cart(&state.orm, user_id).await?;
    let items = list_items(&state.orm, cart.id).await?;

    Ok(ApiResponse::success(
        "OK",
        CartWithItems {
            cart: Cart::from(cart),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Read-only lookup; unlike [`get_or_create_cart`] this never creates.
pub async fn get_cart(state: &AppState, user_id: Uuid) -> AppResult<ApiResponse<CartWithItems>> {
    let cart = find_cart_by_user(&state.orm, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart"))?;
    let items = list_items(&state.orm, cart.id).await?;

    Ok(ApiResponse::success(
        "OK",
        CartWithItems {
            cart: Cart::from(cart),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Add a product to a cart, merging into the existing line for the same
/// product. Amounts accumulate, they never overwrite.
pub async fn add_item(
    state: &AppState,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let cart_id = payload
        .cart_id
        .ok_or_else(|| AppError::BadRequest("cart_id is required".into()))?;
    let type_item = payload
        .type_item
        .ok_or_else(|| AppError::BadRequest("type_item is required".into()))?;
    let item_id = payload
        .item_id
        .ok_or_else(|| AppError::BadRequest("item_id is required".into()))?;
    let amount = payload.amount.unwrap_or(1);
    if amount <= 0 {
        return Err(AppError::BadRequest(
            "amount must be greater than 0".to_string(),
        ));
    }

    let cart = Carts::find_by_id(cart_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Cart"))?;

    let txn = state.orm.begin().await?;

    // Single statement so concurrent adds of the same product cannot lose an
    // increment.
    let line = CartItemActive {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart.id),
        type_item: Set(type_item),
        item_id: Set(item_id),
        amount: Set(amount),
        created_at: Set(Utc::now().into()),
    };
    CartItems::insert(line)
        .on_conflict(
            OnConflict::columns([
                CartItemCol::CartId,
                CartItemCol::TypeItem,
                CartItemCol::ItemId,
            ])
            .value(
                CartItemCol::Amount,
                Expr::col((CartItems, CartItemCol::Amount)).add(Expr::cust("excluded.amount")),
            )
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

    let merged = find_line(&txn, cart.id, type_item, item_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow!("cart line missing after upsert")))?;

    txn.commit().await?;

    tracing::debug!(
        cart_id = %cart.id,
        type_item = %type_item,
        item_id = %item_id,
        amount = merged.amount,
        "cart line upserted"
    );

    audit_best_effort(
        &state.orm,
        Some(cart.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({
            "cart_id": cart.id,
            "type_item": type_item,
            "item_id": item_id,
            "amount": amount,
        }),
    )
    .await;

    Ok(ApiResponse::success("OK", CartItem::from(merged), None))
}

/// Set a line's amount outright.
pub async fn update_item_quantity(
    state: &AppState,
    id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let amount = payload
        .amount
        .ok_or_else(|| AppError::BadRequest("amount is required".into()))?;
    if amount <= 0 {
        return Err(AppError::BadRequest(
            "amount must be greater than 0".to_string(),
        ));
    }

    let line = CartItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Cart item"))?;

    let mut active: CartItemActive = line.into();
    active.amount = Set(amount);
    let updated = active.update(&state.orm).await?;

    audit_best_effort(
        &state.orm,
        None,
        "cart_update",
        "cart_items",
        serde_json::json!({ "cart_item_id": id, "amount": amount }),
    )
    .await;

    Ok(ApiResponse::success("OK", CartItem::from(updated), None))
}

/// Delete one line. Deleting a line that is already gone succeeds.
pub async fn remove_item(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected > 0 {
        audit_best_effort(
            &state.orm,
            None,
            "cart_remove",
            "cart_items",
            serde_json::json!({ "cart_item_id": id }),
        )
        .await;
    }

    Ok(ApiResponse::confirmation("Removed from cart"))
}

/// Delete every line of a cart. Idempotent.
pub async fn clear_cart(
    state: &AppState,
    cart_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart_id))
        .exec(&state.orm)
        .await?;

    tracing::debug!(%cart_id, removed = result.rows_affected, "cart cleared");

    Ok(ApiResponse::confirmation("Cart cleared"))
}

/// Find the user's cart or create it. A unique violation on `user_id` means a
/// concurrent request won the insert, so the row is re-read instead.
pub(crate) async fn ensure_cart<C>(conn: &C, user_id: Uuid) -> AppResult<CartModel>
where
    C: ConnectionTrait,
{
    if let Some(cart) = find_cart_by_user(conn, user_id).await? {
        return Ok(cart);
    }
    create_or_fetch_cart(conn, user_id).await
}

async fn create_or_fetch_cart<C>(conn: &C, user_id: Uuid) -> AppResult<CartModel>
where
    C: ConnectionTrait,
{
    let created = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await;

    match created {
        Ok(cart) => {
            tracing::info!(%user_id, cart_id = %cart.id, "cart created");
            Ok(cart)
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            tracing::debug!(%user_id, "cart created concurrently, re-reading");
            find_cart_by_user(conn, user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Cart"))
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) async fn find_cart_by_user<C>(conn: &C, user_id: Uuid) -> AppResult<Option<CartModel>>
where
    C: ConnectionTrait,
{
    Ok(Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?)
}

pub(crate) async fn list_items<C>(conn: &C, cart_id: Uuid) -> AppResult<Vec<CartItem>>
where
    C: ConnectionTrait,
{
    Ok(CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(CartItem::from)
        .collect())
}

async fn find_line<C>(
    conn: &C,
    cart_id: Uuid,
    type_item: ProductKind,
    item_id: Uuid,
) -> AppResult<Option<crate::entity::cart_items::Model>>
where
    C: ConnectionTrait,
{
    Ok(CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .filter(CartItemCol::TypeItem.eq(type_item))
        .filter(CartItemCol::ItemId.eq(item_id))
        .one(conn)
        .await?)
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};

    use super::*;
    use crate::db::create_schema;

    async fn sqlite_conn() -> anyhow::Result<DatabaseConnection> {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let orm = Database::connect(opts).await?;
        create_schema(&orm).await?;
        Ok(orm)
    }

    #[tokio::test]
    async fn insert_race_falls_back_to_existing_cart() -> anyhow::Result<()> {
        let orm = sqlite_conn().await?;
        let user_id = Uuid::new_v4();
        // Another request created the cart after this one's lookup missed.
        let winner = CartActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(&orm)
        .await?;

        let cart = create_or_fetch_cart(&orm, user_id).await?;

        assert_eq!(cart.id, winner.id);
        let carts = Carts::find()
            .filter(CartCol::UserId.eq(user_id))
            .all(&orm)
            .await?;
        assert_eq!(carts.len(), 1);
        Ok(())
    }
}
