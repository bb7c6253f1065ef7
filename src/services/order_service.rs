use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::audit_best_effort,
    catalog::{CatalogEntry, CatalogReader, ProductRef},
    dto::orders::{CreateOrderRequest, NewOrderItem, OrderList, OrderWithItems, UpdateOrderRequest},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    },
    error::{AppError, AppResult},
    models::{Order, OrderItem, checked_total},
    order_status::{DeletePolicy, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service,
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if let Some(user_id) = query.user_id {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    if !ids.is_empty() {
        for item in OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(ids))
            .all(&state.orm)
            .await?
        {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(OrderItem::from(item));
        }
    }

    // Totals are folded per order, never across orders.
    let items = orders
        .into_iter()
        .map(|order| {
            let lines = items_by_order.get(&order.id).map(Vec::as_slice).unwrap_or(&[]);
            Order::from_entity(order, lines)
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let data = load_order(&state.orm, id).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Order plus its items, with the total derived from those items.
pub async fn load_order<C>(conn: &C, id: Uuid) -> AppResult<OrderWithItems>
where
    C: ConnectionTrait,
{
    let order = Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let items: Vec<OrderItem> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(OrderWithItems {
        order: Order::from_entity(order, &items),
        items,
    })
}

pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::BadRequest("user_id is required".into()))?;

    let order_id = Uuid::new_v4();
    let mut lines = Vec::new();
    let mut amounts = Vec::new();
    for item in payload.items.unwrap_or_default() {
        let (line, amount) = resolve_item(state.catalog.as_ref(), order_id, item).await?;
        lines.push(line);
        amounts.push(amount);
    }
    ensure_total_fits(amounts)?;

    let txn = state.orm.begin().await?;
    let now = Utc::now();
    OrderActive {
        id: Set(order_id),
        user_id: Set(user_id),
        status: Set(payload.status.unwrap_or(OrderStatus::Pending)),
        note: Set(payload.note),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    for line in lines {
        line.insert(&txn).await?;
    }
    let data = load_order(&txn, order_id).await?;
    txn.commit().await?;

    tracing::info!(%order_id, %user_id, lines = data.items.len(), "order created");
    audit_best_effort(
        &state.orm,
        Some(user_id),
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order_id }),
    )
    .await;

    Ok(ApiResponse::success("Order created", data, Some(Meta::empty())))
}

/// Materialise the user's cart as a pending order and empty the cart.
///
/// Prices are snapshot from the catalog before the write transaction starts.
/// Inside the transaction the cart lines are re-read under a row lock and only
/// those lines are moved into the order; a line added after the snapshot stays
/// in the cart.
pub async fn checkout_cart(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let cart = cart_service::find_cart_by_user(&state.orm, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart"))?;
    let snapshot = cart_service::list_items(&state.orm, cart.id).await?;
    if snapshot.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let mut prices: HashMap<ProductRef, CatalogEntry> = HashMap::new();
    for line in &snapshot {
        let product = ProductRef::new(line.type_item, line.item_id);
        if prices.contains_key(&product) {
            continue;
        }
        let entry = state.catalog.price_of(product).await?.ok_or_else(|| {
            AppError::BadRequest(format!(
                "{} is no longer available",
                product.fallback_label()
            ))
        })?;
        prices.insert(product, entry);
    }

    let order_id = Uuid::new_v4();
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    let locked = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .lock_exclusive()
        .all(&txn)
        .await?;

    let mut taken = Vec::with_capacity(locked.len());
    let mut lines = Vec::with_capacity(locked.len());
    let mut amounts = Vec::with_capacity(locked.len());
    for line in locked {
        let Some(entry) = prices.get(&ProductRef::new(line.type_item, line.item_id)) else {
            continue;
        };
        taken.push(line.id);
        amounts.push((entry.unit_price, line.amount));
        lines.push(OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            type_item: Set(line.type_item),
            item_id: Set(line.item_id),
            name: Set(entry.name.clone()),
            quantity: Set(line.amount),
            price: Set(entry.unit_price),
            created_at: Set(now.into()),
        });
    }
    if taken.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    ensure_total_fits(amounts)?;

    OrderActive {
        id: Set(order_id),
        user_id: Set(user_id),
        status: Set(OrderStatus::Pending),
        note: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    for line in lines {
        line.insert(&txn).await?;
    }
    CartItems::delete_many()
        .filter(CartItemCol::Id.is_in(taken))
        .exec(&txn)
        .await?;
    let data = load_order(&txn, order_id).await?;
    txn.commit().await?;

    tracing::info!(%order_id, %user_id, total = data.order.total_price, "checkout success");
    audit_best_effort(
        &state.orm,
        Some(user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order_id, "cart_id": cart.id }),
    )
    .await;

    Ok(ApiResponse::success("Checkout success", data, Some(Meta::empty())))
}

/// Partial update of order-level fields. Items are untouched.
pub async fn update_order(
    state: &AppState,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;
    let previous = order.status;

    let mut active: OrderActive = order.into();
    if let Some(status) = payload.status {
        if !state.orders.transitions.is_allowed(previous, status) {
            return Err(AppError::BadRequest(format!(
                "Order cannot move from {previous} to {status}"
            )));
        }
        active.status = Set(status);
    }
    if let Some(note) = payload.note {
        active.note = Set(Some(note));
    }
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    if let Some(status) = payload.status.filter(|s| *s != previous) {
        tracing::info!(order_id = %id, from = %previous, to = %status, "order status changed");
        audit_best_effort(
            &state.orm,
            None,
            "order_status_update",
            "orders",
            serde_json::json!({ "order_id": id, "from": previous, "to": status }),
        )
        .await;
    }

    let data = load_order(&state.orm, id).await?;
    Ok(ApiResponse::success("Order updated", data, Some(Meta::empty())))
}

/// Delete an order. Its items follow the configured [`DeletePolicy`].
pub async fn delete_order(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let result = Orders::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Order"));
    }

    let removed_items = match state.orders.delete_policy {
        DeletePolicy::Cascade => {
            OrderItems::delete_many()
                .filter(OrderItemCol::OrderId.eq(id))
                .exec(&txn)
                .await?
                .rows_affected
        }
        DeletePolicy::RetainItems => 0,
    };
    txn.commit().await?;

    tracing::info!(order_id = %id, removed_items, "order deleted");
    audit_best_effort(
        &state.orm,
        None,
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id, "removed_items": removed_items }),
    )
    .await;

    Ok(ApiResponse::confirmation("Order deleted"))
}

pub async fn add_order_item(
    state: &AppState,
    order_id: Uuid,
    payload: NewOrderItem,
) -> AppResult<ApiResponse<OrderItem>> {
    Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let (line, amount) = resolve_item(state.catalog.as_ref(), order_id, payload).await?;
    let existing = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(&state.orm)
        .await?;
    ensure_total_fits(
        existing
            .iter()
            .map(|item| (item.price, item.quantity))
            .chain(std::iter::once(amount)),
    )?;
    let item = line.insert(&state.orm).await?;

    tracing::debug!(%order_id, order_item_id = %item.id, price = item.price, "order item added");

    Ok(ApiResponse::success("Order item added", OrderItem::from(item), None))
}

pub async fn remove_order_item(
    state: &AppState,
    order_id: Uuid,
    order_item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = OrderItems::delete_many()
        .filter(
            Condition::all()
                .add(OrderItemCol::Id.eq(order_item_id))
                .add(OrderItemCol::OrderId.eq(order_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Order item"));
    }

    tracing::debug!(%order_id, %order_item_id, "order item removed");

    Ok(ApiResponse::confirmation("Order item removed"))
}

/// Validate an item payload and fix its name and unit price. Returns the row
/// to insert with its `(price, quantity)`.
///
/// An explicit price wins; otherwise the live catalog price is copied. Either
/// way the stored value is a snapshot.
async fn resolve_item(
    catalog: &dyn CatalogReader,
    order_id: Uuid,
    payload: NewOrderItem,
) -> AppResult<(OrderItemActive, (i64, i32))> {
    let type_item = payload
        .type_item
        .ok_or_else(|| AppError::BadRequest("type_item is required".into()))?;
    let item_id = payload
        .item_id
        .ok_or_else(|| AppError::BadRequest("item_id is required".into()))?;
    let quantity = payload
        .quantity
        .ok_or_else(|| AppError::BadRequest("quantity is required".into()))?;
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".into(),
        ));
    }
    if payload.price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }

    let product = ProductRef::new(type_item, item_id);
    let name = payload.name.filter(|n| !n.trim().is_empty());

    let (name, price) = match (name, payload.price) {
        (Some(name), Some(price)) => (name, price),
        (name, price) => {
            let entry = catalog.price_of(product).await?;
            let price = match (price, &entry) {
                (Some(price), _) => price,
                (None, Some(entry)) => entry.unit_price,
                (None, None) => {
                    return Err(AppError::BadRequest(format!(
                        "price is required: {} is not in the catalog",
                        product.fallback_label()
                    )));
                }
            };
            let name = name
                .or_else(|| entry.map(|e| e.name))
                .unwrap_or_else(|| product.fallback_label());
            (name, price)
        }
    };

    ensure_total_fits([(price, quantity)])?;

    let line = OrderItemActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        type_item: Set(type_item),
        item_id: Set(item_id),
        name: Set(name),
        quantity: Set(quantity),
        price: Set(price),
        created_at: Set(Utc::now().into()),
    };
    Ok((line, (price, quantity)))
}

fn ensure_total_fits<I>(lines: I) -> AppResult<i64>
where
    I: IntoIterator<Item = (i64, i32)>,
{
    checked_total(lines)
        .ok_or_else(|| AppError::BadRequest("order total is too large".into()))
}
