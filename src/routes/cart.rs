use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        cart::{AddToCartRequest, CartWithItems, UpdateCartItemRequest},
        orders::OrderWithItems,
    },
    error::AppResult,
    models::CartItem,
    response::ApiResponse,
    routes::params::CartLookupQuery,
    services::{cart_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}", get(get_or_create_cart))
        .route("/users/{user_id}/checkout", post(checkout_cart))
        .route("/items", post(add_to_cart))
        .route("/items/{id}", patch(update_cart_item).delete(remove_cart_item))
        .route("/{cart_id}/items", delete(clear_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart/users/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "Owner of the cart"),
        ("create" = Option<bool>, Query, description = "Create the cart when missing, default true")
    ),
    responses(
        (status = 200, description = "The user's cart", body = ApiResponse<CartWithItems>),
        (status = 404, description = "No cart and create=false"),
    ),
    tag = "Cart"
)]
pub async fn get_or_create_cart(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<CartLookupQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<CartWithItems>>> {
    let Path(user_id) = path?;
    let Query(query) = query?;
    let resp = if query.create.unwrap_or(true) {
        cart_service::get_or_create_cart(&state, user_id).await?
    } else {
        cart_service::get_cart(&state, user_id).await?
    };
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Created or merged cart item", body = ApiResponse<CartItem>),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Cart not found"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    payload: Result<Json<AddToCartRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let Json(payload) = payload?;
    let resp = cart_service::add_item(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart item ID")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Updated cart item", body = ApiResponse<CartItem>),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateCartItemRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    let resp = cart_service::update_item_quantity(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart item ID")),
    responses(
        (status = 200, description = "Cart item absent", body = ApiResponse<serde_json::Value>),
    ),
    tag = "Cart"
)]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let Path(id) = path?;
    let resp = cart_service::remove_item(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{cart_id}/items",
    params(("cart_id" = Uuid, Path, description = "Cart ID")),
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<serde_json::Value>),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let Path(cart_id) = path?;
    let resp = cart_service::clear_cart(&state, cart_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/users/{user_id}/checkout",
    params(("user_id" = Uuid, Path, description = "Owner of the cart")),
    responses(
        (status = 201, description = "Order created from the cart", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Cart is empty or references unavailable products"),
        (status = 404, description = "Cart not found"),
    ),
    tag = "Cart"
)]
pub async fn checkout_cart(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let Path(user_id) = path?;
    let resp = order_service::checkout_cart(&state, user_id).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
