use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::Redirect,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, NewOrderItem, OrderList, OrderWithItems, UpdateOrderRequest},
    error::AppResult,
    models::OrderItem,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{checkout_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route(
            "/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/{id}/items", post(add_order_item))
        .route("/{id}/items/{item_id}", delete(remove_order_item))
        .route("/{id}/pay", get(pay_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("user_id" = Option<Uuid>, Query, description = "Filter by owner"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Orders with derived total_price", body = ApiResponse<OrderList>)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    query: Result<Query<OrderListQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let Query(query) = query?;
    let resp = order_service::list_orders(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Bad request"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let Json(payload) = payload?;
    let resp = order_service::create_order(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items and total_price", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let Path(id) = path?;
    let resp = order_service::get_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Illegal status transition"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    let resp = order_service::update_order(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let Path(id) = path?;
    let resp = order_service::delete_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/items",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = NewOrderItem,
    responses(
        (status = 201, description = "Order item added", body = ApiResponse<OrderItem>),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn add_order_item(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NewOrderItem>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderItem>>)> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    let resp = order_service::add_order_item(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("item_id" = Uuid, Path, description = "Order item ID")
    ),
    responses(
        (status = 200, description = "Order item removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Order item not found"),
    ),
    tag = "Orders"
)]
pub async fn remove_order_item(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let Path((id, item_id)) = path?;
    let resp = order_service::remove_order_item(&state, id, item_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/pay",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 303, description = "Redirect to the payment provider"),
        (status = 400, description = "Order has no items"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Payment provider failure"),
    ),
    tag = "Orders"
)]
pub async fn pay_order(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Redirect> {
    let Path(id) = path?;
    let url = checkout_service::pay_order(&state, id).await?;
    Ok(Redirect::to(&url))
}
