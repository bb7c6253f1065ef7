mod common;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr,
};
use tokio::task::JoinSet;
use travel_checkout::{
    catalog::ProductKind,
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    entity::{Carts, carts},
    error::AppError,
    services::cart_service,
};
use uuid::Uuid;

fn add_request(cart_id: Uuid, kind: ProductKind, item_id: Uuid, amount: Option<i32>) -> AddToCartRequest {
    AddToCartRequest {
        cart_id: Some(cart_id),
        type_item: Some(kind),
        item_id: Some(item_id),
        amount,
    }
}

#[tokio::test]
async fn get_or_create_cart_is_idempotent() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user_id = Uuid::new_v4();

    let first = cart_service::get_or_create_cart(&state, user_id).await?;
    let second = cart_service::get_or_create_cart(&state, user_id).await?;

    let first = first.data.expect("cart");
    let second = second.data.expect("cart");
    assert_eq!(first.cart.id, second.cart.id);
    assert_eq!(first.cart.user_id, user_id);
    assert!(second.items.is_empty());

    let carts = Carts::find()
        .filter(carts::Column::UserId.eq(user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(carts, 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_get_or_create_cart_yields_one_cart() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user_id = Uuid::new_v4();

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let state = state.clone();
        tasks.spawn(async move { cart_service::get_or_create_cart(&state, user_id).await });
    }

    let mut cart_ids = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let resp = joined??;
        cart_ids.push(resp.data.expect("cart").cart.id);
    }
    cart_ids.sort();
    cart_ids.dedup();
    assert_eq!(cart_ids.len(), 1, "all callers must see the same cart");

    let carts = Carts::find()
        .filter(carts::Column::UserId.eq(user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(carts, 1);
    Ok(())
}

#[tokio::test]
async fn second_cart_for_same_user_violates_unique_constraint() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user_id = Uuid::new_v4();
    cart_service::get_or_create_cart(&state, user_id).await?;

    let duplicate = carts::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(&state.orm)
    .await;

    let err = duplicate.expect_err("duplicate cart must be rejected by the store");
    assert!(
        matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))),
        "expected unique violation, got {err:?}"
    );
    Ok(())
}

#[tokio::test]
async fn get_cart_without_cart_is_not_found() -> anyhow::Result<()> {
    let state = common::test_state().await?;

    let result = cart_service::get_cart(&state, Uuid::new_v4()).await;

    assert!(
        matches!(result, Err(AppError::NotFound(_))),
        "expected NotFound, got {result:?}"
    );
    Ok(())
}

#[tokio::test]
async fn adding_same_item_twice_merges_amounts() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let cart = cart_service::get_or_create_cart(&state, Uuid::new_v4())
        .await?
        .data
        .expect("cart")
        .cart;
    let flight_id = Uuid::new_v4();

    let first = cart_service::add_item(
        &state,
        add_request(cart.id, ProductKind::Flight, flight_id, Some(2)),
    )
    .await?
    .data
    .expect("item");
    let second = cart_service::add_item(
        &state,
        add_request(cart.id, ProductKind::Flight, flight_id, Some(3)),
    )
    .await?
    .data
    .expect("item");

    assert_eq!(first.id, second.id);
    assert_eq!(second.amount, 5);

    let items = cart_service::get_cart(&state, cart.user_id)
        .await?
        .data
        .expect("cart")
        .items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].amount, 5);
    Ok(())
}

#[tokio::test]
async fn same_id_under_different_kind_is_a_separate_line() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let cart = cart_service::get_or_create_cart(&state, Uuid::new_v4())
        .await?
        .data
        .expect("cart")
        .cart;
    let item_id = Uuid::new_v4();

    cart_service::add_item(&state, add_request(cart.id, ProductKind::Flight, item_id, None)).await?;
    cart_service::add_item(&state, add_request(cart.id, ProductKind::Hotel, item_id, None)).await?;

    let items = cart_service::get_cart(&state, cart.user_id)
        .await?
        .data
        .expect("cart")
        .items;
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.amount == 1), "amount defaults to 1");
    Ok(())
}

#[tokio::test]
async fn concurrent_adds_do_not_lose_increments() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let cart = cart_service::get_or_create_cart(&state, Uuid::new_v4())
        .await?
        .data
        .expect("cart")
        .cart;
    let package_id = Uuid::new_v4();

    let mut tasks = JoinSet::new();
    for _ in 0..6 {
        let state = state.clone();
        let request = add_request(cart.id, ProductKind::Package, package_id, Some(2));
        tasks.spawn(async move { cart_service::add_item(&state, request).await });
    }
    while let Some(joined) = tasks.join_next().await {
        joined??;
    }

    let items = cart_service::get_cart(&state, cart.user_id)
        .await?
        .data
        .expect("cart")
        .items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].amount, 12);
    Ok(())
}

#[tokio::test]
async fn add_item_validates_payload() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let cart = cart_service::get_or_create_cart(&state, Uuid::new_v4())
        .await?
        .data
        .expect("cart")
        .cart;

    let missing_kind = AddToCartRequest {
        cart_id: Some(cart.id),
        type_item: None,
        item_id: Some(Uuid::new_v4()),
        amount: None,
    };
    let result = cart_service::add_item(&state, missing_kind).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))), "got {result:?}");

    let zero = add_request(cart.id, ProductKind::Car, Uuid::new_v4(), Some(0));
    let result = cart_service::add_item(&state, zero).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))), "got {result:?}");

    let unknown_cart = add_request(Uuid::new_v4(), ProductKind::Car, Uuid::new_v4(), None);
    let result = cart_service::add_item(&state, unknown_cart).await;
    assert!(matches!(result, Err(AppError::NotFound(_))), "got {result:?}");
    Ok(())
}

#[tokio::test]
async fn update_quantity_sets_amount_directly() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let cart = cart_service::get_or_create_cart(&state, Uuid::new_v4())
        .await?
        .data
        .expect("cart")
        .cart;
    let item = cart_service::add_item(
        &state,
        add_request(cart.id, ProductKind::Hotel, Uuid::new_v4(), Some(4)),
    )
    .await?
    .data
    .expect("item");

    let updated = cart_service::update_item_quantity(
        &state,
        item.id,
        UpdateCartItemRequest { amount: Some(2) },
    )
    .await?
    .data
    .expect("item");
    assert_eq!(updated.amount, 2);

    let missing = cart_service::update_item_quantity(
        &state,
        Uuid::new_v4(),
        UpdateCartItemRequest { amount: Some(2) },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))), "got {missing:?}");

    let negative = cart_service::update_item_quantity(
        &state,
        item.id,
        UpdateCartItemRequest { amount: Some(-1) },
    )
    .await;
    assert!(matches!(negative, Err(AppError::BadRequest(_))), "got {negative:?}");
    Ok(())
}

#[tokio::test]
async fn deletes_are_idempotent() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let cart = cart_service::get_or_create_cart(&state, Uuid::new_v4())
        .await?
        .data
        .expect("cart")
        .cart;
    let item = cart_service::add_item(
        &state,
        add_request(cart.id, ProductKind::Flight, Uuid::new_v4(), None),
    )
    .await?
    .data
    .expect("item");

    let removed = cart_service::remove_item(&state, item.id).await?;
    assert!(removed.success);
    let removed_again = cart_service::remove_item(&state, item.id).await?;
    assert!(removed_again.success);

    cart_service::add_item(
        &state,
        add_request(cart.id, ProductKind::Car, Uuid::new_v4(), Some(2)),
    )
    .await?;
    cart_service::clear_cart(&state, cart.id).await?;
    let cleared_again = cart_service::clear_cart(&state, cart.id).await?;
    assert!(cleared_again.success);

    let items = cart_service::get_cart(&state, cart.user_id)
        .await?
        .data
        .expect("cart")
        .items;
    assert!(items.is_empty());
    Ok(())
}
