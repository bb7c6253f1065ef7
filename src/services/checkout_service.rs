//! "Pay order": read the order, hand its lines to the payment provider and
//! return the provider's redirect URL.
//!
//! The order is only read. A failed submission leaves it exactly as it was, so
//! a client may simply retry. No lock is held across the provider call; the
//! payment reflects the items as they were when they were read.

use uuid::Uuid;

use crate::{
    audit::audit_best_effort,
    dto::orders::OrderWithItems,
    error::{AppError, AppResult},
    payment::PaymentLineItem,
    services::order_service,
    state::AppState,
};

/// Map stored order lines to the provider's line format. Uses the snapshot
/// name and price, never the live catalog.
pub fn payment_lines(order: &OrderWithItems) -> Vec<PaymentLineItem> {
    order
        .items
        .iter()
        .map(|item| PaymentLineItem {
            id: item.id,
            title: item.name.clone(),
            unit_price: item.price,
            quantity: item.quantity,
        })
        .collect()
}

pub async fn pay_order(state: &AppState, order_id: Uuid) -> AppResult<String> {
    let order = order_service::load_order(&state.orm, order_id).await?;

    let lines = payment_lines(&order);
    if lines.is_empty() {
        return Err(AppError::BadRequest(
            "Order has no items to pay for".into(),
        ));
    }

    let redirect_url = match state.payments.submit(lines).await {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(%order_id, error = %err, "payment submission failed");
            return Err(err.into());
        }
    };

    tracing::info!(%order_id, total = order.order.total_price, "payment submitted");
    audit_best_effort(
        &state.orm,
        Some(order.order.user_id),
        "order_payment_submitted",
        "orders",
        serde_json::json!({ "order_id": order_id, "total_price": order.order.total_price }),
    )
    .await;

    Ok(redirect_url)
}
