//! Checkout API Handlers
//!
//! One request creates the payment intent and the `pending` order row. The
//! client-supplied idempotency key makes the whole operation retryable: a
//! second request with the same key returns the original order and client
//! secret without touching the payment provider again.

use axum::{Json, extract::State};
use chrono::Local;
use shared::{CheckoutRequest, CheckoutResponse, OrderStatus, PaymentStatus};
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{Order, OrderCreate, OrderItemSnapshot};
use crate::db::repository::{
    OrderRepository, ProductRepository, RepoError, SystemStateRepository,
};
use crate::utils::{AppError, AppResult};

/// POST /api/checkout/intent - 创建订单与支付意向
pub async fn create_intent(
    State(state): State<ServerState>,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let orders = OrderRepository::new(state.db.clone());

    // Retried checkout: hand back the original order
    if let Some(existing) = orders
        .find_by_idempotency_key(&request.idempotency_key)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
    {
        tracing::info!(
            order = %existing.order_number,
            "Checkout replay resolved to existing order"
        );
        return replay_response(existing);
    }

    // Prices and weights come from the catalog, never from the client
    let products = ProductRepository::new(state.db.clone());
    let mut total_amount: i64 = 0;
    let mut snapshots = Vec::with_capacity(request.items.len());
    for item in &request.items {
        if item.quantity == 0 {
            return Err(AppError::validation("item quantity must be at least 1"));
        }
        let product = products
            .find_by_id(&item.product_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::validation(format!("Unknown product {}", item.product_id)))?;
        let unit_price = product.price_for(item.variant.as_deref()).ok_or_else(|| {
            AppError::validation(format!(
                "Product {} has no variant {:?}",
                item.product_id, item.variant
            ))
        })?;

        let quantity = i32::try_from(item.quantity)
            .map_err(|_| AppError::validation("item quantity out of range"))?;
        total_amount += unit_price * i64::from(quantity);
        snapshots.push(OrderItemSnapshot {
            product_id: item.product_id.clone(),
            variant: item.variant.clone(),
            name: product.name.clone(),
            quantity,
            unit_price,
            variant_weight: product.variant_weight_for(item.variant.as_deref()),
            product_weight: product.weight,
        });
    }

    let order_number = next_order_number(&state).await?;

    let pickup_point_id = request.pickup_point.as_ref().map(|p| p.id.clone());
    let intent = state
        .payments
        .create_intent(
            total_amount,
            &state.config.currency,
            &request.idempotency_key,
            &order_number,
            pickup_point_id.as_deref(),
        )
        .await
        .map_err(|e| AppError::upstream(e.to_string()))?;

    let now = chrono::Utc::now().to_rfc3339();
    let created = orders
        .create(
            OrderCreate {
                order_number: order_number.clone(),
                idempotency_key: request.idempotency_key.clone(),
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Unpaid,
                total_amount,
                currency: state.config.currency.clone(),
                customer_name: request.customer.name.clone(),
                customer_email: request.customer.email.clone(),
                customer_phone: request.customer.phone.clone(),
                pickup_point_id,
                pickup_point_name: request.pickup_point.as_ref().and_then(|p| p.name.clone()),
                pickup_point_address: request
                    .pickup_point
                    .as_ref()
                    .and_then(|p| p.address.clone()),
                payment_intent_id: Some(intent.id.clone()),
                payment_client_secret: Some(intent.client_secret.clone()),
                created_at: now.clone(),
                updated_at: now,
            },
            snapshots,
        )
        .await;

    // The unique index on the idempotency key settles same-key races: the
    // losing insert is rejected and replays the winner's order instead
    let order = match created {
        Ok(order) => order,
        Err(RepoError::Duplicate(_)) => {
            let existing = orders
                .find_by_idempotency_key(&request.idempotency_key)
                .await
                .map_err(|e| AppError::database(e.to_string()))?
                .ok_or_else(|| {
                    AppError::internal("duplicate insert rejected but no winner row found")
                })?;
            tracing::info!(
                order = %existing.order_number,
                "Concurrent checkout lost the insert race, replaying existing order"
            );
            return replay_response(existing);
        }
        Err(e) => return Err(AppError::database(e.to_string())),
    };

    tracing::info!(
        order = %order.order_number,
        amount = total_amount,
        intent_id = %intent.id,
        "Checkout created order and payment intent"
    );

    Ok(Json(CheckoutResponse {
        order_id: order.id_string(),
        order_number,
        client_secret: intent.client_secret,
        amount: total_amount,
        currency: order.currency,
    }))
}

/// Rebuild the original checkout response from a stored order row
fn replay_response(existing: Order) -> AppResult<Json<CheckoutResponse>> {
    let client_secret = existing.payment_client_secret.clone().ok_or_else(|| {
        AppError::internal(format!(
            "order {} has no stored client secret",
            existing.order_number
        ))
    })?;
    Ok(Json(CheckoutResponse {
        order_id: existing.id_string(),
        order_number: existing.order_number,
        client_secret,
        amount: existing.total_amount,
        currency: existing.currency,
    }))
}

/// 订单号: ORD + 当天日期 + 递增序列 (10001 起)
async fn next_order_number(state: &ServerState) -> Result<String, AppError> {
    let sequence = SystemStateRepository::new(state.db.clone())
        .next_order_sequence()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    let date = Local::now().format("%Y%m%d");
    Ok(format!("ORD{}{}", date, 10000 + sequence))
}
