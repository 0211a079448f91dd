//! Admin Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::OrderStatus;

use crate::core::ServerState;
use crate::db::models::{Order, OrderDetail};
use crate::db::repository::OrderRepository;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    /// snake_case status filter, e.g. `confirmed`
    pub status: Option<String>,
}

/// GET /api/admin/orders - 订单列表 (新到旧)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let status = match query.status.as_deref() {
        Some(s) => Some(
            s.parse::<OrderStatus>()
                .map_err(AppError::validation)?,
        ),
        None => None,
    };
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let repo = OrderRepository::new(state.db.clone());
    let orders = repo
        .find_all(limit, offset, status)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(orders))
}

/// GET /api/admin/orders/:id - 订单详情 (含行项目)
pub async fn get_detail(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("Order {}", id)))?;

    let items = match order.id.as_ref() {
        Some(record_id) => repo
            .find_items(record_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?,
        None => Vec::new(),
    };

    Ok(Json(OrderDetail { order, items }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PUT /api/admin/orders/:id/status - 人工覆盖履约状态
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    let status = request
        .status
        .parse::<OrderStatus>()
        .map_err(AppError::validation)?;

    let repo = OrderRepository::new(state.db.clone());
    let order = repo.update_status(&id, status).await.map_err(|e| match e {
        crate::db::repository::RepoError::NotFound(msg) => AppError::not_found(msg),
        other => AppError::database(other.to_string()),
    })?;

    tracing::info!(order = %order.order_number, status = %status, "Admin status override");
    Ok(Json(order))
}
