//! Admin Shipment API Handlers
//!
//! Error mapping: precondition failures (duplicate shipment, missing pickup
//! point, printed label) are business-rule 400s whose message the admin UI
//! shows verbatim; carrier faults surface as upstream 500s.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, header},
};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::{BulkShipmentRequest, BulkShipmentSummary, CreateShipmentRequest, ShipmentInfo};

use crate::core::ServerState;
use crate::services::shipping::{ShipmentError, ShipmentOverrides};
use crate::utils::{AppError, AppResult};

fn map_shipment_error(err: ShipmentError) -> AppError {
    match err {
        ShipmentError::OrderNotFound(msg) => AppError::not_found(msg),
        ShipmentError::NoPickupPoint
        | ShipmentError::AlreadyExists
        | ShipmentError::NoShipment
        | ShipmentError::AlreadyPrinted => AppError::business_rule(err.to_string()),
        ShipmentError::Carrier(e) => AppError::upstream(e.to_string()),
        ShipmentError::Database(msg) => AppError::database(msg),
    }
}

fn pdf_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    headers
}

/// POST /api/admin/shipments - 为单个订单登记运单
pub async fn create(
    State(state): State<ServerState>,
    Json(request): Json<CreateShipmentRequest>,
) -> AppResult<Json<ShipmentInfo>> {
    let overrides = ShipmentOverrides {
        weight: request.weight,
        width: request.width,
        height: request.height,
        depth: request.depth,
    };
    let info = state
        .shipments
        .create_by_order_id(&request.order_id, &overrides)
        .await
        .map_err(map_shipment_error)?;
    Ok(Json(info))
}

/// POST /api/admin/shipments/bulk - 批量登记, 永远 200 + 汇总
pub async fn create_bulk(
    State(state): State<ServerState>,
    Json(request): Json<BulkShipmentRequest>,
) -> Json<BulkShipmentSummary> {
    Json(state.shipments.create_bulk(&request).await)
}

/// POST /api/admin/orders/:id/shipment/cancel - 取消 (本地解绑)
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    state
        .shipments
        .cancel(&id)
        .await
        .map_err(map_shipment_error)?;
    Ok(Json(json!({ "cancelled": true })))
}

/// GET /api/admin/orders/:id/label - 单张标签 PDF
pub async fn label(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<(HeaderMap, Vec<u8>)> {
    let document = state
        .shipments
        .label(&id)
        .await
        .map_err(map_shipment_error)?;
    Ok((pdf_headers(), document))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelsRequest {
    pub order_ids: Vec<String>,
}

/// POST /api/admin/shipments/labels - 合并标签 PDF
pub async fn labels(
    State(state): State<ServerState>,
    Json(request): Json<LabelsRequest>,
) -> AppResult<(HeaderMap, Vec<u8>)> {
    if request.order_ids.is_empty() {
        return Err(AppError::validation("orderIds must not be empty"));
    }
    let document = state
        .shipments
        .labels(&request.order_ids)
        .await
        .map_err(map_shipment_error)?;
    Ok((pdf_headers(), document))
}
