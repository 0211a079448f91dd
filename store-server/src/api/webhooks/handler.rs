//! Payment Webhook Handler
//!
//! Signature verification runs against the raw body bytes before any JSON
//! parsing. Verified events are acknowledged with 200 even when they resolve
//! to a no-op or the payload does not parse (redelivering a malformed body
//! never helps); only signature failures and database errors get an error
//! status, so the provider retries exactly the deliveries worth retrying.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde_json::{Value, json};

use crate::core::ServerState;
use crate::services::payments::{SIGNATURE_HEADER, parse_event, verify_signature};
use crate::utils::{AppError, AppResult};

/// POST /api/webhooks/payments - 支付网关通知入口
pub async fn payments(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::signature("missing signature header"))?;

    verify_signature(
        &state.config.payment_webhook_secret,
        header,
        &body,
        chrono::Utc::now().timestamp(),
    )
    .map_err(|e| AppError::signature(e.to_string()))?;

    let event = match parse_event(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Verified webhook payload does not parse, acknowledging");
            return Ok(Json(json!({ "received": true })));
        }
    };

    state
        .reconciliation
        .process(event)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(Json(json!({ "received": true })))
}
