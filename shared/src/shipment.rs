//! Shipment DTOs
//!
//! Shared between the admin dashboard and the server. Single and bulk
//! creation, plus the best-effort bulk result summary.

use serde::{Deserialize, Serialize};

/// Admin request to register one shipment with the carrier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    pub order_id: String,
    /// Explicit weight in kg; when absent the server computes it from items
    pub weight: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
}

/// Admin request to register shipments for many orders at once
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkShipmentRequest {
    pub order_ids: Vec<String>,
    pub weight: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
}

/// Carrier identifiers persisted on the order after a successful creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentInfo {
    /// Carrier-assigned shipment/label id
    pub packet_id: String,
    pub tracking_number: String,
    pub barcode_text: Option<String>,
}

/// Per-order failure inside a bulk run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkShipmentError {
    pub order_id: String,
    pub message: String,
}

/// Bulk creation outcome. The batch is best-effort: individual failures are
/// collected here and never abort the remaining orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkShipmentSummary {
    pub success_count: usize,
    pub error_count: usize,
    pub total_count: usize,
    pub errors: Vec<BulkShipmentError>,
}

impl BulkShipmentSummary {
    pub fn new(total_count: usize) -> Self {
        Self {
            success_count: 0,
            error_count: 0,
            total_count,
            errors: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_error(&mut self, order_id: impl Into<String>, message: impl Into<String>) {
        self.error_count += 1;
        self.errors.push(BulkShipmentError {
            order_id: order_id.into(),
            message: message.into(),
        });
    }
}
