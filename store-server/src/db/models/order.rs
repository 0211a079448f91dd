//! Order Model
//!
//! 订单主表 + 不可变订单行 (order_item)。
//!
//! The order row is written by three writers only: checkout (insert),
//! the payment reconciliation flow (status columns) and the shipment flow
//! (shipment columns). Items are snapshotted at checkout and never mutated.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::{OrderStatus, PaymentStatus};
use surrealdb::RecordId;

// =============================================================================
// Order (主表)
// =============================================================================

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Human-facing number, e.g. ORD2026082510001
    pub order_number: String,
    /// Client-supplied token; unique, correlates webhooks back to this row
    pub idempotency_key: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Minor currency units (no floating point for money)
    pub total_amount: i64,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    // Pickup-point delivery reference (None for home delivery)
    #[serde(default)]
    pub pickup_point_id: Option<String>,
    #[serde(default)]
    pub pickup_point_name: Option<String>,
    #[serde(default)]
    pub pickup_point_address: Option<String>,
    // Payment provider references
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub payment_client_secret: Option<String>,
    // Shipment fields, written once by the shipment flow
    #[serde(default)]
    pub packet_id: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub label_printed: bool,
    #[serde(default)]
    pub printed_at: Option<String>,
    /// Computed shipment weight in kg
    #[serde(default)]
    pub weight: Option<f64>,
    /// Set when the confirmation email went out (redelivery guard)
    #[serde(default)]
    pub confirmation_sent_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Order {
    /// "order:xyz" form of the row id, for API payloads and logs
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }
}

/// Insert payload for a new order (always `pending`/`unpaid`)
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreate {
    pub order_number: String,
    pub idempotency_key: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: i64,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub pickup_point_id: Option<String>,
    pub pickup_point_name: Option<String>,
    pub pickup_point_address: Option<String>,
    pub payment_intent_id: Option<String>,
    pub payment_client_secret: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// =============================================================================
// Order Item (order_item 表, record link 指向 order)
// =============================================================================

/// Immutable line item snapshotted at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Record link to the owning order
    pub order: RecordId,
    pub product_id: String,
    #[serde(default)]
    pub variant: Option<String>,
    pub name: String,
    pub quantity: i32,
    /// Minor currency units per unit
    pub unit_price: i64,
    /// Per-unit weight of the chosen variant, if the variant records one
    #[serde(default)]
    pub variant_weight: Option<f64>,
    /// Per-unit weight of the product, if the product records one
    #[serde(default)]
    pub product_weight: Option<f64>,
}

/// Snapshot used when inserting items alongside a new order
#[derive(Debug, Clone)]
pub struct OrderItemSnapshot {
    pub product_id: String,
    pub variant: Option<String>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub variant_weight: Option<f64>,
    pub product_weight: Option<f64>,
}

/// Full order view for the admin dashboard
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
