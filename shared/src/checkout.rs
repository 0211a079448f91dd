//! Checkout payloads
//!
//! Storefront checkout creates a payment intent and a `pending` order in one
//! request. The client supplies the idempotency key so a retried checkout
//! never creates a second order.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Storefront checkout request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Client-generated token, unique per checkout attempt
    #[validate(length(min = 8, max = 128))]
    pub idempotency_key: String,
    #[validate(length(min = 1))]
    pub items: Vec<CheckoutItem>,
    #[validate(nested)]
    pub customer: CustomerInfo,
    /// Present only when the customer selected pickup-point delivery
    pub pickup_point: Option<PickupPoint>,
}

/// One cart line. Prices are resolved server-side from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: String,
    /// Variant name, when the product has variants
    pub variant: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
}

/// Carrier pickup point selected by the customer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupPoint {
    pub id: String,
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Checkout response: what the payment widget needs to finish the payment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: String,
    pub order_number: String,
    pub client_secret: String,
    /// Total in minor currency units
    pub amount: i64,
    pub currency: String,
}
