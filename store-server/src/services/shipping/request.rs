//! Shipment request construction
//!
//! A [`ShipmentRequest`] is a transient value object built fresh per attempt
//! from the order row and its item snapshots. The whole weight-estimation
//! policy lives here:
//!
//! 1. explicit caller-supplied weight, if present and positive;
//! 2. otherwise Σ over items of (variant weight ∥ product weight ∥ 0.25 kg) × qty;
//! 3. 1.0 kg for the whole shipment if the item computation is unavailable.

use crate::db::models::{Order, OrderItem};
use rust_decimal::Decimal;

/// Per-item fallback when neither the variant nor the product records a weight
pub const DEFAULT_ITEM_WEIGHT_KG: f64 = 0.25;

/// Whole-shipment fallback when items cannot be read at all
pub const FALLBACK_SHIPMENT_WEIGHT_KG: f64 = 1.0;

/// Caller-supplied overrides for a shipment attempt
#[derive(Debug, Clone, Default)]
pub struct ShipmentOverrides {
    pub weight: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
}

/// Transient carrier request, never persisted
#[derive(Debug, Clone)]
pub struct ShipmentRequest {
    pub order_number: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub pickup_point_id: String,
    /// kg
    pub weight: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    /// Cash on delivery in major units; zero for prepaid orders
    pub cod: Decimal,
    /// Declared order value in major units (the carrier API takes major
    /// units; everything else in this system stores minor units)
    pub value: Decimal,
    pub currency: String,
    /// Sender label registered with the carrier
    pub eshop: String,
}

/// Split a recipient name on the first whitespace boundary.
///
/// A single-word name yields an empty surname; the carrier accepts that and
/// the original behavior is kept.
pub fn split_recipient_name(full: &str) -> (String, String) {
    let trimmed = full.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((name, surname)) => (name.to_string(), surname.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

/// Minor currency units → major units (160000 → 1600.00)
pub fn minor_to_major(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Tier 2 of the weight policy: per-item chain, summed over quantities
pub fn compute_items_weight(items: &[OrderItem]) -> f64 {
    items
        .iter()
        .map(|item| {
            let per_unit = item
                .variant_weight
                .or(item.product_weight)
                .unwrap_or(DEFAULT_ITEM_WEIGHT_KG);
            per_unit * f64::from(item.quantity)
        })
        .sum()
}

/// Build the carrier request from an order and a resolved weight.
///
/// The pickup-point precondition is checked by the caller; this function
/// assumes `pickup_point_id` is present.
pub fn build_shipment_request(
    order: &Order,
    weight: f64,
    overrides: &ShipmentOverrides,
    eshop: &str,
) -> ShipmentRequest {
    let (name, surname) = split_recipient_name(&order.customer_name);
    ShipmentRequest {
        order_number: order.order_number.clone(),
        name,
        surname,
        email: order.customer_email.clone(),
        phone: order.customer_phone.clone(),
        pickup_point_id: order.pickup_point_id.clone().unwrap_or_default(),
        weight,
        width: overrides.width,
        height: overrides.height,
        depth: overrides.depth,
        cod: Decimal::ZERO,
        value: minor_to_major(order.total_amount),
        currency: order.currency.to_uppercase(),
        eshop: eshop.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{OrderStatus, PaymentStatus};
    use surrealdb::RecordId;

    fn item(quantity: i32, variant_weight: Option<f64>, product_weight: Option<f64>) -> OrderItem {
        OrderItem {
            id: None,
            order: RecordId::from_table_key("order", "o1"),
            product_id: "product:tea".into(),
            variant: None,
            name: "Tea".into(),
            quantity,
            unit_price: 10000,
            variant_weight,
            product_weight,
        }
    }

    fn order() -> Order {
        Order {
            id: None,
            order_number: "ORD2026082510001".into(),
            idempotency_key: "key".into(),
            status: OrderStatus::Confirmed,
            payment_status: PaymentStatus::Paid,
            total_amount: 160000,
            currency: "czk".into(),
            customer_name: "Jana Nováková".into(),
            customer_email: "jana@example.com".into(),
            customer_phone: Some("+420777123456".into()),
            pickup_point_id: Some("1234".into()),
            pickup_point_name: None,
            pickup_point_address: None,
            payment_intent_id: None,
            payment_client_secret: None,
            packet_id: None,
            tracking_number: None,
            label_printed: false,
            printed_at: None,
            weight: None,
            confirmation_sent_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn splits_name_on_first_whitespace() {
        assert_eq!(
            split_recipient_name("Jana Nováková"),
            ("Jana".to_string(), "Nováková".to_string())
        );
        assert_eq!(
            split_recipient_name("Jan Amos Komenský"),
            ("Jan".to_string(), "Amos Komenský".to_string())
        );
        // Single-word name: empty surname, kept as-is
        assert_eq!(
            split_recipient_name("Madonna"),
            ("Madonna".to_string(), String::new())
        );
    }

    #[test]
    fn weight_falls_back_per_item() {
        // No weights recorded anywhere: 0.25 × total quantity
        let items = vec![item(2, None, None), item(3, None, None)];
        assert!((compute_items_weight(&items) - 0.25 * 5.0).abs() < 1e-9);

        // Variant weight wins over product weight
        let items = vec![item(2, Some(0.5), Some(0.8))];
        assert!((compute_items_weight(&items) - 1.0).abs() < 1e-9);

        // Product weight used when the variant has none
        let items = vec![item(4, None, Some(0.1))];
        assert!((compute_items_weight(&items) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn declared_value_is_major_units() {
        let request = build_shipment_request(&order(), 1.2, &ShipmentOverrides::default(), "my-shop");
        assert_eq!(request.value.to_string(), "1600.00");
        assert_eq!(request.cod, Decimal::ZERO);
        assert_eq!(request.currency, "CZK");
        assert_eq!(request.pickup_point_id, "1234");
        assert_eq!(request.name, "Jana");
        assert_eq!(request.surname, "Nováková");
    }

    #[test]
    fn minor_to_major_edge_cases() {
        assert_eq!(minor_to_major(1).to_string(), "0.01");
        assert_eq!(minor_to_major(100).to_string(), "1.00");
        assert_eq!(minor_to_major(0).to_string(), "0.00");
    }
}
