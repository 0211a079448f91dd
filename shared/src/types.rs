//! Order lifecycle types
//!
//! The two status columns on an order row. `status` tracks fulfilment,
//! `payment_status` tracks the payment attempt. Both serialize as
//! snake_case strings in rows and API payloads.

use serde::{Deserialize, Serialize};

/// Order fulfilment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Payment attempt status
///
/// Happy path is one-directional: `unpaid → processing → paid`.
/// `failed` and `requires_action` end the attempt but keep the order row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Processing,
    Paid,
    Failed,
    RequiresAction,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::RequiresAction => "requires_action",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Statuses a payment notification is allowed to transition from.
    ///
    /// Used as the expected-set of the conditional order update: a webhook
    /// redelivery for an order already settled matches none of these and
    /// becomes a no-op.
    pub fn pre_settlement() -> &'static [PaymentStatus] {
        &[
            PaymentStatus::Unpaid,
            PaymentStatus::Processing,
            PaymentStatus::RequiresAction,
        ]
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::RequiresAction).unwrap(),
            "\"requires_action\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
    }

    #[test]
    fn paid_is_not_pre_settlement() {
        assert!(!PaymentStatus::pre_settlement().contains(&PaymentStatus::Paid));
        assert!(PaymentStatus::pre_settlement().contains(&PaymentStatus::Unpaid));
    }
}
