//! Shared types for the store platform
//!
//! Common types used by both the storefront and the admin dashboard:
//! order lifecycle enums, checkout payloads and shipment DTOs.

pub mod checkout;
pub mod shipment;
pub mod types;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use checkout::{CheckoutItem, CheckoutRequest, CheckoutResponse, CustomerInfo, PickupPoint};
pub use shipment::{
    BulkShipmentError, BulkShipmentRequest, BulkShipmentSummary, CreateShipmentRequest,
    ShipmentInfo,
};
pub use types::{OrderStatus, PaymentStatus};
