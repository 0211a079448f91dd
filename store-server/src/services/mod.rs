//! Business service layer
//!
//! 各流程的编排逻辑, 由 API handler 调用, 依赖 repository 与外部客户端.

pub mod email;
pub mod invoice;
pub mod payments;
pub mod reconciliation;
pub mod shipping;

pub use email::{EmailClient, HttpEmailClient, NoEmailClient};
pub use payments::PaymentClient;
pub use reconciliation::ReconciliationService;
pub use shipping::{CarrierApi, CarrierClient, ShipmentService};
