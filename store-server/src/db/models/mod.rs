//! Database Models

pub mod order;
pub mod product;
pub mod serde_helpers;
pub mod system_state;

pub use order::{Order, OrderCreate, OrderDetail, OrderItem, OrderItemSnapshot};
pub use product::{Product, ProductCreate, ProductVariant};
pub use system_state::SystemState;
