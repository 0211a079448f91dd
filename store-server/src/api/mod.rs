//! HTTP API 模块
//!
//! 每个资源一个子模块, `mod.rs` 注册路由, `handler.rs` 实现处理器.
//!
//! | 模块 | 路径前缀 | 说明 |
//! |------|----------|------|
//! | [`health`] | /health | 健康检查 |
//! | [`products`] | /api/products | 商品目录 (公开) |
//! | [`checkout`] | /api/checkout | 下单 + 支付意向 (公开) |
//! | [`webhooks`] | /api/webhooks | 支付网关通知 |
//! | [`orders`] | /api/admin/orders | 订单管理 |
//! | [`shipments`] | /api/admin/shipments | 物流管理 |

pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;
pub mod shipments;
pub mod webhooks;
