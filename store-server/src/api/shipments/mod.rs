//! Admin Shipment API 模块
//!
//! 物流相关路由分两组: /api/admin/shipments 下的创建与标签, 以及挂在订单
//! 路径下的取消与单张标签.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/admin/shipments", shipment_routes())
        .route(
            "/api/admin/orders/{id}/shipment/cancel",
            post(handler::cancel),
        )
        .route("/api/admin/orders/{id}/label", get(handler::label))
}

fn shipment_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/bulk", post(handler::create_bulk))
        .route("/labels", post(handler::labels))
}
