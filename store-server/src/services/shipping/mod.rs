//! Shipment Request Flow
//!
//! Given an order in a shippable state with a pickup point and no existing
//! shipment, build the carrier request, send it, parse the response and
//! persist the returned identifiers. The shipment fields are written exactly
//! once per order; the duplicate check runs before the carrier is contacted.
//!
//! # 模块结构
//!
//! - [`request`] - 请求值对象与重量策略
//! - [`xml`] - 承运商 XML 编解码
//! - [`ShipmentService`] - 流程编排 (创建/批量/取消/标签)

pub mod request;
pub mod xml;

pub use request::{
    DEFAULT_ITEM_WEIGHT_KG, FALLBACK_SHIPMENT_WEIGHT_KG, ShipmentOverrides, ShipmentRequest,
    build_shipment_request, compute_items_weight,
};
pub use xml::{CarrierError, CarrierPacket};

use crate::db::models::Order;
use crate::db::repository::{OrderRepository, RepoError};
use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use shared::{BulkShipmentRequest, BulkShipmentSummary, ShipmentInfo};
use std::sync::Arc;
use std::time::Duration;
use surrealdb::RecordId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShipmentError {
    #[error("Order {0} not found")]
    OrderNotFound(String),

    #[error("no pickup point selected")]
    NoPickupPoint,

    #[error("shipment already exists")]
    AlreadyExists,

    #[error("no shipment exists for this order")]
    NoShipment,

    #[error("label already printed, shipment cannot be cancelled")]
    AlreadyPrinted,

    #[error(transparent)]
    Carrier(#[from] CarrierError),

    #[error("database error: {0}")]
    Database(String),
}

impl From<RepoError> for ShipmentError {
    fn from(err: RepoError) -> Self {
        ShipmentError::Database(err.to_string())
    }
}

/// Carrier API seam. The HTTP client below is the production implementation;
/// tests inject fakes.
#[async_trait]
pub trait CarrierApi: Send + Sync {
    async fn create_packet(&self, request: &ShipmentRequest)
    -> Result<CarrierPacket, CarrierError>;
    async fn packet_label(&self, packet_id: &str) -> Result<Vec<u8>, CarrierError>;
    async fn packets_labels(&self, packet_ids: &[String]) -> Result<Vec<u8>, CarrierError>;
    async fn packet_status(&self, packet_id: &str) -> Result<String, CarrierError>;
}

/// XML-over-HTTP carrier client
pub struct CarrierClient {
    http: reqwest::Client,
    api_url: String,
    api_password: String,
}

impl CarrierClient {
    pub fn new(api_url: String, api_password: String, timeout_ms: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_url,
            api_password,
        }
    }

    async fn post_xml(&self, body: String) -> Result<String, CarrierError> {
        let resp = self
            .http
            .post(&self.api_url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| CarrierError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CarrierError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(CarrierError::Transport(format!("{status}: {text}")));
        }
        Ok(text)
    }
}

#[async_trait]
impl CarrierApi for CarrierClient {
    async fn create_packet(
        &self,
        request: &ShipmentRequest,
    ) -> Result<CarrierPacket, CarrierError> {
        let body = xml::build_create_packet(&self.api_password, request)?;
        let response = self.post_xml(body).await?;
        xml::parse_create_packet_response(&response)
    }

    async fn packet_label(&self, packet_id: &str) -> Result<Vec<u8>, CarrierError> {
        let body = xml::build_packet_label(&self.api_password, packet_id)?;
        let response = self.post_xml(body).await?;
        xml::parse_label_response(&response)
    }

    async fn packets_labels(&self, packet_ids: &[String]) -> Result<Vec<u8>, CarrierError> {
        let body = xml::build_packets_labels(&self.api_password, packet_ids)?;
        let response = self.post_xml(body).await?;
        xml::parse_label_response(&response)
    }

    async fn packet_status(&self, packet_id: &str) -> Result<String, CarrierError> {
        let body = xml::build_packet_status(&self.api_password, packet_id)?;
        let response = self.post_xml(body).await?;
        xml::parse_status_response(&response)
    }
}

/// Shipment flow orchestration
#[derive(Clone)]
pub struct ShipmentService {
    orders: OrderRepository,
    carrier: Arc<dyn CarrierApi>,
    /// Sender label registered with the carrier
    eshop: String,
}

impl ShipmentService {
    pub fn new(orders: OrderRepository, carrier: Arc<dyn CarrierApi>, eshop: String) -> Self {
        Self {
            orders,
            carrier,
            eshop,
        }
    }

    pub async fn create_by_order_id(
        &self,
        order_id: &str,
        overrides: &ShipmentOverrides,
    ) -> Result<ShipmentInfo, ShipmentError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ShipmentError::OrderNotFound(order_id.to_string()))?;
        self.create(&order, overrides).await
    }

    /// Register one shipment with the carrier and persist its identifiers.
    ///
    /// Precondition order matters: the duplicate check must reject before any
    /// carrier call happens.
    pub async fn create(
        &self,
        order: &Order,
        overrides: &ShipmentOverrides,
    ) -> Result<ShipmentInfo, ShipmentError> {
        if order
            .pickup_point_id
            .as_deref()
            .unwrap_or_default()
            .is_empty()
        {
            return Err(ShipmentError::NoPickupPoint);
        }
        if order.packet_id.is_some() {
            return Err(ShipmentError::AlreadyExists);
        }
        let order_id = order
            .id
            .clone()
            .ok_or_else(|| ShipmentError::Database("order row has no id".into()))?;

        let weight = self.resolve_weight(&order_id, overrides.weight).await;
        let request = build_shipment_request(order, weight, overrides, &self.eshop);
        let packet = self.carrier.create_packet(&request).await?;

        self.orders
            .set_shipment(&order_id, &packet.id, &packet.barcode)
            .await?;

        tracing::info!(
            order = %order.order_number,
            packet_id = %packet.id,
            weight = weight,
            "Shipment registered with carrier"
        );

        Ok(ShipmentInfo {
            packet_id: packet.id,
            tracking_number: packet.barcode,
            barcode_text: packet.barcode_text,
        })
    }

    /// Weight policy, tiers 1 and 3; tier 2 lives in [`compute_items_weight`]
    async fn resolve_weight(&self, order_id: &RecordId, explicit: Option<f64>) -> f64 {
        if let Some(weight) = explicit
            && weight > 0.0
        {
            return weight;
        }
        match self.orders.find_items(order_id).await {
            Ok(items) => compute_items_weight(&items),
            Err(e) => {
                tracing::warn!(
                    order_id = %order_id,
                    error = %e,
                    "Could not read order items, using fallback shipment weight"
                );
                FALLBACK_SHIPMENT_WEIGHT_KG
            }
        }
    }

    /// Best-effort batch: per-order failures are collected, never aborting
    pub async fn create_bulk(&self, request: &BulkShipmentRequest) -> BulkShipmentSummary {
        let mut summary = BulkShipmentSummary::new(request.order_ids.len());
        let overrides = ShipmentOverrides {
            weight: request.weight,
            width: request.width,
            height: request.height,
            depth: request.depth,
        };

        for order_id in &request.order_ids {
            match self.create_by_order_id(order_id, &overrides).await {
                Ok(_) => summary.record_success(),
                Err(e) => {
                    tracing::warn!(order_id = %order_id, error = %e, "Bulk shipment item failed");
                    summary.record_error(order_id.clone(), e.to_string());
                }
            }
        }
        summary
    }

    /// Unlink the shipment locally. The carrier-side record is deliberately
    /// left untouched; see the warning log.
    pub async fn cancel(&self, order_id: &str) -> Result<(), ShipmentError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ShipmentError::OrderNotFound(order_id.to_string()))?;
        let Some(packet_id) = order.packet_id.as_deref() else {
            return Err(ShipmentError::NoShipment);
        };
        if order.label_printed {
            return Err(ShipmentError::AlreadyPrinted);
        }
        let id = order
            .id
            .clone()
            .ok_or_else(|| ShipmentError::Database("order row has no id".into()))?;

        self.orders.clear_shipment(&id).await?;
        tracing::warn!(
            order = %order.order_number,
            packet_id = %packet_id,
            "Shipment unlinked locally; carrier-side record was not cancelled"
        );
        Ok(())
    }

    /// Fetch one label and flag the order as printed
    pub async fn label(&self, order_id: &str) -> Result<Vec<u8>, ShipmentError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ShipmentError::OrderNotFound(order_id.to_string()))?;
        let packet_id = order.packet_id.as_deref().ok_or(ShipmentError::NoShipment)?;

        let document = self.carrier.packet_label(packet_id).await?;
        if let Some(id) = order.id.clone() {
            self.orders.mark_printed(vec![id]).await?;
        }
        Ok(document)
    }

    /// Fetch one merged document for many orders; orders without a shipment
    /// are skipped
    pub async fn labels(&self, order_ids: &[String]) -> Result<Vec<u8>, ShipmentError> {
        let mut packet_ids = Vec::new();
        let mut row_ids = Vec::new();
        for order_id in order_ids {
            let Some(order) = self.orders.find_by_id(order_id).await? else {
                continue;
            };
            if let (Some(packet_id), Some(id)) = (order.packet_id.clone(), order.id.clone()) {
                packet_ids.push(packet_id);
                row_ids.push(id);
            }
        }
        if packet_ids.is_empty() {
            return Err(ShipmentError::NoShipment);
        }

        let document = self.carrier.packets_labels(&packet_ids).await?;
        self.orders.mark_printed(row_ids).await?;
        Ok(document)
    }

    /// Carrier-side status text for an order's shipment
    pub async fn status(&self, order_id: &str) -> Result<String, ShipmentError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ShipmentError::OrderNotFound(order_id.to_string()))?;
        let packet_id = order.packet_id.as_deref().ok_or(ShipmentError::NoShipment)?;
        Ok(self.carrier.packet_status(packet_id).await?)
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use crate::db::models::{Order, OrderCreate, OrderItemSnapshot};
    use shared::{OrderStatus, PaymentStatus};
    use std::sync::Mutex;

    /// Order literal for codec tests (not backed by a row)
    pub fn paid_order() -> Order {
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
            pickup_point_name: Some("Z-Box Praha 4".into()),
            pickup_point_address: None,
            payment_intent_id: Some("pi_test".into()),
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

    pub fn order_create(key: &str, pickup_point: Option<&str>) -> OrderCreate {
        let now = chrono::Utc::now().to_rfc3339();
        OrderCreate {
            order_number: format!("ORD-{key}"),
            idempotency_key: key.into(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            total_amount: 160000,
            currency: "czk".into(),
            customer_name: "Jana Nováková".into(),
            customer_email: "jana@example.com".into(),
            customer_phone: None,
            pickup_point_id: pickup_point.map(Into::into),
            pickup_point_name: None,
            pickup_point_address: None,
            payment_intent_id: Some(format!("pi_{key}")),
            payment_client_secret: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn snapshot(quantity: i32, weight: Option<f64>) -> OrderItemSnapshot {
        OrderItemSnapshot {
            product_id: "product:tea".into(),
            variant: None,
            name: "Tea".into(),
            quantity,
            unit_price: 80000,
            variant_weight: None,
            product_weight: weight,
        }
    }

    /// Carrier fake recording every create request
    #[derive(Default)]
    pub struct FakeCarrier {
        pub create_calls: Mutex<Vec<ShipmentRequest>>,
        pub fail_create: Mutex<Option<CarrierError>>,
    }

    impl FakeCarrier {
        pub fn failing(error: CarrierError) -> Self {
            Self {
                create_calls: Mutex::new(Vec::new()),
                fail_create: Mutex::new(Some(error)),
            }
        }
    }

    #[async_trait]
    impl CarrierApi for FakeCarrier {
        async fn create_packet(
            &self,
            request: &ShipmentRequest,
        ) -> Result<CarrierPacket, CarrierError> {
            self.create_calls.lock().unwrap().push(request.clone());
            if let Some(error) = self.fail_create.lock().unwrap().take() {
                return Err(error);
            }
            Ok(CarrierPacket {
                id: format!("pk-{}", request.order_number),
                barcode: format!("Z-{}", request.order_number),
                barcode_text: Some("Z 123".into()),
            })
        }

        async fn packet_label(&self, _packet_id: &str) -> Result<Vec<u8>, CarrierError> {
            Ok(b"%PDF-1.4 label".to_vec())
        }

        async fn packets_labels(&self, packet_ids: &[String]) -> Result<Vec<u8>, CarrierError> {
            Ok(format!("%PDF-1.4 labels x{}", packet_ids.len()).into_bytes())
        }

        async fn packet_status(&self, _packet_id: &str) -> Result<String, CarrierError> {
            Ok("We have received the parcel data.".into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::*;
    use super::*;
    use crate::db::memory_db;

    async fn service_with(carrier: Arc<dyn CarrierApi>) -> (ShipmentService, OrderRepository) {
        let db = memory_db().await;
        let repo = OrderRepository::new(db);
        (
            ShipmentService::new(repo.clone(), carrier, "my-shop".into()),
            repo,
        )
    }

    #[tokio::test]
    async fn duplicate_shipment_is_rejected_before_carrier_call() {
        let carrier = Arc::new(FakeCarrier::default());
        let (service, repo) = service_with(carrier.clone()).await;

        let order = repo
            .create(order_create("dup", Some("1234")), vec![])
            .await
            .unwrap();
        let id = order.id.clone().unwrap();
        repo.set_shipment(&id, "existing", "Z-existing").await.unwrap();

        let order = repo.find_by_id(&id.to_string()).await.unwrap().unwrap();
        let err = service
            .create(&order, &ShipmentOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ShipmentError::AlreadyExists));
        assert!(carrier.create_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_pickup_point_is_rejected() {
        let carrier = Arc::new(FakeCarrier::default());
        let (service, repo) = service_with(carrier.clone()).await;

        let order = repo.create(order_create("nopp", None), vec![]).await.unwrap();
        let err = service
            .create(&order, &ShipmentOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ShipmentError::NoPickupPoint));
        assert!(carrier.create_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn computed_weight_uses_per_item_default() {
        let carrier = Arc::new(FakeCarrier::default());
        let (service, repo) = service_with(carrier.clone()).await;

        // 2 + 3 items, no recorded weights: 0.25 × 5
        let order = repo
            .create(
                order_create("w1", Some("1234")),
                vec![snapshot(2, None), snapshot(3, None)],
            )
            .await
            .unwrap();
        service
            .create(&order, &ShipmentOverrides::default())
            .await
            .unwrap();

        let calls = carrier.create_calls.lock().unwrap();
        assert!((calls[0].weight - 1.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn explicit_weight_wins_over_items() {
        let carrier = Arc::new(FakeCarrier::default());
        let (service, repo) = service_with(carrier.clone()).await;

        let order = repo
            .create(order_create("w2", Some("1234")), vec![snapshot(10, Some(2.0))])
            .await
            .unwrap();
        let overrides = ShipmentOverrides {
            weight: Some(3.5),
            ..Default::default()
        };
        service.create(&order, &overrides).await.unwrap();

        let calls = carrier.create_calls.lock().unwrap();
        assert!((calls[0].weight - 3.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn success_persists_tracking_and_advances_pending() {
        let carrier = Arc::new(FakeCarrier::default());
        let (service, repo) = service_with(carrier).await;

        let order = repo
            .create(order_create("ok", Some("1234")), vec![])
            .await
            .unwrap();
        let info = service
            .create(&order, &ShipmentOverrides::default())
            .await
            .unwrap();
        assert_eq!(info.packet_id, "pk-ORD-ok");

        let stored = repo
            .find_by_id(&order.id.unwrap().to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.packet_id.as_deref(), Some("pk-ORD-ok"));
        assert_eq!(stored.tracking_number.as_deref(), Some("Z-ORD-ok"));
        assert_eq!(stored.status, shared::OrderStatus::Processing);
    }

    #[tokio::test]
    async fn carrier_fault_writes_no_tracking_fields() {
        let carrier = Arc::new(FakeCarrier::failing(CarrierError::Fault(
            "IncorrectApiPassword".into(),
        )));
        let (service, repo) = service_with(carrier).await;

        let order = repo
            .create(order_create("fault", Some("1234")), vec![])
            .await
            .unwrap();
        let err = service
            .create(&order, &ShipmentOverrides::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("IncorrectApiPassword"));

        let stored = repo
            .find_by_id(&order.id.unwrap().to_string())
            .await
            .unwrap()
            .unwrap();
        assert!(stored.packet_id.is_none());
        assert!(stored.tracking_number.is_none());
    }

    #[tokio::test]
    async fn bulk_collects_per_order_failures() {
        let carrier = Arc::new(FakeCarrier::default());
        let (service, repo) = service_with(carrier).await;

        // A already has a label
        let a = repo.create(order_create("a", Some("1234")), vec![]).await.unwrap();
        let a_id = a.id.clone().unwrap();
        repo.set_shipment(&a_id, "pk-a", "Z-a").await.unwrap();
        // B lacks a pickup point
        let b = repo.create(order_create("b", None), vec![]).await.unwrap();
        // C is valid
        let c = repo.create(order_create("c", Some("1234")), vec![]).await.unwrap();
        let c_id = c.id.clone().unwrap();

        let request = BulkShipmentRequest {
            order_ids: vec![
                a_id.to_string(),
                b.id.unwrap().to_string(),
                c_id.to_string(),
            ],
            weight: None,
            width: None,
            height: None,
            depth: None,
        };
        let summary = service.create_bulk(&request).await;

        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.errors.len(), 2);
        assert_eq!(summary.errors[0].order_id, a_id.to_string());
        assert!(summary.errors[0].message.contains("already exists"));
        assert!(summary.errors[1].message.contains("no pickup point"));

        let stored_c = repo.find_by_id(&c_id.to_string()).await.unwrap().unwrap();
        assert!(stored_c.packet_id.is_some());
    }

    #[tokio::test]
    async fn printed_shipment_cannot_be_cancelled() {
        let carrier = Arc::new(FakeCarrier::default());
        let (service, repo) = service_with(carrier).await;

        let order = repo
            .create(order_create("printed", Some("1234")), vec![])
            .await
            .unwrap();
        let id = order.id.clone().unwrap();
        repo.set_shipment(&id, "pk-p", "Z-p").await.unwrap();
        repo.mark_printed(vec![id.clone()]).await.unwrap();

        let err = service.cancel(&id.to_string()).await.unwrap_err();
        assert!(matches!(err, ShipmentError::AlreadyPrinted));

        let stored = repo.find_by_id(&id.to_string()).await.unwrap().unwrap();
        assert_eq!(stored.packet_id.as_deref(), Some("pk-p"));
        assert!(stored.label_printed);
    }

    #[tokio::test]
    async fn cancel_clears_local_fields_only() {
        let carrier = Arc::new(FakeCarrier::default());
        let (service, repo) = service_with(carrier).await;

        let order = repo
            .create(order_create("cancel", Some("1234")), vec![])
            .await
            .unwrap();
        let id = order.id.clone().unwrap();
        repo.set_shipment(&id, "pk-c", "Z-c").await.unwrap();

        service.cancel(&id.to_string()).await.unwrap();
        let stored = repo.find_by_id(&id.to_string()).await.unwrap().unwrap();
        assert!(stored.packet_id.is_none());
        assert!(stored.tracking_number.is_none());
    }

    #[tokio::test]
    async fn label_fetch_marks_order_printed() {
        let carrier = Arc::new(FakeCarrier::default());
        let (service, repo) = service_with(carrier).await;

        let order = repo
            .create(order_create("label", Some("1234")), vec![])
            .await
            .unwrap();
        let id = order.id.clone().unwrap();
        repo.set_shipment(&id, "pk-l", "Z-l").await.unwrap();

        let document = service.label(&id.to_string()).await.unwrap();
        assert!(document.starts_with(b"%PDF"));

        let stored = repo.find_by_id(&id.to_string()).await.unwrap().unwrap();
        assert!(stored.label_printed);
        assert!(stored.printed_at.is_some());
    }
}
