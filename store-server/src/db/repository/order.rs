//! Order Repository
//!
//! The order row has exactly three writers: checkout (insert), the payment
//! reconciliation flow (status columns, via the conditional transition below)
//! and the shipment flow (shipment columns). Admin status override is the only
//! unconditional status write.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Order, OrderCreate, OrderItem, OrderItemSnapshot};
use serde::Serialize;
use shared::{OrderStatus, PaymentStatus};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const ORDER_TABLE: &str = "order";
const ITEM_TABLE: &str = "order_item";

/// Insert payload for one order line
#[derive(Debug, Serialize)]
struct OrderItemInsert {
    order: RecordId,
    product_id: String,
    variant: Option<String>,
    name: String,
    quantity: i32,
    unit_price: i64,
    variant_weight: Option<f64>,
    product_weight: Option<f64>,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn record_id(id: &str) -> RecordId {
        if id.contains(':') {
            id.parse()
                .unwrap_or_else(|_| RecordId::from_table_key(ORDER_TABLE, id))
        } else {
            RecordId::from_table_key(ORDER_TABLE, id)
        }
    }

    /// Insert a new order together with its immutable item snapshots
    pub async fn create(
        &self,
        data: OrderCreate,
        items: Vec<OrderItemSnapshot>,
    ) -> RepoResult<Order> {
        let order: Option<Order> = self.base.db().create(ORDER_TABLE).content(data).await?;
        let order =
            order.ok_or_else(|| RepoError::Database("order insert returned no row".into()))?;
        let order_id = order
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("order insert returned no id".into()))?;

        for item in items {
            let _: Option<OrderItem> = self
                .base
                .db()
                .create(ITEM_TABLE)
                .content(OrderItemInsert {
                    order: order_id.clone(),
                    product_id: item.product_id,
                    variant: item.variant,
                    name: item.name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    variant_weight: item.variant_weight,
                    product_weight: item.product_weight,
                })
                .await?;
        }

        Ok(order)
    }

    /// List orders, newest first, optionally filtered by status
    pub async fn find_all(
        &self,
        limit: i32,
        offset: i32,
        status: Option<OrderStatus>,
    ) -> RepoResult<Vec<Order>> {
        let mut sql = String::from("SELECT * FROM order");
        if status.is_some() {
            sql.push_str(" WHERE status = $status");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT $limit START $offset");

        let orders: Vec<Order> = self
            .base
            .db()
            .query(sql)
            .bind(("status", status.map(|s| s.as_str().to_string())))
            .bind(("limit", limit))
            .bind(("offset", offset))
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let record_id = Self::record_id(id);
        let order: Option<Order> = self.base.db().select(record_id).await?;
        Ok(order)
    }

    /// Locate an order from a webhook that carries no order id
    pub async fn find_by_idempotency_key(&self, key: &str) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE idempotency_key = $key LIMIT 1")
            .bind(("key", key.to_string()))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Items belonging to an order
    pub async fn find_items(&self, order_id: &RecordId) -> RepoResult<Vec<OrderItem>> {
        let items: Vec<OrderItem> = self
            .base
            .db()
            .query("SELECT * FROM order_item WHERE order = $order")
            .bind(("order", order_id.clone()))
            .await?
            .take(0)?;
        Ok(items)
    }

    /// Conditional payment transition (compare-and-swap on `payment_status`).
    ///
    /// Updates the row found by idempotency key only while its payment status
    /// is still in `expected`. Returns `None` when no row matched — either the
    /// key is unknown or the order already left the expected set (webhook
    /// redelivery), and the caller must skip side effects.
    pub async fn transition_payment(
        &self,
        idempotency_key: &str,
        status: OrderStatus,
        payment_status: PaymentStatus,
        expected: &[PaymentStatus],
    ) -> RepoResult<Option<Order>> {
        let expected: Vec<String> = expected.iter().map(|s| s.as_str().to_string()).collect();
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE order SET status = $status, payment_status = $payment_status, \
                 updated_at = $now \
                 WHERE idempotency_key = $key AND payment_status IN $expected",
            )
            .bind(("status", status.as_str().to_string()))
            .bind(("payment_status", payment_status.as_str().to_string()))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .bind(("key", idempotency_key.to_string()))
            .bind(("expected", expected))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Admin status override
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> RepoResult<Order> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query("UPDATE $id SET status = $status, updated_at = $now")
            .bind(("id", Self::record_id(id)))
            .bind(("status", status.as_str().to_string()))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    pub async fn set_weight(&self, id: &RecordId, weight: f64) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $id SET weight = $weight, updated_at = $now")
            .bind(("id", id.clone()))
            .bind(("weight", weight))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await?;
        Ok(())
    }

    /// Persist carrier identifiers after a successful shipment creation.
    ///
    /// A `pending` order advances to `processing` as a side effect; any other
    /// status is left untouched.
    pub async fn set_shipment(
        &self,
        id: &RecordId,
        packet_id: &str,
        tracking_number: &str,
    ) -> RepoResult<Order> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $id SET packet_id = $packet_id, tracking_number = $tracking, \
                 status = IF status = 'pending' THEN 'processing' ELSE status END, \
                 updated_at = $now",
            )
            .bind(("id", id.clone()))
            .bind(("packet_id", packet_id.to_string()))
            .bind(("tracking", tracking_number.to_string()))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Unlink the local shipment fields (carrier record stays live)
    pub async fn clear_shipment(&self, id: &RecordId) -> RepoResult<()> {
        self.base
            .db()
            .query(
                "UPDATE $id SET packet_id = NONE, tracking_number = NONE, updated_at = $now",
            )
            .bind(("id", id.clone()))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await?;
        Ok(())
    }

    /// Flag orders whose labels were handed to the admin for printing
    pub async fn mark_printed(&self, ids: Vec<RecordId>) -> RepoResult<()> {
        self.base
            .db()
            .query(
                "UPDATE order SET label_printed = true, printed_at = $now, updated_at = $now \
                 WHERE id IN $ids",
            )
            .bind(("ids", ids))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await?;
        Ok(())
    }

    /// Stamp the confirmation-email guard
    pub async fn set_confirmation_sent(&self, id: &RecordId) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $id SET confirmation_sent_at = $now, updated_at = $now")
            .bind(("id", id.clone()))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;
    use chrono::Utc;

    fn pending_order(key: &str) -> OrderCreate {
        let now = Utc::now().to_rfc3339();
        OrderCreate {
            order_number: "ORD2026082510001".into(),
            idempotency_key: key.into(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            total_amount: 160000,
            currency: "czk".into(),
            customer_name: "Jana Nováková".into(),
            customer_email: "jana@example.com".into(),
            customer_phone: None,
            pickup_point_id: Some("1234".into()),
            pickup_point_name: None,
            pickup_point_address: None,
            payment_intent_id: Some("pi_test".into()),
            payment_client_secret: Some("pi_test_secret".into()),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn item(name: &str, quantity: i32) -> OrderItemSnapshot {
        OrderItemSnapshot {
            product_id: "product:tea".into(),
            variant: None,
            name: name.into(),
            quantity,
            unit_price: 80000,
            variant_weight: None,
            product_weight: None,
        }
    }

    #[tokio::test]
    async fn create_and_find_by_idempotency_key() {
        let db = memory_db().await;
        let repo = OrderRepository::new(db);

        let order = repo
            .create(pending_order("key-1"), vec![item("Tea", 2)])
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);

        let found = repo.find_by_idempotency_key("key-1").await.unwrap().unwrap();
        assert_eq!(found.order_number, order.order_number);

        let items = repo.find_items(found.id.as_ref().unwrap()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);

        assert!(repo.find_by_idempotency_key("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_idempotency_key_is_rejected() {
        let db = memory_db().await;
        let repo = OrderRepository::new(db);
        repo.create(pending_order("key-dup"), vec![]).await.unwrap();

        let second = repo.create(pending_order("key-dup"), vec![]).await;
        assert!(matches!(second, Err(RepoError::Duplicate(_))));

        // Exactly one row carries the key, so the transition settles one order
        repo.transition_payment(
            "key-dup",
            OrderStatus::Confirmed,
            PaymentStatus::Paid,
            PaymentStatus::pre_settlement(),
        )
        .await
        .unwrap()
        .unwrap();
        let confirmed = repo
            .find_all(10, 0, Some(OrderStatus::Confirmed))
            .await
            .unwrap();
        assert_eq!(confirmed.len(), 1);
    }

    #[tokio::test]
    async fn transition_is_conditional_on_payment_status() {
        let db = memory_db().await;
        let repo = OrderRepository::new(db);
        repo.create(pending_order("key-2"), vec![]).await.unwrap();

        // First delivery applies the transition
        let updated = repo
            .transition_payment(
                "key-2",
                OrderStatus::Confirmed,
                PaymentStatus::Paid,
                PaymentStatus::pre_settlement(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Confirmed);
        assert_eq!(updated.payment_status, PaymentStatus::Paid);

        // Redelivery matches zero rows: payment_status is no longer in the set
        let redelivered = repo
            .transition_payment(
                "key-2",
                OrderStatus::Confirmed,
                PaymentStatus::Paid,
                PaymentStatus::pre_settlement(),
            )
            .await
            .unwrap();
        assert!(redelivered.is_none());
    }

    #[tokio::test]
    async fn set_shipment_advances_pending_to_processing() {
        let db = memory_db().await;
        let repo = OrderRepository::new(db);
        let order = repo.create(pending_order("key-3"), vec![]).await.unwrap();
        let id = order.id.clone().unwrap();

        let updated = repo.set_shipment(&id, "98765", "Z 987 65").await.unwrap();
        assert_eq!(updated.packet_id.as_deref(), Some("98765"));
        assert_eq!(updated.tracking_number.as_deref(), Some("Z 987 65"));
        assert_eq!(updated.status, OrderStatus::Processing);

        // A confirmed order keeps its status
        repo.update_status(&id.to_string(), OrderStatus::Confirmed)
            .await
            .unwrap();
        let again = repo.set_shipment(&id, "98766", "Z 987 66").await.unwrap();
        assert_eq!(again.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn clear_shipment_unsets_fields() {
        let db = memory_db().await;
        let repo = OrderRepository::new(db);
        let order = repo.create(pending_order("key-4"), vec![]).await.unwrap();
        let id = order.id.clone().unwrap();

        repo.set_shipment(&id, "111", "Z 111").await.unwrap();
        repo.clear_shipment(&id).await.unwrap();

        let fetched = repo.find_by_id(&id.to_string()).await.unwrap().unwrap();
        assert!(fetched.packet_id.is_none());
        assert!(fetched.tracking_number.is_none());
    }
}
