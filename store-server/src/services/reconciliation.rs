//! Payment Reconciliation Flow
//!
//! 接收已验签的支付事件, 推进订单状态并触发后续动作.
//!
//! The state transition is the only gate: a conditional update matches the
//! order by idempotency key while its payment status is still pre-settlement.
//! Zero rows matched means the event is a redelivery or references an unknown
//! key; either way it is acknowledged and every side effect is skipped.
//!
//! Side effects run only after a won `succeeded` transition, each best-effort
//! in a fixed order: weight recomputation, confirmation email with attached
//! invoice (guarded by `confirmation_sent_at`), shipment creation, then the
//! plain status notification. A failed side effect is logged and never rolls
//! back the committed status. All other events are transition-only.

use crate::db::models::Order;
use crate::db::repository::OrderRepository;
use crate::services::email::{EmailAttachment, EmailClient, EmailMessage};
use crate::services::invoice::generate_invoice;
use crate::services::payments::PaymentEvent;
use crate::services::payments::webhook::IntentSnapshot;
use crate::services::shipping::{ShipmentOverrides, ShipmentService, compute_items_weight};
use shared::{OrderStatus, PaymentStatus};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("database error: {0}")]
    Database(String),
}

impl From<crate::db::repository::RepoError> for ReconciliationError {
    fn from(err: crate::db::repository::RepoError) -> Self {
        ReconciliationError::Database(err.to_string())
    }
}

/// What processing an event amounted to; webhooks respond 200 either way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// The conditional transition matched and side effects ran
    Applied,
    /// Unknown key, redelivery, or an event type this system ignores
    NoOp,
}

#[derive(Clone)]
pub struct ReconciliationService {
    orders: OrderRepository,
    shipments: ShipmentService,
    mailer: Arc<dyn EmailClient>,
    store_name: String,
}

impl ReconciliationService {
    pub fn new(
        orders: OrderRepository,
        shipments: ShipmentService,
        mailer: Arc<dyn EmailClient>,
        store_name: String,
    ) -> Self {
        Self {
            orders,
            shipments,
            mailer,
            store_name,
        }
    }

    /// Apply one verified payment event.
    ///
    /// Only database failures bubble up (the provider should retry those);
    /// everything else resolves to an outcome.
    pub async fn process(
        &self,
        event: PaymentEvent,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        match event {
            PaymentEvent::Succeeded(snapshot) => {
                self.settle(
                    snapshot,
                    OrderStatus::Confirmed,
                    PaymentStatus::Paid,
                    true,
                )
                .await
            }
            PaymentEvent::Failed(snapshot) => {
                self.settle(
                    snapshot,
                    OrderStatus::Cancelled,
                    PaymentStatus::Failed,
                    false,
                )
                .await
            }
            PaymentEvent::Processing(snapshot) => {
                self.settle(
                    snapshot,
                    OrderStatus::Pending,
                    PaymentStatus::Processing,
                    false,
                )
                .await
            }
            PaymentEvent::RequiresAction(snapshot) => {
                self.settle(
                    snapshot,
                    OrderStatus::Pending,
                    PaymentStatus::RequiresAction,
                    false,
                )
                .await
            }
            PaymentEvent::Ignored { event_type } => {
                tracing::debug!(event_type = %event_type, "Ignoring payment event type");
                Ok(ReconciliationOutcome::NoOp)
            }
        }
    }

    async fn settle(
        &self,
        snapshot: IntentSnapshot,
        status: OrderStatus,
        payment_status: PaymentStatus,
        success: bool,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        let Some(key) = snapshot.metadata.idempotency_key.as_deref() else {
            tracing::warn!(
                intent_id = %snapshot.intent_id,
                "Payment event carries no idempotency key, acknowledging without action"
            );
            return Ok(ReconciliationOutcome::NoOp);
        };

        let updated = self
            .orders
            .transition_payment(key, status, payment_status, PaymentStatus::pre_settlement())
            .await?;
        let Some(order) = updated else {
            tracing::info!(
                intent_id = %snapshot.intent_id,
                "No order matched the transition (unknown key or redelivery), skipping"
            );
            return Ok(ReconciliationOutcome::NoOp);
        };

        tracing::info!(
            order = %order.order_number,
            status = %status,
            payment_status = %payment_status,
            "Payment transition applied"
        );

        if success {
            self.run_success_side_effects(&order, snapshot.metadata.pickup_point_id.as_deref())
                .await;
        }

        Ok(ReconciliationOutcome::Applied)
    }

    /// Post-settlement actions for a paid order, each one best-effort.
    /// The shipment trigger follows the event metadata, which the provider
    /// echoes back from intent creation.
    async fn run_success_side_effects(&self, order: &Order, pickup_point_id: Option<&str>) {
        let Some(order_id) = order.id.clone() else {
            return;
        };

        // Recompute the shipment weight from the item snapshots
        match self.orders.find_items(&order_id).await {
            Ok(items) => {
                let weight = compute_items_weight(&items);
                if let Err(e) = self.orders.set_weight(&order_id, weight).await {
                    tracing::warn!(order = %order.order_number, error = %e, "Could not persist weight");
                }
            }
            Err(e) => {
                tracing::warn!(order = %order.order_number, error = %e, "Could not read items for weight");
            }
        }

        // Confirmation email + invoice, at most once per order
        if order.confirmation_sent_at.is_none() {
            if self.send_confirmation_email(order).await {
                if let Err(e) = self.orders.set_confirmation_sent(&order_id).await {
                    tracing::warn!(order = %order.order_number, error = %e, "Could not stamp confirmation guard");
                }
            }
        } else {
            tracing::info!(order = %order.order_number, "Confirmation already sent, skipping email");
        }

        // Shipment for pickup-point orders without one
        if pickup_point_id.is_some_and(|p| !p.is_empty()) && order.packet_id.is_none() {
            if let Err(e) = self
                .shipments
                .create(order, &ShipmentOverrides::default())
                .await
            {
                tracing::warn!(
                    order = %order.order_number,
                    error = %e,
                    "Automatic shipment creation failed, order remains shippable manually"
                );
            }
        }

        self.send_status_email(order).await;
    }

    async fn send_confirmation_email(&self, order: &Order) -> bool {
        let items = match order.id.as_ref() {
            Some(id) => self.orders.find_items(id).await.unwrap_or_default(),
            None => Vec::new(),
        };
        let invoice = generate_invoice(order, &items);
        tracing::info!(
            order = %order.order_number,
            checksum = %invoice.checksum,
            "Generated invoice"
        );

        let message = EmailMessage {
            to: order.customer_email.clone(),
            subject: format!(
                "{} — order {} confirmed",
                self.store_name, order.order_number
            ),
            body_html: format!(
                "<p>Thank you for your order <strong>{}</strong>. Your payment was \
                 received; the invoice is attached.</p>",
                order.order_number
            ),
            attachments: vec![EmailAttachment {
                filename: invoice.filename,
                content_type: "text/html".into(),
                data: invoice.html.into_bytes(),
            }],
        };

        match self.mailer.send_email(message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(order = %order.order_number, error = %e, "Confirmation email failed");
                false
            }
        }
    }

    /// Plain "order is being processed" notification, sent after the
    /// confirmation side effects
    async fn send_status_email(&self, order: &Order) {
        let message = EmailMessage {
            to: order.customer_email.clone(),
            subject: format!(
                "{} — order {} is being processed",
                self.store_name, order.order_number
            ),
            body_html: format!(
                "<p>Your order <strong>{}</strong> is now being prepared. We will \
                 let you know when it ships.</p>",
                order.order_number
            ),
            attachments: Vec::new(),
        };
        if let Err(e) = self.mailer.send_email(message).await {
            tracing::warn!(order = %order.order_number, error = %e, "Status email failed");
        }
    }
}
