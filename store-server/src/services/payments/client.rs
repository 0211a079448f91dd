//! Payment provider API client
//!
//! Creates payment intents over the provider's form-encoded HTTP API. The
//! checkout idempotency key is forwarded as the provider's `Idempotency-Key`
//! header, so a retried checkout resolves to the same intent, and is embedded
//! in the intent metadata so the asynchronous webhook can find the order row.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment API error: {0}")]
    Api(String),

    #[error("payment transport error: {0}")]
    Transport(String),
}

/// Created intent, as the storefront widget needs it
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct PaymentClient {
    http: reqwest::Client,
    api_url: String,
    secret_key: String,
}

impl PaymentClient {
    pub fn new(api_url: String, secret_key: String, timeout_ms: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_url,
            secret_key,
        }
    }

    /// Create a payment intent for a pending order
    pub async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        idempotency_key: &str,
        order_number: &str,
        pickup_point_id: Option<&str>,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut form: Vec<(&str, String)> = vec![
            ("amount", amount.to_string()),
            ("currency", currency.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[idempotency_key]", idempotency_key.to_string()),
            ("metadata[order_number]", order_number.to_string()),
        ];
        if let Some(point) = pickup_point_id {
            form.push(("metadata[pickup_point_id]", point.to_string()));
        }

        let resp = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_url))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", idempotency_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(PaymentError::Api(format!("{status}: {message}")));
        }

        resp.json::<PaymentIntent>()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))
    }
}
