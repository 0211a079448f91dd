//! Transactional email dispatch
//!
//! [`EmailClient`] is the seam the flows depend on; the HTTP implementation
//! posts to an email API, [`NoEmailClient`] logs and succeeds so environments
//! without credentials keep working. Email is always best-effort: callers log
//! failures and never roll back committed state because a send failed.

use async_trait::async_trait;
use base64::Engine;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email API error: {0}")]
    Api(String),

    #[error("email transport error: {0}")]
    Transport(String),
}

/// One attachment (invoice PDF/HTML)
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: String,
    pub attachments: Vec<EmailAttachment>,
}

#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// HTTP email API client
pub struct HttpEmailClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpEmailClient {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl EmailClient for HttpEmailClient {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        let attachments: Vec<serde_json::Value> = message
            .attachments
            .iter()
            .map(|a| {
                json!({
                    "filename": a.filename,
                    "contentType": a.content_type,
                    "content": base64::engine::general_purpose::STANDARD.encode(&a.data),
                })
            })
            .collect();

        let payload = json!({
            "from": self.from,
            "to": message.to,
            "subject": message.subject,
            "html": message.body_html,
            "attachments": attachments,
        });

        let resp = self
            .http
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(EmailError::Api(format!("{status}: {body}")));
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// Client when email support is disabled
#[derive(Debug, Clone, Default)]
pub struct NoEmailClient;

#[async_trait]
impl EmailClient for NoEmailClient {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email support disabled, message not sent"
        );
        Ok(())
    }
}

/// Test double that records every message it was asked to send
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingEmailClient {
        pub sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl EmailClient for RecordingEmailClient {
        async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }
}
