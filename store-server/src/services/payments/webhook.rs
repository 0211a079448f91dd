//! Payment webhook verification and parsing
//!
//! The provider signs the raw request body with a shared secret:
//! `Webhook-Signature: t=<unix>,v1=<hex hmac-sha256("{t}.{body}")>`.
//! Verification happens before anything is parsed; a body that fails it is
//! rejected without touching any state.
//!
//! Payloads are parsed into an explicit [`PaymentEvent`] enum — no untyped
//! JSON leaves this module.

use ring::hmac;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "webhook-signature";

/// Maximum accepted clock skew between the signature timestamp and now
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is malformed")]
    Malformed,

    #[error("signature timestamp outside tolerance")]
    Expired,

    #[error("signature does not match payload")]
    Mismatch,
}

/// Verify the signature header against the raw body.
///
/// Accepts any matching `v1` entry (the provider sends several during secret
/// rotation). HMAC comparison is constant-time via `ring::hmac::verify`.
pub fn verify_signature(
    secret: &str,
    header: &str,
    body: &[u8],
    now_unix: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => {
                if let Ok(sig) = hex::decode(value) {
                    candidates.push(sig);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::Expired);
    }

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let mut signed = format!("{timestamp}.").into_bytes();
    signed.extend_from_slice(body);

    for candidate in &candidates {
        if hmac::verify(&key, &signed, candidate).is_ok() {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

/// Metadata the provider echoes back from intent creation
#[derive(Debug, Clone, Default)]
pub struct EventMetadata {
    pub idempotency_key: Option<String>,
    pub pickup_point_id: Option<String>,
}

/// Intent reference carried by every lifecycle notification
#[derive(Debug, Clone)]
pub struct IntentSnapshot {
    pub intent_id: String,
    pub metadata: EventMetadata,
}

/// Tagged payment lifecycle notification
#[derive(Debug, Clone)]
pub enum PaymentEvent {
    Succeeded(IntentSnapshot),
    Failed(IntentSnapshot),
    Processing(IntentSnapshot),
    RequiresAction(IntentSnapshot),
    /// Event type this system does not react to; acknowledged and dropped
    Ignored { event_type: String },
}

#[derive(Debug, Deserialize)]
struct WirePayload {
    #[serde(rename = "type")]
    event_type: String,
    data: WireData,
}

#[derive(Debug, Deserialize)]
struct WireData {
    object: WireObject,
}

#[derive(Debug, Deserialize)]
struct WireObject {
    id: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// Parse a verified body into a tagged event
pub fn parse_event(body: &[u8]) -> Result<PaymentEvent, serde_json::Error> {
    let payload: WirePayload = serde_json::from_slice(body)?;
    let snapshot = IntentSnapshot {
        intent_id: payload.data.object.id,
        metadata: EventMetadata {
            idempotency_key: payload.data.object.metadata.get("idempotency_key").cloned(),
            pickup_point_id: payload.data.object.metadata.get("pickup_point_id").cloned(),
        },
    };

    Ok(match payload.event_type.as_str() {
        "payment_intent.succeeded" => PaymentEvent::Succeeded(snapshot),
        "payment_intent.payment_failed" => PaymentEvent::Failed(snapshot),
        "payment_intent.processing" => PaymentEvent::Processing(snapshot),
        "payment_intent.requires_action" => PaymentEvent::RequiresAction(snapshot),
        _ => PaymentEvent::Ignored {
            event_type: payload.event_type,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn sign(secret: &str, timestamp: i64, body: &[u8]) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let mut signed = format!("{timestamp}.").into_bytes();
        signed.extend_from_slice(body);
        let tag = hmac::sign(&key, &signed);
        format!("t={timestamp},v1={}", hex::encode(tag.as_ref()))
    }

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"type":"payment_intent.succeeded"}"#;
        let header = sign(SECRET, 1_700_000_000, body);
        assert_eq!(
            verify_signature(SECRET, &header, body, 1_700_000_000),
            Ok(())
        );
    }

    #[test]
    fn rejects_tampered_body() {
        let header = sign(SECRET, 1_700_000_000, b"original");
        assert_eq!(
            verify_signature(SECRET, &header, b"tampered", 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = b"payload";
        let header = sign("whsec_other", 1_700_000_000, body);
        assert_eq!(
            verify_signature(SECRET, &header, body, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamp() {
        let body = b"payload";
        let header = sign(SECRET, 1_700_000_000, body);
        assert_eq!(
            verify_signature(SECRET, &header, body, 1_700_000_000 + 3600),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn rejects_header_without_signature() {
        assert_eq!(
            verify_signature(SECRET, "t=123", b"x", 123),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_signature(SECRET, "nonsense", b"x", 123),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn parses_succeeded_event_with_metadata() {
        let body = br#"{
            "type": "payment_intent.succeeded",
            "data": {"object": {
                "id": "pi_123",
                "metadata": {"idempotency_key": "key-1", "pickup_point_id": "1234"}
            }}
        }"#;
        match parse_event(body).unwrap() {
            PaymentEvent::Succeeded(snap) => {
                assert_eq!(snap.intent_id, "pi_123");
                assert_eq!(snap.metadata.idempotency_key.as_deref(), Some("key-1"));
                assert_eq!(snap.metadata.pickup_point_id.as_deref(), Some("1234"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn missing_metadata_parses_as_none() {
        let body = br#"{"type":"payment_intent.payment_failed","data":{"object":{"id":"pi_9"}}}"#;
        match parse_event(body).unwrap() {
            PaymentEvent::Failed(snap) => {
                assert!(snap.metadata.idempotency_key.is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_type_is_ignored() {
        let body = br#"{"type":"charge.refund.updated","data":{"object":{"id":"re_1"}}}"#;
        match parse_event(body).unwrap() {
            PaymentEvent::Ignored { event_type } => {
                assert_eq!(event_type, "charge.refund.updated");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
