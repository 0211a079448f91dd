//! Carrier XML codec
//!
//! The carrier speaks XML-over-HTTP: one verb per request body, the shared
//! API password embedded in each. Requests are serialized with quick-xml.
//!
//! Responses are not always well-formed — live traffic contains raw control
//! characters and unescaped ampersands. Parsing therefore runs as a chain:
//!
//! 1. sanitize the body (strip control chars, escape stray `&`);
//! 2. structured parse with roxmltree;
//! 3. regex tag extraction over the sanitized text.
//!
//! A fault status found by either stage raises [`CarrierError::Fault`] with
//! the extracted fault text; a body no stage can recover anything from raises
//! [`CarrierError::Parse`].

use crate::services::shipping::request::ShipmentRequest;
use base64::Engine;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("carrier fault: {0}")]
    Fault(String),

    #[error("carrier response could not be parsed: {0}")]
    Parse(String),

    #[error("carrier request could not be encoded: {0}")]
    Encode(String),

    #[error("carrier transport error: {0}")]
    Transport(String),
}

/// Normalized successful create-packet response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierPacket {
    pub id: String,
    pub barcode: String,
    pub barcode_text: Option<String>,
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Serialize)]
#[serde(rename = "createPacket")]
struct CreatePacketXml<'a> {
    #[serde(rename = "apiPassword")]
    api_password: &'a str,
    #[serde(rename = "packetAttributes")]
    attributes: PacketAttributesXml<'a>,
}

#[derive(Serialize)]
struct PacketAttributesXml<'a> {
    number: &'a str,
    name: &'a str,
    surname: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(rename = "addressId")]
    address_id: &'a str,
    cod: String,
    value: String,
    currency: &'a str,
    weight: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    depth: Option<f64>,
    eshop: &'a str,
}

#[derive(Serialize)]
#[serde(rename = "packetLabelPdf")]
struct PacketLabelXml<'a> {
    #[serde(rename = "apiPassword")]
    api_password: &'a str,
    #[serde(rename = "packetId")]
    packet_id: &'a str,
    format: &'a str,
    offset: u32,
}

#[derive(Serialize)]
#[serde(rename = "packetsLabelsPdf")]
struct PacketsLabelsXml<'a> {
    #[serde(rename = "apiPassword")]
    api_password: &'a str,
    #[serde(rename = "packetIds")]
    packet_ids: PacketIdsXml,
    format: &'a str,
    offset: u32,
}

#[derive(Serialize)]
struct PacketIdsXml {
    id: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename = "packetStatus")]
struct PacketStatusXml<'a> {
    #[serde(rename = "apiPassword")]
    api_password: &'a str,
    #[serde(rename = "packetId")]
    packet_id: &'a str,
}

/// A6-on-A4 label layout used by the admin print view
pub const LABEL_FORMAT: &str = "A6 on A4";

pub fn build_create_packet(
    api_password: &str,
    request: &ShipmentRequest,
) -> Result<String, CarrierError> {
    let body = CreatePacketXml {
        api_password,
        attributes: PacketAttributesXml {
            number: &request.order_number,
            name: &request.name,
            surname: &request.surname,
            email: &request.email,
            phone: request.phone.as_deref(),
            address_id: &request.pickup_point_id,
            cod: request.cod.to_string(),
            value: request.value.to_string(),
            currency: &request.currency,
            weight: format!("{:.3}", request.weight),
            width: request.width,
            height: request.height,
            depth: request.depth,
            eshop: &request.eshop,
        },
    };
    quick_xml::se::to_string(&body).map_err(|e| CarrierError::Encode(e.to_string()))
}

pub fn build_packet_label(api_password: &str, packet_id: &str) -> Result<String, CarrierError> {
    quick_xml::se::to_string(&PacketLabelXml {
        api_password,
        packet_id,
        format: LABEL_FORMAT,
        offset: 0,
    })
    .map_err(|e| CarrierError::Encode(e.to_string()))
}

pub fn build_packets_labels(
    api_password: &str,
    packet_ids: &[String],
) -> Result<String, CarrierError> {
    quick_xml::se::to_string(&PacketsLabelsXml {
        api_password,
        packet_ids: PacketIdsXml {
            id: packet_ids.to_vec(),
        },
        format: LABEL_FORMAT,
        offset: 0,
    })
    .map_err(|e| CarrierError::Encode(e.to_string()))
}

pub fn build_packet_status(api_password: &str, packet_id: &str) -> Result<String, CarrierError> {
    quick_xml::se::to_string(&PacketStatusXml {
        api_password,
        packet_id,
    })
    .map_err(|e| CarrierError::Encode(e.to_string()))
}

// =============================================================================
// Response parsing
// =============================================================================

/// Fields either parsing stage may recover
#[derive(Debug, Clone, Default)]
struct ExtractedFields {
    status: Option<String>,
    fault: Option<String>,
    id: Option<String>,
    barcode: Option<String>,
    barcode_text: Option<String>,
    status_text: Option<String>,
    result: Option<String>,
}

impl ExtractedFields {
    fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.fault.is_none()
            && self.id.is_none()
            && self.barcode.is_none()
            && self.barcode_text.is_none()
            && self.status_text.is_none()
            && self.result.is_none()
    }
}

/// Strip control characters and escape ampersands that do not start an entity
pub fn sanitize_response(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let chars: Vec<char> = raw
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '&' {
            if starts_entity(&chars[i + 1..]) {
                out.push('&');
            } else {
                out.push_str("&amp;");
            }
        } else {
            out.push(c);
        }
        i += 1;
    }
    out
}

/// True when the chars after `&` look like an XML entity reference
fn starts_entity(rest: &[char]) -> bool {
    let prefix: String = rest.iter().take(12).collect();
    let Some(end) = prefix.find(';') else {
        return false;
    };
    let body = &prefix[..end];
    matches!(body, "amp" | "lt" | "gt" | "apos" | "quot")
        || (body.starts_with('#') && body.len() > 1)
}

fn parse_structured(xml: &str) -> Option<ExtractedFields> {
    let doc = roxmltree::Document::parse(xml).ok()?;
    let get = |tag: &str| {
        doc.descendants()
            .find(|n| n.has_tag_name(tag))
            .and_then(|n| n.text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    };

    let fields = ExtractedFields {
        status: get("status"),
        fault: get("fault")
            .or_else(|| get("string"))
            .or_else(|| get("faultString"))
            .or_else(|| get("detail")),
        id: get("id"),
        barcode: get("barcode"),
        barcode_text: get("barcodeText"),
        status_text: get("statusText"),
        result: get("result"),
    };
    (!fields.is_empty()).then_some(fields)
}

static TAG_ID: LazyLock<Regex> = LazyLock::new(|| tag_regex("id"));
static TAG_BARCODE: LazyLock<Regex> = LazyLock::new(|| tag_regex("barcode"));
static TAG_BARCODE_TEXT: LazyLock<Regex> = LazyLock::new(|| tag_regex("barcodeText"));
static TAG_STATUS: LazyLock<Regex> = LazyLock::new(|| tag_regex("status"));
static TAG_STATUS_TEXT: LazyLock<Regex> = LazyLock::new(|| tag_regex("statusText"));
static TAG_FAULT: LazyLock<Regex> = LazyLock::new(|| tag_regex("fault"));
static TAG_STRING: LazyLock<Regex> = LazyLock::new(|| tag_regex("string"));
static TAG_RESULT: LazyLock<Regex> = LazyLock::new(|| tag_regex("result"));

fn tag_regex(tag: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{tag}>\s*(.*?)\s*</{tag}>")).expect("static tag pattern")
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

/// Last-resort extraction: scan for known tags in the raw text
fn parse_with_regex(text: &str) -> Option<ExtractedFields> {
    let fields = ExtractedFields {
        status: capture(&TAG_STATUS, text),
        fault: capture(&TAG_FAULT, text).or_else(|| capture(&TAG_STRING, text)),
        id: capture(&TAG_ID, text),
        barcode: capture(&TAG_BARCODE, text),
        barcode_text: capture(&TAG_BARCODE_TEXT, text),
        status_text: capture(&TAG_STATUS_TEXT, text),
        result: capture(&TAG_RESULT, text),
    };
    (!fields.is_empty()).then_some(fields)
}

fn parse_fields(raw: &str) -> Result<ExtractedFields, CarrierError> {
    let sanitized = sanitize_response(raw);
    let fields = parse_structured(&sanitized)
        .or_else(|| parse_with_regex(&sanitized))
        .ok_or_else(|| CarrierError::Parse("no recognizable fields in response".into()))?;

    if let Some(status) = &fields.status
        && !status.eq_ignore_ascii_case("ok")
    {
        let text = fields
            .fault
            .clone()
            .unwrap_or_else(|| format!("carrier returned status '{status}'"));
        return Err(CarrierError::Fault(text));
    }
    Ok(fields)
}

/// Parse a create-packet response into the normalized packet shape
pub fn parse_create_packet_response(raw: &str) -> Result<CarrierPacket, CarrierError> {
    let fields = parse_fields(raw)?;
    let id = fields
        .id
        .ok_or_else(|| CarrierError::Parse("response carries no shipment id".into()))?;
    let barcode = fields.barcode.unwrap_or_else(|| id.clone());
    Ok(CarrierPacket {
        id,
        barcode,
        barcode_text: fields.barcode_text,
    })
}

/// Parse a label response; the document comes back base64-encoded
pub fn parse_label_response(raw: &str) -> Result<Vec<u8>, CarrierError> {
    let fields = parse_fields(raw)?;
    let encoded = fields
        .result
        .ok_or_else(|| CarrierError::Parse("response carries no label document".into()))?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| CarrierError::Parse(format!("label document is not valid base64: {e}")))
}

/// Parse a packet-status response into its human-readable status text
pub fn parse_status_response(raw: &str) -> Result<String, CarrierError> {
    let fields = parse_fields(raw)?;
    fields
        .status_text
        .or(fields.result)
        .ok_or_else(|| CarrierError::Parse("response carries no status text".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::shipping::request::{ShipmentOverrides, build_shipment_request};
    use crate::services::shipping::tests_support::paid_order;

    fn request() -> ShipmentRequest {
        build_shipment_request(&paid_order(), 1.5, &ShipmentOverrides::default(), "my-shop")
    }

    #[test]
    fn create_packet_request_embeds_password_and_major_units() {
        let xml = build_create_packet("secret-password", &request()).unwrap();
        assert!(xml.starts_with("<createPacket>"));
        assert!(xml.contains("<apiPassword>secret-password</apiPassword>"));
        assert!(xml.contains("<value>1600.00</value>"));
        assert!(xml.contains("<addressId>1234</addressId>"));
        assert!(xml.contains("<weight>1.500</weight>"));
        assert!(xml.contains("<surname>Nováková</surname>"));
        // No dimension overrides: elements omitted entirely
        assert!(!xml.contains("<width>"));
    }

    #[test]
    fn bulk_label_request_repeats_ids() {
        let xml =
            build_packets_labels("pw", &["111".to_string(), "222".to_string()]).unwrap();
        assert!(xml.contains("<packetIds><id>111</id><id>222</id></packetIds>"));
    }

    #[test]
    fn parses_well_formed_response() {
        let raw = "<response><status>ok</status><result>\
                   <id>12345</id><barcode>Z1234567890</barcode>\
                   <barcodeText>Z 123 456 7890</barcodeText></result></response>";
        let packet = parse_create_packet_response(raw).unwrap();
        assert_eq!(packet.id, "12345");
        assert_eq!(packet.barcode, "Z1234567890");
        assert_eq!(packet.barcode_text.as_deref(), Some("Z 123 456 7890"));
    }

    #[test]
    fn fault_status_raises_with_fault_text() {
        let raw = "<response><status>fault</status>\
                   <fault>IncorrectApiPassword</fault>\
                   <string>Incorrect API password.</string></response>";
        match parse_create_packet_response(raw) {
            Err(CarrierError::Fault(text)) => assert!(text.contains("IncorrectApiPassword")),
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn control_characters_are_sanitized_before_parsing() {
        let raw = "<response><status>ok</status><result><id>777\u{0002}</id>\
                   <barcode>Z777</barcode></result></response>";
        let packet = parse_create_packet_response(raw).unwrap();
        assert_eq!(packet.id, "777");
    }

    #[test]
    fn stray_ampersand_is_escaped_before_parsing() {
        // Raw `&` would make the structured parser bail; after sanitizing it
        // parses and the entity decodes back to the original text
        let raw = "<response><status>ok</status><result><id>1</id>\
                   <barcode>A&B</barcode></result></response>";
        let packet = parse_create_packet_response(raw).unwrap();
        assert_eq!(packet.barcode, "A&B");
    }

    #[test]
    fn regex_fallback_recovers_fields_from_broken_xml() {
        // Unclosed wrapper element defeats the structured parser
        let raw = "<response><status>ok<id>424242</id><barcode>Z42</barcode>";
        let packet = parse_create_packet_response(raw).unwrap();
        assert_eq!(packet.id, "424242");
        assert_eq!(packet.barcode, "Z42");
    }

    #[test]
    fn regex_fallback_still_detects_fault() {
        let raw = "garbage <status>fault</status> more garbage \
                   <fault>PacketAttributesFault</fault><broken";
        match parse_create_packet_response(raw) {
            Err(CarrierError::Fault(text)) => assert!(text.contains("PacketAttributesFault")),
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn unrecoverable_body_is_a_parse_error() {
        match parse_create_packet_response("') UNION SELECT nothing") {
            Err(CarrierError::Parse(_)) => {}
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn label_response_decodes_base64_document() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4 fake");
        let raw = format!(
            "<response><status>ok</status><result>{encoded}</result></response>"
        );
        let bytes = parse_label_response(&raw).unwrap();
        assert_eq!(bytes, b"%PDF-1.4 fake");
    }

    #[test]
    fn status_response_extracts_status_text() {
        let raw = "<response><status>ok</status><result>\
                   <statusText>We have received the parcel data.</statusText></result></response>";
        let text = parse_status_response(raw).unwrap();
        assert!(text.contains("received the parcel data"));
    }
}
