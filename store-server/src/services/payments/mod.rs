//! Payment provider integration
//!
//! - [`client`] - outbound intent creation
//! - [`webhook`] - inbound notification verification and parsing

pub mod client;
pub mod webhook;

pub use client::{PaymentClient, PaymentError, PaymentIntent};
pub use webhook::{
    PaymentEvent, SIGNATURE_HEADER, SignatureError, parse_event, verify_signature,
};
