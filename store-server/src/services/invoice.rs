//! Invoice document generation
//!
//! Renders a self-contained HTML invoice from the order row and its item
//! snapshots. Attached to the confirmation email; the checksum is logged so a
//! resent document can be compared against the original.

use crate::db::models::{Order, OrderItem};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Generated invoice ready to attach
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub filename: String,
    pub html: String,
    /// SHA256 of the rendered document
    pub checksum: String,
}

/// Minor units → "1600.00" style major-unit string
pub fn format_amount(minor: i64) -> String {
    Decimal::new(minor, 2).to_string()
}

pub fn generate_invoice(order: &Order, items: &[OrderItem]) -> InvoiceDocument {
    let mut rows = String::new();
    for item in items {
        let line_total = item.unit_price * i64::from(item.quantity);
        let name = match &item.variant {
            Some(variant) => format!("{} ({})", item.name, variant),
            None => item.name.clone(),
        };
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&name),
            item.quantity,
            format_amount(item.unit_price),
            format_amount(line_total),
        ));
    }

    let currency = order.currency.to_uppercase();
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Invoice {number}</title></head>
<body>
<h1>Invoice {number}</h1>
<p>Customer: {customer}<br>Email: {email}</p>
<table border="1" cellspacing="0" cellpadding="4">
<tr><th>Item</th><th>Qty</th><th>Unit price</th><th>Total</th></tr>
{rows}</table>
<p><strong>Total: {total} {currency}</strong></p>
</body>
</html>
"#,
        number = escape_html(&order.order_number),
        customer = escape_html(&order.customer_name),
        email = escape_html(&order.customer_email),
        rows = rows,
        total = format_amount(order.total_amount),
        currency = currency,
    );

    let checksum = hex::encode(Sha256::digest(html.as_bytes()));
    InvoiceDocument {
        filename: format!("invoice-{}.html", order.order_number),
        html,
        checksum,
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
