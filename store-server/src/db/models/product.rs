//! Product Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Product model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Minor currency units
    pub price: i64,
    /// Weight per unit in kg, if recorded
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Product variant (size, colour, ...). Price and weight override the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl Product {
    /// Resolve the unit price for an optional variant name
    pub fn price_for(&self, variant: Option<&str>) -> Option<i64> {
        match variant {
            None => Some(self.price),
            Some(name) => self
                .variants
                .iter()
                .find(|v| v.name == name)
                .map(|v| v.price),
        }
    }

    /// Per-unit variant weight for an optional variant name
    pub fn variant_weight_for(&self, variant: Option<&str>) -> Option<f64> {
        variant.and_then(|name| {
            self.variants
                .iter()
                .find(|v| v.name == name)
                .and_then(|v| v.weight)
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub weight: Option<f64>,
    pub variants: Vec<ProductVariant>,
    pub sort_order: i32,
    pub is_active: bool,
}

impl ProductCreate {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            weight: None,
            variants: Vec::new(),
            sort_order: 0,
            is_active: true,
        }
    }
}
