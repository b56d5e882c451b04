//! Order entity module
//!
//! A customer order with a due date and one or more product lines. Both
//! the multi-line shape (`lines[]`) and the legacy single-line shape
//! (`product_id` + `quantity` on the order itself) are accepted;
//! `effective_lines` normalizes the two.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::timestamp::{de_datetime, de_datetime_opt};

/// One product line of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Product to manufacture
    pub product_id: String,
    /// Units ordered; zero-quantity lines produce no batches
    pub quantity: u32,
    /// Line priority overriding the order priority
    #[serde(default)]
    pub priority: Option<i32>,
}

/// A customer order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier
    pub id: String,
    /// Latest acceptable finish for the whole order
    #[serde(deserialize_with = "de_datetime")]
    pub due_date: NaiveDateTime,
    /// Earliest start; defaults to the wall clock when absent
    #[serde(default, deserialize_with = "de_datetime_opt")]
    pub release_date: Option<NaiveDateTime>,
    /// Order priority; lines may override per product
    #[serde(default)]
    pub priority: i32,
    /// Product lines of a multi-line order
    #[serde(default)]
    pub lines: Vec<OrderLine>,
    /// Legacy single-line shape: product ordered directly on the order
    #[serde(default)]
    pub product_id: Option<String>,
    /// Legacy single-line shape: quantity ordered directly on the order
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl Order {
    /// Normalizes the order into product lines
    ///
    /// Multi-line orders return their lines; the legacy single-line shape
    /// is wrapped into a one-element list.
    pub fn effective_lines(&self) -> Vec<OrderLine> {
        if !self.lines.is_empty() {
            return self.lines.clone();
        }
        match (&self.product_id, self.quantity) {
            (Some(product_id), Some(quantity)) => vec![OrderLine {
                product_id: product_id.clone(),
                quantity,
                priority: None,
            }],
            _ => Vec::new(),
        }
    }
}
