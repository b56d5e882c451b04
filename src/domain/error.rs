//! Planning error module
//!
//! This module defines the typed error enum used for item-level validation
//! diagnostics. Validation failures skip the offending item and never abort
//! a solve; infeasibility during decoding is reported through skip counters
//! and fail statistics instead of errors.

use thiserror::Error;

/// Errors raised while validating or interpreting catalog items
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    /// A datetime string did not match any of the accepted formats
    #[error("malformed datetime: {0}")]
    InvalidDateTime(String),

    /// A time-of-day string was not a valid HH:MM value
    #[error("invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    /// An order line names a product that is not in the catalog
    #[error("order {order_id} references unknown product {product_id}")]
    UnknownProduct { order_id: String, product_id: String },

    /// A product has no candidate routings
    #[error("product {0} has no routings")]
    MissingRouting(String),

    /// A product references a routing id that is not in the catalog
    #[error("product {product_id} references unknown routing {routing_id}")]
    UnknownRouting { product_id: String, routing_id: String },

    /// A machine references a work center that is not in the catalog
    #[error("machine {machine_id} references unknown work center {work_center_id}")]
    UnknownWorkCenter {
        machine_id: String,
        work_center_id: String,
    },

    /// An operation's batch rule violates min_qty <= max_qty or max_qty >= 1
    #[error("operation {op_name} has invalid batch rule (min {min_qty:?}, max {max_qty:?})")]
    InvalidBatchRule {
        op_name: String,
        min_qty: Option<u32>,
        max_qty: Option<u32>,
    },

    /// A shift carries an unparseable start, end or break time
    #[error("shift {shift_id} has invalid time: {detail}")]
    InvalidShift { shift_id: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlanningError::UnknownProduct {
            order_id: "O1".to_string(),
            product_id: "P9".to_string(),
        };
        assert_eq!(err.to_string(), "order O1 references unknown product P9");
    }
}
