//! Product entity module
//!
//! This module defines the Product entity together with its routing
//! operations and batch sizing rules. A product has at least one candidate
//! routing; the scheduler picks the best routing per batch during decoding.

use serde::{Deserialize, Serialize};

use crate::domain::error::PlanningError;

/// Minimum/maximum lot quantities attached to a batchable operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRule {
    /// Smallest lot the operation accepts
    pub min_qty: Option<u32>,
    /// Largest lot the operation accepts
    pub max_qty: Option<u32>,
}

impl BatchRule {
    /// Checks the `min_qty <= max_qty` and `max_qty >= 1` invariants
    pub fn is_valid(&self) -> bool {
        if let Some(max) = self.max_qty {
            if max < 1 {
                return false;
            }
            if let Some(min) = self.min_qty {
                return min <= max;
            }
        }
        true
    }
}

/// A single operation inside a routing
///
/// Processing and fixed-setup durations accept either minute-denominated
/// keys (`*_min`) or legacy hour-denominated keys, which are normalized to
/// minutes by the accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Position of the operation inside its routing; unique per routing
    pub op_no: u32,
    /// Human-readable operation name (e.g. "Cutting", "Painting")
    pub name: String,
    /// Work center whose machines may run this operation
    pub work_center_id: String,
    /// Processing minutes per unit
    #[serde(default)]
    pub proc_time_per_unit_min: Option<f64>,
    /// Legacy processing hours per unit; multiplied by 60 on access
    #[serde(default)]
    pub proc_time_per_unit: Option<f64>,
    /// Fixed setup minutes, used when no matrix cell matches
    #[serde(default)]
    pub setup_time_fixed_min: Option<f64>,
    /// Legacy fixed setup hours; multiplied by 60 on access
    #[serde(default)]
    pub setup_time_fixed: Option<f64>,
    /// Machine state this operation leaves behind (tool/material/color)
    #[serde(default)]
    pub setup_state_key: String,
    /// Whether the operation may define the product's lot rule
    #[serde(default)]
    pub batchable: bool,
    /// Lot sizing rule, read from the first batchable operation
    #[serde(default)]
    pub batch: Option<BatchRule>,
    /// Operator needed for setup; None inherits from machine/work center
    #[serde(default)]
    pub setup_requires_operator: Option<bool>,
    /// Operator needed while running; None inherits from machine/work center
    #[serde(default)]
    pub run_requires_operator: Option<bool>,
    /// Whether processing may span multiple disjoint windows
    #[serde(default)]
    pub preemptable: bool,
    /// Minutes added to the total duration per window-to-window spill
    #[serde(default)]
    pub preemption_overhead_min: f64,
    /// Setup matrix override between the machine and work-center rungs
    #[serde(default)]
    pub setup_matrix_id: Option<String>,
}

impl Operation {
    /// Processing minutes per unit, normalizing the legacy hour key
    pub fn proc_per_unit_min(&self) -> f64 {
        self.proc_time_per_unit_min
            .or(self.proc_time_per_unit.map(|hours| hours * 60.0))
            .unwrap_or(0.0)
    }

    /// Fixed setup minutes if configured, normalizing the legacy hour key
    pub fn fixed_setup_min(&self) -> Option<f64> {
        self.setup_time_fixed_min
            .or(self.setup_time_fixed.map(|hours| hours * 60.0))
    }

    /// Validates the operation's batch rule
    ///
    /// # Returns
    ///
    /// Ok(()) when the rule is absent or consistent, an error otherwise
    pub fn validate(&self) -> Result<(), PlanningError> {
        match self.batch {
            Some(rule) if !rule.is_valid() => Err(PlanningError::InvalidBatchRule {
                op_name: self.name.clone(),
                min_qty: rule.min_qty,
                max_qty: rule.max_qty,
            }),
            _ => Ok(()),
        }
    }
}

/// A manufacturable product with candidate routings and optional lot size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier
    pub id: String,
    /// Human-readable product name
    #[serde(default)]
    pub name: String,
    /// Candidate routing ids, ordered by preference; must be nonempty
    #[serde(default)]
    pub routing_ids: Vec<String>,
    /// Preferred lot size; when positive, lots run from this up to 5x
    #[serde(default)]
    pub lot_size: Option<u32>,
}

impl Product {
    /// Validates that the product carries at least one routing
    pub fn validate(&self) -> Result<(), PlanningError> {
        if self.routing_ids.is_empty() {
            return Err(PlanningError::MissingRouting(self.id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op() -> Operation {
        serde_json::from_value(serde_json::json!({
            "op_no": 10,
            "name": "Cutting",
            "work_center_id": "WC_CUT",
        }))
        .unwrap()
    }

    #[test]
    fn test_proc_per_unit_prefers_minute_key() {
        let mut operation = op();
        operation.proc_time_per_unit_min = Some(6.0);
        operation.proc_time_per_unit = Some(2.0);
        assert_eq!(operation.proc_per_unit_min(), 6.0);
    }

    #[test]
    fn test_proc_per_unit_converts_hours() {
        let mut operation = op();
        operation.proc_time_per_unit = Some(0.5);
        assert_eq!(operation.proc_per_unit_min(), 30.0);
    }

    #[test]
    fn test_fixed_setup_converts_hours() {
        let mut operation = op();
        operation.setup_time_fixed = Some(0.25);
        assert_eq!(operation.fixed_setup_min(), Some(15.0));
        operation.setup_time_fixed_min = Some(10.0);
        assert_eq!(operation.fixed_setup_min(), Some(10.0));
    }

    #[test]
    fn test_batch_rule_validation() {
        let mut operation = op();
        operation.batch = Some(BatchRule {
            min_qty: Some(20),
            max_qty: Some(10),
        });
        assert!(operation.validate().is_err());

        operation.batch = Some(BatchRule {
            min_qty: Some(5),
            max_qty: Some(10),
        });
        assert!(operation.validate().is_ok());
    }

    #[test]
    fn test_product_requires_routing() {
        let product = Product {
            id: "P1".to_string(),
            name: "Widget".to_string(),
            routing_ids: vec![],
            lot_size: None,
        };
        assert!(product.validate().is_err());
    }
}
