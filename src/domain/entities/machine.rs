//! Machine entity module
//!
//! A machine belongs to exactly one work center, runs during its assigned
//! shifts and carries a tool/material state that setup matrices transition.

use serde::{Deserialize, Serialize};

fn default_state() -> String {
    "clean".to_string()
}

fn default_efficiency() -> f64 {
    1.0
}

/// A single machine of the fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    /// Unique machine identifier
    pub id: String,
    /// Work center this machine belongs to
    pub work_center_id: String,
    /// State the machine starts the horizon in
    #[serde(default = "default_state")]
    pub initial_state: String,
    /// Speed factor; below 1.0 slows processing down, above speeds it up.
    /// Non-positive values are treated as 1.0.
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    /// Shift ids defining when the machine is available; empty means 24/7
    #[serde(default)]
    pub shifts: Vec<String>,
    /// Setup matrix override, consulted before the operation and work center
    #[serde(default)]
    pub setup_matrix_id: Option<String>,
    /// Fallback setup minutes when no matrix cell or fixed time applies
    #[serde(default)]
    pub default_setup_min: Option<f64>,
    /// Operator requirement while running; `requires_operator_for_run` is
    /// the legacy key for the same field
    #[serde(default, alias = "requires_operator_for_run")]
    pub run_requires_operator: Option<bool>,
    /// Operator requirement during setup
    #[serde(default)]
    pub setup_requires_operator: Option<bool>,
}

impl Machine {
    /// Efficiency with non-positive values normalized to 1.0
    pub fn effective_efficiency(&self) -> f64 {
        if self.efficiency > 0.0 {
            self.efficiency
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let m: Machine =
            serde_json::from_value(json!({"id": "M1", "work_center_id": "WC_CUT"})).unwrap();
        assert_eq!(m.initial_state, "clean");
        assert_eq!(m.efficiency, 1.0);
        assert!(m.shifts.is_empty());
    }

    #[test]
    fn test_run_operator_alias() {
        let m: Machine = serde_json::from_value(json!({
            "id": "M1",
            "work_center_id": "WC_CUT",
            "requires_operator_for_run": true,
        }))
        .unwrap();
        assert_eq!(m.run_requires_operator, Some(true));
    }

    #[test]
    fn test_effective_efficiency_clamps_non_positive() {
        let mut m: Machine =
            serde_json::from_value(json!({"id": "M1", "work_center_id": "WC_CUT"})).unwrap();
        m.efficiency = 0.0;
        assert_eq!(m.effective_efficiency(), 1.0);
        m.efficiency = -2.0;
        assert_eq!(m.effective_efficiency(), 1.0);
        m.efficiency = 0.5;
        assert_eq!(m.effective_efficiency(), 0.5);
    }
}
