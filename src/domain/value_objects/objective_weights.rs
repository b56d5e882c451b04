//! Objective weights value object module
//!
//! Weights for the scalarized scheduling objective. Defaults follow the
//! production tuning: tardiness dominates, setup changes are discouraged,
//! preemption is free unless configured otherwise.

use serde::{Deserialize, Serialize};

/// Weights applied to the schedule KPI terms when computing fitness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    /// Weight on schedule span in minutes
    #[serde(default = "default_makespan")]
    pub makespan: f64,
    /// Weight on summed order tardiness in minutes
    #[serde(default = "default_tardiness")]
    pub tardiness: f64,
    /// Weight on total setup minutes
    #[serde(default = "default_setup_cost")]
    pub setup_cost: f64,
    /// Weight on total preemption split count
    #[serde(default = "default_preemption_cost")]
    pub preemption_cost: f64,
}

fn default_makespan() -> f64 {
    1.0
}

fn default_tardiness() -> f64 {
    10.0
}

fn default_setup_cost() -> f64 {
    5.0
}

fn default_preemption_cost() -> f64 {
    0.0
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            makespan: default_makespan(),
            tardiness: default_tardiness(),
            setup_cost: default_setup_cost(),
            preemption_cost: default_preemption_cost(),
        }
    }
}
