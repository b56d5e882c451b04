//! Work center entity module
//!
//! A work center groups parallel, interchangeable machines and carries
//! setup and operator defaults that machines and operations may inherit.

use serde::{Deserialize, Serialize};

/// A group of interchangeable machines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCenter {
    /// Unique work center identifier
    pub id: String,
    /// Machines belonging to this work center
    #[serde(default)]
    pub parallel_machines: Vec<String>,
    /// Setup matrix used when neither machine nor operation names one
    #[serde(default)]
    pub setup_matrix_id: Option<String>,
    /// Fallback setup minutes when no matrix cell or fixed time applies
    #[serde(default)]
    pub default_setup_min: Option<f64>,
    /// Default operator requirement for setup, inherited by operations
    #[serde(default)]
    pub setup_requires_operator: Option<bool>,
    /// Default operator requirement for running, inherited by operations
    #[serde(default)]
    pub run_requires_operator: Option<bool>,
}
