//! Speed override entity module
//!
//! Overrides divide the computed processing minutes for a machine running
//! a specific operation, optionally narrowed to one product. Overrides are
//! applied in list order; a non-positive multiplier is ignored.

use serde::{Deserialize, Serialize};

/// A processing-speed multiplier for a machine/operation pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedOverride {
    /// Machine the override applies to
    pub machine_id: String,
    /// Product the override is narrowed to; None matches every product
    #[serde(default)]
    pub product_id: Option<String>,
    /// Operation name the override applies to
    pub operation: String,
    /// Divisor applied to the processing minutes
    pub multiplier: f64,
}

impl SpeedOverride {
    /// Checks whether the override matches a machine/product/operation
    pub fn matches(&self, machine_id: &str, product_id: &str, operation: &str) -> bool {
        if self.machine_id != machine_id || self.operation != operation {
            return false;
        }
        match &self.product_id {
            Some(scoped) => scoped == product_id,
            None => true,
        }
    }
}
