//! Setup matrix entity module
//!
//! A setup matrix maps `previous state -> next state -> minutes` for a
//! machine changing tools, materials or colors. Missing cells fall through
//! the resolution chain handled by the cost oracle.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Minutes needed to transition a machine between setup states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupMatrix {
    /// Unique matrix identifier
    pub id: String,
    /// `prev_state -> next_state -> minutes`
    #[serde(default)]
    pub matrix: HashMap<String, HashMap<String, f64>>,
}

impl SetupMatrix {
    /// Looks up the transition cost for a state pair
    ///
    /// # Arguments
    ///
    /// * `prev` - State the machine is currently in
    /// * `next` - State the operation requires
    ///
    /// # Returns
    ///
    /// The cell minutes, or None when the cell is absent
    pub fn minutes(&self, prev: &str, next: &str) -> Option<f64> {
        self.matrix.get(prev).and_then(|row| row.get(next)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_hit_and_miss() {
        let matrix: SetupMatrix = serde_json::from_value(json!({
            "id": "SM1",
            "matrix": {
                "clean": {"MAT_A": 8.0},
                "MAT_A": {"MAT_B": 12.0},
            },
        }))
        .unwrap();
        assert_eq!(matrix.minutes("clean", "MAT_A"), Some(8.0));
        assert_eq!(matrix.minutes("MAT_A", "MAT_B"), Some(12.0));
        assert_eq!(matrix.minutes("MAT_B", "clean"), None);
    }
}
