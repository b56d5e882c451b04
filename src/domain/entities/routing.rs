//! Routing entity module
//!
//! A routing is an ordered sequence of operations. Operations execute
//! strictly in `op_no` order: operation i+1 cannot start before operation i
//! finishes.

use serde::{Deserialize, Serialize};

use super::product::Operation;

/// An ordered list of operations producing a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routing {
    /// Unique routing identifier
    pub id: String,
    /// Operations of the routing; ordered by `op_no` when iterated
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Routing {
    /// Returns the operations sorted by `op_no`
    ///
    /// The catalog does not require the serialized order to match the
    /// execution order, so consumers iterate through this accessor.
    pub fn operations_in_order(&self) -> Vec<&Operation> {
        let mut ordered: Vec<&Operation> = self.operations.iter().collect();
        ordered.sort_by_key(|op| op.op_no);
        ordered
    }

    /// Checks whether any operation carries the given name
    pub fn has_operation_named(&self, name: &str) -> bool {
        self.operations.iter().any(|op| op.name == name)
    }

    /// First batchable operation in execution order, if any
    pub fn first_batchable_operation(&self) -> Option<&Operation> {
        self.operations_in_order()
            .into_iter()
            .find(|op| op.batchable)
    }
}
