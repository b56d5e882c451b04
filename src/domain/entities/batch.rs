//! Batch entity module
//!
//! A batch is a producible chunk of one order line, sized by lot rules.
//! Batches are generated once from the orders and immutable thereafter;
//! chromosomes permute indices into the shared batch table.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The atomic unit the scheduler routes through operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Deterministic identifier, `B<order digits><line><seq>`
    pub batch_id: String,
    /// Order this batch fulfils
    pub order_id: String,
    /// Product manufactured by this batch
    pub product_id: String,
    /// Units in this batch
    pub qty: u32,
    /// Priority inherited from the line or order
    pub priority: i32,
    /// Due date inherited from the order
    pub due_date: NaiveDateTime,
    /// Earliest start inherited from the order
    pub release_date: NaiveDateTime,
}
