//! Schedule entity module
//!
//! The decoder's output: one entry per placed operation, plus the KPI
//! block summarizing a solve.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One placed operation of one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Batch this entry belongs to
    pub batch_id: String,
    /// Order the batch fulfils
    pub order_id: String,
    /// Product manufactured
    pub product_id: String,
    /// Routing chosen for the batch
    pub routing_id: String,
    /// Operation number inside the routing
    pub op_no: u32,
    /// Operation name
    pub operation: String,
    /// Units processed
    pub qty: u32,
    /// Machine the operation runs on
    pub machine: String,
    /// Placement start (setup begins here)
    pub start: NaiveDateTime,
    /// Placement finish, including any preemption overhead
    pub finish: NaiveDateTime,
    /// Setup minutes charged
    pub setup_min: f64,
    /// Processing minutes charged
    pub proc_min: f64,
    /// Window-to-window spills of a packed placement
    pub splits: u32,
}

/// Key performance indicators of a solved schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Last finish minus first start, in minutes
    pub makespan_min: f64,
    /// Summed setup minutes across all entries
    pub total_setup_min: f64,
    /// Summed positive lateness across orders, in minutes
    pub total_tardiness_min: f64,
    /// Summed preemption splits across all entries
    pub total_splits: u32,
    /// Batches the decoder could not place
    pub skipped: u32,
    /// Busy minutes over available window minutes per machine, in [0, 1]
    pub machine_utilization: BTreeMap<String, f64>,
    /// Placement failure counters by reason
    pub fail_stats: BTreeMap<String, u32>,
}
