//! Fail reason value object module
//!
//! Typed placement-failure reasons and the ordered counter map surfaced in
//! the KPIs. Infeasibility is data, never an error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Why an operation could not be placed on any machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FailReason {
    /// The operation's work center lists no machines
    NoMachineInWorkCenter,
    /// No window at all remains after the earliest start
    NoWindowAfterEarliest,
    /// Every placement would exceed the daily overtime cap
    OtCapHit,
    /// No single window was long enough for a contiguous placement
    NoContiguousWindow,
    /// Packing ran out of windows before consuming the run time
    CannotPackAcross,
    /// Placement failed for a reason the packer could not classify
    UnknownFitFail,
}

impl FailReason {
    /// Stable wire name used in KPI maps
    pub fn as_str(&self) -> &'static str {
        match self {
            FailReason::NoMachineInWorkCenter => "no_machine_in_wc",
            FailReason::NoWindowAfterEarliest => "no_window_after_est",
            FailReason::OtCapHit => "ot_cap_hit",
            FailReason::NoContiguousWindow => "no_contiguous_window",
            FailReason::CannotPackAcross => "cannot_pack_across",
            FailReason::UnknownFitFail => "unknown_fit_fail",
        }
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered reason -> count map accumulated across a decode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailStats(BTreeMap<FailReason, u32>);

impl FailStats {
    /// Creates an empty counter map
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for a reason
    pub fn record(&mut self, reason: FailReason) {
        *self.0.entry(reason).or_insert(0) += 1;
    }

    /// Folds another counter map into this one
    pub fn absorb(&mut self, other: &FailStats) {
        for (reason, count) in &other.0 {
            *self.0.entry(*reason).or_insert(0) += count;
        }
    }

    /// Count recorded for a reason
    pub fn count(&self, reason: FailReason) -> u32 {
        self.0.get(&reason).copied().unwrap_or(0)
    }

    /// Total count across all reasons
    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    /// Renders the map with stable wire names, for KPI output
    pub fn by_name(&self) -> BTreeMap<String, u32> {
        self.0
            .iter()
            .map(|(reason, count)| (reason.as_str().to_string(), *count))
            .collect()
    }
}
