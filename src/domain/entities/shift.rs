//! Shift entity module
//!
//! Shifts are daily working windows expressed as HH:MM strings; an end at
//! or before the start crosses midnight, and "24:00" is accepted as the
//! midnight of the next day. Times stay as strings on the entity and are
//! interpreted by the calendar compiler, which skips unparseable shifts
//! with a diagnostic.

use serde::{Deserialize, Serialize};

/// A break inside a shift or the global calendar, as HH:MM strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakSpec {
    /// Break start time of day
    pub start: String,
    /// Break end time of day
    pub end: String,
}

/// A daily working window pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Unique shift identifier
    pub id: String,
    /// Shift start time of day, e.g. "08:00"
    pub start_time: String,
    /// Shift end time of day; at or before start means next day
    pub end_time: String,
    /// Breaks subtracted from every materialized day
    #[serde(default)]
    pub breaks: Vec<BreakSpec>,
}
