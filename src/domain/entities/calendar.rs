//! Calendar entity module
//!
//! The working-time calendar: holidays, per-machine maintenance windows,
//! declared overtime windows with an optional daily cap, and global breaks.
//! The calendar compiler turns this plus the shift definitions into
//! per-machine typed availability windows.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::shift::BreakSpec;
use crate::domain::value_objects::interval::Interval;
use crate::domain::value_objects::timestamp::de_datetime;

/// A planned machine downtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintenance {
    /// Machine taken down
    pub machine_id: String,
    /// Downtime start
    #[serde(deserialize_with = "de_datetime")]
    pub start: NaiveDateTime,
    /// Downtime end
    #[serde(deserialize_with = "de_datetime")]
    pub end: NaiveDateTime,
}

/// A declared overtime interval, open to all machines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeWindow {
    /// Overtime start
    #[serde(deserialize_with = "de_datetime")]
    pub start: NaiveDateTime,
    /// Overtime end
    #[serde(deserialize_with = "de_datetime")]
    pub end: NaiveDateTime,
}

/// Working-time exceptions layered over the shift patterns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    /// Full-day closures
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    /// Per-machine downtimes
    #[serde(default)]
    pub machine_maintenances: Vec<Maintenance>,
    /// Overtime intervals available on top of regular shifts
    #[serde(default)]
    pub ot_windows: Vec<OvertimeWindow>,
    /// Daily overtime budget per machine, in hours
    #[serde(default)]
    pub ot_cap_hours_per_day: Option<f64>,
    /// Breaks applied to every shift of every machine
    #[serde(default)]
    pub breaks: Vec<BreakSpec>,
}

/// Availability window kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowKind {
    /// Regular shift time
    #[serde(rename = "REG")]
    Regular,
    /// Overtime, counted against the daily cap
    #[serde(rename = "OT")]
    Overtime,
}

/// A compiled per-machine availability window, half-open `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub kind: WindowKind,
}

impl Window {
    /// Creates a window over an interval
    pub fn new(interval: Interval, kind: WindowKind) -> Self {
        Self {
            start: interval.start,
            end: interval.end,
            kind,
        }
    }

    /// The window as a plain interval
    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    /// Window length in fractional minutes
    pub fn duration_min(&self) -> f64 {
        self.interval().duration_min()
    }
}
