//! Window packer service module
//!
//! Places a single operation on one machine's availability windows.
//! Contiguous mode needs one window long enough for setup plus run; packed
//! mode places the setup inside a single window, then spreads the run
//! across later windows, charging a preemption overhead per spill. Both
//! modes refuse placements that would blow the daily overtime cap.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::domain::entities::{Window, WindowKind};
use crate::domain::value_objects::interval::Interval;
use crate::domain::value_objects::timestamp::minutes_to_duration;

/// Slack on overtime cap comparisons, in minutes
const OT_CAP_TOLERANCE_MIN: f64 = 1e-9;

/// Why a placement attempt failed on this machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitFailure {
    /// No window at all remains at or after the earliest start
    NoWindowAfterEarliest,
    /// No single window was long enough
    NoContiguousWindow,
    /// Every otherwise feasible placement exceeded the daily OT cap
    OtCapHit,
    /// The run time could not be consumed before windows ran out
    CannotPackAcross,
}

/// A feasible placement of one operation
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Placement start; setup begins here
    pub start: NaiveDateTime,
    /// Placement finish, including preemption overhead
    pub finish: NaiveDateTime,
    /// Total preemption overhead charged
    pub overhead_min: f64,
    /// Number of window-to-window spills
    pub splits: u32,
    /// Setup and run time actually occupying windows
    pub work_slabs: Vec<Interval>,
    /// Overtime minutes this placement consumes, per calendar day
    pub ot_minutes_by_day: BTreeMap<NaiveDate, f64>,
}

/// Places operations onto one machine's compiled windows
pub struct WindowPacker<'a> {
    windows: &'a [Window],
    ot_cap_min: Option<f64>,
}

impl<'a> WindowPacker<'a> {
    /// Creates a packer over a machine's sorted windows
    ///
    /// # Arguments
    ///
    /// * `windows` - The machine's availability windows, sorted and disjoint
    /// * `ot_cap_hours_per_day` - Daily overtime budget, if any
    pub fn new(windows: &'a [Window], ot_cap_hours_per_day: Option<f64>) -> Self {
        Self {
            windows,
            ot_cap_min: ot_cap_hours_per_day.map(|hours| hours * 60.0),
        }
    }

    /// Contiguous placement: setup and run inside a single window
    ///
    /// Scans windows in order and returns the first slot of
    /// `setup_min + proc_min` minutes starting no earlier than `earliest`
    /// that fits inside one window and respects the OT cap.
    pub fn place_contiguous(
        &self,
        earliest: NaiveDateTime,
        setup_min: f64,
        proc_min: f64,
        ot_used_by_day: &BTreeMap<NaiveDate, f64>,
    ) -> Result<Placement, FitFailure> {
        let need = minutes_to_duration(setup_min + proc_min);
        let mut saw_window = false;
        let mut saw_cap_block = false;

        for window in self.windows.iter().filter(|w| w.end > earliest) {
            saw_window = true;
            let start = window.start.max(earliest);
            if window.end - start < need {
                continue;
            }
            let slab = Interval::new(start, start + need);
            match self.ot_fit(&[slab], ot_used_by_day) {
                Ok(ot_minutes_by_day) => {
                    return Ok(Placement {
                        start,
                        finish: slab.end,
                        overhead_min: 0.0,
                        splits: 0,
                        work_slabs: vec![slab],
                        ot_minutes_by_day,
                    });
                }
                Err(()) => {
                    saw_cap_block = true;
                    continue;
                }
            }
        }

        if saw_cap_block {
            Err(FitFailure::OtCapHit)
        } else if saw_window {
            Err(FitFailure::NoContiguousWindow)
        } else {
            Err(FitFailure::NoWindowAfterEarliest)
        }
    }

    /// Packed placement: setup in one window, run spread across windows
    ///
    /// The setup must fit entirely inside one window; shorter windows are
    /// skipped until one does. The remaining run time then consumes later
    /// windows in order. Every spill into a further window adds
    /// `overhead_min` to the total duration and one split. The finish is
    /// the end of the last work slab plus the accumulated overhead.
    pub fn place_packed(
        &self,
        earliest: NaiveDateTime,
        setup_min: f64,
        proc_min: f64,
        overhead_min: f64,
        ot_used_by_day: &BTreeMap<NaiveDate, f64>,
    ) -> Result<Placement, FitFailure> {
        let setup = minutes_to_duration(setup_min);
        let mut saw_window = false;
        let mut saw_cap_block = false;

        for (anchor, window) in self
            .windows
            .iter()
            .enumerate()
            .filter(|(_, w)| w.end > earliest)
        {
            saw_window = true;
            let start = window.start.max(earliest);
            if window.end - start < setup {
                continue;
            }

            let mut remaining = minutes_to_duration(proc_min);
            let mut slabs = Vec::new();
            let mut splits = 0u32;

            let first_end = window.end.min(start + setup + remaining);
            slabs.push(Interval::new(start, first_end));
            remaining = remaining - (first_end - (start + setup));

            let mut exhausted = false;
            for later in &self.windows[anchor + 1..] {
                if remaining <= Duration::zero() {
                    break;
                }
                let take = (later.end - later.start).min(remaining);
                splits += 1;
                slabs.push(Interval::new(later.start, later.start + take));
                remaining = remaining - take;
            }
            if remaining > Duration::zero() {
                exhausted = true;
            }
            if exhausted {
                // Later anchors only see a subset of these windows, so no
                // retry can succeed either
                if saw_cap_block {
                    return Err(FitFailure::OtCapHit);
                }
                return Err(FitFailure::CannotPackAcross);
            }

            match self.ot_fit(&slabs, ot_used_by_day) {
                Ok(ot_minutes_by_day) => {
                    let overhead_total = overhead_min * f64::from(splits);
                    let last_end = slabs.last().map(|s| s.end).unwrap_or(start);
                    return Ok(Placement {
                        start,
                        finish: last_end + minutes_to_duration(overhead_total),
                        overhead_min: overhead_total,
                        splits,
                        work_slabs: slabs,
                        ot_minutes_by_day,
                    });
                }
                Err(()) => {
                    saw_cap_block = true;
                    continue;
                }
            }
        }

        if saw_cap_block {
            Err(FitFailure::OtCapHit)
        } else if saw_window {
            Err(FitFailure::CannotPackAcross)
        } else {
            Err(FitFailure::NoWindowAfterEarliest)
        }
    }

    /// Overtime minutes of the slabs per day, checked against the cap
    fn ot_fit(
        &self,
        slabs: &[Interval],
        ot_used_by_day: &BTreeMap<NaiveDate, f64>,
    ) -> Result<BTreeMap<NaiveDate, f64>, ()> {
        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for slab in slabs {
            for window in self.windows.iter().filter(|w| w.kind == WindowKind::Overtime) {
                if let Some(overlap) = slab.intersection(&window.interval()) {
                    for (day, piece) in overlap.split_by_day() {
                        *by_day.entry(day).or_insert(0.0) += piece.duration_min();
                    }
                }
            }
        }

        if let Some(cap_min) = self.ot_cap_min {
            for (day, minutes) in &by_day {
                let already = ot_used_by_day.get(day).copied().unwrap_or(0.0);
                if already + minutes > cap_min + OT_CAP_TOLERANCE_MIN {
                    return Err(());
                }
            }
        }
        Ok(by_day)
    }
}
