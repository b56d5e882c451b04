//! Calendar compiler service module
//!
//! Compiles shifts, holidays, breaks, maintenance and declared overtime
//! into per-machine typed availability windows over a planning horizon.
//! Everything here routes through the interval algebra primitives.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::warn;

use crate::domain::entities::{Catalog, CatalogIndex, Shift, Window, WindowKind};
use crate::domain::error::PlanningError;
use crate::domain::value_objects::interval::{merge, subtract, Interval};
use crate::domain::value_objects::timestamp::{at_minute_of_day, parse_hhmm};

/// Compiles the working-time calendar into per-machine windows
pub struct CalendarCompiler<'a> {
    catalog: &'a Catalog,
    index: &'a CatalogIndex<'a>,
}

impl<'a> CalendarCompiler<'a> {
    /// Creates a compiler over a catalog and its index
    pub fn new(catalog: &'a Catalog, index: &'a CatalogIndex<'a>) -> Self {
        Self { catalog, index }
    }

    /// Compiles availability windows for every machine
    ///
    /// # Arguments
    ///
    /// * `day0` - First day of the planning horizon
    /// * `horizon_days` - Number of days to materialize
    ///
    /// # Returns
    ///
    /// Sorted, disjoint REG and OT windows per machine id. REG and OT never
    /// overlap: declared overtime is clipped against the regular windows.
    pub fn compile(&self, day0: NaiveDate, horizon_days: i64) -> HashMap<String, Vec<Window>> {
        let horizon = Interval::new(
            day0.and_time(NaiveTime::MIN),
            (day0 + Duration::days(horizon_days)).and_time(NaiveTime::MIN),
        );

        let shift_windows = self.materialize_shifts(day0, horizon_days);
        let holiday_blocks = self.holiday_blocks();

        let mut windows_by_machine = HashMap::new();
        for machine in &self.catalog.machines {
            // Union of the machine's shifts; no shifts means 24/7
            let mut regular = if machine.shifts.is_empty() {
                vec![horizon]
            } else {
                let mut union = Vec::new();
                for shift_id in &machine.shifts {
                    match shift_windows.get(shift_id.as_str()) {
                        Some(windows) => union.extend_from_slice(windows),
                        None => warn!(machine = %machine.id, shift = %shift_id, "unknown shift; skipping"),
                    }
                }
                merge(&union)
            };

            regular = subtract(&regular, &holiday_blocks);

            let maintenance: Vec<Interval> = self
                .catalog
                .calendar
                .machine_maintenances
                .iter()
                .filter(|m| m.machine_id == machine.id)
                .map(|m| Interval::new(m.start, m.end))
                .collect();
            regular = subtract(&regular, &maintenance);

            let mut windows: Vec<Window> = regular
                .iter()
                .map(|iv| Window::new(*iv, WindowKind::Regular))
                .collect();

            // Declared overtime is clipped to whatever regular time does not
            // already cover, then tagged
            for ot in &self.catalog.calendar.ot_windows {
                let declared = Interval::new(ot.start, ot.end);
                for free in subtract(&[declared], &regular) {
                    windows.push(Window::new(free, WindowKind::Overtime));
                }
            }

            windows.sort_by_key(|w| w.start);
            windows_by_machine.insert(machine.id.clone(), windows);
        }
        windows_by_machine
    }

    /// Materializes every shift into per-day intervals minus breaks
    fn materialize_shifts(&self, day0: NaiveDate, horizon_days: i64) -> HashMap<&'a str, Vec<Interval>> {
        let mut by_shift = HashMap::new();
        for (shift_id, shift) in &self.index.shifts {
            match self.materialize_shift(shift, day0, horizon_days) {
                Ok(windows) => {
                    by_shift.insert(*shift_id, windows);
                }
                Err(err) => warn!(shift = %shift_id, %err, "invalid shift times; skipping shift"),
            }
        }
        by_shift
    }

    fn materialize_shift(
        &self,
        shift: &Shift,
        day0: NaiveDate,
        horizon_days: i64,
    ) -> Result<Vec<Interval>, PlanningError> {
        let start_min = parse_hhmm(&shift.start_time)?;
        let end_min = parse_hhmm(&shift.end_time)?;

        let mut break_specs = Vec::new();
        for rule in shift.breaks.iter().chain(self.catalog.calendar.breaks.iter()) {
            break_specs.push((parse_hhmm(&rule.start)?, parse_hhmm(&rule.end)?));
        }

        let mut days = Vec::new();
        for offset in 0..horizon_days {
            let day = day0 + Duration::days(offset);
            let start = at_minute_of_day(day, start_min);
            // End at or before start rolls to the next day
            let end = if end_min <= start_min {
                at_minute_of_day(day + Duration::days(1), end_min)
            } else {
                at_minute_of_day(day, end_min)
            };
            let window = Interval::new(start, end);

            let mut breaks = Vec::new();
            for &(break_start, break_end) in &break_specs {
                // Anchor each break on both candidate days so breaks inside
                // a midnight-crossing shift are caught
                for anchor in [day, day + Duration::days(1)] {
                    let bs = at_minute_of_day(anchor, break_start);
                    let be = if break_end <= break_start {
                        at_minute_of_day(anchor + Duration::days(1), break_end)
                    } else {
                        at_minute_of_day(anchor, break_end)
                    };
                    breaks.push(Interval::new(bs, be));
                }
            }

            days.extend(subtract(&[window], &breaks));
        }
        Ok(merge(&days))
    }

    fn holiday_blocks(&self) -> Vec<Interval> {
        let blocks: Vec<Interval> = self
            .catalog
            .calendar
            .holidays
            .iter()
            .map(|day| {
                Interval::new(
                    day.and_time(NaiveTime::MIN),
                    (*day + Duration::days(1)).and_time(NaiveTime::MIN),
                )
            })
            .collect();
        merge(&blocks)
    }
}
