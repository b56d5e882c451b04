//! Objective evaluator service module
//!
//! Scores a decoded schedule on the weighted KPI sum. An empty schedule
//! gets a sentinel far worse than any feasible one; every skipped batch
//! adds a heavy flat penalty so the search always prefers placing work.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use super::schedule_decoder::DecodeOutcome;
use crate::domain::entities::{Order, ScheduleEntry};
use crate::domain::value_objects::ObjectiveWeights;

/// Flat penalty per skipped batch
const SKIP_PENALTY: f64 = 1e6;

/// Sentinel base for a schedule with no entries at all
const EMPTY_SCHEDULE_PENALTY: f64 = 1e12;

/// Per-skip surcharge on the empty sentinel
const EMPTY_SCHEDULE_SKIP_PENALTY: f64 = 1e9;

/// Scores decoded schedules
pub struct ObjectiveEvaluator<'a> {
    weights: ObjectiveWeights,
    due_by_order: HashMap<&'a str, NaiveDateTime>,
}

impl<'a> ObjectiveEvaluator<'a> {
    /// Creates an evaluator from the objective weights and the orders
    pub fn new(weights: ObjectiveWeights, orders: &[&'a Order]) -> Self {
        Self {
            weights,
            due_by_order: orders.iter().map(|o| (o.id.as_str(), o.due_date)).collect(),
        }
    }

    /// Scores a decode outcome; lower is better
    pub fn evaluate(&self, outcome: &DecodeOutcome) -> f64 {
        let skipped = f64::from(outcome.skipped);
        if outcome.schedule.is_empty() {
            return EMPTY_SCHEDULE_PENALTY + EMPTY_SCHEDULE_SKIP_PENALTY * skipped;
        }

        let span = makespan_min(&outcome.schedule);
        let tardiness = self.total_tardiness_min(&outcome.schedule);
        let setup: f64 = outcome.schedule.iter().map(|e| e.setup_min).sum();
        let splits: u32 = outcome.schedule.iter().map(|e| e.splits).sum();

        self.weights.makespan * span
            + self.weights.tardiness * tardiness
            + self.weights.setup_cost * setup
            + self.weights.preemption_cost * f64::from(splits)
            + SKIP_PENALTY * skipped
    }

    /// Summed positive lateness across orders, in minutes
    ///
    /// An order is late by the distance between its last entry's finish and
    /// its due date.
    pub fn total_tardiness_min(&self, schedule: &[ScheduleEntry]) -> f64 {
        // Ordered map so the float summation order is reproducible
        let mut last_finish: BTreeMap<&str, NaiveDateTime> = BTreeMap::new();
        for entry in schedule {
            last_finish
                .entry(entry.order_id.as_str())
                .and_modify(|finish| *finish = (*finish).max(entry.finish))
                .or_insert(entry.finish);
        }

        let mut total = 0.0;
        for (order_id, finish) in &last_finish {
            if let Some(due) = self.due_by_order.get(order_id) {
                let late_min = (*finish - *due).num_seconds() as f64 / 60.0;
                if late_min > 0.0 {
                    total += late_min;
                }
            }
        }
        total
    }
}

/// Last finish minus first start over a schedule, in minutes
pub fn makespan_min(schedule: &[ScheduleEntry]) -> f64 {
    let first_start = schedule.iter().map(|e| e.start).min();
    let last_finish = schedule.iter().map(|e| e.finish).max();
    match (first_start, last_finish) {
        (Some(start), Some(finish)) => (finish - start).num_seconds() as f64 / 60.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn dt(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn entry(order_id: &str, start: NaiveDateTime, finish: NaiveDateTime) -> ScheduleEntry {
        ScheduleEntry {
            batch_id: "B1".to_string(),
            order_id: order_id.to_string(),
            product_id: "P1".to_string(),
            routing_id: "R1".to_string(),
            op_no: 10,
            operation: "Cut".to_string(),
            qty: 1,
            machine: "M1".to_string(),
            start,
            finish,
            setup_min: 10.0,
            proc_min: 60.0,
            splits: 1,
        }
    }

    fn order(id: &str, due: &str) -> Order {
        serde_json::from_value(json!({"id": id, "due_date": due})).unwrap()
    }

    #[test]
    fn test_empty_schedule_sentinel() {
        let evaluator = ObjectiveEvaluator::new(ObjectiveWeights::default(), &[]);
        let outcome = DecodeOutcome {
            schedule: vec![],
            skipped: 3,
            ..Default::default()
        };
        assert_eq!(evaluator.evaluate(&outcome), 1e12 + 3e9);
    }

    #[test]
    fn test_weighted_sum() {
        let o1 = order("O1", "2025-01-06T09:00:00");
        let evaluator = ObjectiveEvaluator::new(ObjectiveWeights::default(), &[&o1]);
        let outcome = DecodeOutcome {
            schedule: vec![entry("O1", dt(6, 8, 0), dt(6, 10, 0))],
            skipped: 1,
            ..Default::default()
        };
        // span 120, tardiness 60 (due 09:00, finish 10:00), setup 10,
        // splits 1 at weight 0, one skip:
        // 1*120 + 10*60 + 5*10 + 0*1 + 1e6 = 120 + 600 + 50 + 1e6
        assert_eq!(evaluator.evaluate(&outcome), 120.0 + 600.0 + 50.0 + 1e6);
    }

    #[test]
    fn test_tardiness_uses_last_finish_per_order() {
        let o1 = order("O1", "2025-01-06T12:00:00");
        let evaluator = ObjectiveEvaluator::new(ObjectiveWeights::default(), &[&o1]);
        let schedule = vec![
            entry("O1", dt(6, 8, 0), dt(6, 13, 0)),
            entry("O1", dt(6, 8, 0), dt(6, 11, 0)),
        ];
        // Only the 13:00 finish counts: one hour late
        assert_eq!(evaluator.total_tardiness_min(&schedule), 60.0);
    }

    #[test]
    fn test_early_finish_is_not_negative_tardiness() {
        let o1 = order("O1", "2025-01-06T17:00:00");
        let evaluator = ObjectiveEvaluator::new(ObjectiveWeights::default(), &[&o1]);
        let schedule = vec![entry("O1", dt(6, 8, 0), dt(6, 9, 0))];
        assert_eq!(evaluator.total_tardiness_min(&schedule), 0.0);
    }

    #[test]
    fn test_lower_tardiness_scores_better() {
        let o1 = order("O1", "2025-01-06T09:00:00");
        let evaluator = ObjectiveEvaluator::new(ObjectiveWeights::default(), &[&o1]);
        let late = DecodeOutcome {
            schedule: vec![entry("O1", dt(6, 8, 0), dt(6, 12, 0))],
            ..Default::default()
        };
        let punctual = DecodeOutcome {
            schedule: vec![entry("O1", dt(6, 8, 0), dt(6, 9, 0))],
            ..Default::default()
        };
        assert!(evaluator.evaluate(&punctual) < evaluator.evaluate(&late));
    }
}
