//! Solve schedule use case module
//!
//! Orchestrates a full solve: validate the catalog, build batches, compile
//! calendars, run the genetic search plus local refinement, and retry at a
//! larger horizon while batches remain unplaced. Returns the schedule and
//! its KPI block; infeasibility is reported in the KPIs, never thrown.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::application::services::batch_builder::BatchBuilder;
use crate::application::services::calendar_compiler::CalendarCompiler;
use crate::application::services::genetic_optimizer::{GaOutcome, GeneticOptimizer};
use crate::application::services::local_search::LocalSearch;
use crate::application::services::objective_evaluator::{makespan_min, ObjectiveEvaluator};
use crate::application::services::schedule_decoder::ScheduleDecoder;
use crate::domain::entities::{Batch, Catalog, CatalogIndex, Kpis, ScheduleEntry, Window};

/// Extra horizon days tried while batches remain unplaced
const HORIZON_EXTENSIONS: [i64; 3] = [0, 7, 14];

/// Result of a full solve
#[derive(Debug, Clone, Serialize)]
pub struct SolveResult {
    /// Placed operations in insertion order
    pub schedule: Vec<ScheduleEntry>,
    /// KPI block of the chosen decode
    pub kpis: Kpis,
    /// Objective value of the chosen decode
    pub objective: f64,
    /// Batches generated from the orders; zero flags a degenerate input
    pub batch_count: usize,
}

/// One horizon attempt kept for the final comparison
struct Attempt {
    refined: GaOutcome,
    makespan: f64,
    tardiness: f64,
    utilization: BTreeMap<String, f64>,
}

/// Use case running the whole scheduling pipeline
pub struct SolveScheduleUseCase;

impl SolveScheduleUseCase {
    /// Creates the use case
    pub fn new() -> Self {
        Self
    }

    /// Solves the scheduling problem described by the catalog
    ///
    /// Deterministic for a fixed catalog (including the master seed):
    /// repeated calls return byte-identical results.
    pub fn execute(&self, catalog: &Catalog) -> SolveResult {
        for finding in catalog.validate() {
            warn!(%finding, "catalog validation finding");
        }

        let index = CatalogIndex::new(catalog);
        let batches = BatchBuilder::new(catalog, &index).build();
        if batches.is_empty() {
            error!("no batches could be built from the orders; nothing to schedule");
            return SolveResult {
                schedule: Vec::new(),
                kpis: Kpis::default(),
                objective: 0.0,
                batch_count: 0,
            };
        }
        info!(batches = batches.len(), "batch table built");

        let day0 = batches
            .iter()
            .map(|b| b.release_date)
            .min()
            .map(|dt| dt.date())
            .unwrap_or_default();
        let base_days = base_horizon_days(&batches, day0);

        let orders = catalog.all_orders();
        let evaluator = ObjectiveEvaluator::new(catalog.settings.objective_weights, &orders);

        let mut attempts: Vec<Attempt> = Vec::new();
        for extra in HORIZON_EXTENSIONS {
            let horizon_days = base_days + extra;
            let windows = CalendarCompiler::new(catalog, &index).compile(day0, horizon_days);
            let decoder = ScheduleDecoder::new(catalog, &index, &windows, &batches);
            let ga = GeneticOptimizer::new(&decoder, &evaluator, &catalog.settings.ga);
            let search = LocalSearch::new(&decoder, &evaluator, &catalog.settings.local_search);

            // Each attempt reseeds from the master seed so adding horizon
            // retries never perturbs an earlier attempt's outcome
            let mut rng = StdRng::seed_from_u64(catalog.settings.ga.seed);
            let refined = search.refine(ga.run(&mut rng), &mut rng);

            let skipped = refined.decode.skipped;
            let makespan = makespan_min(&refined.decode.schedule);
            info!(horizon_days, skipped, makespan, "horizon attempt complete");

            attempts.push(Attempt {
                makespan,
                tardiness: evaluator.total_tardiness_min(&refined.decode.schedule),
                utilization: machine_utilization(&refined.decode.schedule, &windows),
                refined,
            });
            if skipped == 0 {
                break;
            }
        }

        // Lexicographically smallest (skipped, makespan); ties keep the
        // shortest horizon
        let mut chosen: Option<Attempt> = None;
        for attempt in attempts {
            let better = chosen
                .as_ref()
                .map(|cur| {
                    (attempt.refined.decode.skipped, attempt.makespan)
                        < (cur.refined.decode.skipped, cur.makespan)
                })
                .unwrap_or(true);
            if better {
                chosen = Some(attempt);
            }
        }
        let chosen = chosen.expect("HORIZON_EXTENSIONS is non-empty");

        let decode = chosen.refined.decode;
        let kpis = Kpis {
            makespan_min: chosen.makespan,
            total_setup_min: decode.schedule.iter().map(|e| e.setup_min).sum(),
            total_tardiness_min: chosen.tardiness,
            total_splits: decode.schedule.iter().map(|e| e.splits).sum(),
            skipped: decode.skipped,
            machine_utilization: chosen.utilization,
            fail_stats: decode.fail_stats.by_name(),
        };
        info!(
            makespan = kpis.makespan_min,
            tardiness = kpis.total_tardiness_min,
            skipped = kpis.skipped,
            "solve complete"
        );

        SolveResult {
            schedule: decode.schedule,
            kpis,
            objective: chosen.refined.objective,
            batch_count: batches.len(),
        }
    }
}

impl Default for SolveScheduleUseCase {
    fn default() -> Self {
        Self::new()
    }
}

/// Base horizon: the order span plus slack, clamped to one week minimum
/// and sixty days maximum
fn base_horizon_days(batches: &[Batch], day0: NaiveDate) -> i64 {
    let span_days = batches
        .iter()
        .map(|b| b.due_date.date())
        .max()
        .map(|due| (due - day0).num_days())
        .unwrap_or(0);
    (span_days + 3).clamp(7, 60)
}

/// Busy minutes over available window minutes per machine
fn machine_utilization(
    schedule: &[ScheduleEntry],
    windows_by_machine: &std::collections::HashMap<String, Vec<Window>>,
) -> BTreeMap<String, f64> {
    let mut busy: BTreeMap<&str, f64> = BTreeMap::new();
    for entry in schedule {
        *busy.entry(entry.machine.as_str()).or_insert(0.0) +=
            (entry.finish - entry.start).num_seconds() as f64 / 60.0;
    }

    let mut utilization = BTreeMap::new();
    for (machine, windows) in windows_by_machine {
        let available: f64 = windows.iter().map(Window::duration_min).sum();
        let used = busy.get(machine.as_str()).copied().unwrap_or(0.0);
        let ratio = if available > 0.0 {
            (used / available).clamp(0.0, 1.0)
        } else {
            0.0
        };
        utilization.insert(machine.clone(), ratio);
    }
    utilization
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use serde_json::json;

    fn dt(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn solve(value: serde_json::Value) -> SolveResult {
        let catalog = Catalog::from_json_value(value).unwrap();
        SolveScheduleUseCase::new().execute(&catalog)
    }

    fn cut_shop(machines: serde_json::Value, orders: serde_json::Value) -> serde_json::Value {
        json!({
            "products": [{"id": "P", "name": "Widget", "routing_ids": ["R1"]}],
            "routings": [{"id": "R1", "operations": [
                {"op_no": 10, "name": "Cut", "work_center_id": "WC_CUT",
                 "proc_time_per_unit_min": 6.0, "setup_time_fixed_min": 10.0},
            ]}],
            "work_centers": [{"id": "WC_CUT"}],
            "machines": machines,
            "shifts": [{"id": "DAY", "start_time": "08:00", "end_time": "17:00"}],
            "orders": orders,
            "settings": {"ga": {"pop_size": 6, "generations": 4}},
        })
    }

    #[test]
    fn test_single_order_single_op() {
        // Ten units at 6 min/unit plus 10 min setup: 08:00 to 09:10
        let result = solve(cut_shop(
            json!([
                {"id": "M1", "work_center_id": "WC_CUT", "shifts": ["DAY"]},
                {"id": "M2", "work_center_id": "WC_CUT", "shifts": ["DAY"]},
            ]),
            json!([{"id": "O1", "due_date": "2025-01-06T17:00:00",
                    "release_date": "2025-01-06T08:00:00",
                    "product_id": "P", "quantity": 10}]),
        ));
        assert_eq!(result.batch_count, 1);
        assert_eq!(result.schedule.len(), 1);
        let entry = &result.schedule[0];
        assert!(entry.machine == "M1" || entry.machine == "M2");
        assert_eq!(entry.start, dt(6, 8, 0));
        assert_eq!(entry.finish, dt(6, 9, 10));
        assert_eq!(entry.setup_min, 10.0);
        assert_eq!(entry.proc_min, 60.0);
        assert_eq!(result.kpis.total_tardiness_min, 0.0);
        assert_eq!(result.kpis.makespan_min, 70.0);
        assert_eq!(result.kpis.skipped, 0);
    }

    #[test]
    fn test_two_orders_share_one_machine() {
        let result = solve(cut_shop(
            json!([{"id": "M1", "work_center_id": "WC_CUT", "shifts": ["DAY"]}]),
            json!([
                {"id": "O1", "due_date": "2025-01-06T17:00:00",
                 "release_date": "2025-01-06T08:00:00", "product_id": "P", "quantity": 10},
                {"id": "O2", "due_date": "2025-01-06T17:00:00",
                 "release_date": "2025-01-06T08:00:00", "product_id": "P", "quantity": 10},
            ]),
        ));
        assert_eq!(result.schedule.len(), 2);
        let mut finishes: Vec<NaiveDateTime> = result.schedule.iter().map(|e| e.finish).collect();
        finishes.sort();
        assert_eq!(finishes, vec![dt(6, 9, 10), dt(6, 10, 20)]);
        assert_eq!(result.kpis.skipped, 0);
    }

    #[test]
    fn test_preemptable_op_splits_across_break() {
        let result = solve(json!({
            "products": [{"id": "P", "routing_ids": ["R1"]}],
            "routings": [{"id": "R1", "operations": [
                {"op_no": 10, "name": "Mill", "work_center_id": "WC",
                 "proc_time_per_unit_min": 30.0, "setup_time_fixed_min": 10.0,
                 "preemptable": true, "preemption_overhead_min": 2.0},
            ]}],
            "work_centers": [{"id": "WC"}],
            "machines": [{"id": "M1", "work_center_id": "WC", "shifts": ["DAY"]}],
            "shifts": [{"id": "DAY", "start_time": "08:00", "end_time": "17:00",
                        "breaks": [{"start": "12:00", "end": "13:00"}]}],
            "orders": [{"id": "O1", "due_date": "2025-01-07",
                        "release_date": "2025-01-06T08:00:00",
                        "product_id": "P", "quantity": 10}],
            "settings": {"ga": {"pop_size": 4, "generations": 2}},
        }));
        let entry = &result.schedule[0];
        // Work ends 14:10, the single spill adds two minutes
        assert_eq!(entry.splits, 1);
        assert_eq!(entry.finish, dt(6, 14, 12));
        assert_eq!(result.kpis.total_splits, 1);
    }

    #[test]
    fn test_non_preemptable_op_waits_for_free_block() {
        let result = solve(json!({
            "products": [{"id": "P", "routing_ids": ["R1"]}],
            "routings": [{"id": "R1", "operations": [
                {"op_no": 10, "name": "Mill", "work_center_id": "WC",
                 "proc_time_per_unit_min": 30.0, "setup_time_fixed_min": 10.0},
            ]}],
            "work_centers": [{"id": "WC"}],
            "machines": [{"id": "M1", "work_center_id": "WC", "shifts": ["DAY"]}],
            "shifts": [{"id": "DAY", "start_time": "08:00", "end_time": "18:30",
                        "breaks": [{"start": "12:00", "end": "13:00"}]}],
            "orders": [{"id": "O1", "due_date": "2025-01-07",
                        "release_date": "2025-01-06T08:00:00",
                        "product_id": "P", "quantity": 10}],
            "settings": {"ga": {"pop_size": 4, "generations": 2}},
        }));
        let entry = &result.schedule[0];
        // 310 minutes exceed the morning block, so the op starts at 13:00
        assert_eq!(entry.start, dt(6, 13, 0));
        assert_eq!(entry.finish, dt(6, 18, 10));
        assert_eq!(entry.splits, 0);
    }

    fn overtime_shop(proc_min_per_unit: f64) -> serde_json::Value {
        json!({
            "products": [{"id": "P", "routing_ids": ["R1"]}],
            "routings": [{"id": "R1", "operations": [
                {"op_no": 10, "name": "Run", "work_center_id": "WC",
                 "proc_time_per_unit_min": proc_min_per_unit,
                 "preemptable": true, "preemption_overhead_min": 0.0},
            ]}],
            "work_centers": [{"id": "WC"}],
            "machines": [{"id": "M1", "work_center_id": "WC", "shifts": ["DAY"]}],
            "shifts": [{"id": "DAY", "start_time": "08:00", "end_time": "17:00"}],
            "calendar": {
                "ot_windows": [{"start": "2025-01-06 17:00", "end": "2025-01-06 22:00"}],
                "ot_cap_hours_per_day": 1.0,
            },
            "orders": [{"id": "O1", "due_date": "2025-01-07",
                        "release_date": "2025-01-06T08:00:00",
                        "product_id": "P", "quantity": 1}],
            "settings": {"ga": {"pop_size": 4, "generations": 2}},
        })
    }

    #[test]
    fn test_overtime_within_cap_is_used() {
        // 540 regular minutes plus exactly the 60-minute OT budget
        let result = solve(overtime_shop(600.0));
        assert_eq!(result.kpis.skipped, 0);
        let entry = &result.schedule[0];
        assert_eq!(entry.finish, dt(6, 18, 0));
        assert_eq!(entry.splits, 1);
    }

    #[test]
    fn test_overtime_over_cap_reroutes_to_regular_time() {
        // Packing from Monday would need 180 OT minutes against the
        // 60-minute budget, so the decoder starts Tuesday instead and
        // finishes on plain regular time
        let result = solve(overtime_shop(720.0));
        assert_eq!(result.kpis.skipped, 0);
        let entry = &result.schedule[0];
        assert_eq!(entry.start, dt(7, 8, 0));
        assert_eq!(entry.finish, dt(8, 11, 0));
    }

    #[test]
    fn test_overtime_only_machine_hits_cap_and_skips() {
        // The machine references a shift nobody defined, so it has no
        // regular time at all; the lone OT window cannot host two hours of
        // work under a one-hour cap
        let result = solve(json!({
            "products": [{"id": "P", "routing_ids": ["R1"]}],
            "routings": [{"id": "R1", "operations": [
                {"op_no": 10, "name": "Run", "work_center_id": "WC",
                 "proc_time_per_unit_min": 120.0},
            ]}],
            "work_centers": [{"id": "WC"}],
            "machines": [{"id": "M1", "work_center_id": "WC", "shifts": ["GHOST"]}],
            "calendar": {
                "ot_windows": [{"start": "2025-01-06 17:00", "end": "2025-01-06 22:00"}],
                "ot_cap_hours_per_day": 1.0,
            },
            "orders": [{"id": "O1", "due_date": "2025-01-07",
                        "release_date": "2025-01-06T08:00:00",
                        "product_id": "P", "quantity": 1}],
            "settings": {"ga": {"pop_size": 4, "generations": 2}},
        }));
        assert_eq!(result.kpis.skipped, 1);
        assert!(result.schedule.is_empty());
        assert_eq!(result.kpis.fail_stats.get("ot_cap_hit"), Some(&1));
    }

    #[test]
    fn test_setup_matrix_transition_sequence() {
        let result = solve(json!({
            "products": [
                {"id": "PA", "routing_ids": ["RA"]},
                {"id": "PB", "routing_ids": ["RB"]},
            ],
            "routings": [
                {"id": "RA", "operations": [
                    {"op_no": 10, "name": "Paint", "work_center_id": "WC",
                     "proc_time_per_unit_min": 2.0, "setup_state_key": "MAT_A"},
                ]},
                {"id": "RB", "operations": [
                    {"op_no": 10, "name": "Paint", "work_center_id": "WC",
                     "proc_time_per_unit_min": 2.0, "setup_state_key": "MAT_B"},
                ]},
            ],
            "work_centers": [{"id": "WC", "setup_matrix_id": "SM"}],
            "machines": [{"id": "M1", "work_center_id": "WC", "shifts": ["DAY"]}],
            "shifts": [{"id": "DAY", "start_time": "08:00", "end_time": "17:00"}],
            "setup_matrices": [{"id": "SM", "matrix": {
                "clean": {"MAT_A": 8.0, "MAT_B": 30.0},
                "MAT_A": {"MAT_B": 12.0},
                "MAT_B": {"MAT_A": 40.0},
            }}],
            "orders": [
                {"id": "O1", "due_date": "2025-01-07",
                 "release_date": "2025-01-06T08:00:00", "product_id": "PA", "quantity": 5},
                {"id": "O2", "due_date": "2025-01-07",
                 "release_date": "2025-01-06T08:00:00", "product_id": "PB", "quantity": 5},
            ],
            "settings": {"ga": {"pop_size": 6, "generations": 4}},
        }));
        assert_eq!(result.schedule.len(), 2);
        // Cheapest sequence: clean -> MAT_A (8) then MAT_A -> MAT_B (12)
        let setups: Vec<f64> = result.schedule.iter().map(|e| e.setup_min).collect();
        assert_eq!(setups, vec![8.0, 12.0]);
        assert_eq!(result.kpis.total_setup_min, 20.0);
    }

    #[test]
    fn test_horizon_extends_until_feasible() {
        // 70 hours of preemptable work against 8-hour days: infeasible in
        // the 7-day base horizon, feasible after extension
        let result = solve(json!({
            "products": [{"id": "P", "routing_ids": ["R1"]}],
            "routings": [{"id": "R1", "operations": [
                {"op_no": 10, "name": "Run", "work_center_id": "WC",
                 "proc_time_per_unit_min": 4200.0,
                 "preemptable": true, "preemption_overhead_min": 0.0},
            ]}],
            "work_centers": [{"id": "WC"}],
            "machines": [{"id": "M1", "work_center_id": "WC", "shifts": ["DAY"]}],
            "shifts": [{"id": "DAY", "start_time": "08:00", "end_time": "16:00"}],
            "orders": [{"id": "O1", "due_date": "2025-01-08",
                        "release_date": "2025-01-06T08:00:00",
                        "product_id": "P", "quantity": 1}],
            "settings": {"ga": {"pop_size": 4, "generations": 2}},
        }));
        assert_eq!(result.kpis.skipped, 0);
        assert_eq!(result.schedule.len(), 1);
        // Ten working days gone: finish lands on Jan 15 (weekends are
        // ordinary shift days in this shop)
        assert!(result.schedule[0].finish > dt(14, 0, 0));
    }

    #[test]
    fn test_degenerate_input_yields_empty_result() {
        let result = solve(json!({
            "products": [{"id": "P", "routing_ids": ["R1"]}],
            "routings": [{"id": "R1", "operations": [
                {"op_no": 10, "name": "Cut", "work_center_id": "WC"},
            ]}],
            "work_centers": [{"id": "WC"}],
            "machines": [{"id": "M1", "work_center_id": "WC"}],
        }));
        assert_eq!(result.batch_count, 0);
        assert!(result.schedule.is_empty());
        assert_eq!(result.kpis, Kpis::default());
    }

    #[test]
    fn test_unknown_product_skipped_not_fatal() {
        let result = solve(cut_shop(
            json!([{"id": "M1", "work_center_id": "WC_CUT", "shifts": ["DAY"]}]),
            json!([
                {"id": "O1", "due_date": "2025-01-06T17:00:00",
                 "release_date": "2025-01-06T08:00:00", "product_id": "P", "quantity": 10},
                {"id": "O2", "due_date": "2025-01-06T17:00:00",
                 "release_date": "2025-01-06T08:00:00", "product_id": "P_GHOST", "quantity": 10},
            ]),
        ));
        // The ghost line vanished during batching, the real one scheduled
        assert_eq!(result.batch_count, 1);
        assert_eq!(result.schedule.len(), 1);
        assert_eq!(result.kpis.skipped, 0);
    }

    #[test]
    fn test_solve_is_deterministic_end_to_end() {
        let value = cut_shop(
            json!([
                {"id": "M1", "work_center_id": "WC_CUT", "shifts": ["DAY"]},
                {"id": "M2", "work_center_id": "WC_CUT", "shifts": ["DAY"]},
            ]),
            json!([
                {"id": "O1", "due_date": "2025-01-06T17:00:00",
                 "release_date": "2025-01-06T08:00:00", "product_id": "P", "quantity": 10},
                {"id": "O2", "due_date": "2025-01-06T12:00:00",
                 "release_date": "2025-01-06T08:00:00", "product_id": "P", "quantity": 20},
                {"id": "O3", "due_date": "2025-01-06T17:00:00",
                 "release_date": "2025-01-06T08:00:00", "product_id": "P", "quantity": 5},
            ]),
        );
        let catalog = Catalog::from_json_value(value).unwrap();
        let use_case = SolveScheduleUseCase::new();
        let first = use_case.execute(&catalog);
        let second = use_case.execute(&catalog);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_machine_utilization_bounds() {
        let result = solve(cut_shop(
            json!([
                {"id": "M1", "work_center_id": "WC_CUT", "shifts": ["DAY"]},
                {"id": "M2", "work_center_id": "WC_CUT", "shifts": ["DAY"]},
            ]),
            json!([{"id": "O1", "due_date": "2025-01-06T17:00:00",
                    "release_date": "2025-01-06T08:00:00",
                    "product_id": "P", "quantity": 10}]),
        ));
        assert_eq!(result.kpis.machine_utilization.len(), 2);
        for ratio in result.kpis.machine_utilization.values() {
            assert!((0.0..=1.0).contains(ratio));
        }
        // 70 busy minutes somewhere against 7 days of 9-hour shifts
        let total: f64 = result.kpis.machine_utilization.values().sum();
        assert!(total > 0.0);
    }
}
