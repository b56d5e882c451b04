//! Schedule decoder service module
//!
//! Serial schedule generation: walks a chromosome's batch order and places
//! every operation of every batch greedily. Each candidate routing of a
//! batch is attempted against a copy of the fleet state; the routing
//! finishing earliest is committed. Within an operation, the machine
//! minimizing the finish time wins, ties broken by machine id. A batch
//! whose every routing fails is skipped and counted, never an error.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};

use super::cost_oracle::CostOracle;
use super::window_packer::{FitFailure, Placement, WindowPacker};
use crate::domain::entities::{
    Batch, Catalog, CatalogIndex, Machine, Operation, Product, Routing, ScheduleEntry, Window,
    WorkCenter,
};
use crate::domain::value_objects::{Chromosome, FailReason, FailStats};

/// Result of decoding one chromosome
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeOutcome {
    /// Placed operations in insertion order
    pub schedule: Vec<ScheduleEntry>,
    /// Batches that could not be placed
    pub skipped: u32,
    /// Failure counters for the skipped batches
    pub fail_stats: FailStats,
}

/// Transient per-decode fleet state
#[derive(Debug, Clone)]
struct FleetState {
    /// Next instant each machine is free
    free: HashMap<String, NaiveDateTime>,
    /// Current setup state of each machine
    state: HashMap<String, String>,
    /// Overtime minutes consumed per machine and day
    ot_used: HashMap<String, BTreeMap<NaiveDate, f64>>,
}

impl FleetState {
    fn initial(catalog: &Catalog, earliest_release: NaiveDateTime) -> Self {
        let mut free = HashMap::new();
        let mut state = HashMap::new();
        for machine in &catalog.machines {
            free.insert(machine.id.clone(), earliest_release);
            state.insert(machine.id.clone(), machine.initial_state.clone());
        }
        Self {
            free,
            state,
            ot_used: HashMap::new(),
        }
    }
}

/// Decodes chromosomes into concrete schedules
pub struct ScheduleDecoder<'a> {
    index: &'a CatalogIndex<'a>,
    windows_by_machine: &'a HashMap<String, Vec<Window>>,
    batches: &'a [Batch],
    oracle: CostOracle<'a>,
    ot_cap_hours_per_day: Option<f64>,
    allow_preemption: bool,
    earliest_release: NaiveDateTime,
    initial_state: FleetState,
}

impl<'a> ScheduleDecoder<'a> {
    /// Creates a decoder over an immutable catalog, compiled windows and
    /// the batch table
    pub fn new(
        catalog: &'a Catalog,
        index: &'a CatalogIndex<'a>,
        windows_by_machine: &'a HashMap<String, Vec<Window>>,
        batches: &'a [Batch],
    ) -> Self {
        let earliest_release = batches
            .iter()
            .map(|b| b.release_date)
            .min()
            .unwrap_or_default();
        Self {
            index,
            windows_by_machine,
            batches,
            oracle: CostOracle::new(catalog, index),
            ot_cap_hours_per_day: catalog.calendar.ot_cap_hours_per_day,
            allow_preemption: catalog.preference_settings.allow_job_preemption,
            earliest_release,
            initial_state: FleetState::initial(catalog, earliest_release),
        }
    }

    /// The batch table this decoder schedules
    pub fn batches(&self) -> &[Batch] {
        self.batches
    }

    /// Decodes a chromosome into a schedule
    ///
    /// Deterministic: identical inputs and permutation produce an
    /// identical schedule.
    pub fn decode(&self, chromosome: &Chromosome) -> DecodeOutcome {
        let mut fleet = self.initial_state.clone();
        let mut outcome = DecodeOutcome::default();

        for &batch_idx in chromosome.genes() {
            let Some(batch) = self.batches.get(batch_idx) else {
                continue;
            };
            let Some(product) = self.index.products.get(batch.product_id.as_str()).copied() else {
                outcome.skipped += 1;
                outcome.fail_stats.record(FailReason::UnknownFitFail);
                continue;
            };

            let mut best: Option<(NaiveDateTime, Vec<ScheduleEntry>, FleetState)> = None;
            let mut last_failure = None;
            for routing_id in &product.routing_ids {
                let Some(routing) = self.index.routings.get(routing_id.as_str()) else {
                    continue;
                };
                match self.attempt_routing(batch, product, routing, &fleet) {
                    Ok((finish, entries, state)) => {
                        let better = best.as_ref().map(|(f, _, _)| finish < *f).unwrap_or(true);
                        if better {
                            best = Some((finish, entries, state));
                        }
                    }
                    Err(reason) => last_failure = Some(reason),
                }
            }

            match best {
                Some((_, entries, state)) => {
                    outcome.schedule.extend(entries);
                    fleet = state;
                }
                None => {
                    outcome.skipped += 1;
                    outcome
                        .fail_stats
                        .record(last_failure.unwrap_or(FailReason::UnknownFitFail));
                }
            }
        }
        outcome
    }

    /// Attempts a full placement of one batch along one routing
    ///
    /// Works on a clone of the fleet state; the caller commits the clone
    /// only if this routing wins.
    fn attempt_routing(
        &self,
        batch: &Batch,
        product: &Product,
        routing: &Routing,
        fleet: &FleetState,
    ) -> Result<(NaiveDateTime, Vec<ScheduleEntry>, FleetState), FailReason> {
        let mut tentative = fleet.clone();
        let mut entries = Vec::new();
        let mut cur_start = batch.release_date.max(self.earliest_release);

        for op in routing.operations_in_order() {
            let machines = self.index.machines_in_work_center(&op.work_center_id);
            let Some(work_center) = self.index.work_centers.get(op.work_center_id.as_str()) else {
                return Err(FailReason::NoMachineInWorkCenter);
            };
            if machines.is_empty() {
                return Err(FailReason::NoMachineInWorkCenter);
            }

            let mut best_fit: Option<(Placement, &Machine, f64, f64)> = None;
            let mut saw = SeenFailures::default();
            for machine in machines {
                let Some(windows) = self.windows_by_machine.get(machine.id.as_str()) else {
                    saw.no_window = true;
                    continue;
                };
                let earliest = tentative
                    .free
                    .get(machine.id.as_str())
                    .copied()
                    .unwrap_or(self.earliest_release)
                    .max(cur_start);
                let prev_state = tentative.state.get(machine.id.as_str()).map(String::as_str);
                let (setup_min, _) = self
                    .oracle
                    .setup_minutes(prev_state, op, machine, work_center);
                let proc_min = self
                    .oracle
                    .processing_minutes(op, batch.qty, machine, product);

                let empty = BTreeMap::new();
                let ot_used = tentative.ot_used.get(machine.id.as_str()).unwrap_or(&empty);
                let packer = WindowPacker::new(windows, self.ot_cap_hours_per_day);
                let attempt = if self.packed_mode(op, machine, work_center) {
                    packer.place_packed(
                        earliest,
                        setup_min,
                        proc_min,
                        op.preemption_overhead_min,
                        ot_used,
                    )
                } else {
                    packer.place_contiguous(earliest, setup_min, proc_min, ot_used)
                };

                match attempt {
                    Ok(placement) => {
                        // Machines iterate in id order, so a strict compare
                        // keeps the smallest id on finish ties
                        let better = best_fit
                            .as_ref()
                            .map(|(p, _, _, _)| placement.finish < p.finish)
                            .unwrap_or(true);
                        if better {
                            best_fit = Some((placement, machine, setup_min, proc_min));
                        }
                    }
                    Err(failure) => saw.note(failure),
                }
            }

            let Some((placement, machine, setup_min, proc_min)) = best_fit else {
                return Err(saw.dominant_reason());
            };

            tentative
                .free
                .insert(machine.id.clone(), placement.finish);
            if !op.setup_state_key.is_empty() {
                tentative
                    .state
                    .insert(machine.id.clone(), op.setup_state_key.clone());
            }
            if !placement.ot_minutes_by_day.is_empty() {
                let used = tentative.ot_used.entry(machine.id.clone()).or_default();
                for (day, minutes) in &placement.ot_minutes_by_day {
                    *used.entry(*day).or_insert(0.0) += minutes;
                }
            }

            entries.push(ScheduleEntry {
                batch_id: batch.batch_id.clone(),
                order_id: batch.order_id.clone(),
                product_id: batch.product_id.clone(),
                routing_id: routing.id.clone(),
                op_no: op.op_no,
                operation: op.name.clone(),
                qty: batch.qty,
                machine: machine.id.clone(),
                start: placement.start,
                finish: placement.finish,
                setup_min,
                proc_min,
                splits: placement.splits,
            });
            cur_start = placement.finish;
        }

        Ok((cur_start, entries, tentative))
    }

    /// Whether this operation may spread across windows on this machine
    ///
    /// Operator-bound, non-preemptable work cannot cross a break; packing
    /// additionally needs the operation flag and the global preference.
    fn packed_mode(&self, op: &Operation, machine: &Machine, work_center: &WorkCenter) -> bool {
        let operator_bound = operator_required(op, machine, work_center) && !op.preemptable;
        op.preemptable && self.allow_preemption && !operator_bound
    }
}

/// Resolves the operator flags with op > machine > work center inheritance
fn operator_required(op: &Operation, machine: &Machine, work_center: &WorkCenter) -> bool {
    let setup = op
        .setup_requires_operator
        .or(machine.setup_requires_operator)
        .or(work_center.setup_requires_operator)
        .unwrap_or(false);
    let run = op
        .run_requires_operator
        .or(machine.run_requires_operator)
        .or(work_center.run_requires_operator)
        .unwrap_or(false);
    setup || run
}

/// Placement failures observed across a machine sweep
#[derive(Debug, Default)]
struct SeenFailures {
    ot_cap: bool,
    no_contiguous: bool,
    cannot_pack: bool,
    no_window: bool,
}

impl SeenFailures {
    fn note(&mut self, failure: FitFailure) {
        match failure {
            FitFailure::OtCapHit => self.ot_cap = true,
            FitFailure::NoContiguousWindow => self.no_contiguous = true,
            FitFailure::CannotPackAcross => self.cannot_pack = true,
            FitFailure::NoWindowAfterEarliest => self.no_window = true,
        }
    }

    /// The most telling reason among the observed failures
    fn dominant_reason(&self) -> FailReason {
        if self.ot_cap {
            FailReason::OtCapHit
        } else if self.no_contiguous {
            FailReason::NoContiguousWindow
        } else if self.cannot_pack {
            FailReason::CannotPackAcross
        } else if self.no_window {
            FailReason::NoWindowAfterEarliest
        } else {
            FailReason::UnknownFitFail
        }
    }
}
