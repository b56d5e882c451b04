//! Catalog entity module
//!
//! The immutable root aggregate a solve consumes: products, routings, the
//! machine fleet, setup matrices, orders, shifts, the working-time calendar
//! and the solver settings. Loaded once, validated once, then read-only
//! for the whole solve.

use std::collections::HashMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::calendar::Calendar;
use super::machine::Machine;
use super::order::Order;
use super::product::Product;
use super::routing::Routing;
use super::setup_matrix::SetupMatrix;
use super::shift::Shift;
use super::speed_override::SpeedOverride;
use super::work_center::WorkCenter;
use crate::domain::error::PlanningError;
use crate::domain::value_objects::timestamp::parse_hhmm;
use crate::domain::value_objects::ObjectiveWeights;

fn default_true() -> bool {
    true
}

/// Genetic algorithm knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaParams {
    /// Individuals per generation; clamped to at least 2
    #[serde(default = "GaParams::default_pop_size")]
    pub pop_size: usize,
    /// Generations to run; clamped to at least 1
    #[serde(default = "GaParams::default_generations")]
    pub generations: usize,
    /// Tournament size; 1 or less degrades to uniform parent sampling
    #[serde(default = "GaParams::default_tournament_k")]
    pub tournament_k: usize,
    /// Probability of crossover per offspring
    #[serde(default = "GaParams::default_crossover_rate")]
    pub crossover_rate: f64,
    /// Swap-mutation rate; scales the number of swaps per offspring
    #[serde(default = "GaParams::default_mutation_rate")]
    pub mutation_rate: f64,
    /// Individuals carried unchanged into the next generation
    #[serde(default = "GaParams::default_elite_count")]
    pub elite_count: usize,
    /// Master seed of the reproducibility contract
    #[serde(default = "GaParams::default_seed")]
    pub seed: u64,
    /// Optional wall-clock budget checked at generation boundaries
    #[serde(default)]
    pub time_budget_secs: Option<f64>,
}

impl GaParams {
    fn default_pop_size() -> usize {
        30
    }

    fn default_generations() -> usize {
        40
    }

    fn default_tournament_k() -> usize {
        3
    }

    fn default_crossover_rate() -> f64 {
        0.9
    }

    fn default_mutation_rate() -> f64 {
        0.1
    }

    fn default_elite_count() -> usize {
        2
    }

    fn default_seed() -> u64 {
        42
    }

    /// Population size with the >= 2 floor applied
    pub fn effective_pop_size(&self) -> usize {
        self.pop_size.max(2)
    }

    /// Generation count with the >= 1 floor applied
    pub fn effective_generations(&self) -> usize {
        self.generations.max(1)
    }
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            pop_size: Self::default_pop_size(),
            generations: Self::default_generations(),
            tournament_k: Self::default_tournament_k(),
            crossover_rate: Self::default_crossover_rate(),
            mutation_rate: Self::default_mutation_rate(),
            elite_count: Self::default_elite_count(),
            seed: Self::default_seed(),
            time_budget_secs: None,
        }
    }
}

/// Simulated-annealing / tabu local search knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSearchParams {
    /// Neighbor evaluations per refinement
    #[serde(default = "LocalSearchParams::default_iterations")]
    pub iterations: usize,
    /// Initial annealing temperature
    #[serde(default = "LocalSearchParams::default_initial_temp")]
    pub initial_temp: f64,
    /// Geometric cooling factor per iteration
    #[serde(default = "LocalSearchParams::default_cooling")]
    pub cooling: f64,
    /// Recent-candidate ring size
    #[serde(default = "LocalSearchParams::default_tabu_size")]
    pub tabu_size: usize,
    /// Mutation rate used to generate neighbors
    #[serde(default = "LocalSearchParams::default_mutation_rate")]
    pub mutation_rate: f64,
}

impl LocalSearchParams {
    fn default_iterations() -> usize {
        60
    }

    fn default_initial_temp() -> f64 {
        900.0
    }

    fn default_cooling() -> f64 {
        0.95
    }

    fn default_tabu_size() -> usize {
        24
    }

    fn default_mutation_rate() -> f64 {
        0.3
    }
}

impl Default for LocalSearchParams {
    fn default() -> Self {
        Self {
            iterations: Self::default_iterations(),
            initial_temp: Self::default_initial_temp(),
            cooling: Self::default_cooling(),
            tabu_size: Self::default_tabu_size(),
            mutation_rate: Self::default_mutation_rate(),
        }
    }
}

/// Solver settings carried in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Weights of the scalarized objective
    #[serde(default)]
    pub objective_weights: ObjectiveWeights,
    /// Genetic algorithm knobs
    #[serde(default)]
    pub ga: GaParams,
    /// Local search knobs
    #[serde(default)]
    pub local_search: LocalSearchParams,
    /// Absorb trailing batches below min_qty into the previous same-product
    /// batch instead of emitting an undersized one
    #[serde(default = "default_true")]
    pub merge_undersized_tail: bool,
    /// Short-circuit setup lookup to zero when prev and next state match
    #[serde(default)]
    pub setup_same_state_is_zero: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            objective_weights: ObjectiveWeights::default(),
            ga: GaParams::default(),
            local_search: LocalSearchParams::default(),
            merge_undersized_tail: true,
            setup_same_state_is_zero: false,
        }
    }
}

/// Planner preference flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSettings {
    /// Allow preemptable operations to span multiple windows
    #[serde(default = "default_true")]
    pub allow_job_preemption: bool,
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        Self {
            allow_job_preemption: true,
        }
    }
}

/// The immutable domain catalog a solve consumes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub routings: Vec<Routing>,
    #[serde(default)]
    pub work_centers: Vec<WorkCenter>,
    #[serde(default)]
    pub machines: Vec<Machine>,
    #[serde(default)]
    pub setup_matrices: Vec<SetupMatrix>,
    /// Speed overrides; `speed` is the legacy key for the same list
    #[serde(default, alias = "speed")]
    pub speed_overrides: Vec<SpeedOverride>,
    /// Single-line orders
    #[serde(default)]
    pub orders: Vec<Order>,
    /// Multi-line orders
    #[serde(default)]
    pub orders_multiline: Vec<Order>,
    #[serde(default)]
    pub shifts: Vec<Shift>,
    #[serde(default)]
    pub calendar: Calendar,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub preference_settings: PreferenceSettings,
}

impl Catalog {
    /// Builds a catalog from an already-parsed JSON value
    ///
    /// Convenience for embedders holding structured input; file and network
    /// handling stay outside the crate.
    pub fn from_json_value(value: serde_json::Value) -> anyhow::Result<Self> {
        serde_json::from_value(value).context("failed to map JSON value onto the domain catalog")
    }

    /// All orders, single-line and multi-line, in declaration order
    pub fn all_orders(&self) -> Vec<&Order> {
        self.orders.iter().chain(self.orders_multiline.iter()).collect()
    }

    /// Item-level validation diagnostics
    ///
    /// Each finding concerns one catalog item; callers log the findings and
    /// the affected items are skipped downstream. Validation never aborts a
    /// solve.
    pub fn validate(&self) -> Vec<PlanningError> {
        let mut findings = Vec::new();
        let index = CatalogIndex::new(self);

        for product in &self.products {
            if let Err(err) = product.validate() {
                findings.push(err);
            }
            for routing_id in &product.routing_ids {
                if !index.routings.contains_key(routing_id.as_str()) {
                    findings.push(PlanningError::UnknownRouting {
                        product_id: product.id.clone(),
                        routing_id: routing_id.clone(),
                    });
                }
            }
        }

        for routing in &self.routings {
            for operation in &routing.operations {
                if let Err(err) = operation.validate() {
                    findings.push(err);
                }
            }
        }

        for machine in &self.machines {
            if !index.work_centers.contains_key(machine.work_center_id.as_str()) {
                findings.push(PlanningError::UnknownWorkCenter {
                    machine_id: machine.id.clone(),
                    work_center_id: machine.work_center_id.clone(),
                });
            }
        }

        for shift in &self.shifts {
            for raw in [&shift.start_time, &shift.end_time]
                .into_iter()
                .chain(shift.breaks.iter().flat_map(|b| [&b.start, &b.end]))
            {
                if let Err(err) = parse_hhmm(raw) {
                    findings.push(PlanningError::InvalidShift {
                        shift_id: shift.id.clone(),
                        detail: err.to_string(),
                    });
                }
            }
        }

        for order in self.all_orders() {
            for line in order.effective_lines() {
                if !index.products.contains_key(line.product_id.as_str()) {
                    findings.push(PlanningError::UnknownProduct {
                        order_id: order.id.clone(),
                        product_id: line.product_id.clone(),
                    });
                }
            }
        }

        findings
    }
}

/// Id -> entity lookup maps over a catalog
///
/// Built once per solve; all maps borrow from the catalog.
pub struct CatalogIndex<'a> {
    pub products: HashMap<&'a str, &'a Product>,
    pub routings: HashMap<&'a str, &'a Routing>,
    pub work_centers: HashMap<&'a str, &'a WorkCenter>,
    pub machines: HashMap<&'a str, &'a Machine>,
    pub setup_matrices: HashMap<&'a str, &'a SetupMatrix>,
    pub shifts: HashMap<&'a str, &'a Shift>,
    machines_by_work_center: HashMap<&'a str, Vec<&'a Machine>>,
}

impl<'a> CatalogIndex<'a> {
    /// Indexes a catalog
    pub fn new(catalog: &'a Catalog) -> Self {
        let mut machines_by_work_center: HashMap<&str, Vec<&Machine>> = HashMap::new();
        for machine in &catalog.machines {
            machines_by_work_center
                .entry(machine.work_center_id.as_str())
                .or_default()
                .push(machine);
        }
        // Sorted candidate lists keep machine enumeration deterministic
        for machines in machines_by_work_center.values_mut() {
            machines.sort_by(|a, b| a.id.cmp(&b.id));
        }

        Self {
            products: catalog.products.iter().map(|p| (p.id.as_str(), p)).collect(),
            routings: catalog.routings.iter().map(|r| (r.id.as_str(), r)).collect(),
            work_centers: catalog
                .work_centers
                .iter()
                .map(|wc| (wc.id.as_str(), wc))
                .collect(),
            machines: catalog.machines.iter().map(|m| (m.id.as_str(), m)).collect(),
            setup_matrices: catalog
                .setup_matrices
                .iter()
                .map(|sm| (sm.id.as_str(), sm))
                .collect(),
            shifts: catalog.shifts.iter().map(|s| (s.id.as_str(), s)).collect(),
            machines_by_work_center,
        }
    }

    /// Candidate machines of a work center, sorted by machine id
    ///
    /// Falls back to the work center's `parallel_machines` list when no
    /// machine declares the work center directly.
    pub fn machines_in_work_center(&self, work_center_id: &str) -> Vec<&'a Machine> {
        if let Some(machines) = self.machines_by_work_center.get(work_center_id) {
            if !machines.is_empty() {
                return machines.clone();
            }
        }
        let Some(work_center) = self.work_centers.get(work_center_id) else {
            return Vec::new();
        };
        let mut fallback: Vec<&Machine> = work_center
            .parallel_machines
            .iter()
            .filter_map(|id| self.machines.get(id.as_str()).copied())
            .collect();
        fallback.sort_by(|a, b| a.id.cmp(&b.id));
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::from_json_value(json!({
            "products": [
                {"id": "P1", "name": "Widget", "routing_ids": ["R1"]},
                {"id": "P2", "name": "Broken", "routing_ids": []},
            ],
            "routings": [
                {"id": "R1", "operations": [
                    {"op_no": 10, "name": "Cutting", "work_center_id": "WC_CUT"},
                ]},
            ],
            "work_centers": [{"id": "WC_CUT", "parallel_machines": ["M1"]}],
            "machines": [
                {"id": "M1", "work_center_id": "WC_CUT"},
                {"id": "M9", "work_center_id": "WC_GHOST"},
            ],
            "shifts": [
                {"id": "DAY", "start_time": "08:00", "end_time": "17:00"},
                {"id": "BAD", "start_time": "8am", "end_time": "17:00"},
            ],
            "orders": [
                {"id": "O1", "due_date": "2025-01-10", "product_id": "P1", "quantity": 10},
                {"id": "O2", "due_date": "2025-01-10", "product_id": "P_MISSING", "quantity": 1},
            ],
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_reports_item_level_findings() {
        let findings = catalog().validate();
        assert!(findings.contains(&PlanningError::MissingRouting("P2".to_string())));
        assert!(findings.iter().any(|f| matches!(
            f,
            PlanningError::UnknownWorkCenter { machine_id, .. } if machine_id == "M9"
        )));
        assert!(findings.iter().any(|f| matches!(
            f,
            PlanningError::InvalidShift { shift_id, .. } if shift_id == "BAD"
        )));
        assert!(findings.iter().any(|f| matches!(
            f,
            PlanningError::UnknownProduct { order_id, .. } if order_id == "O2"
        )));
    }

    #[test]
    fn test_index_machines_by_work_center_sorted() {
        let catalog = Catalog::from_json_value(json!({
            "work_centers": [{"id": "WC", "parallel_machines": []}],
            "machines": [
                {"id": "M2", "work_center_id": "WC"},
                {"id": "M1", "work_center_id": "WC"},
            ],
        }))
        .unwrap();
        let index = CatalogIndex::new(&catalog);
        let ids: Vec<&str> = index
            .machines_in_work_center("WC")
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["M1", "M2"]);
    }

    #[test]
    fn test_index_falls_back_to_parallel_machines() {
        let catalog = Catalog::from_json_value(json!({
            "work_centers": [{"id": "WC_ASSIGN", "parallel_machines": ["M1"]}],
            "machines": [{"id": "M1", "work_center_id": "WC_OTHER"}],
        }))
        .unwrap();
        let index = CatalogIndex::new(&catalog);
        let ids: Vec<&str> = index
            .machines_in_work_center("WC_ASSIGN")
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["M1"]);
    }

    #[test]
    fn test_speed_alias() {
        let catalog = Catalog::from_json_value(json!({
            "speed": [{"machine_id": "M1", "operation": "Cutting", "multiplier": 2.0}],
        }))
        .unwrap();
        assert_eq!(catalog.speed_overrides.len(), 1);
    }

    #[test]
    fn test_ga_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.ga.pop_size, 30);
        assert_eq!(settings.ga.seed, 42);
        assert!(settings.merge_undersized_tail);
        assert!(!settings.setup_same_state_is_zero);
        assert!(PreferenceSettings::default().allow_job_preemption);
    }
}
