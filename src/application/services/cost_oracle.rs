//! Cost oracle service module
//!
//! Setup-minutes and processing-minutes lookups. Setup resolves through
//! the matrix chain (machine matrix, operation matrix, work-center matrix)
//! and falls back through operation fixed time, machine default and
//! work-center default before giving up at zero; the rung that fired is
//! reported so tests can observe it. Processing scales per-unit minutes by
//! quantity, applies speed overrides in list order and divides by machine
//! efficiency.

use crate::domain::entities::{Catalog, CatalogIndex, Machine, Operation, Product, WorkCenter};
use crate::domain::value_objects::SetupResolution;

/// Resolves setup and processing minutes against the catalog
pub struct CostOracle<'a> {
    catalog: &'a Catalog,
    index: &'a CatalogIndex<'a>,
    setup_same_state_is_zero: bool,
}

impl<'a> CostOracle<'a> {
    /// Creates an oracle over a catalog and its index
    pub fn new(catalog: &'a Catalog, index: &'a CatalogIndex<'a>) -> Self {
        Self {
            catalog,
            index,
            setup_same_state_is_zero: catalog.settings.setup_same_state_is_zero,
        }
    }

    /// Setup minutes for transitioning a machine into an operation's state
    ///
    /// # Arguments
    ///
    /// * `prev_state` - State the machine is currently in, if known
    /// * `op` - Operation about to run; its `setup_state_key` is the target
    /// * `machine` - Machine the operation would run on
    /// * `work_center` - The operation's work center
    ///
    /// # Returns
    ///
    /// The resolved minutes and the fallback rung that produced them
    pub fn setup_minutes(
        &self,
        prev_state: Option<&str>,
        op: &Operation,
        machine: &Machine,
        work_center: &WorkCenter,
    ) -> (f64, SetupResolution) {
        let next_state = op.setup_state_key.as_str();

        if self.setup_same_state_is_zero && prev_state == Some(next_state) {
            return (0.0, SetupResolution::SameState);
        }

        let matrix_id = machine
            .setup_matrix_id
            .as_deref()
            .or(op.setup_matrix_id.as_deref())
            .or(work_center.setup_matrix_id.as_deref());
        if let (Some(matrix_id), Some(prev)) = (matrix_id, prev_state) {
            if let Some(minutes) = self
                .index
                .setup_matrices
                .get(matrix_id)
                .and_then(|matrix| matrix.minutes(prev, next_state))
            {
                return (minutes, SetupResolution::Matrix);
            }
        }

        if let Some(minutes) = op.fixed_setup_min() {
            return (minutes, SetupResolution::OperationFixed);
        }
        if let Some(minutes) = machine.default_setup_min {
            return (minutes, SetupResolution::MachineDefault);
        }
        if let Some(minutes) = work_center.default_setup_min {
            return (minutes, SetupResolution::WorkCenterDefault);
        }
        (0.0, SetupResolution::Unresolved)
    }

    /// Processing minutes for a batch of an operation on a machine
    ///
    /// Speed overrides are applied in declaration order; a non-positive
    /// multiplier is ignored. Non-positive machine efficiency counts as 1.0.
    pub fn processing_minutes(
        &self,
        op: &Operation,
        qty: u32,
        machine: &Machine,
        product: &Product,
    ) -> f64 {
        let mut total = op.proc_per_unit_min() * f64::from(qty);

        for ovr in &self.catalog.speed_overrides {
            if ovr.multiplier > 0.0 && ovr.matches(&machine.id, &product.id, &op.name) {
                total /= ovr.multiplier;
            }
        }

        total / machine.effective_efficiency()
    }
}
