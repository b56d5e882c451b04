//! Setup resolution value object module
//!
//! Names the rung of the setup-minutes fallback chain that produced a
//! value, so callers and tests can observe which source fired.

use serde::{Deserialize, Serialize};

/// Source of a resolved setup-minutes value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupResolution {
    /// Policy short-circuit: previous and next state are equal
    SameState,
    /// A matrix cell `prev -> next` existed
    Matrix,
    /// The operation's fixed setup time
    OperationFixed,
    /// The machine's default setup minutes
    MachineDefault,
    /// The work center's default setup minutes
    WorkCenterDefault,
    /// Nothing matched; setup is zero
    Unresolved,
}
