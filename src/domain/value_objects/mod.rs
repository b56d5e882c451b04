pub mod chromosome;
pub mod fail_reason;
pub mod interval;
pub mod objective_weights;
pub mod setup_resolution;
pub mod timestamp;

pub use chromosome::Chromosome;
pub use fail_reason::{FailReason, FailStats};
pub use interval::Interval;
pub use objective_weights::ObjectiveWeights;
pub use setup_resolution::SetupResolution;
