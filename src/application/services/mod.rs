pub mod batch_builder;
pub mod calendar_compiler;
pub mod cost_oracle;
pub mod genetic_optimizer;
pub mod local_search;
pub mod objective_evaluator;
pub mod schedule_decoder;
pub mod window_packer;

pub use batch_builder::BatchBuilder;
pub use calendar_compiler::CalendarCompiler;
pub use cost_oracle::CostOracle;
pub use genetic_optimizer::{GaOutcome, GeneticOptimizer};
pub use local_search::LocalSearch;
pub use objective_evaluator::ObjectiveEvaluator;
pub use schedule_decoder::{DecodeOutcome, ScheduleDecoder};
pub use window_packer::{FitFailure, Placement, WindowPacker};
