pub mod solve_schedule;

pub use solve_schedule::{SolveResult, SolveScheduleUseCase};
