pub mod domain;
pub mod application;

pub use domain::entities;
pub use domain::error::PlanningError;
pub use domain::value_objects;
pub use application::services;
pub use application::use_cases;
