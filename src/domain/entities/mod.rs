pub mod batch;
pub mod calendar;
pub mod catalog;
pub mod machine;
pub mod order;
pub mod product;
pub mod routing;
pub mod schedule;
pub mod setup_matrix;
pub mod shift;
pub mod speed_override;
pub mod work_center;

pub use batch::Batch;
pub use calendar::{Calendar, Maintenance, OvertimeWindow, Window, WindowKind};
pub use catalog::{Catalog, CatalogIndex, GaParams, LocalSearchParams, PreferenceSettings, Settings};
pub use machine::Machine;
pub use order::{Order, OrderLine};
pub use product::{BatchRule, Operation, Product};
pub use routing::Routing;
pub use schedule::{Kpis, ScheduleEntry};
pub use setup_matrix::SetupMatrix;
pub use shift::{BreakSpec, Shift};
pub use speed_override::SpeedOverride;
pub use work_center::WorkCenter;
