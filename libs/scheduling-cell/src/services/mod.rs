pub mod slot_finder;
pub mod data_source;
pub mod optimizer;

pub use slot_finder::{find_available_slots, IntersectionStrategy, SlotFinder, SlotFinderConfig};
pub use data_source::{InMemoryDataSource, SchedulingDataSource};
pub use optimizer::ScheduleOptimizerService;
