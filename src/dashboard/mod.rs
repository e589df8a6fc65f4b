pub mod scheduler;
pub mod service;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use scheduler::{Scheduler, SchedulerHandle};
pub use service::Dashboard;
pub use state::{ChartSnapshot, DashboardSnapshot, Phase, PAGES};
