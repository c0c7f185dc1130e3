pub mod cadence;
pub mod daemon;

pub use cadence::{DailyCadence, ScheduleError, Tick};
pub use daemon::{JobError, ScheduledJob, Scheduler, SchedulerError, SchedulerExit};
