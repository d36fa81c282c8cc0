pub mod dashboard;
pub mod reminders;
pub mod service;
pub mod snapshot;

pub use crate::dashboard::{AbandonedEntry, Dashboard, DashboardOptions, HabitStatus};
pub use crate::reminders::{ReminderRequest, ReminderSink};
pub use crate::service::{HabitService, HabitServiceBuilder};
pub use crate::snapshot::{Snapshot, SnapshotFile};
