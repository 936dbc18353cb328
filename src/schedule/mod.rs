//! Schedule access — record sources and the paging cursor over them.

pub mod pager;
pub mod provider;

pub use pager::{SchedulePager, WindowAdvance};
pub use provider::{InMemorySchedule, JsonFileSchedule, ScheduleProvider, ScheduleRecord};
