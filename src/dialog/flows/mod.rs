pub mod profile;
pub mod schedule;

pub use profile::{HELLO_USER, ProfileFlow, ProfileSummaryFlow, WHO_ARE_YOU};
pub use schedule::{LOOP_CALENDAR, MAY_I_HELP, ScheduleFlow, ScheduleLoopFlow};
