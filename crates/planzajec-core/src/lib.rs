//! Core types: schedules, civil calendar, merging, export formatting

pub mod format;
pub mod merge;
pub mod schedule;
pub mod time;
pub mod tracing;

pub use format::{
    ExportOptions, OutputFormat, ScheduleExport, render_ics, render_json, render_table,
};
pub use merge::merge_schedules;
pub use schedule::{
    AggregateSchedule, Grouping, Lecturer, MAX_SCHEDULES_PER_REQUEST, Schedule, ScheduleHeader,
    ScheduleItem, SchedulePeriod, ScheduleType, ScheduleTypeError,
};
pub use time::{CalendarError, ScheduleCalendar, DEFAULT_TIMEZONE};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
