//! Output formatting for schedules.
//!
//! This module renders fetched data in the formats the CLI can print:
//! - **JSON**: machine-readable output, field names in camelCase
//! - **ICS**: an iCalendar feed of a merged schedule
//! - **Table**: one line per class for the terminal

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schedule::{AggregateSchedule, ScheduleItem, SchedulePeriod};
use crate::time::ScheduleCalendar;

mod ics;

pub use ics::render_ics;

/// Link template for a lecturer's course page on the e-learning platform.
pub const MOODLE_COURSE_URL: &str = "https://e-uczelnia.uek.krakow.pl/course/view.php?id=";

/// Returns the course page URL for a moodle course id.
pub fn moodle_course_url(course_id: i64) -> String {
    format!("{}{}", MOODLE_COURSE_URL, course_id)
}

/// The output format for fetched data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Machine-readable JSON output.
    #[default]
    Json,
    /// iCalendar feed (schedules only).
    Ics,
    /// Human-readable terminal output.
    Table,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Ics => "ics",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "ics" | "ical" | "icalendar" => Ok(Self::Ics),
            "table" | "tty" => Ok(Self::Table),
            other => Err(format!(
                "unknown output format {:?} (expected json, ics or table)",
                other
            )),
        }
    }
}

/// Options shared by the schedule renderers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Subjects left out of ICS and table output.
    #[serde(default)]
    pub hidden_subjects: Vec<String>,
    /// Maximum subject length in table output (truncated with ellipsis).
    #[serde(default)]
    pub max_subject_length: Option<usize>,
}

impl ExportOptions {
    pub fn with_hidden_subjects(mut self, subjects: Vec<String>) -> Self {
        self.hidden_subjects = subjects;
        self
    }

    /// Returns true if items with this subject should be left out.
    pub fn is_hidden(&self, subject: &str) -> bool {
        self.hidden_subjects.iter().any(|hidden| hidden == subject)
    }

    /// Iterates over the items that are not hidden.
    pub fn visible<'a>(
        &'a self,
        items: &'a [ScheduleItem],
    ) -> impl Iterator<Item = &'a ScheduleItem> + 'a {
        items.iter().filter(|item| !self.is_hidden(&item.subject))
    }
}

/// JSON shape of a schedule query result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleExport<'a> {
    pub aggregate_schedule: &'a AggregateSchedule,
    pub periods: &'a [SchedulePeriod],
}

/// Renders any serializable value as pretty-printed JSON.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Renders a merged schedule as a plain-text table, one line per class.
///
/// Times are shown in the calendar's local time.
pub fn render_table(
    aggregate: &AggregateSchedule,
    options: &ExportOptions,
    calendar: &ScheduleCalendar,
) -> String {
    let mut lines = Vec::new();

    let title = aggregate
        .headers
        .iter()
        .map(|h| h.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    if !title.is_empty() {
        lines.push(title);
    }

    let mut count = 0;
    for item in options.visible(&aggregate.items) {
        lines.push(table_row(item, options, calendar));
        count += 1;
    }

    if count == 0 {
        lines.push("No classes".to_string());
    }

    lines.join("\n")
}

fn table_row(item: &ScheduleItem, options: &ExportOptions, calendar: &ScheduleCalendar) -> String {
    let start = calendar.to_local(&item.start);
    let end = calendar.to_local(&item.end);

    let subject = match options.max_subject_length {
        Some(max_len) => ellipsis(&item.subject, max_len),
        None => Cow::Borrowed(item.subject.as_str()),
    };
    let marker = if item.extra.is_some() { "[!] " } else { "" };
    let room = match (&item.room_name, &item.room_url) {
        (_, Some(_)) => "Online",
        (Some(name), None) => name.as_str(),
        (None, None) => "-",
    };

    let mut row = format!(
        "{}-{}  {:<12} {}{}  @ {}",
        start.format("%Y-%m-%d %a %H:%M"),
        end.format("%H:%M"),
        item.kind,
        marker,
        subject,
        room
    );
    if !item.groups.is_empty() {
        row.push_str("  [");
        row.push_str(&item.groups.join(", "));
        row.push(']');
    }
    row
}

/// Truncates a string to `max_len` characters, ending with `...` when cut.
///
/// Limits too short to hold the dots cut without them.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }

    if max_len <= ELLIPSIS.len() {
        return Cow::Owned(s.chars().take(max_len).collect());
    }

    let truncated: String = s.chars().take(max_len - ELLIPSIS.len()).collect();
    Cow::Owned(format!("{}{}", truncated, ELLIPSIS))
}

const ELLIPSIS: &str = "...";
