//! Single-entity schedule building.
//!
//! Turns one decoded [`ScheduleDocument`] into a [`Schedule`] for the
//! requested entity. The document type decides which fields come from the
//! document's own identity and which from the rows:
//!
//! | document type | groups        | lecturers                 | room          |
//! |---------------|---------------|---------------------------|---------------|
//! | Group         | document name | row `nauczyciel`          | row `sala`    |
//! | Lecturer      | row `grupa`   | document name and `idcel` | row `sala`    |
//! | Room          | row `grupa`   | row `nauczyciel`          | document name |
//!
//! Any malformed row fails the whole build.

use std::num::ParseIntError;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use planzajec_core::{
    CalendarError, Lecturer, Schedule, ScheduleCalendar, ScheduleHeader, ScheduleItem,
    SchedulePeriod, ScheduleType,
};
use regex::Regex;
use thiserror::Error;

use crate::xml::{RawLecturer, RawRow, ScheduleDocument};

/// Online rooms are published as an HTML anchor.
static ROOM_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^<a href="(.+)">(.+)</a>$"#).expect("Invalid room link regex")
});

/// Type of the language-course placeholder rows.
const LANGUAGE_COURSE_TYPE: &str = "lektorat";

/// Subject suffix of the language-course placeholder rows.
const LANGUAGE_COURSE_PLACEHOLDER_SUFFIX: &str = "grupa przedmiotów";

/// A moodle course id that is not a number.
#[derive(Debug, Error)]
#[error("cannot convert moodle id {input:?} to a number")]
pub struct MoodleIdError {
    pub input: String,
    #[source]
    pub source: ParseIntError,
}

/// Parses a moodle course id. A leading `-` is ignored.
pub fn parse_moodle_id(raw: &str) -> Result<i64, MoodleIdError> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    digits.parse::<i64>().map_err(|source| MoodleIdError {
        input: raw.to_string(),
        source,
    })
}

/// A malformed period.
#[derive(Debug, Error)]
pub enum PeriodError {
    #[error("failed to parse period start date at index {index}")]
    Start {
        index: usize,
        #[source]
        source: CalendarError,
    },

    #[error("failed to parse period end date at index {index}")]
    End {
        index: usize,
        #[source]
        source: CalendarError,
    },
}

/// A malformed class row.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("failed to parse item start date")]
    Start(#[source] CalendarError),

    #[error("failed to parse item end date")]
    End(#[source] CalendarError),

    #[error("start time {start} is after end time {end}")]
    StartAfterEnd {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },

    #[error("invalid moodle id at lecturer index {index}")]
    LecturerMoodleId {
        index: usize,
        #[source]
        source: MoodleIdError,
    },
}

impl RowError {
    /// Index of the offending lecturer sub-row, if the error is about one.
    pub fn lecturer_index(&self) -> Option<usize> {
        match self {
            Self::LecturerMoodleId { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// A document that does not describe the requested entity, or that
/// contains malformed data.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("received different schedule type than requested: {received:?} (requested {requested})")]
    TypeMismatch {
        requested: ScheduleType,
        received: String,
    },

    #[error("cannot parse schedule id {raw:?} as number")]
    InvalidId {
        raw: String,
        #[source]
        source: ParseIntError,
    },

    #[error("received different schedule id than requested: {received} (requested {requested})")]
    IdMismatch { requested: i64, received: i64 },

    #[error("missing schedule name")]
    MissingName,

    #[error("invalid schedule moodle id")]
    InvalidMoodleId(#[source] MoodleIdError),

    #[error("invalid item at index {index}")]
    Row {
        index: usize,
        #[source]
        source: RowError,
    },

    #[error(transparent)]
    Period(#[from] PeriodError),
}

impl DocumentError {
    /// Index of the offending row, if the error is about one.
    pub fn row_index(&self) -> Option<usize> {
        match self {
            Self::Row { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Parses the document's periods, in document order.
///
/// Periods start at `00:00` of their first day and end at `23:59` of their
/// last day. One malformed period fails the whole list.
pub fn extract_periods(
    document: &ScheduleDocument,
    calendar: &ScheduleCalendar,
) -> Result<Vec<SchedulePeriod>, PeriodError> {
    document
        .periods
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let start = calendar
                .day_start(&raw.from)
                .map_err(|source| PeriodError::Start { index, source })?;
            let end = calendar
                .day_end(&raw.to)
                .map_err(|source| PeriodError::End { index, source })?;
            Ok(SchedulePeriod { start, end })
        })
        .collect()
}

/// Builds the schedule of the requested entity from its document.
pub fn build_schedule(
    document: &ScheduleDocument,
    requested_type: ScheduleType,
    requested_id: i64,
    calendar: &ScheduleCalendar,
) -> Result<(Schedule, Vec<SchedulePeriod>), DocumentError> {
    if ScheduleType::from_code(&document.typ) != Some(requested_type) {
        return Err(DocumentError::TypeMismatch {
            requested: requested_type,
            received: document.typ.clone(),
        });
    }

    let received_id = document
        .id
        .trim()
        .parse::<i64>()
        .map_err(|source| DocumentError::InvalidId {
            raw: document.id.clone(),
            source,
        })?;
    if received_id != requested_id {
        return Err(DocumentError::IdMismatch {
            requested: requested_id,
            received: received_id,
        });
    }

    let name = document.nazwa.trim();
    if name.is_empty() {
        return Err(DocumentError::MissingName);
    }

    let own_moodle_id = match document.idcel.trim() {
        "" => None,
        raw => Some(parse_moodle_id(raw).map_err(DocumentError::InvalidMoodleId)?),
    };

    let identity = Identity {
        schedule_type: requested_type,
        name,
        own_lecturer: Lecturer::new(name).with_moodle_course_id(own_moodle_id),
    };

    let mut items = Vec::with_capacity(document.rows.len());
    for (index, row) in document.rows.iter().enumerate() {
        if let Some(item) = identity
            .build_item(row, calendar)
            .map_err(|source| DocumentError::Row { index, source })?
        {
            items.push(item);
        }
    }

    let periods = extract_periods(document, calendar)?;

    Ok((
        Schedule::new(ScheduleHeader::new(received_id, name), items),
        periods,
    ))
}

/// The requested entity, as seen by its own document.
struct Identity<'a> {
    schedule_type: ScheduleType,
    name: &'a str,
    own_lecturer: Lecturer,
}

impl Identity<'_> {
    /// Returns `None` for rows that are skipped.
    fn build_item(
        &self,
        row: &RawRow,
        calendar: &ScheduleCalendar,
    ) -> Result<Option<ScheduleItem>, RowError> {
        let kind = row.kind.trim().to_lowercase();
        let subject = row.subject.trim();

        if kind == LANGUAGE_COURSE_TYPE && subject.ends_with(LANGUAGE_COURSE_PLACEHOLDER_SUFFIX) {
            return Ok(None);
        }

        let start = calendar
            .parse_local(&row.date, &row.start_time)
            .map_err(RowError::Start)?;
        let end_time = row.end_time.split_whitespace().next().unwrap_or_default();
        let end = calendar
            .parse_local(&row.date, end_time)
            .map_err(RowError::End)?;
        if start > end {
            return Err(RowError::StartAfterEnd { start, end });
        }

        let mut item = ScheduleItem::new(start, end, subject, kind)
            .with_groups(self.groups(row))
            .with_lecturers(self.lecturers(&row.lecturers)?);

        match self.schedule_type {
            ScheduleType::Room => item = item.with_room(self.name, None),
            _ => {
                if let Some((room_name, room_url)) = parse_room(&row.room) {
                    item = item.with_room(room_name, room_url);
                }
            }
        }

        let notes = row.notes.trim();
        if !notes.is_empty() {
            item = item.with_extra(notes);
        }

        Ok(Some(item))
    }

    fn groups(&self, row: &RawRow) -> Vec<String> {
        match self.schedule_type {
            ScheduleType::Group => vec![self.name.to_string()],
            _ => row
                .groups
                .split(',')
                .map(str::trim)
                .filter(|group| !group.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    fn lecturers(&self, raw: &[RawLecturer]) -> Result<Vec<Lecturer>, RowError> {
        if self.schedule_type == ScheduleType::Lecturer {
            return Ok(vec![self.own_lecturer.clone()]);
        }

        let mut lecturers = Vec::with_capacity(raw.len());
        for (index, lecturer) in raw.iter().enumerate() {
            let name = lecturer.name.trim();
            if name.is_empty() {
                continue;
            }

            let moodle_course_id = match lecturer.moodle.trim() {
                "" => None,
                raw_id => Some(
                    parse_moodle_id(raw_id)
                        .map_err(|source| RowError::LecturerMoodleId { index, source })?,
                ),
            };
            lecturers.push(Lecturer::new(name).with_moodle_course_id(moodle_course_id));
        }
        Ok(lecturers)
    }
}

/// Splits a raw room field into its name and optional link.
fn parse_room(raw: &str) -> Option<(String, Option<String>)> {
    let room = raw.trim();
    if room.is_empty() {
        return None;
    }

    match ROOM_LINK_REGEX.captures(room) {
        Some(captures) => Some((captures[2].to_string(), Some(captures[1].to_string()))),
        None => Some((room.to_string(), None)),
    }
}
