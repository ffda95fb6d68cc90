//! Schedule types.
//!
//! This module provides the canonical, provider-agnostic representation of
//! class schedules:
//! - [`ScheduleType`]: which kind of entity a schedule belongs to
//! - [`ScheduleItem`]: one concrete class occurrence
//! - [`Schedule`]: one entity's ordered timeline
//! - [`AggregateSchedule`]: several timelines merged into one

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of entities that can be combined into one aggregate schedule.
pub const MAX_SCHEDULES_PER_REQUEST: usize = 4;

/// The kind of entity a schedule describes.
///
/// The type decides which row fields of an upstream document are
/// authoritative: a group's own schedule never lists groups per row, a
/// lecturer's never lists lecturers, and a room's never lists the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleType {
    /// A student group.
    #[serde(rename = "G")]
    Group,
    /// A lecturer.
    #[serde(rename = "N")]
    Lecturer,
    /// A room.
    #[serde(rename = "S")]
    Room,
}

impl ScheduleType {
    /// All schedule types, in upstream order.
    pub const ALL: [ScheduleType; 3] = [Self::Group, Self::Lecturer, Self::Room];

    /// Returns the upstream wire code (`G`, `N` or `S`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Group => "G",
            Self::Lecturer => "N",
            Self::Room => "S",
        }
    }

    /// Parses a strict upstream wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "G" => Some(Self::Group),
            "N" => Some(Self::Lecturer),
            "S" => Some(Self::Room),
            _ => None,
        }
    }

    /// Returns a human-readable name for this type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Lecturer => "lecturer",
            Self::Room => "room",
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unknown schedule type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid schedule type: {0:?} (expected G, N, S, group, lecturer or room)")]
pub struct ScheduleTypeError(pub String);

impl FromStr for ScheduleType {
    type Err = ScheduleTypeError;

    /// Accepts the wire codes as well as the lowercase type names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(schedule_type) = Self::from_code(trimmed) {
            return Ok(schedule_type);
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "group" => Ok(Self::Group),
            "lecturer" => Ok(Self::Lecturer),
            "room" => Ok(Self::Room),
            _ => Err(ScheduleTypeError(s.to_string())),
        }
    }
}

/// A browsable grouping of schedules (faculty, building, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub name: String,
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
}

/// Identifies one queried entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleHeader {
    pub id: i64,
    pub name: String,
}

impl ScheduleHeader {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A selectable reporting period (e.g. a semester).
///
/// `start` is midnight of the first day and `end` is 23:59 of the last day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// A lecturer attached to a schedule item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecturer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moodle_course_id: Option<i64>,
}

impl Lecturer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            moodle_course_id: None,
        }
    }

    /// Sets the moodle course id. An id of 0 means no course.
    pub fn with_moodle_course_id(mut self, id: Option<i64>) -> Self {
        self.moodle_course_id = id.filter(|&id| id != 0);
        self
    }
}

/// One concrete class occurrence.
///
/// Invariant: `start <= end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub subject: String,
    /// Lowercase class type, e.g. `wykład`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lecturers: Vec<Lecturer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_url: Option<String>,
    /// Free-text notes attached by the upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl ScheduleItem {
    /// Creates an item with the given time range, subject and type.
    pub fn new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        subject: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            start,
            end,
            subject: subject.into(),
            kind: kind.into(),
            groups: Vec::new(),
            lecturers: Vec::new(),
            room_name: None,
            room_url: None,
            extra: None,
        }
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_lecturers(mut self, lecturers: Vec<Lecturer>) -> Self {
        self.lecturers = lecturers;
        self
    }

    pub fn with_room(mut self, name: impl Into<String>, url: Option<String>) -> Self {
        self.room_name = Some(name.into());
        self.room_url = url;
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Orders items by `(start, end, subject, type)`.
    ///
    /// This is both the per-schedule sort key and the merge comparator.
    /// Group membership is not part of the key: the same class seen from
    /// two groups must sort next to itself.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
            .then_with(|| self.subject.cmp(&other.subject))
            .then_with(|| self.kind.cmp(&other.kind))
    }

    /// Returns true if both items describe the same real occurrence,
    /// possibly viewed from different groups.
    ///
    /// Lecturers must match element-wise, in order.
    pub fn same_occurrence(&self, other: &Self) -> bool {
        self.start == other.start
            && self.end == other.end
            && self.subject == other.subject
            && self.kind == other.kind
            && self.extra == other.extra
            && self.lecturers == other.lecturers
            && self.room_name == other.room_name
            && self.room_url == other.room_url
    }

    /// Appends groups not already present, keeping existing order.
    pub fn absorb_groups(&mut self, groups: Vec<String>) {
        for group in groups {
            if !self.groups.contains(&group) {
                self.groups.push(group);
            }
        }
    }
}

/// One entity's schedule for a selected period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub header: ScheduleHeader,
    /// Sorted by [`ScheduleItem::chronological_cmp`].
    pub items: Vec<ScheduleItem>,
}

impl Schedule {
    /// Creates a schedule, sorting the items into chronological order.
    pub fn new(header: ScheduleHeader, mut items: Vec<ScheduleItem>) -> Self {
        items.sort_by(ScheduleItem::chronological_cmp);
        Self { header, items }
    }
}

/// Several schedules merged into one deduplicated timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSchedule {
    /// One header per source schedule, in request order.
    pub headers: Vec<ScheduleHeader>,
    pub items: Vec<ScheduleItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 10, 7, h, m, 0)
            .unwrap()
    }

    #[test]
    fn schedule_type_codes() {
        for schedule_type in ScheduleType::ALL {
            assert_eq!(
                ScheduleType::from_code(schedule_type.code()),
                Some(schedule_type)
            );
        }
        assert_eq!(ScheduleType::from_code("g"), None);
        assert_eq!(ScheduleType::from_code("X"), None);
    }

    #[test]
    fn schedule_type_from_str() {
        assert_eq!("G".parse::<ScheduleType>(), Ok(ScheduleType::Group));
        assert_eq!(" room ".parse::<ScheduleType>(), Ok(ScheduleType::Room));
        assert_eq!("Lecturer".parse::<ScheduleType>(), Ok(ScheduleType::Lecturer));
        assert!("student".parse::<ScheduleType>().is_err());
    }

    #[test]
    fn schedule_type_serializes_as_code() {
        assert_eq!(
            serde_json::to_string(&ScheduleType::Lecturer).unwrap(),
            "\"N\""
        );
        let parsed: ScheduleType = serde_json::from_str("\"S\"").unwrap();
        assert_eq!(parsed, ScheduleType::Room);
    }

    #[test]
    fn chronological_order_uses_start_end_subject_type() {
        let a = ScheduleItem::new(at(9, 0), at(10, 30), "Math", "wykład");
        let later_start = ScheduleItem::new(at(9, 15), at(10, 0), "Art", "wykład");
        let later_end = ScheduleItem::new(at(9, 0), at(11, 0), "Art", "wykład");
        let other_subject = ScheduleItem::new(at(9, 0), at(10, 30), "Physics", "ćwiczenia");
        let other_type = ScheduleItem::new(at(9, 0), at(10, 30), "Math", "seminarium");
        let non_ascii_type = ScheduleItem::new(at(9, 0), at(10, 30), "Math", "ćwiczenia");

        assert_eq!(a.chronological_cmp(&later_start), Ordering::Less);
        assert_eq!(a.chronological_cmp(&later_end), Ordering::Less);
        assert_eq!(a.chronological_cmp(&other_subject), Ordering::Less);
        assert_eq!(other_type.chronological_cmp(&a), Ordering::Less);
        // Byte order: 'ć' (0xC4 0x87) sorts after 'w'.
        assert_eq!(non_ascii_type.chronological_cmp(&a), Ordering::Greater);
    }

    #[test]
    fn zero_moodle_course_id_is_absent() {
        let lecturer = Lecturer::new("dr Jan Nowak").with_moodle_course_id(Some(0));
        assert_eq!(lecturer.moodle_course_id, None);
        assert_eq!(
            serde_json::to_string(&lecturer).unwrap(),
            r#"{"name":"dr Jan Nowak"}"#
        );
        assert_eq!(lecturer, Lecturer::new("dr Jan Nowak"));
        assert_eq!(
            Lecturer::new("x").with_moodle_course_id(Some(7)).moodle_course_id,
            Some(7)
        );
    }

    #[test]
    fn chronological_order_ignores_groups() {
        let a = ScheduleItem::new(at(9, 0), at(10, 30), "Math", "wykład")
            .with_groups(vec!["A".to_string()]);
        let b = a.clone().with_groups(vec!["B".to_string()]);
        assert_eq!(a.chronological_cmp(&b), Ordering::Equal);
        assert!(a.same_occurrence(&b));
    }

    #[test]
    fn same_occurrence_requires_identical_lecturers_in_order() {
        let base = ScheduleItem::new(at(9, 0), at(10, 30), "Math", "wykład").with_lecturers(vec![
            Lecturer::new("dr Nowak"),
            Lecturer::new("dr Kowalski").with_moodle_course_id(Some(12)),
        ]);

        let reordered = base.clone().with_lecturers(vec![
            Lecturer::new("dr Kowalski").with_moodle_course_id(Some(12)),
            Lecturer::new("dr Nowak"),
        ]);
        assert!(!base.same_occurrence(&reordered));

        let other_moodle = base.clone().with_lecturers(vec![
            Lecturer::new("dr Nowak"),
            Lecturer::new("dr Kowalski").with_moodle_course_id(Some(13)),
        ]);
        assert!(!base.same_occurrence(&other_moodle));

        let other_room = base.clone().with_room("Paw. A 101", None);
        assert!(!base.same_occurrence(&other_room));

        let other_extra = base.clone().with_extra("odwołane");
        assert!(!base.same_occurrence(&other_extra));
    }

    #[test]
    fn absorb_groups_keeps_order_and_skips_known() {
        let mut item = ScheduleItem::new(at(9, 0), at(10, 30), "Math", "wykład")
            .with_groups(vec!["A".to_string(), "B".to_string()]);
        item.absorb_groups(vec!["C".to_string(), "A".to_string(), "D".to_string()]);
        assert_eq!(item.groups, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn schedule_new_sorts_items() {
        let late = ScheduleItem::new(at(12, 0), at(13, 30), "Late", "wykład");
        let early = ScheduleItem::new(at(8, 0), at(9, 30), "Early", "wykład");
        let schedule = Schedule::new(ScheduleHeader::new(1, "A"), vec![late, early]);
        assert_eq!(schedule.items[0].subject, "Early");
        assert_eq!(schedule.items[1].subject, "Late");
    }

    #[test]
    fn item_json_shape() {
        let item = ScheduleItem::new(at(9, 45), at(11, 15), "Mikroekonomia", "wykład")
            .with_groups(vec!["KrDZEk1011".to_string()])
            .with_lecturers(vec![
                Lecturer::new("dr Jan Nowak").with_moodle_course_id(Some(4321)),
            ])
            .with_room("Paw. A 101", None);

        insta::assert_json_snapshot!(item, @r#"
        {
          "start": "2024-10-07T09:45:00+02:00",
          "end": "2024-10-07T11:15:00+02:00",
          "subject": "Mikroekonomia",
          "type": "wykład",
          "groups": [
            "KrDZEk1011"
          ],
          "lecturers": [
            {
              "name": "dr Jan Nowak",
              "moodleCourseId": 4321
            }
          ],
          "roomName": "Paw. A 101"
        }
        "#);
    }
}
