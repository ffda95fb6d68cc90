//! iCalendar feed rendering.

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, Event, EventLike, Property};
use uuid::Uuid;

use super::{ExportOptions, moodle_course_url};
use crate::schedule::{AggregateSchedule, ScheduleItem};

const CALENDAR_NAME_PREFIX: &str = "(UEK) ";
const ORGANIZER_ADDRESS: &str = "mailto:unknown@invalid.invalid";
const ONLINE_LOCATION: &str = "Online";

/// Renders a merged schedule as an iCalendar document.
///
/// Items whose subject is hidden are skipped. `now` becomes the DTSTAMP of
/// every event.
pub fn render_ics(
    aggregate: &AggregateSchedule,
    options: &ExportOptions,
    now: DateTime<Utc>,
) -> String {
    let mut calendar = Calendar::new();
    calendar.name(&calendar_name(aggregate, options));

    for item in options.visible(&aggregate.items) {
        calendar.push(item_event(item, now));
    }

    calendar.done().to_string()
}

fn calendar_name(aggregate: &AggregateSchedule, options: &ExportOptions) -> String {
    let mut name = String::from(CALENDAR_NAME_PREFIX);
    name.push_str(
        &aggregate
            .headers
            .iter()
            .map(|h| h.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    );
    if !options.hidden_subjects.is_empty() {
        name.push_str(&format!(" (-{})", options.hidden_subjects.len()));
    }
    name
}

fn item_event(item: &ScheduleItem, now: DateTime<Utc>) -> Event {
    let mut event = Event::new();
    event
        .uid(&Uuid::new_v4().to_string())
        .sequence(0)
        .timestamp(now)
        .starts(item.start.with_timezone(&Utc))
        .ends(item.end.with_timezone(&Utc))
        .summary(&summary(item))
        .description(&description(item));

    if let Some(lecturer) = item.lecturers.first() {
        event.append_property(
            Property::new("ORGANIZER", ORGANIZER_ADDRESS)
                .add_parameter("CN", &lecturer.name)
                .done(),
        );
    }

    if let Some(room_name) = &item.room_name {
        let location = if item.room_url.is_some() {
            ONLINE_LOCATION
        } else {
            room_name.as_str()
        };
        event.location(location);
    }

    event.add_property("CATEGORIES", item.kind.as_str());
    event.done()
}

fn summary(item: &ScheduleItem) -> String {
    let marker = if item.extra.is_some() { "[!] " } else { "" };
    format!("{}[{}] {}", marker, item.kind, item.subject)
}

fn description(item: &ScheduleItem) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(extra) = &item.extra {
        sections.push(extra.clone());
    }
    if let Some(url) = &item.room_url {
        sections.push(url.clone());
    }
    if !item.lecturers.is_empty() {
        sections.push(
            item.lecturers
                .iter()
                .map(|lecturer| match lecturer.moodle_course_id {
                    Some(id) => format!("{} ({})", lecturer.name, moodle_course_url(id)),
                    None => lecturer.name.clone(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    if !item.groups.is_empty() {
        sections.push(item.groups.join(", "));
    }

    sections.join("\n\n")
}
