//! Merging of per-entity schedules.
//!
//! Each source schedule is already sorted by
//! [`ScheduleItem::chronological_cmp`]. The merge walks one cursor per
//! source, repeatedly takes the smallest head item and either appends it or,
//! when it is the same occurrence as the last appended item, folds its groups
//! into that item.
//!
//! Only the last appended item is inspected. Duplicates are adjacent because
//! the sort key leaves out the group, which is the one field that differs
//! between two views of the same class.

use std::iter::Peekable;
use std::vec::IntoIter;

use crate::schedule::{AggregateSchedule, Schedule, ScheduleItem};

/// Merges sorted schedules into one deduplicated, sorted aggregate.
///
/// Headers keep the order of `schedules`. Ties between sources are resolved
/// in favour of the earlier source.
pub fn merge_schedules(schedules: Vec<Schedule>) -> AggregateSchedule {
    let total_items = schedules.iter().map(|s| s.items.len()).sum();
    let mut headers = Vec::with_capacity(schedules.len());
    let mut cursors: Vec<Peekable<IntoIter<ScheduleItem>>> = Vec::with_capacity(schedules.len());

    for schedule in schedules {
        headers.push(schedule.header);
        cursors.push(schedule.items.into_iter().peekable());
    }

    let mut items: Vec<ScheduleItem> = Vec::with_capacity(total_items);

    while let Some(next) = take_smallest(&mut cursors) {
        match items.last_mut() {
            Some(previous) if previous.same_occurrence(&next) => {
                previous.absorb_groups(next.groups);
            }
            _ => items.push(next),
        }
    }

    AggregateSchedule { headers, items }
}

/// Advances the cursor whose head compares smallest and returns that head.
fn take_smallest(cursors: &mut [Peekable<IntoIter<ScheduleItem>>]) -> Option<ScheduleItem> {
    let mut smallest: Option<(usize, &ScheduleItem)> = None;

    for (index, cursor) in cursors.iter_mut().enumerate() {
        let Some(candidate) = cursor.peek() else {
            continue;
        };

        let is_smaller = match smallest {
            Some((_, current)) => current.chronological_cmp(candidate).is_gt(),
            None => true,
        };
        if is_smaller {
            smallest = Some((index, candidate));
        }
    }

    let (index, _) = smallest?;
    cursors[index].next()
}
