//! `planzajec schedule`

use chrono::Utc;
use planzajec_core::{
    AggregateSchedule, ExportOptions, OutputFormat, ScheduleCalendar, ScheduleExport,
    SchedulePeriod, ScheduleType, render_ics, render_json, render_table,
};
use tracing::debug;

use super::Session;
use crate::error::ClientResult;

/// Fetches, merges and renders the schedules of `ids`.
pub async fn run(
    session: &Session,
    schedule_type: ScheduleType,
    ids: &[i64],
    period_index: usize,
    format: OutputFormat,
    options: &ExportOptions,
) -> ClientResult<String> {
    let (aggregate, periods) = session
        .client
        .fetch_aggregate_schedule(
            &session.params,
            schedule_type,
            ids,
            period_index,
            &session.cancel,
        )
        .await?;
    debug!(format = %format, hidden = options.hidden_subjects.len(), "Rendering schedule");

    render(
        &aggregate,
        &periods,
        format,
        options,
        session.client.calendar(),
    )
}

pub fn render(
    aggregate: &AggregateSchedule,
    periods: &[SchedulePeriod],
    format: OutputFormat,
    options: &ExportOptions,
    calendar: &ScheduleCalendar,
) -> ClientResult<String> {
    match format {
        OutputFormat::Json => Ok(render_json(&ScheduleExport {
            aggregate_schedule: aggregate,
            periods,
        })?),
        OutputFormat::Ics => Ok(render_ics(aggregate, options, Utc::now())),
        OutputFormat::Table => Ok(render_table(aggregate, options, calendar)),
    }
}
