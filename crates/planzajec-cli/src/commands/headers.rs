//! `planzajec headers`

use planzajec_core::{OutputFormat, ScheduleHeader, ScheduleType, render_json};

use super::Session;
use crate::error::{ClientError, ClientResult};

/// Fetches the entities of one type inside a grouping and renders them.
pub async fn run(
    session: &Session,
    schedule_type: ScheduleType,
    grouping: &str,
    format: OutputFormat,
) -> ClientResult<String> {
    let headers = session
        .client
        .fetch_headers(&session.params, schedule_type, grouping, &session.cancel)
        .await?;
    render(&headers, format)
}

pub fn render(headers: &[ScheduleHeader], format: OutputFormat) -> ClientResult<String> {
    match format {
        OutputFormat::Json => Ok(render_json(headers)?),
        OutputFormat::Table => {
            let width = headers
                .iter()
                .map(|h| h.id.to_string().len())
                .max()
                .unwrap_or(0);
            Ok(headers
                .iter()
                .map(|h| format!("{:>width$}  {}", h.id, h.name, width = width))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        OutputFormat::Ics => Err(ClientError::Output(
            "ics output is only available for schedules".to_string(),
        )),
    }
}
