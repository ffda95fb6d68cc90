//! `planzajec groupings`

use planzajec_core::{Grouping, OutputFormat, render_json};

use super::Session;
use crate::error::{ClientError, ClientResult};

/// Fetches all groupings and renders them.
pub async fn run(session: &Session, format: OutputFormat) -> ClientResult<String> {
    let groupings = session
        .client
        .fetch_groupings(&session.params, &session.cancel)
        .await?;
    render(&groupings, format)
}

pub fn render(groupings: &[Grouping], format: OutputFormat) -> ClientResult<String> {
    match format {
        OutputFormat::Json => Ok(render_json(groupings)?),
        OutputFormat::Table => Ok(groupings
            .iter()
            .map(|g| format!("{}  {}", g.schedule_type.code(), g.name))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Ics => Err(ClientError::Output(
            "ics output is only available for schedules".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{BASE_URL, record, replay_session};

    const GROUPINGS: &str = r#"<plan-zajec>
  <grupowanie typ="G" grupa="Kolegium Ekonomii"/>
  <grupowanie typ="S" grupa="Paw. A"/>
</plan-zajec>"#;

    #[tokio::test]
    async fn renders_replayed_groupings() {
        let dir = tempfile::tempdir().unwrap();
        record(dir.path(), &format!("{}?xml", BASE_URL), GROUPINGS);
        let session = replay_session(dir.path());

        let table = run(&session, OutputFormat::Table).await.unwrap();
        assert_eq!(table, "G  Kolegium Ekonomii\nS  Paw. A");

        let json = run(&session, OutputFormat::Json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "Kolegium Ekonomii");
        assert_eq!(value[0]["type"], "G");
    }

    #[test]
    fn ics_is_rejected() {
        let err = render(&[], OutputFormat::Ics).unwrap_err();
        assert!(matches!(err, ClientError::Output(_)));
    }
}
