//! Decoding of upstream `plan-zajec` documents.
//!
//! The same document shape answers every query: the grouping listing fills
//! `grupowanie`, header listings fill `zasob`, and schedules fill the
//! identity attributes, `okres` and `zajecia`. Field names follow the
//! upstream's Polish vocabulary.

use planzajec_core::{Grouping, ScheduleHeader, ScheduleType};
use serde::Deserialize;

/// Name of the document's root element.
const ROOT_ELEMENT: &str = "plan-zajec";

/// A decoded upstream document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScheduleDocument {
    /// Declared schedule type code.
    #[serde(rename = "@typ", default)]
    pub typ: String,
    /// Declared entity id.
    #[serde(rename = "@id", default)]
    pub id: String,
    /// The entity's own moodle course id (lecturer documents).
    #[serde(rename = "@idcel", default)]
    pub idcel: String,
    /// Declared entity name.
    #[serde(rename = "@nazwa", default)]
    pub nazwa: String,
    #[serde(rename = "okres", default)]
    pub periods: Vec<RawPeriod>,
    #[serde(rename = "grupowanie", default)]
    pub groupings: Vec<RawGrouping>,
    #[serde(rename = "zasob", default)]
    pub resources: Vec<RawResource>,
    #[serde(rename = "zajecia", default)]
    pub rows: Vec<RawRow>,
}

/// Raw period bounds (`YYYY-MM-DD`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawPeriod {
    #[serde(rename = "@od", default)]
    pub from: String,
    #[serde(rename = "@do", default)]
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawGrouping {
    #[serde(rename = "@typ", default)]
    pub typ: String,
    #[serde(rename = "@grupa", default)]
    pub name: String,
}

/// A header candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawResource {
    #[serde(rename = "@typ", default)]
    pub typ: String,
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(rename = "@nazwa", default)]
    pub name: String,
}

/// One raw class row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRow {
    /// Date, `YYYY-MM-DD`.
    #[serde(rename = "termin", default)]
    pub date: String,
    /// Start time, `HH:MM`.
    #[serde(rename = "od-godz", default)]
    pub start_time: String,
    /// End time, `HH:MM` optionally followed by an annotation.
    #[serde(rename = "do-godz", default)]
    pub end_time: String,
    #[serde(rename = "przedmiot", default)]
    pub subject: String,
    #[serde(rename = "typ", default)]
    pub kind: String,
    #[serde(rename = "nauczyciel", default)]
    pub lecturers: Vec<RawLecturer>,
    /// Room name, or an HTML anchor for online classes.
    #[serde(rename = "sala", default)]
    pub room: String,
    /// Comma-separated group names.
    #[serde(rename = "grupa", default)]
    pub groups: String,
    #[serde(rename = "uwagi", default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawLecturer {
    #[serde(rename = "@moodle", default)]
    pub moodle: String,
    #[serde(rename = "$text", default)]
    pub name: String,
}

/// Errors from decoding a document body.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("expected root element <plan-zajec>, found <{0}>")]
    UnexpectedRoot(String),

    #[error("document has no root element")]
    MissingRoot,

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    De(#[from] quick_xml::DeError),
}

/// Decodes a document body.
pub fn parse_document(body: &str) -> Result<ScheduleDocument, DecodeError> {
    check_root(body)?;
    Ok(quick_xml::de::from_str(body)?)
}

fn check_root(body: &str) -> Result<(), DecodeError> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_str(body);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                return if name == ROOT_ELEMENT {
                    Ok(())
                } else {
                    Err(DecodeError::UnexpectedRoot(name))
                };
            }
            Event::Eof => return Err(DecodeError::MissingRoot),
            _ => {}
        }
    }
}

impl ScheduleDocument {
    /// Valid groupings, in document order.
    ///
    /// Records with an unknown type or a blank name are skipped.
    pub fn extract_groupings(&self) -> Vec<Grouping> {
        self.groupings
            .iter()
            .filter_map(|raw| {
                let schedule_type = ScheduleType::from_code(&raw.typ)?;
                let name = raw.name.trim();
                if name.is_empty() {
                    return None;
                }
                Some(Grouping {
                    name: name.to_string(),
                    schedule_type,
                })
            })
            .collect()
    }

    /// Headers of the requested type, in document order.
    ///
    /// Records of another type, with a blank name or an unparseable id are
    /// skipped.
    pub fn extract_headers(&self, schedule_type: ScheduleType) -> Vec<ScheduleHeader> {
        self.resources
            .iter()
            .filter(|raw| ScheduleType::from_code(&raw.typ) == Some(schedule_type))
            .filter_map(|raw| {
                let name = raw.name.trim();
                if name.is_empty() {
                    return None;
                }
                let id = raw.id.trim().parse::<i64>().ok()?;
                Some(ScheduleHeader::new(id, name))
            })
            .collect()
    }
}
