use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::geo::{CoordinateError, ValidatedCoordinate};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` characters followed by `...`, as shown in the list.
    #[must_use]
    pub fn preview(&self, len: usize) -> String {
        let head: String = self.0.chars().take(len).collect();
        format!("{head}...")
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupStatus {
    Received,
    InProgress,
    Done,
    NotADefect,
    #[default]
    Unknown,
}

impl GroupStatus {
    /// Accepts both the enum literals and the labels the backend stores.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            "RECEIVED" | "접수됨" => Self::Received,
            "IN_PROGRESS" | "처리중" => Self::InProgress,
            "DONE" | "완료" => Self::Done,
            "NOT_A_DEFECT" | "포트홀아님" => Self::NotADefect,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Received => "#dc3545",
            Self::InProgress => "#fd7e14",
            Self::Done => "#198754",
            Self::NotADefect => "#6c757d",
            Self::Unknown => "#0d6efd",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Received => "Received",
            Self::InProgress => "In progress",
            Self::Done => "Done",
            Self::NotADefect => "Not a defect",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportedAt {
    Parsed(NaiveDateTime),
    Raw(String),
    Missing,
}

impl ReportedAt {
    fn parse(raw: &str) -> Self {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Self::Parsed(dt.naive_local());
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map_or_else(|| Self::Raw(raw.to_string()), Self::Parsed)
    }

    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Parsed(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Self::Raw(raw) => raw.clone(),
            Self::Missing => String::new(),
        }
    }
}

/// Why a record was skipped or degraded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordIssue {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no usable group_id")]
    MissingId,
    #[error("group_id {0} already appeared earlier in the listing")]
    DuplicateId(GroupId),
    #[error("status is missing")]
    MissingStatus,
    #[error("unrecognized status {0:?}")]
    UnrecognizedStatus(String),
    #[error("coordinate is missing")]
    MissingCoordinate,
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),
    #[error("unparseable latest_reported_at {0:?}")]
    InvalidTimestamp(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub group_id: GroupId,
    /// `None` for records whose coordinate was missing or invalid.
    pub location: Option<ValidatedCoordinate>,
    pub status: GroupStatus,
    /// Text shown on the status badge, as sent by the server.
    pub status_text: String,
    pub report_count: u32,
    pub report_ids: Vec<String>,
    pub latest_reported_at: ReportedAt,
}

/// A decoded group together with the degradations applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRecord {
    pub group: Group,
    pub issues: Vec<RecordIssue>,
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn read_location(obj: &Map<String, Value>) -> Result<ValidatedCoordinate, RecordIssue> {
    let lat = obj.get("latitude").and_then(Value::as_f64);
    let lng = obj.get("longitude").and_then(Value::as_f64);
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(ValidatedCoordinate::new(lat, lng)?),
        _ => Err(RecordIssue::MissingCoordinate),
    }
}

impl Group {
    /// Decodes one raw group record.
    ///
    /// Only an unidentifiable record is rejected; anything else degrades the
    /// affected field and is reported in [`GroupRecord::issues`].
    pub fn from_json(value: &Value) -> Result<GroupRecord, RecordIssue> {
        let obj = value.as_object().ok_or(RecordIssue::NotAnObject)?;
        let group_id = obj
            .get("group_id")
            .and_then(scalar_text)
            .map(GroupId)
            .ok_or(RecordIssue::MissingId)?;

        let mut issues = Vec::new();

        let location = read_location(obj)
            .map_err(|issue| issues.push(issue))
            .ok();

        let (status, status_text) = match obj.get("status").and_then(Value::as_str) {
            Some(text) => {
                let status = GroupStatus::from_wire(text);
                if status == GroupStatus::Unknown {
                    issues.push(RecordIssue::UnrecognizedStatus(text.to_string()));
                }
                (status, text.to_string())
            }
            None => {
                issues.push(RecordIssue::MissingStatus);
                (GroupStatus::Unknown, GroupStatus::Unknown.label().to_string())
            }
        };

        let report_ids: Vec<String> = obj
            .get("report_ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(scalar_text).collect())
            .unwrap_or_default();

        let report_count = obj
            .get("report_count")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or_else(|| u32::try_from(report_ids.len()).unwrap_or(u32::MAX));

        let latest_reported_at = match obj.get("latest_reported_at").and_then(Value::as_str) {
            Some(raw) => {
                let parsed = ReportedAt::parse(raw);
                if let ReportedAt::Raw(raw) = &parsed {
                    issues.push(RecordIssue::InvalidTimestamp(raw.clone()));
                }
                parsed
            }
            None => ReportedAt::Missing,
        };

        Ok(GroupRecord {
            group: Group {
                group_id,
                location,
                status,
                status_text,
                report_count,
                report_ids,
                latest_reported_at,
            },
            issues,
        })
    }
}

/// Result of decoding the whole group listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedGroups {
    pub groups: Vec<Group>,
    pub skipped: usize,
    pub degraded: usize,
}

/// Decodes every record independently; a bad record never aborts the rest.
///
/// The first record carrying a given id wins; later ones are skipped.
pub fn decode_groups(values: &[Value]) -> DecodedGroups {
    let mut out = DecodedGroups::default();
    let mut seen = HashSet::new();
    for (position, value) in values.iter().enumerate() {
        let decoded = Group::from_json(value).and_then(|record| {
            if seen.insert(record.group.group_id.clone()) {
                Ok(record)
            } else {
                Err(RecordIssue::DuplicateId(record.group.group_id))
            }
        });
        match decoded {
            Ok(GroupRecord { group, issues }) => {
                if !issues.is_empty() {
                    out.degraded += 1;
                    for issue in &issues {
                        warn!(group_id = %group.group_id, %issue, "degraded pothole group record");
                    }
                }
                out.groups.push(group);
            }
            Err(issue) => {
                out.skipped += 1;
                warn!(position, %issue, "skipped pothole group record");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "group_id": "9f1c2d3e-aaaa-bbbb-cccc-1234567890ab",
            "latitude": 37.8813,
            "longitude": 127.73,
            "status": "접수됨",
            "report_count": 3,
            "report_ids": [11, 12, 15],
            "latest_reported_at": "2024-05-02T09:15:30.123456"
        })
    }

    #[test]
    fn decodes_well_formed_record() {
        let record = Group::from_json(&sample()).unwrap();
        assert!(record.issues.is_empty(), "{:?}", record.issues);
        let group = record.group;
        assert_eq!(group.status, GroupStatus::Received);
        assert_eq!(group.status_text, "접수됨");
        assert_eq!(group.report_count, 3);
        assert_eq!(group.report_ids, vec!["11", "12", "15"]);
        assert_eq!(group.location.map(ValidatedCoordinate::lat), Some(37.8813));
        assert_eq!(group.latest_reported_at.display(), "2024-05-02 09:15:30");
    }

    #[test]
    fn accepts_enum_literals() {
        assert_eq!(GroupStatus::from_wire("IN_PROGRESS"), GroupStatus::InProgress);
        assert_eq!(GroupStatus::from_wire("DONE"), GroupStatus::Done);
        assert_eq!(GroupStatus::from_wire("포트홀아님"), GroupStatus::NotADefect);
        assert_eq!(GroupStatus::from_wire("archived"), GroupStatus::Unknown);
    }

    #[test]
    fn status_colors_are_total() {
        assert_eq!(GroupStatus::Received.color(), "#dc3545");
        assert_eq!(GroupStatus::InProgress.color(), "#fd7e14");
        assert_eq!(GroupStatus::Done.color(), "#198754");
        assert_eq!(GroupStatus::NotADefect.color(), "#6c757d");
        assert_eq!(GroupStatus::Unknown.color(), "#0d6efd");
    }

    #[test]
    fn unknown_status_degrades() {
        let mut value = sample();
        value["status"] = json!("보류");
        let record = Group::from_json(&value).unwrap();
        assert_eq!(record.group.status, GroupStatus::Unknown);
        assert_eq!(record.group.status_text, "보류");
        assert_eq!(record.issues, vec![RecordIssue::UnrecognizedStatus("보류".into())]);
    }

    #[test]
    fn missing_coordinate_keeps_record() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("longitude");
        let record = Group::from_json(&value).unwrap();
        assert!(record.group.location.is_none());
        assert_eq!(record.issues, vec![RecordIssue::MissingCoordinate]);
    }

    #[test]
    fn out_of_range_coordinate_keeps_record() {
        let mut value = sample();
        value["latitude"] = json!(123.0);
        let record = Group::from_json(&value).unwrap();
        assert!(record.group.location.is_none());
        assert!(matches!(record.issues[0], RecordIssue::InvalidCoordinate(_)));
    }

    #[test]
    fn missing_id_is_rejected() {
        let mut value = sample();
        value["group_id"] = json!("  ");
        assert_eq!(Group::from_json(&value), Err(RecordIssue::MissingId));
        assert_eq!(Group::from_json(&json!([1, 2])), Err(RecordIssue::NotAnObject));
    }

    #[test]
    fn numeric_id_and_derived_count() {
        let value = json!({
            "group_id": 42,
            "latitude": 37.0,
            "longitude": 127.0,
            "status": "DONE",
            "report_ids": ["a", "b"],
            "latest_reported_at": "2024-05-02T09:15:30Z"
        });
        let group = Group::from_json(&value).unwrap().group;
        assert_eq!(group.group_id.as_str(), "42");
        assert_eq!(group.report_count, 2);
        assert_eq!(group.latest_reported_at.display(), "2024-05-02 09:15:30");
    }

    #[test]
    fn garbage_timestamp_is_kept_raw() {
        let mut value = sample();
        value["latest_reported_at"] = json!("yesterday");
        let record = Group::from_json(&value).unwrap();
        assert_eq!(record.group.latest_reported_at, ReportedAt::Raw("yesterday".into()));
        assert_eq!(record.group.latest_reported_at.display(), "yesterday");
    }

    #[test]
    fn bad_records_do_not_abort_the_batch() {
        let mut degraded = sample();
        degraded["group_id"] = json!("second");
        degraded["status"] = Value::Null;
        let values = vec![sample(), json!("nonsense"), degraded, json!({"latitude": 1.0})];

        let decoded = decode_groups(&values);
        assert_eq!(decoded.groups.len(), 2);
        assert_eq!(decoded.skipped, 2);
        assert_eq!(decoded.degraded, 1);
        assert_eq!(decoded.groups[1].status, GroupStatus::Unknown);
    }

    #[test]
    fn repeated_ids_keep_the_first_record() {
        let mut numeric = sample();
        numeric["group_id"] = json!(42);
        let mut textual = sample();
        textual["group_id"] = json!("42");
        textual["status"] = json!("DONE");
        let values = vec![numeric, sample(), textual, sample()];

        let decoded = decode_groups(&values);
        let ids: Vec<&str> = decoded.groups.iter().map(|g| g.group_id.as_str()).collect();
        assert_eq!(ids, ["42", "9f1c2d3e-aaaa-bbbb-cccc-1234567890ab"]);
        assert_eq!(decoded.skipped, 2);
        assert_eq!(decoded.groups[0].status, GroupStatus::Received);
    }

    #[test]
    fn preview_truncates_by_character() {
        let id = GroupId::new("9f1c2d3e-aaaa");
        assert_eq!(id.preview(8), "9f1c2d3e...");
        assert_eq!(GroupId::new("abc").preview(8), "abc...");
    }
}
