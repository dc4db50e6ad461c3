//! Session document: the persisted per-sender transcript.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::element::Element;
use crate::db::Fields;
use crate::error::{PagerError, Result};

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
pub const SYNCED_AT: &str = "syncedAt";
pub const CLAIMED_BY: &str = "claimedBy";
pub const ELEMENTS: &str = "elements";

/// Typed view of a session document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDocument {
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// When the session was last claimed.
    pub synced_at: Option<DateTime<Utc>>,
    /// Sender token holding the session; `None` while unclaimed.
    pub claimed_by: Option<String>,
    /// Document order is insertion order.
    pub elements: Vec<Element>,
}

impl SessionDocument {
    /// A fresh, unclaimed, empty session.
    pub const fn unclaimed(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: None,
            synced_at: None,
            claimed_by: None,
            elements: Vec::new(),
        }
    }

    pub const fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }

    /// Whether `token` may write to this session: it is unclaimed or already theirs.
    pub fn is_open_to(&self, token: &str) -> bool {
        self.claimed_by.as_deref().is_none_or(|owner| owner == token)
    }

    /// Load from stored fields.
    ///
    /// `createdAt` is required. A missing or empty `claimedBy` means
    /// unclaimed, missing `elements` means empty, missing or null
    /// `updatedAt`/`syncedAt` mean never. Any field present with the wrong
    /// type is a [`PagerError::MalformedDocument`].
    pub fn from_fields(fields: &Fields) -> Result<Self> {
        let created_at = optional_timestamp(fields, CREATED_AT)?
            .ok_or_else(|| malformed(CREATED_AT, "missing"))?;

        let claimed_by = match fields.get(CLAIMED_BY) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(malformed(CLAIMED_BY, "expected a string")),
        };

        let elements = match fields.get(ELEMENTS) {
            None | Some(Value::Null) => Vec::new(),
            Some(v @ Value::Array(_)) => serde_json::from_value(v.clone())
                .map_err(|e| malformed(ELEMENTS, &e.to_string()))?,
            Some(_) => return Err(malformed(ELEMENTS, "expected an array")),
        };

        Ok(Self {
            created_at,
            updated_at: optional_timestamp(fields, UPDATED_AT)?,
            synced_at: optional_timestamp(fields, SYNCED_AT)?,
            claimed_by,
            elements,
        })
    }

    /// Convert to stored fields. An unclaimed session stores `claimedBy` as "".
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(CREATED_AT.into(), Value::String(format_timestamp(self.created_at)));
        fields.insert(
            UPDATED_AT.into(),
            self.updated_at
                .map_or(Value::Null, |t| Value::String(format_timestamp(t))),
        );
        fields.insert(
            SYNCED_AT.into(),
            self.synced_at
                .map_or(Value::Null, |t| Value::String(format_timestamp(t))),
        );
        fields.insert(
            CLAIMED_BY.into(),
            Value::String(self.claimed_by.clone().unwrap_or_default()),
        );
        fields.insert(
            ELEMENTS.into(),
            Value::Array(
                self.elements
                    .iter()
                    .map(|e| serde_json::to_value(e).unwrap_or(Value::Null))
                    .collect(),
            ),
        );
        fields
    }
}

/// Fixed-width UTC timestamp; lexicographic order matches time order.
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a timestamp string flexibly from various formats.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    None
}

fn optional_timestamp(fields: &Fields, key: &str) -> Result<Option<DateTime<Utc>>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| malformed(key, &format!("invalid timestamp {s:?}"))),
        Some(_) => Err(malformed(key, "expected a timestamp string")),
    }
}

fn malformed(key: &str, why: &str) -> PagerError {
    PagerError::MalformedDocument(format!("{key}: {why}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ElementKind;
    use serde_json::json;

    fn fields(v: Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn loads_provisioned_document() {
        let doc = SessionDocument::from_fields(&fields(json!({
            "createdAt": "2024-05-01T12:00:00.000000Z",
            "claimedBy": "",
        })))
        .unwrap();
        assert!(!doc.is_claimed());
        assert!(doc.elements.is_empty());
        assert_eq!(doc.updated_at, None);
        assert!(doc.is_open_to("anyone"));
    }

    #[test]
    fn claimed_document_is_only_open_to_owner() {
        let mut doc = SessionDocument::unclaimed(Utc::now());
        doc.claimed_by = Some("tok-a".into());
        assert!(doc.is_open_to("tok-a"));
        assert!(!doc.is_open_to("tok-b"));
    }

    #[test]
    fn round_trips_through_fields() {
        let mut doc = SessionDocument::unclaimed(Utc::now());
        doc.updated_at = Some(Utc::now());
        doc.claimed_by = Some("tok".into());
        doc.elements
            .push(Element::from_text(ElementKind::OrderedList, "a\nb"));

        let back = SessionDocument::from_fields(&doc.to_fields()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn wrong_claim_type_is_malformed() {
        let result = SessionDocument::from_fields(&fields(json!({
            "createdAt": "2024-05-01T12:00:00Z",
            "claimedBy": 42,
        })));
        assert!(matches!(result, Err(PagerError::MalformedDocument(_))));
    }

    #[test]
    fn missing_created_at_is_malformed() {
        let result = SessionDocument::from_fields(&fields(json!({"claimedBy": ""})));
        assert!(matches!(result, Err(PagerError::MalformedDocument(_))));
    }

    #[test]
    fn bad_elements_are_malformed() {
        let result = SessionDocument::from_fields(&fields(json!({
            "createdAt": "2024-05-01T12:00:00Z",
            "elements": [{"Type": "blink", "Content": "x"}],
        })));
        assert!(matches!(result, Err(PagerError::MalformedDocument(_))));

        let result = SessionDocument::from_fields(&fields(json!({
            "createdAt": "2024-05-01T12:00:00Z",
            "elements": "nope",
        })));
        assert!(matches!(result, Err(PagerError::MalformedDocument(_))));
    }

    #[test]
    fn parses_sqlite_style_timestamps() {
        assert!(parse_timestamp("2024-05-01 12:00:00").is_some());
        assert!(parse_timestamp("2024-05-01 12:00:00.123").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
