//! # Raw Source Events
//!
//! The verbatim movement/event record fetched from the prison source system.
//! Immutable once fetched; ordering key is `event_datetime`.
//!
//! Source timestamps arrive in two shapes: naive local strings
//! (`2021-06-08T14:41:11.526762`) and explicit-offset RFC 3339 strings
//! (`2021-06-08T13:41:11.0709360Z`). Both are normalized to UTC at the
//! deserialization boundary, naive values being read as UTC; this is the
//! single place to change if real payload samples show a civil reference
//! zone. Republication renders the normalized instant in the naive
//! six-digit-fraction form, so an explicit-offset source literal is
//! deliberately not reproduced byte for byte; the instant is identical.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A raw movement/event record from the prison source system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffenderEvent {
    pub event_type: String,

    #[serde(
        serialize_with = "serialize_event_datetime",
        deserialize_with = "deserialize_event_datetime"
    )]
    pub event_datetime: DateTime<Utc>,

    /// NOMS number of the subject, when the event concerns a person
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offender_id_display: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement_seq: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_location_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_booking_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_note_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_note_type: Option<String>,

    /// Any source fields we do not model, preserved for verbatim republication
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl OffenderEvent {
    /// Routing `code` attribute for the raw-event publish: an alert code when
    /// present, else `"{movementType}-{directionCode}"` when both are present
    pub fn code_attribute(&self) -> Option<String> {
        if let Some(alert) = &self.alert_code {
            return Some(alert.clone());
        }
        match (&self.movement_type, &self.direction_code) {
            (Some(movement), Some(direction)) => Some(format!("{movement}-{direction}")),
            _ => None,
        }
    }
}

fn serialize_event_datetime<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
}

fn deserialize_event_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_event_datetime(&raw).map_err(serde::de::Error::custom)
}

/// Parse a source timestamp, accepting both offset-carrying and naive forms
pub fn parse_event_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("unparseable event timestamp '{raw}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parses_naive_timestamp_as_utc() {
        let parsed = parse_event_datetime("2021-06-08T14:41:11.526762").unwrap();
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2021, 6, 8, 14, 41, 11).unwrap()
                + chrono::Duration::microseconds(526_762)
        );
    }

    #[test]
    fn test_parses_explicit_utc_timestamp() {
        let parsed = parse_event_datetime("2021-06-08T13:41:11.0709360Z").unwrap();
        assert_eq!(parsed.timestamp(), 1623159671);
    }

    #[test]
    fn test_rejects_garbage_timestamp() {
        assert!(parse_event_datetime("not-a-timestamp").is_err());
    }

    #[test]
    fn test_deserializes_reception_event_with_extras() {
        let json = r#"{
            "eventType": "OFFENDER_MOVEMENT-RECEPTION",
            "eventDatetime": "2021-06-08T14:41:11.526762",
            "offenderIdDisplay": "A1234BC",
            "bookingId": 1200835,
            "movementSeq": 2,
            "movementType": "ADM",
            "directionCode": "IN",
            "nomisEventType": "OFF_RECEP_OASYS"
        }"#;
        let event: OffenderEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, "OFFENDER_MOVEMENT-RECEPTION");
        assert_eq!(event.offender_id_display.as_deref(), Some("A1234BC"));
        assert_eq!(event.booking_id, Some(1200835));
        assert_eq!(
            event.extra.get("nomisEventType"),
            Some(&Value::String("OFF_RECEP_OASYS".to_string()))
        );
    }

    #[test]
    fn test_republished_json_round_trips_unknown_fields() {
        let json = r#"{"eventType":"ALERT","eventDatetime":"2021-06-08T14:41:11.526762","alertCode":"XA","alertSeq":3}"#;
        let event: OffenderEvent = serde_json::from_str(json).unwrap();
        let republished = serde_json::to_string(&event).unwrap();
        assert!(republished.contains("\"alertSeq\":3"));
        assert!(republished.contains("\"alertCode\":\"XA\""));
    }

    #[test]
    fn test_republished_timestamp_is_normalized_naive_utc() {
        let json = r#"{"eventType":"ALERT","eventDatetime":"2021-06-08T13:41:11.0709360Z"}"#;
        let event: OffenderEvent = serde_json::from_str(json).unwrap();
        let republished = serde_json::to_string(&event).unwrap();
        // same instant, canonical six-digit naive form
        assert!(republished.contains("\"eventDatetime\":\"2021-06-08T13:41:11.070936\""));
    }

    #[test]
    fn test_code_attribute_prefers_alert_code() {
        let json = r#"{"eventType":"ALERT","eventDatetime":"2021-06-08T14:41:11.526762","alertCode":"XA","movementType":"REL","directionCode":"OUT"}"#;
        let event: OffenderEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.code_attribute().as_deref(), Some("XA"));
    }

    #[test]
    fn test_code_attribute_from_movement_and_direction() {
        let json = r#"{"eventType":"OFFENDER_MOVEMENT-DISCHARGE","eventDatetime":"2021-06-08T14:41:11.526762","movementType":"REL","directionCode":"OUT"}"#;
        let event: OffenderEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.code_attribute().as_deref(), Some("REL-OUT"));
    }

    #[test]
    fn test_code_attribute_absent_without_codes() {
        let json = r#"{"eventType":"BOOKING_NUMBER-CHANGED","eventDatetime":"2021-06-08T14:41:11.526762","bookingId":99}"#;
        let event: OffenderEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.code_attribute(), None);
    }
}
