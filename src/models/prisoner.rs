//! # Prisoner and Recall Lookup Results
//!
//! Current subject state as returned by the prison API, and recall history
//! records from the probation API. Prisoner details are fetched fresh per
//! classification and represent "as of now" state, which may differ from the
//! state at the event timestamp.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Legal status of a prisoner, as reported by the prison source system.
/// Closed set: an unrecognized source code deserializes to `Unknown` via the
/// `other` variant so a new code surfaces as an explicit classification
/// decision, never a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegalStatus {
    Recall,
    CivilPrisoner,
    ConvictedUnsentenced,
    Sentenced,
    IndeterminateSentence,
    ImmigrationDetainee,
    Remand,
    Dead,
    Other,
    #[serde(other)]
    Unknown,
}

/// Current prisoner state from the prison API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrisonerDetails {
    pub offender_no: String,
    #[serde(default = "LegalStatus::default_unknown")]
    pub legal_status: LegalStatus,
    pub recall: bool,
    pub last_movement_type_code: String,
    pub last_movement_reason_code: String,
    pub status: String,
    pub latest_location_id: String,
}

impl LegalStatus {
    fn default_unknown() -> Self {
        LegalStatus::Unknown
    }
}

/// One recall referral from the probation system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recall {
    pub referral_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recall_rejected_or_withdrawn: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_recall: Option<bool>,
}

impl Recall {
    /// A recall that is either confirmed (`outcome_recall == true`) or still
    /// in progress and not rejected (`recall_rejected_or_withdrawn == false`)
    pub fn is_active_or_completed(&self) -> bool {
        self.outcome_recall == Some(true) || self.recall_rejected_or_withdrawn == Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_status_deserializes_screaming_snake() {
        let status: LegalStatus = serde_json::from_str("\"INDETERMINATE_SENTENCE\"").unwrap();
        assert_eq!(status, LegalStatus::IndeterminateSentence);
    }

    #[test]
    fn test_unrecognized_legal_status_maps_to_unknown() {
        let status: LegalStatus = serde_json::from_str("\"SOME_NEW_CODE\"").unwrap();
        assert_eq!(status, LegalStatus::Unknown);
    }

    #[test]
    fn test_recall_active_when_outcome_confirmed() {
        let recall = Recall {
            referral_date: NaiveDate::from_ymd_opt(2021, 5, 12).unwrap(),
            recall_rejected_or_withdrawn: None,
            outcome_recall: Some(true),
        };
        assert!(recall.is_active_or_completed());
    }

    #[test]
    fn test_recall_active_when_in_progress_and_not_rejected() {
        let recall = Recall {
            referral_date: NaiveDate::from_ymd_opt(2021, 5, 12).unwrap(),
            recall_rejected_or_withdrawn: Some(false),
            outcome_recall: None,
        };
        assert!(recall.is_active_or_completed());
    }

    #[test]
    fn test_recall_inactive_when_rejected() {
        let recall = Recall {
            referral_date: NaiveDate::from_ymd_opt(2021, 5, 12).unwrap(),
            recall_rejected_or_withdrawn: Some(true),
            outcome_recall: None,
        };
        assert!(!recall.is_active_or_completed());
    }

    #[test]
    fn test_recall_inactive_when_nothing_known() {
        let recall = Recall {
            referral_date: NaiveDate::from_ymd_opt(2021, 5, 12).unwrap(),
            recall_rejected_or_withdrawn: None,
            outcome_recall: None,
        };
        assert!(!recall.is_active_or_completed());
    }

    #[test]
    fn test_prisoner_details_deserializes_from_api_shape() {
        let json = r#"{
            "offenderNo": "A1234BC",
            "legalStatus": "SENTENCED",
            "recall": false,
            "lastMovementTypeCode": "ADM",
            "lastMovementReasonCode": "I",
            "status": "ACTIVE IN",
            "latestLocationId": "MDI"
        }"#;
        let details: PrisonerDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.legal_status, LegalStatus::Sentenced);
        assert!(!details.recall);
        assert_eq!(details.latest_location_id, "MDI");
    }
}
