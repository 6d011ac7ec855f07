//! # Classification Decision Tables
//!
//! Pure functions over small closed tagged unions. Every match is exhaustive,
//! so adding a new source code forces a compile-time decision rather than a
//! silent fallthrough.

use crate::models::outcomes::ReceiveReason;
use crate::models::prisoner::{LegalStatus, PrisonerDetails};

/// Movement type derived from the prison movement type code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovementType {
    TemporaryAbsence,
    Court,
    Transfer,
    Released,
    Admission,
    Other(String),
}

/// Derive the movement type from a raw movement type code
pub fn movement_type(code: &str) -> MovementType {
    match code {
        "TAP" => MovementType::TemporaryAbsence,
        "CRT" => MovementType::Court,
        "TRN" => MovementType::Transfer,
        "REL" => MovementType::Released,
        "ADM" => MovementType::Admission,
        other => MovementType::Other(other.to_string()),
    }
}

/// True when a release movement reason code means hospitalisation
pub fn is_hospital_release(reason_code: &str) -> bool {
    matches!(reason_code, "HP" | "HO")
}

/// Legal statuses whose prison-side data is insufficient to rule out a
/// recall, triggering the probation lookup
pub fn requires_probation_check(status: LegalStatus) -> bool {
    matches!(
        status,
        LegalStatus::Other
            | LegalStatus::Unknown
            | LegalStatus::ConvictedUnsentenced
            | LegalStatus::Sentenced
            | LegalStatus::IndeterminateSentence
    )
}

/// Fallback receive reason when neither the recall flag nor the probation
/// lookup settled the classification
pub fn receive_reason_for_status(status: LegalStatus) -> ReceiveReason {
    match status {
        LegalStatus::Recall => ReceiveReason::Recall,
        LegalStatus::CivilPrisoner
        | LegalStatus::ConvictedUnsentenced
        | LegalStatus::Sentenced
        | LegalStatus::IndeterminateSentence => ReceiveReason::Convicted,
        LegalStatus::ImmigrationDetainee => ReceiveReason::ImmigrationDetainee,
        LegalStatus::Remand => ReceiveReason::Remand,
        LegalStatus::Dead | LegalStatus::Other | LegalStatus::Unknown => ReceiveReason::Unknown,
    }
}

/// Coarse current location derived from the prisoner status string
pub fn current_location(details: &PrisonerDetails) -> String {
    if details.status.ends_with("IN") {
        "IN_PRISON".to_string()
    } else {
        "OUTSIDE_PRISON".to_string()
    }
}

/// Coarse prison-care status derived from the prisoner status string
pub fn current_prison_status(details: &PrisonerDetails) -> String {
    if details.status.starts_with("ACTIVE") {
        "UNDER_PRISON_CARE".to_string()
    } else {
        "NOT_UNDER_PRISON_CARE".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details_with_status(status: &str) -> PrisonerDetails {
        PrisonerDetails {
            offender_no: "A1234BC".to_string(),
            legal_status: LegalStatus::Sentenced,
            recall: false,
            last_movement_type_code: "ADM".to_string(),
            last_movement_reason_code: "I".to_string(),
            status: status.to_string(),
            latest_location_id: "MDI".to_string(),
        }
    }

    #[test]
    fn test_movement_type_codes() {
        assert_eq!(movement_type("TAP"), MovementType::TemporaryAbsence);
        assert_eq!(movement_type("CRT"), MovementType::Court);
        assert_eq!(movement_type("TRN"), MovementType::Transfer);
        assert_eq!(movement_type("REL"), MovementType::Released);
        assert_eq!(movement_type("ADM"), MovementType::Admission);
        assert_eq!(
            movement_type("XXX"),
            MovementType::Other("XXX".to_string())
        );
    }

    #[test]
    fn test_hospital_release_codes() {
        assert!(is_hospital_release("HP"));
        assert!(is_hospital_release("HO"));
        assert!(!is_hospital_release("YY"));
    }

    #[test]
    fn test_probation_check_guard() {
        assert!(requires_probation_check(LegalStatus::Unknown));
        assert!(requires_probation_check(LegalStatus::Other));
        assert!(requires_probation_check(LegalStatus::Sentenced));
        assert!(requires_probation_check(LegalStatus::ConvictedUnsentenced));
        assert!(requires_probation_check(LegalStatus::IndeterminateSentence));

        assert!(!requires_probation_check(LegalStatus::Recall));
        assert!(!requires_probation_check(LegalStatus::Remand));
        assert!(!requires_probation_check(LegalStatus::ImmigrationDetainee));
        assert!(!requires_probation_check(LegalStatus::CivilPrisoner));
        assert!(!requires_probation_check(LegalStatus::Dead));
    }

    #[test]
    fn test_fallback_reason_table() {
        assert_eq!(
            receive_reason_for_status(LegalStatus::Recall),
            ReceiveReason::Recall
        );
        assert_eq!(
            receive_reason_for_status(LegalStatus::CivilPrisoner),
            ReceiveReason::Convicted
        );
        assert_eq!(
            receive_reason_for_status(LegalStatus::Sentenced),
            ReceiveReason::Convicted
        );
        assert_eq!(
            receive_reason_for_status(LegalStatus::ImmigrationDetainee),
            ReceiveReason::ImmigrationDetainee
        );
        assert_eq!(
            receive_reason_for_status(LegalStatus::Remand),
            ReceiveReason::Remand
        );
        assert_eq!(
            receive_reason_for_status(LegalStatus::Dead),
            ReceiveReason::Unknown
        );
        assert_eq!(
            receive_reason_for_status(LegalStatus::Unknown),
            ReceiveReason::Unknown
        );
    }

    #[test]
    fn test_location_derivation() {
        assert_eq!(current_location(&details_with_status("ACTIVE IN")), "IN_PRISON");
        assert_eq!(
            current_location(&details_with_status("INACTIVE OUT")),
            "OUTSIDE_PRISON"
        );
        assert_eq!(
            current_prison_status(&details_with_status("ACTIVE IN")),
            "UNDER_PRISON_CARE"
        );
        assert_eq!(
            current_prison_status(&details_with_status("INACTIVE OUT")),
            "NOT_UNDER_PRISON_CARE"
        );
    }
}
