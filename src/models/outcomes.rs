//! # Classification Outcomes
//!
//! The sum types produced by the reason calculators, one per flow, plus the
//! presentation attributes the domain event assembler copies into
//! `additionalInformation`.

use serde::{Deserialize, Serialize};

/// Which data source determined the classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonSource {
    Prison,
    Probation,
}

/// Why a prisoner was received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiveReason {
    Recall,
    Remand,
    Convicted,
    ImmigrationDetainee,
    Unknown,
    TemporaryAbsenceReturn,
}

impl ReceiveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiveReason::Recall => "RECALL",
            ReceiveReason::Remand => "REMAND",
            ReceiveReason::Convicted => "CONVICTED",
            ReceiveReason::ImmigrationDetainee => "IMMIGRATION_DETAINEE",
            ReceiveReason::Unknown => "UNKNOWN",
            ReceiveReason::TemporaryAbsenceReturn => "TEMPORARY_ABSENCE_RETURN",
        }
    }
}

/// Why a prisoner was released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseReason {
    TemporaryAbsenceRelease,
    ReleasedToHospital,
    SentToCourt,
    Transferred,
    Unknown,
}

impl ReleaseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseReason::TemporaryAbsenceRelease => "TEMPORARY_ABSENCE_RELEASE",
            ReleaseReason::ReleasedToHospital => "RELEASED_TO_HOSPITAL",
            ReleaseReason::SentToCourt => "SENT_TO_COURT",
            ReleaseReason::Transferred => "TRANSFERRED",
            ReleaseReason::Unknown => "UNKNOWN",
        }
    }
}

/// Full result of the receive-flow classification
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveOutcome {
    pub reason: ReceiveReason,
    pub source: ReasonSource,
    pub prison_id: String,
    pub current_location: String,
    pub current_prison_status: String,
}

/// Full result of the release-flow classification
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub reason: ReleaseReason,
    pub details: Option<String>,
    pub prison_id: String,
    pub current_location: String,
    pub current_prison_status: String,
}

/// One merged-identifier pairing from the merge flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// The NOMS number that was retired by the merge
    pub merged_number: String,
    /// The NOMS number the subject now goes by
    pub remaining_number: String,
}
