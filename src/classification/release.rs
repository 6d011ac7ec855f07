//! # Release Reason Calculator
//!
//! Classifies why a prisoner was released, from the last movement type and
//! reason codes alone. No probation lookup: release classification is fully
//! determined by prison-side data.

use std::sync::Arc;

use crate::classification::rules::{
    self, current_location, current_prison_status, MovementType,
};
use crate::clients::PrisonApi;
use crate::error::EventsResult;
use crate::logging::log_classification;
use crate::models::outcomes::{ReleaseOutcome, ReleaseReason};

/// Maps last-movement codes to a release outcome
pub struct ReleaseReasonCalculator {
    prison_api: Arc<dyn PrisonApi>,
}

impl ReleaseReasonCalculator {
    pub fn new(prison_api: Arc<dyn PrisonApi>) -> Self {
        Self { prison_api }
    }

    /// Calculate the release reason for a prisoner. A missing prisoner
    /// propagates as `EventsError::NotFound` for the caller to drop.
    pub async fn calculate_reason_for_release(
        &self,
        noms_number: &str,
    ) -> EventsResult<ReleaseOutcome> {
        let details = self.prison_api.prisoner_details(noms_number).await?;

        let (reason, reason_details) =
            match rules::movement_type(&details.last_movement_type_code) {
                MovementType::TemporaryAbsence => (ReleaseReason::TemporaryAbsenceRelease, None),
                MovementType::Court => (ReleaseReason::SentToCourt, None),
                MovementType::Transfer => (ReleaseReason::Transferred, None),
                MovementType::Released => {
                    if rules::is_hospital_release(&details.last_movement_reason_code) {
                        (ReleaseReason::ReleasedToHospital, None)
                    } else {
                        (
                            ReleaseReason::Unknown,
                            Some(format!(
                                "Movement reason code {}",
                                details.last_movement_reason_code
                            )),
                        )
                    }
                }
                MovementType::Admission | MovementType::Other(_) => (
                    ReleaseReason::Unknown,
                    Some(format!(
                        "Movement type code {}",
                        details.last_movement_type_code
                    )),
                ),
            };

        log_classification("release", Some(noms_number), None, reason.as_str(), None);

        Ok(ReleaseOutcome {
            reason,
            details: reason_details,
            prison_id: details.latest_location_id.clone(),
            current_location: current_location(&details),
            current_prison_status: current_prison_status(&details),
        })
    }
}
