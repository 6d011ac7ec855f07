//! # Receive Reason Calculator
//!
//! Classifies why a prisoner was received. The decision tree is ordered to
//! bound probation call volume: the probation lookup only fires when the
//! prison-side legal status cannot rule a recall in or out.

use std::sync::Arc;

use crate::clients::{PrisonApi, ProbationApi};
use crate::error::EventsResult;
use crate::logging::log_classification;
use crate::models::outcomes::{ReasonSource, ReceiveOutcome, ReceiveReason};
use crate::classification::rules::{
    self, current_location, current_prison_status, MovementType,
};

/// Orchestrates prison/probation lookups into a single receive outcome
pub struct ReceiveReasonCalculator {
    prison_api: Arc<dyn PrisonApi>,
    probation_api: Arc<dyn ProbationApi>,
}

impl ReceiveReasonCalculator {
    pub fn new(prison_api: Arc<dyn PrisonApi>, probation_api: Arc<dyn ProbationApi>) -> Self {
        Self {
            prison_api,
            probation_api,
        }
    }

    /// Calculate the receive reason for a prisoner.
    ///
    /// Terminal checks run in order: temporary absence return, the prison
    /// recall flag, then the guarded probation recall lookup, then the
    /// legal-status fallback table. A missing prisoner propagates as
    /// `EventsError::NotFound` for the caller to drop.
    pub async fn calculate_reason_for_prisoner(
        &self,
        noms_number: &str,
    ) -> EventsResult<ReceiveOutcome> {
        let details = self.prison_api.prisoner_details(noms_number).await?;

        let presentation = |reason: ReceiveReason, source: ReasonSource| ReceiveOutcome {
            reason,
            source,
            prison_id: details.latest_location_id.clone(),
            current_location: current_location(&details),
            current_prison_status: current_prison_status(&details),
        };

        let outcome = if rules::movement_type(&details.last_movement_type_code)
            == MovementType::TemporaryAbsence
        {
            presentation(ReceiveReason::TemporaryAbsenceReturn, ReasonSource::Prison)
        } else if details.recall {
            presentation(ReceiveReason::Recall, ReasonSource::Prison)
        } else if rules::requires_probation_check(details.legal_status) {
            let recalls = self.probation_api.recalls(noms_number).await?;
            if recalls.iter().any(|r| r.is_active_or_completed()) {
                presentation(ReceiveReason::Recall, ReasonSource::Probation)
            } else {
                presentation(
                    rules::receive_reason_for_status(details.legal_status),
                    ReasonSource::Prison,
                )
            }
        } else {
            presentation(
                rules::receive_reason_for_status(details.legal_status),
                ReasonSource::Prison,
            )
        };

        log_classification(
            "receive",
            Some(noms_number),
            None,
            outcome.reason.as_str(),
            Some(match outcome.source {
                ReasonSource::Prison => "PRISON",
                ReasonSource::Probation => "PROBATION",
            }),
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EventsError, EventsResult};
    use crate::models::{LegalStatus, OffenderEvent, PrisonerDetails, Recall};
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubPrisonApi {
        details: Option<PrisonerDetails>,
    }

    #[async_trait]
    impl PrisonApi for StubPrisonApi {
        async fn fetch_events(
            &self,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> EventsResult<Vec<OffenderEvent>> {
            unimplemented!("not used by receive flow")
        }

        async fn prisoner_details(&self, noms_number: &str) -> EventsResult<PrisonerDetails> {
            self.details
                .clone()
                .ok_or_else(|| EventsError::not_found(format!("prisoner {noms_number}")))
        }

        async fn booking_noms_number(&self, _booking_id: i64) -> EventsResult<Option<String>> {
            unimplemented!("not used by receive flow")
        }

        async fn merged_identifiers(&self, _booking_id: i64) -> EventsResult<Vec<String>> {
            unimplemented!("not used by receive flow")
        }
    }

    struct StubProbationApi {
        recalls: Vec<Recall>,
        calls: AtomicUsize,
    }

    impl StubProbationApi {
        fn new(recalls: Vec<Recall>) -> Self {
            Self {
                recalls,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProbationApi for StubProbationApi {
        async fn recalls(&self, _noms_number: &str) -> EventsResult<Vec<Recall>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.recalls.clone())
        }
    }

    fn details(
        legal_status: LegalStatus,
        recall: bool,
        movement_type_code: &str,
    ) -> PrisonerDetails {
        PrisonerDetails {
            offender_no: "A1234BC".to_string(),
            legal_status,
            recall,
            last_movement_type_code: movement_type_code.to_string(),
            last_movement_reason_code: "I".to_string(),
            status: "ACTIVE IN".to_string(),
            latest_location_id: "MDI".to_string(),
        }
    }

    fn calculator(
        prisoner: Option<PrisonerDetails>,
        recalls: Vec<Recall>,
    ) -> (ReceiveReasonCalculator, Arc<StubProbationApi>) {
        let probation = Arc::new(StubProbationApi::new(recalls));
        let calculator = ReceiveReasonCalculator::new(
            Arc::new(StubPrisonApi { details: prisoner }),
            probation.clone(),
        );
        (calculator, probation)
    }

    fn active_recall() -> Recall {
        Recall {
            referral_date: NaiveDate::from_ymd_opt(2021, 5, 12).unwrap(),
            recall_rejected_or_withdrawn: None,
            outcome_recall: Some(true),
        }
    }

    #[tokio::test]
    async fn test_recall_status_with_recall_flag_is_recall_without_probation_call() {
        let (calculator, probation) =
            calculator(Some(details(LegalStatus::Recall, true, "ADM")), vec![]);
        let outcome = calculator
            .calculate_reason_for_prisoner("A1234BC")
            .await
            .unwrap();
        assert_eq!(outcome.reason, ReceiveReason::Recall);
        assert_eq!(outcome.source, ReasonSource::Prison);
        assert_eq!(probation.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_status_with_recall_flag_is_recall() {
        let (calculator, probation) =
            calculator(Some(details(LegalStatus::Unknown, true, "ADM")), vec![]);
        let outcome = calculator
            .calculate_reason_for_prisoner("A1234BC")
            .await
            .unwrap();
        assert_eq!(outcome.reason, ReceiveReason::Recall);
        assert_eq!(outcome.source, ReasonSource::Prison);
        assert_eq!(probation.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_status_without_recall_flag_consults_probation() {
        let (calculator, probation) = calculator(
            Some(details(LegalStatus::Unknown, false, "ADM")),
            vec![active_recall()],
        );
        let outcome = calculator
            .calculate_reason_for_prisoner("A1234BC")
            .await
            .unwrap();
        assert_eq!(outcome.reason, ReceiveReason::Recall);
        assert_eq!(outcome.source, ReasonSource::Probation);
        assert_eq!(probation.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_status_with_empty_recall_list_is_unknown() {
        let (calculator, probation) =
            calculator(Some(details(LegalStatus::Unknown, false, "ADM")), vec![]);
        let outcome = calculator
            .calculate_reason_for_prisoner("A1234BC")
            .await
            .unwrap();
        assert_eq!(outcome.reason, ReceiveReason::Unknown);
        assert_eq!(outcome.source, ReasonSource::Prison);
        assert_eq!(probation.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_recall_falls_through_to_status_table() {
        let rejected = Recall {
            referral_date: NaiveDate::from_ymd_opt(2021, 5, 12).unwrap(),
            recall_rejected_or_withdrawn: Some(true),
            outcome_recall: None,
        };
        let (calculator, _) = calculator(
            Some(details(LegalStatus::Sentenced, false, "ADM")),
            vec![rejected],
        );
        let outcome = calculator
            .calculate_reason_for_prisoner("A1234BC")
            .await
            .unwrap();
        assert_eq!(outcome.reason, ReceiveReason::Convicted);
        assert_eq!(outcome.source, ReasonSource::Prison);
    }

    #[tokio::test]
    async fn test_temporary_absence_return_is_terminal() {
        let (calculator, probation) =
            calculator(Some(details(LegalStatus::Sentenced, true, "TAP")), vec![]);
        let outcome = calculator
            .calculate_reason_for_prisoner("A1234BC")
            .await
            .unwrap();
        assert_eq!(outcome.reason, ReceiveReason::TemporaryAbsenceReturn);
        assert_eq!(probation.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remand_skips_probation_lookup() {
        let (calculator, probation) =
            calculator(Some(details(LegalStatus::Remand, false, "ADM")), vec![]);
        let outcome = calculator
            .calculate_reason_for_prisoner("A1234BC")
            .await
            .unwrap();
        assert_eq!(outcome.reason, ReceiveReason::Remand);
        assert_eq!(probation.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_prisoner_propagates_not_found() {
        let (calculator, _) = calculator(None, vec![]);
        let err = calculator
            .calculate_reason_for_prisoner("A1234BC")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_outcome_carries_presentation_attributes() {
        let (calculator, _) = calculator(
            Some(details(LegalStatus::ImmigrationDetainee, false, "ADM")),
            vec![],
        );
        let outcome = calculator
            .calculate_reason_for_prisoner("A1234BC")
            .await
            .unwrap();
        assert_eq!(outcome.prison_id, "MDI");
        assert_eq!(outcome.current_location, "IN_PRISON");
        assert_eq!(outcome.current_prison_status, "UNDER_PRISON_CARE");
    }
}
