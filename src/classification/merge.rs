//! # Merged Prisoner Identification
//!
//! When a booking number changes, the booking's historical NOMS numbers tell
//! us which identities were merged away. An unknown booking yields an empty
//! list, there being simply no merge to report. No dedup is performed; callers
//! see exactly what the source returned, in lookup order.

use std::sync::Arc;
use tracing::info;

use crate::clients::PrisonApi;
use crate::error::EventsResult;
use crate::models::outcomes::MergeOutcome;

/// Resolves merged-identifier pairings for a booking
pub struct MergeCalculator {
    prison_api: Arc<dyn PrisonApi>,
}

impl MergeCalculator {
    pub fn new(prison_api: Arc<dyn PrisonApi>) -> Self {
        Self { prison_api }
    }

    /// One `MergeOutcome` per historical identifier on the booking
    pub async fn identify_merged_prisoner(
        &self,
        booking_id: i64,
    ) -> EventsResult<Vec<MergeOutcome>> {
        let Some(remaining_number) = self.prison_api.booking_noms_number(booking_id).await? else {
            return Ok(Vec::new());
        };

        let merged = self.prison_api.merged_identifiers(booking_id).await?;
        let outcomes: Vec<MergeOutcome> = merged
            .into_iter()
            .map(|merged_number| {
                info!(
                    booking_id = booking_id,
                    merged_number = %merged_number,
                    remaining_number = %remaining_number,
                    "🔀 MERGE_IDENTIFIED"
                );
                MergeOutcome {
                    merged_number,
                    remaining_number: remaining_number.clone(),
                }
            })
            .collect();

        Ok(outcomes)
    }
}
