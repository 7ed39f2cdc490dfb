use crate::pipeline::{Envelope, PipelineError, Transform};
use grid_client::domain::{RawFacilityRecord, StageKind};

/// Pure validation of a `RawFacilityRecord`.
///
/// Rules:
/// - at least one stage (substation, transformer or line) must carry a
///   capacity field; otherwise the record would normalize to nothing.
pub fn validate_facility_record(
    env: Envelope<RawFacilityRecord>,
) -> Result<Envelope<RawFacilityRecord>, PipelineError> {
    let r = &env.payload;

    if !StageKind::CHAIN.into_iter().any(|stage| r.has_stage(stage)) {
        return Err(PipelineError::Transform(format!(
            "record {} has no substation, transformer or line capacity fields",
            env.seq
        )));
    }

    Ok(env)
}

#[derive(Clone, Default)]
pub struct FacilityRecordValidation;

#[async_trait::async_trait]
impl Transform<RawFacilityRecord, RawFacilityRecord> for FacilityRecordValidation {
    async fn apply(
        &self,
        input: Envelope<RawFacilityRecord>,
    ) -> Result<Envelope<RawFacilityRecord>, PipelineError> {
        match validate_facility_record(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("validation_facility_record_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}
