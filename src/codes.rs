//! Decoders for the registry's numeric and string codes.
//!
//! Each decoder either returns the typed value, `None` for the field's "unknown"
//! sentinel, or [`ConsolidationError::UnknownCode`] for anything outside its table.

use crate::{errors::ConsolidationError, models::*, Result};

pub const DIAGNOSIS_EPISODE: &str = "DIA";
pub const FOLLOW_UP_EPISODE: &str = "VERB";

pub fn decode_episode_type(code: &str) -> Result<EpisodeType> {
    match code {
        DIAGNOSIS_EPISODE => Ok(EpisodeType::Diagnosis),
        FOLLOW_UP_EPISODE => Ok(EpisodeType::FollowUp),
        _ => Err(ConsolidationError::unknown_code("episode type", code)),
    }
}

pub fn decode_metastatic_detection(code: i32) -> Result<MetastaticDetection> {
    match code {
        0 => Ok(MetastaticDetection::Absent),
        1 => Ok(MetastaticDetection::AtStart),
        2 => Ok(MetastaticDetection::AtProgression),
        _ => Err(ConsolidationError::unknown_code("metastatic detection", code)),
    }
}

pub fn decode_outcome_kind(code: i32) -> Result<OutcomeKind> {
    match code {
        0 => Ok(OutcomeKind::Censor),
        1 => Ok(OutcomeKind::Progression),
        2 => Ok(OutcomeKind::Death),
        _ => Err(ConsolidationError::unknown_code("outcome event", code)),
    }
}

/// 9 means the extent of the event was not recorded.
pub fn decode_follow_up_event(code: Option<i32>) -> Result<Option<FollowUpEvent>> {
    match code {
        None | Some(9) => Ok(None),
        Some(1) => Ok(Some(FollowUpEvent::LocalOnly)),
        Some(2) => Ok(Some(FollowUpEvent::Regional)),
        Some(3) => Ok(Some(FollowUpEvent::DistantAndPossiblyRegionalOrLocal)),
        Some(other) => Err(ConsolidationError::unknown_code("follow-up event", other)),
    }
}

pub fn decode_sex(code: i32) -> Result<Sex> {
    match code {
        1 => Ok(Sex::Male),
        2 => Ok(Sex::Female),
        _ => Err(ConsolidationError::unknown_code("sex", code)),
    }
}

pub fn decode_vital_status(code: i32) -> Result<VitalStatus> {
    match code {
        0 => Ok(VitalStatus::Alive),
        1 => Ok(VitalStatus::Dead),
        _ => Err(ConsolidationError::unknown_code("vital status", code)),
    }
}

/// Returns `(pre_surgery, post_surgery)`. Both 0 and 4 mean neither; absent is treated the same.
pub fn decode_pre_post_surgery(code: Option<i32>) -> Result<(bool, bool)> {
    match code {
        None | Some(0) | Some(4) => Ok((false, false)),
        Some(1) => Ok((true, false)),
        Some(2) => Ok((false, true)),
        Some(3) => Ok((true, true)),
        Some(other) => Err(ConsolidationError::unknown_code("pre/post surgery", other)),
    }
}

/// Cycle codes carry either a count or a detail marker, never both.
pub fn decode_cycles(code: Option<i32>) -> Result<(Option<i32>, Option<CycleDetails>)> {
    match code {
        None | Some(99) => Ok((None, None)),
        Some(count @ 0..=48) | Some(count @ 60) => Ok((Some(count), None)),
        Some(66) => Ok((None, Some(CycleDetails::Sensitizer))),
        Some(77) => Ok((None, Some(CycleDetails::Maintenance))),
        Some(98) => Ok((None, Some(CycleDetails::OngoingTreatment))),
        Some(other) => Err(ConsolidationError::unknown_code("cycles", other)),
    }
}

/// "0" (not assessed) and "99" (unknown) carry no response.
pub fn decode_response(code: Option<&str>) -> Result<Option<ResponseType>> {
    match code {
        None | Some("0") | Some("99") => Ok(None),
        Some("CR") => Ok(Some(ResponseType::CR)),
        Some("PR") => Ok(Some(ResponseType::PR)),
        Some("MR") => Ok(Some(ResponseType::MR)),
        Some("SD") => Ok(Some(ResponseType::SD)),
        Some("PD") => Ok(Some(ResponseType::PD)),
        Some(other) => Err(ConsolidationError::unknown_code("response", other)),
    }
}
