use crate::codes::{
    decode_follow_up_event, decode_outcome_kind, decode_response, decode_sex, decode_vital_status,
};
use crate::pfs::OutcomeInterpreter;
use crate::quality_filter::QualityFilterGate;
use crate::schemes::TreatmentSchemeConsolidator;
use crate::{models::*, Result};

/// Turns the complete record set of one tumor into a treatment plan, or a rejection.
pub struct TreatmentEpisodeExtractor {
    gate: QualityFilterGate,
}

impl TreatmentEpisodeExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        TreatmentEpisodeExtractor {
            gate: QualityFilterGate::new(config),
        }
    }

    pub fn with_gate(gate: QualityFilterGate) -> Self {
        TreatmentEpisodeExtractor { gate }
    }

    pub fn extract(&self, records: &[RawEpisodeRecord]) -> Result<ExtractionOutcome> {
        let tumor_id = records.first().map(RawEpisodeRecord::tumor_id).unwrap_or_default();

        let verdict = self.gate.accept(records);
        if !verdict.passed {
            let reason = verdict.reason.unwrap_or_else(|| "Rejected by quality filter".to_string());
            return Ok(ExtractionOutcome::Rejected { tumor_id, reason });
        }

        let mut ordered: Vec<&RawEpisodeRecord> = records.iter().collect();
        ordered.sort_by_key(|r| r.identification.episode_order);

        let diagnosis = ordered.iter().copied().find(|r| r.is_diagnosis());

        let schemes = TreatmentSchemeConsolidator::consolidate(
            ordered.iter().flat_map(|r| r.treatment.systemic.slots.iter()),
        )?;
        let classification = TreatmentSchemeConsolidator::classify(&schemes);
        let plan_start_day = TreatmentSchemeConsolidator::plan_start(&schemes);
        let plan_stop_day = TreatmentSchemeConsolidator::plan_stop(&schemes);

        let outcome_measures = Self::outcome_measures(&ordered)?;
        let pfs = OutcomeInterpreter::determine(plan_start_day, plan_stop_day, &outcome_measures);

        let response_measures = Self::response_measures(&ordered)?;
        let days_plan_start_to_response = plan_start_day.and_then(|start| {
            response_measures
                .iter()
                .filter_map(|m| m.day)
                .min()
                .map(|day| day - start)
        });

        let sex = diagnosis
            .and_then(|r| r.patient.sex)
            .map(decode_sex)
            .transpose()?;
        let vital_status = diagnosis
            .and_then(|r| r.patient.vital_status)
            .map(decode_vital_status)
            .transpose()?;
        let days_plan_start_to_latest_alive_status = plan_start_day.and_then(|start| {
            diagnosis
                .and_then(|r| r.patient.vital_status_interval)
                .map(|interval| interval - start)
        });

        log::debug!(
            "Tumor {}: {} schemes classified as {}",
            tumor_id,
            schemes.len(),
            classification
        );

        Ok(ExtractionOutcome::Accepted(TreatmentPlan {
            patient_id: diagnosis.map(|r| r.identification.patient_id).unwrap_or_default(),
            tumor_id,
            sex,
            vital_status,
            classification,
            group: classification.group(),
            schemes,
            plan_start_day,
            plan_stop_day,
            observed_pfs_days: pfs.days,
            had_progression_event: pfs.had_event,
            days_plan_start_to_response,
            days_plan_start_to_latest_alive_status,
            outcome_measures,
            response_measures,
        }))
    }

    /// Outcome fields in episode order, then field order. Fields without an event code are unused.
    fn outcome_measures(records: &[&RawEpisodeRecord]) -> Result<Vec<OutcomeMeasure>> {
        records
            .iter()
            .flat_map(|r| r.response.outcome_fields.iter())
            .filter_map(|field| field.event_code.map(|code| (code, field)))
            .map(|(code, field)| {
                Ok(OutcomeMeasure {
                    kind: decode_outcome_kind(code)?,
                    day: field.interval_days,
                    follow_up_event: decode_follow_up_event(field.follow_up_event_code)?,
                })
            })
            .collect()
    }

    fn response_measures(records: &[&RawEpisodeRecord]) -> Result<Vec<ResponseMeasure>> {
        let mut measures = Vec::new();
        for record in records {
            let code = record.response.response_code.as_deref();
            if let Some(response) = decode_response(code)? {
                measures.push(ResponseMeasure {
                    response,
                    day: record.response.response_interval,
                });
            }
        }
        Ok(measures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConsolidationError;
    use crate::quality_filter::tests::{diagnosis_record, follow_up_record};
    use crate::regimens::{TreatmentClassification, TreatmentGroup};
    use crate::quality_filter::{QualityFilterGate, RecordRule, RuleCategory};
    use crate::schemes::tests::{line, mixed_regimen_slots};

    fn extractor() -> TreatmentEpisodeExtractor {
        TreatmentEpisodeExtractor::new(&ExtractionConfig::default())
    }

    fn progression(day: i32) -> RawOutcomeField {
        RawOutcomeField {
            event_code: Some(1),
            follow_up_event_code: Some(3),
            interval_days: Some(day),
        }
    }

    fn treated_tumor() -> Vec<RawEpisodeRecord> {
        let mut diagnosis = diagnosis_record(42);
        diagnosis.treatment.systemic.chemo = Some(1);
        for (target, slot) in diagnosis.treatment.systemic.slots.iter_mut().zip(mixed_regimen_slots()) {
            *target = slot;
        }
        diagnosis.response.response_code = Some("PD".to_string());
        diagnosis.response.response_interval = Some(5);
        diagnosis.response.outcome_fields[0] = progression(2);

        let mut follow_up = follow_up_record(42, 2);
        follow_up.response.outcome_fields[0] = progression(4);
        vec![follow_up, diagnosis]
    }

    fn accepted(outcome: ExtractionOutcome) -> TreatmentPlan {
        match outcome {
            ExtractionOutcome::Accepted(plan) => plan,
            ExtractionOutcome::Rejected { reason, .. } => panic!("unexpected rejection: {}", reason),
        }
    }

    #[test]
    fn test_full_plan_extraction() {
        let plan = accepted(extractor().extract(&treated_tumor()).unwrap());

        assert_eq!(plan.tumor_id, 42);
        assert_eq!(plan.classification, TreatmentClassification::FolfoxiriB);
        assert_eq!(plan.group, TreatmentGroup::FolfoxiriB);
        assert_eq!(plan.schemes.len(), 3);
        assert_eq!(plan.plan_start_day, Some(1));
        assert_eq!(plan.plan_stop_day, Some(7));
        assert_eq!(plan.observed_pfs_days, Some(3));
        assert_eq!(plan.had_progression_event, Some(true));
        assert_eq!(plan.days_plan_start_to_response, Some(4));
        assert_eq!(plan.days_plan_start_to_latest_alive_status, Some(79));
        assert_eq!(plan.sex, Some(Sex::Male));
        assert_eq!(plan.vital_status, Some(VitalStatus::Alive));
        assert_eq!(plan.response_measures[0].response, ResponseType::PD);
    }

    #[test]
    fn test_outcomes_follow_episode_order() {
        let plan = accepted(extractor().extract(&treated_tumor()).unwrap());
        let days: Vec<Option<i32>> = plan.outcome_measures.iter().map(|m| m.day).collect();
        assert_eq!(days, vec![Some(2), Some(4)]);
        assert_eq!(
            plan.outcome_measures[0].follow_up_event,
            Some(FollowUpEvent::DistantAndPossiblyRegionalOrLocal)
        );
    }

    #[test]
    fn test_rejected_tumor_has_reason() {
        let mut records = treated_tumor();
        records[0].identification.episode_type = EpisodeType::Diagnosis;
        match extractor().extract(&records).unwrap() {
            ExtractionOutcome::Rejected { tumor_id, reason } => {
                assert_eq!(tumor_id, 42);
                assert!(reason.contains("diagnosis records"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_outcome_code_is_fatal() {
        let mut records = treated_tumor();
        records[0].response.outcome_fields[1].event_code = Some(7);
        let err = extractor().extract(&records).unwrap_err();
        assert!(matches!(err, ConsolidationError::UnknownCode { field: "outcome event", .. }));
    }

    #[test]
    fn test_untreated_tumor() {
        let plan = accepted(extractor().extract(&[diagnosis_record(3)]).unwrap());
        assert_eq!(plan.classification, TreatmentClassification::None);
        assert!(plan.schemes.is_empty());
        assert_eq!(plan.plan_start_day, None);
        assert_eq!(plan.observed_pfs_days, None);
        assert_eq!(plan.days_plan_start_to_latest_alive_status, None);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let records = treated_tumor();
        let first = extractor().extract(&records).unwrap();
        let second = extractor().extract(&records).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ongoing_last_line_gives_unknown_pfs() {
        let mut diagnosis = diagnosis_record(8);
        diagnosis.treatment.systemic.chemo = Some(1);
        diagnosis.treatment.systemic.slots[0] = line("L01BC06", Some(1), 10, Some(100));
        diagnosis.treatment.systemic.slots[1] = line("L01BC06", Some(2), 120, None);
        diagnosis.response.outcome_fields[0] = progression(60);
        diagnosis.response.outcome_fields[1] = progression(300);

        let plan = accepted(extractor().extract(&[diagnosis]).unwrap());
        assert_eq!(plan.plan_start_day, Some(10));
        assert_eq!(plan.plan_stop_day, None);
        assert_eq!(plan.observed_pfs_days, None);
        assert_eq!(plan.had_progression_event, None);
    }

    #[test]
    fn test_injected_gate_rejects_with_logging_enabled() {
        let config = ExtractionConfig {
            log_filtered_records: true,
            rejection_reporting: RejectionReporting::AllFailures,
            ..ExtractionConfig::default()
        };
        let mut rules = QualityFilterGate::standard_rules();
        rules.push(RecordRule::new("no_follow_up", RuleCategory::Completeness, |records| {
            (records.len() < 2).then(|| "No follow-up records".to_string())
        }));
        let extractor = TreatmentEpisodeExtractor::with_gate(QualityFilterGate::with_rules(rules, &config));

        match extractor.extract(&[diagnosis_record(9)]).unwrap() {
            ExtractionOutcome::Rejected { tumor_id, reason } => {
                assert_eq!(tumor_id, 9);
                assert_eq!(reason, "No follow-up records");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(extractor.extract(&treated_tumor()).is_ok());
    }
}
