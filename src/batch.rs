use crate::extractor::TreatmentEpisodeExtractor;
use crate::{models::*, Result};
use itertools::Itertools;
use rayon::prelude::*;

pub struct BatchExtractor;

impl BatchExtractor {
    /// Extract every tumor in parallel. A fatal error for one tumor never affects another.
    pub fn extract_all(records: Vec<RawEpisodeRecord>, config: &ExtractionConfig) -> BatchResults {
        let tumors = Self::group_by_tumor(records);
        log::info!("Starting extraction for {} tumors", tumors.len());

        let extractor = TreatmentEpisodeExtractor::new(config);
        let outcomes: Vec<(i64, Result<ExtractionOutcome>)> = tumors
            .par_iter()
            .map(|(tumor_id, tumor_records)| (*tumor_id, extractor.extract(tumor_records)))
            .collect();

        let mut plans = Vec::new();
        let mut rejected = Vec::new();
        let mut failed = Vec::new();

        for (tumor_id, outcome) in outcomes {
            match outcome {
                Ok(ExtractionOutcome::Accepted(plan)) => plans.push(plan),
                Ok(ExtractionOutcome::Rejected { tumor_id, reason }) => {
                    rejected.push(RejectedTumor { tumor_id, reason })
                }
                Err(e) => {
                    log::error!("Failed to extract tumor {}: {}", tumor_id, e);
                    failed.push(FailedTumor {
                        tumor_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        log::info!("Extracted treatment plans for {} tumors", plans.len());
        if !rejected.is_empty() {
            log::warn!("{} tumors removed by quality filter", rejected.len());
        }
        if !failed.is_empty() {
            log::warn!("Failed to extract {} tumors", failed.len());
        }

        BatchResults {
            plans,
            rejected,
            failed,
        }
    }

    /// Tumors sorted by id; each tumor keeps its rows in input order.
    pub fn group_by_tumor(records: Vec<RawEpisodeRecord>) -> Vec<(i64, Vec<RawEpisodeRecord>)> {
        records
            .into_iter()
            .into_group_map_by(|r| r.tumor_id())
            .into_iter()
            .sorted_by_key(|(tumor_id, _)| *tumor_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality_filter::tests::{diagnosis_record, follow_up_record};

    #[test]
    fn test_grouping_keeps_tumors_apart() {
        let records = vec![
            follow_up_record(2, 2),
            diagnosis_record(1),
            diagnosis_record(2),
        ];
        let groups = BatchExtractor::group_by_tumor(records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, 1);
        assert_eq!(groups[1].1.len(), 2);
        assert!(!groups[1].1[0].is_diagnosis());
    }

    #[test]
    fn test_batch_isolates_failures() {
        let mut broken = diagnosis_record(3);
        broken.treatment.systemic.chemo = Some(1);
        broken.treatment.systemic.slots[0].drug_code = Some("BOGUS".to_string());

        let records = vec![
            diagnosis_record(1),
            diagnosis_record(2),
            diagnosis_record(2),
            broken,
        ];
        let results = BatchExtractor::extract_all(records, &ExtractionConfig::default());

        assert_eq!(results.plans.len(), 1);
        assert_eq!(results.plans[0].tumor_id, 1);
        assert_eq!(results.rejected.len(), 1);
        assert_eq!(results.rejected[0].tumor_id, 2);
        assert_eq!(results.failed.len(), 1);
        assert_eq!(results.failed[0].tumor_id, 3);
        assert!(results.failed[0].error.contains("BOGUS"));
        assert_eq!(results.total_tumors(), 3);
    }
}
