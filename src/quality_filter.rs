use crate::models::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

const PRE_SURGERY_CODE: i32 = 1;
const POST_SURGERY_CODE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleCategory {
    Uniqueness,
    Completeness,
    Consistency,
    Plausibility,
}

/// Returns a message describing the violation, or `None` when the records satisfy the rule.
pub type RuleCheck = fn(&[RawEpisodeRecord]) -> Option<String>;

#[derive(Clone)]
pub struct RecordRule {
    pub name: &'static str,
    pub category: RuleCategory,
    check: RuleCheck,
}

impl RecordRule {
    pub fn new(name: &'static str, category: RuleCategory, check: RuleCheck) -> Self {
        RecordRule { name, category, check }
    }

    pub fn evaluate(&self, records: &[RawEpisodeRecord]) -> Option<String> {
        (self.check)(records)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule: String,
    pub category: RuleCategory,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub passed: bool,
    pub reason: Option<String>,
    pub violations: Vec<RuleViolation>,
}

/// Cross-record quality rules a tumor's episodes must satisfy before consolidation.
pub struct QualityFilterGate {
    rules: Vec<RecordRule>,
    log_filtered_records: bool,
    reporting: RejectionReporting,
}

impl QualityFilterGate {
    pub fn new(config: &ExtractionConfig) -> Self {
        let rules = match config.rule_set {
            RuleSet::Standard => Self::standard_rules(),
            RuleSet::Strict => Self::strict_rules(),
        };
        Self::with_rules(rules, config)
    }

    pub fn with_rules(rules: Vec<RecordRule>, config: &ExtractionConfig) -> Self {
        QualityFilterGate {
            rules,
            log_filtered_records: config.log_filtered_records,
            reporting: config.rejection_reporting,
        }
    }

    pub fn rules(&self) -> &[RecordRule] {
        &self.rules
    }

    /// Every rule is evaluated even after one fails, so all violations are available.
    pub fn accept(&self, records: &[RawEpisodeRecord]) -> GateVerdict {
        let violations: Vec<RuleViolation> = self
            .rules
            .iter()
            .filter_map(|rule| {
                rule.evaluate(records).map(|message| RuleViolation {
                    rule: rule.name.to_string(),
                    category: rule.category,
                    message,
                })
            })
            .collect();

        if self.log_filtered_records {
            for violation in &violations {
                log::warn!("[{}] {}", violation.rule, violation.message);
            }
        }

        let reason = match self.reporting {
            _ if violations.is_empty() => None,
            RejectionReporting::FirstFailure => violations.first().map(|v| v.message.clone()),
            RejectionReporting::AllFailures => {
                Some(violations.iter().map(|v| v.message.as_str()).join("; "))
            }
        };

        GateVerdict {
            passed: violations.is_empty(),
            reason,
            violations,
        }
    }

    pub fn standard_rules() -> Vec<RecordRule> {
        use RuleCategory::*;
        vec![
            RecordRule::new("single_tumor_id", Uniqueness, single_tumor_id),
            RecordRule::new("consistent_sex", Uniqueness, consistent_sex),
            RecordRule::new("consistent_incidence_year", Uniqueness, consistent_incidence_year),
            RecordRule::new("exactly_one_diagnosis", Completeness, exactly_one_diagnosis),
            RecordRule::new("valid_vital_status", Completeness, valid_vital_status),
            RecordRule::new("consistent_double_tumor", Consistency, consistent_double_tumor),
            RecordRule::new("no_molecular_on_follow_up", Consistency, no_molecular_on_follow_up),
            RecordRule::new("max_one_metastatic_detection", Consistency, max_one_metastatic_detection),
            RecordRule::new("consistent_metastatic_progression", Consistency, consistent_metastatic_progression),
            RecordRule::new("consistent_comorbidities", Consistency, consistent_comorbidities),
            RecordRule::new("no_metastatic_data_if_absent", Consistency, no_metastatic_data_if_absent),
            RecordRule::new("scheme_number_has_drug", Consistency, scheme_number_has_drug),
            RecordRule::new("plausible_treatment", Plausibility, plausible_treatment),
        ]
    }

    pub fn strict_rules() -> Vec<RecordRule> {
        use RuleCategory::*;
        let mut rules = Self::standard_rules();
        rules.extend([
            RecordRule::new("valid_primary_tumor_type", Completeness, valid_primary_tumor_type),
            RecordRule::new("valid_anal_distance", Consistency, valid_anal_distance),
            RecordRule::new("valid_primary_surgery", Consistency, valid_primary_surgery),
            RecordRule::new("valid_primary_radiotherapy", Consistency, valid_primary_radiotherapy),
            RecordRule::new("valid_gastro_resection", Consistency, valid_gastro_resection),
            RecordRule::new("valid_systemic_treatment", Consistency, valid_systemic_treatment),
            RecordRule::new("consistent_surgical_timing", Plausibility, consistent_surgical_timing),
        ]);
        rules
    }
}

fn tumor_label(records: &[RawEpisodeRecord]) -> String {
    records
        .first()
        .map(|r| r.tumor_id().to_string())
        .unwrap_or_else(|| "<none>".to_string())
}

fn violation_if(failed: bool, records: &[RawEpisodeRecord], message: &str) -> Option<String> {
    failed.then(|| format!("{} for tumor {}", message, tumor_label(records)))
}

fn split_episodes(records: &[RawEpisodeRecord]) -> (Vec<&RawEpisodeRecord>, Vec<&RawEpisodeRecord>) {
    records.iter().partition(|r| r.is_diagnosis())
}

fn zero_or_null(value: Option<i32>) -> bool {
    matches!(value, None | Some(0))
}

fn not_zero_nor_null(value: Option<i32>) -> bool {
    !zero_or_null(value)
}

fn detects_metastases(record: &RawEpisodeRecord) -> bool {
    record.identification.metastatic_detection != MetastaticDetection::Absent
}

fn single_tumor_id(records: &[RawEpisodeRecord]) -> Option<String> {
    let distinct = records.iter().map(|r| r.tumor_id()).unique().count();
    violation_if(distinct > 1, records, "Multiple tumor ids found")
}

fn consistent_sex(records: &[RawEpisodeRecord]) -> Option<String> {
    let distinct = records.iter().map(|r| r.patient.sex).unique().count();
    violation_if(distinct > 1, records, "Inconsistent sex")
}

fn consistent_incidence_year(records: &[RawEpisodeRecord]) -> Option<String> {
    let distinct = records
        .iter()
        .map(|r| r.primary_diagnosis.incidence_year)
        .unique()
        .count();
    violation_if(distinct > 1, records, "Inconsistent year of incidence")
}

fn exactly_one_diagnosis(records: &[RawEpisodeRecord]) -> Option<String> {
    let count = records.iter().filter(|r| r.is_diagnosis()).count();
    violation_if(count != 1, records, &format!("Found {} diagnosis records", count))
}

fn valid_vital_status(records: &[RawEpisodeRecord]) -> Option<String> {
    let (diagnosis, follow_up) = split_episodes(records);
    let populated = diagnosis
        .iter()
        .all(|r| r.patient.vital_status.is_some() && r.patient.vital_status_interval.is_some());
    let empty_on_follow_up = follow_up
        .iter()
        .all(|r| r.patient.vital_status.is_none() && r.patient.vital_status_interval.is_none());

    if !populated {
        violation_if(true, records, "Missing vital status on diagnosis record")
    } else {
        violation_if(!empty_on_follow_up, records, "Vital status present on follow-up record")
    }
}

fn consistent_double_tumor(records: &[RawEpisodeRecord]) -> Option<String> {
    let (diagnosis, follow_up) = split_episodes(records);
    let valid = diagnosis.iter().all(|r| r.clinical.double_primary_tumor.is_some())
        && follow_up.iter().all(|r| r.clinical.double_primary_tumor == Some(0));
    violation_if(!valid, records, "Invalid double tumor data")
}

fn no_molecular_on_follow_up(records: &[RawEpisodeRecord]) -> Option<String> {
    let (_, follow_up) = split_episodes(records);
    let valid = follow_up.iter().all(|r| r.molecular.is_empty());
    violation_if(!valid, records, "Molecular data present on follow-up record")
}

fn max_one_metastatic_detection(records: &[RawEpisodeRecord]) -> Option<String> {
    let count = records.iter().filter(|r| detects_metastases(r)).count();
    violation_if(count > 1, records, "Multiple metastatic detection records")
}

fn consistent_metastatic_progression(records: &[RawEpisodeRecord]) -> Option<String> {
    let valid = records.iter().all(|record| {
        let mut progression = record
            .metastatic_diagnosis
            .metastases
            .iter()
            .map(|m| m.progression);
        match record.identification.metastatic_detection {
            MetastaticDetection::AtStart => progression.any(zero_or_null),
            MetastaticDetection::AtProgression => progression.any(not_zero_nor_null),
            MetastaticDetection::Absent => true,
        }
    });
    violation_if(!valid, records, "Inconsistent metastatic progression data")
}

fn consistent_comorbidities(records: &[RawEpisodeRecord]) -> Option<String> {
    let valid = records.iter().all(|r| {
        let fields = r.comorbidities.fields();
        fields.iter().all(Option::is_none) || fields.iter().all(Option::is_some)
    });
    violation_if(!valid, records, "Partially populated comorbidity data")
}

fn no_metastatic_data_if_absent(records: &[RawEpisodeRecord]) -> Option<String> {
    let valid = records.iter().filter(|r| !detects_metastases(r)).all(|record| {
        let treatment = &record.treatment;
        record.metastatic_diagnosis.metastases.iter().all(MetastasisEntry::is_empty)
            && treatment
                .metastatic_surgery
                .iter()
                .all(|s| *s == MetastaticSurgery::default())
            && treatment
                .metastatic_radiotherapy
                .iter()
                .all(|rt| *rt == MetastaticRadiotherapy::default())
    });
    violation_if(!valid, records, "Metastatic data present without metastatic detection")
}

fn scheme_number_has_drug(records: &[RawEpisodeRecord]) -> Option<String> {
    let valid = records
        .iter()
        .flat_map(|r| r.treatment.systemic.slots.iter())
        .all(|slot| slot.scheme_number.is_none() || slot.drug_code.is_some());
    violation_if(!valid, records, "Scheme number without drug code")
}

fn has_intervention(treatment: &TreatmentFields) -> bool {
    treatment.primary_surgery.performed == Some(1)
        || not_zero_nor_null(treatment.primary_radiotherapy.given)
        || not_zero_nor_null(treatment.primary_radiotherapy.chemoradiation)
        || not_zero_nor_null(treatment.gastro_resection.performed)
        || not_zero_nor_null(treatment.hipec.performed)
        || not_zero_nor_null(treatment.systemic.chemo)
        || not_zero_nor_null(treatment.systemic.targeted)
        || treatment
            .metastatic_surgery
            .iter()
            .any(|s| s.code.is_some() || s.interval_days.is_some())
        || treatment.metastatic_radiotherapy.iter().any(|rt| rt.code.is_some())
}

fn plausible_treatment(records: &[RawEpisodeRecord]) -> Option<String> {
    let claims_treatment = records
        .iter()
        .any(|r| r.treatment.tumor_directed_therapy == Some(1));
    let any_intervention = records.iter().any(|r| has_intervention(&r.treatment));
    violation_if(
        claims_treatment && !any_intervention,
        records,
        "Tumor-directed treatment without any recorded intervention",
    )
}

fn valid_primary_tumor_type(records: &[RawEpisodeRecord]) -> Option<String> {
    let (diagnosis, follow_up) = split_episodes(records);
    let valid = diagnosis.iter().all(|r| r.primary_diagnosis.morphology_category.is_some())
        && follow_up.iter().all(|r| r.primary_diagnosis.morphology_category.is_none());
    violation_if(!valid, records, "Invalid morphology category data")
}

fn valid_anal_distance(records: &[RawEpisodeRecord]) -> Option<String> {
    let (_, follow_up) = split_episodes(records);
    let valid = follow_up.iter().all(|r| r.clinical.anal_distance.is_none());
    violation_if(!valid, records, "Anal distance present on follow-up record")
}

fn valid_primary_surgery(records: &[RawEpisodeRecord]) -> Option<String> {
    let valid = records.iter().all(|r| {
        let surgery = &r.treatment.primary_surgery;
        (surgery.performed == Some(1)) == surgery.types.iter().copied().any(not_zero_nor_null)
    });
    violation_if(!valid, records, "Primary surgery flag disagrees with surgery types")
}

fn valid_primary_radiotherapy(records: &[RawEpisodeRecord]) -> Option<String> {
    let valid = records.iter().all(|r| {
        let rt = &r.treatment.primary_radiotherapy;
        let given = not_zero_nor_null(rt.given) || not_zero_nor_null(rt.chemoradiation);
        given == rt.types.iter().copied().any(not_zero_nor_null)
    });
    violation_if(!valid, records, "Primary radiotherapy flags disagree with radiotherapy types")
}

fn valid_gastro_resection(records: &[RawEpisodeRecord]) -> Option<String> {
    let valid = records.iter().all(|r| {
        let resection = &r.treatment.gastro_resection;
        not_zero_nor_null(resection.performed) == resection.types.iter().copied().any(not_zero_nor_null)
    });
    violation_if(!valid, records, "Gastroenterology resection flag disagrees with resection types")
}

fn valid_systemic_treatment(records: &[RawEpisodeRecord]) -> Option<String> {
    let valid = records.iter().all(|r| {
        let systemic = &r.treatment.systemic;
        let flagged = not_zero_nor_null(systemic.chemo) || not_zero_nor_null(systemic.targeted);
        flagged == systemic.slots.iter().any(|slot| slot.drug_code.is_some())
    });
    violation_if(!valid, records, "Systemic treatment flags disagree with drug codes")
}

fn timed_consistently(
    surgery: Option<i32>,
    surgery_start: Option<i32>,
    timing_code: Option<i32>,
    treatment_start: Option<i32>,
) -> bool {
    match timing_code {
        Some(PRE_SURGERY_CODE) => {
            surgery.is_none()
                || matches!((surgery_start, treatment_start), (Some(s), Some(t)) if t <= s)
        }
        Some(POST_SURGERY_CODE) => {
            surgery.is_some()
                && matches!((surgery_start, treatment_start), (Some(s), Some(t)) if t >= s)
        }
        _ => true,
    }
}

fn consistent_surgical_timing(records: &[RawEpisodeRecord]) -> Option<String> {
    let valid = records.iter().all(|r| {
        let surgery = &r.treatment.primary_surgery;
        let rt = &r.treatment.primary_radiotherapy;
        [rt.given, rt.chemoradiation].into_iter().all(|timing| {
            timed_consistently(surgery.performed, surgery.intervals[0], timing, rt.start_intervals[0])
        })
    });
    violation_if(!valid, records, "Radiotherapy timing inconsistent with surgery")
}
