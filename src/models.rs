use crate::drugs::Drug;
use crate::regimens::{TreatmentClassification, TreatmentGroup};
use serde::{Deserialize, Serialize};

pub const DRUG_SLOT_COUNT: usize = 14;
pub const OUTCOME_FIELD_COUNT: usize = 4;
pub const METASTASIS_COUNT: usize = 10;
pub const METASTATIC_SURGERY_COUNT: usize = 3;
pub const METASTATIC_RADIOTHERAPY_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpisodeType {
    #[serde(rename = "DIA")]
    Diagnosis,
    #[serde(rename = "VERB")]
    FollowUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetastaticDetection {
    Absent,
    AtStart,
    AtProgression,
}

/// One registry row: a single clinical encounter for a tumor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEpisodeRecord {
    pub identification: Identification,
    pub patient: PatientCharacteristics,
    pub clinical: ClinicalCharacteristics,
    pub primary_diagnosis: PrimaryDiagnosis,
    pub molecular: MolecularCharacteristics,
    pub metastatic_diagnosis: MetastaticDiagnosis,
    pub comorbidities: CharlsonComorbidities,
    pub treatment: TreatmentFields,
    pub response: TreatmentResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identification {
    pub patient_id: i64,
    pub tumor_id: i64,
    pub episode_id: i64,
    pub episode_order: i32,
    pub episode_type: EpisodeType,
    pub metastatic_detection: MetastaticDetection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientCharacteristics {
    pub sex: Option<i32>,
    pub age: Option<i32>,
    pub vital_status: Option<i32>,
    pub vital_status_interval: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicalCharacteristics {
    pub double_primary_tumor: Option<i32>,
    pub anal_distance: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimaryDiagnosis {
    pub incidence_year: Option<i32>,
    pub morphology_category: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MolecularCharacteristics {
    pub msi_status: Option<i32>,
    pub braf_mutation: Option<i32>,
    pub ras_mutation: Option<i32>,
}

impl MolecularCharacteristics {
    pub fn is_empty(&self) -> bool {
        self.msi_status.is_none() && self.braf_mutation.is_none() && self.ras_mutation.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetastasisEntry {
    pub location: Option<String>,
    pub interval_days: Option<i32>,
    pub progression: Option<i32>,
}

impl MetastasisEntry {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.interval_days.is_none() && self.progression.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetastaticDiagnosis {
    pub metastases: [MetastasisEntry; METASTASIS_COUNT],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharlsonComorbidities {
    pub cci: Option<i32>,
    pub aids: Option<i32>,
    pub cat: Option<i32>,
    pub chf: Option<i32>,
    pub collagenosis: Option<i32>,
    pub copd: Option<i32>,
    pub cvd: Option<i32>,
    pub dementia: Option<i32>,
    pub dm: Option<i32>,
    pub eod_dm: Option<i32>,
    pub malignancy: Option<i32>,
    pub metastatic: Option<i32>,
    pub mi: Option<i32>,
    pub mild_liver: Option<i32>,
    pub plegia: Option<i32>,
    pub pvd: Option<i32>,
    pub renal: Option<i32>,
    pub severe_liver: Option<i32>,
    pub ulcer: Option<i32>,
}

impl CharlsonComorbidities {
    pub fn fields(&self) -> [Option<i32>; 19] {
        [
            self.cci,
            self.aids,
            self.cat,
            self.chf,
            self.collagenosis,
            self.copd,
            self.cvd,
            self.dementia,
            self.dm,
            self.eod_dm,
            self.malignancy,
            self.metastatic,
            self.mi,
            self.mild_liver,
            self.plegia,
            self.pvd,
            self.renal,
            self.severe_liver,
            self.ulcer,
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreatmentFields {
    pub tumor_directed_therapy: Option<i32>,
    pub primary_surgery: PrimarySurgery,
    pub primary_radiotherapy: PrimaryRadiotherapy,
    pub gastro_resection: GastroResection,
    pub hipec: Hipec,
    pub systemic: SystemicTreatment,
    pub metastatic_surgery: [MetastaticSurgery; METASTATIC_SURGERY_COUNT],
    pub metastatic_radiotherapy: [MetastaticRadiotherapy; METASTATIC_RADIOTHERAPY_COUNT],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimarySurgery {
    pub performed: Option<i32>,
    pub types: [Option<i32>; 2],
    pub intervals: [Option<i32>; 2],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimaryRadiotherapy {
    pub given: Option<i32>,
    pub chemoradiation: Option<i32>,
    pub types: [Option<i32>; 2],
    pub start_intervals: [Option<i32>; 2],
    pub stop_intervals: [Option<i32>; 2],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GastroResection {
    pub performed: Option<i32>,
    pub types: [Option<i32>; 2],
    pub intervals: [Option<i32>; 2],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hipec {
    pub performed: Option<i32>,
    pub interval: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemicTreatment {
    pub chemo: Option<i32>,
    pub targeted: Option<i32>,
    pub slots: [DrugAdministrationSlot; DRUG_SLOT_COUNT],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetastaticSurgery {
    pub code: Option<String>,
    pub radicality: Option<i32>,
    pub interval_days: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetastaticRadiotherapy {
    pub code: Option<String>,
    pub start_interval: Option<i32>,
    pub stop_interval: Option<i32>,
}

/// A single systemic drug administration row. Unused when `drug_code` is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrugAdministrationSlot {
    pub drug_code: Option<String>,
    pub scheme_number: Option<i32>,
    pub cycle_code: Option<i32>,
    pub start_day: Option<i32>,
    pub stop_day: Option<i32>,
    pub pre_post_surgery_code: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreatmentResponse {
    pub response_code: Option<String>,
    pub response_interval: Option<i32>,
    pub outcome_fields: [RawOutcomeField; OUTCOME_FIELD_COUNT],
}

/// Raw follow-up event columns, decoded into an [`OutcomeMeasure`] during extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOutcomeField {
    pub event_code: Option<i32>,
    pub follow_up_event_code: Option<i32>,
    pub interval_days: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    #[serde(rename = "PROGRESSION")]
    Progression,
    #[serde(rename = "DEATH")]
    Death,
    #[serde(rename = "CENSOR")]
    Censor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FollowUpEvent {
    #[serde(rename = "LOCAL_ONLY")]
    LocalOnly,
    #[serde(rename = "REGIONAL")]
    Regional,
    #[serde(rename = "DISTANT_AND_POSSIBLY_REGIONAL_OR_LOCAL")]
    DistantAndPossiblyRegionalOrLocal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeMeasure {
    pub kind: OutcomeKind,
    pub day: Option<i32>,
    pub follow_up_event: Option<FollowUpEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "MALE")]
    Male,
    #[serde(rename = "FEMALE")]
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VitalStatus {
    #[serde(rename = "ALIVE")]
    Alive,
    #[serde(rename = "DEAD")]
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseType {
    CR,
    PR,
    MR,
    SD,
    PD,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CycleDetails {
    #[serde(rename = "SENSITIZER")]
    Sensitizer,
    #[serde(rename = "MAINTENANCE")]
    Maintenance,
    #[serde(rename = "ONGOING_TREATMENT")]
    OngoingTreatment,
}

/// A decoded drug administration belonging to a scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeDrug {
    pub drug: Drug,
    pub cycles: Option<i32>,
    pub cycle_details: Option<CycleDetails>,
    pub start_day: Option<i32>,
    pub stop_day: Option<i32>,
    pub pre_surgery: bool,
    pub post_surgery: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentScheme {
    /// `None` collects every slot that carried no scheme number.
    pub scheme_number: Option<i32>,
    pub components: Vec<SchemeDrug>,
    pub start_min: Option<i32>,
    pub start_max: Option<i32>,
    pub stop_min: Option<i32>,
    pub stop_max: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeasure {
    pub response: ResponseType,
    pub day: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub patient_id: i64,
    pub tumor_id: i64,
    pub sex: Option<Sex>,
    pub vital_status: Option<VitalStatus>,
    pub classification: TreatmentClassification,
    pub group: TreatmentGroup,
    pub schemes: Vec<TreatmentScheme>,
    pub plan_start_day: Option<i32>,
    pub plan_stop_day: Option<i32>,
    pub observed_pfs_days: Option<i32>,
    pub had_progression_event: Option<bool>,
    pub days_plan_start_to_response: Option<i32>,
    pub days_plan_start_to_latest_alive_status: Option<i32>,
    pub outcome_measures: Vec<OutcomeMeasure>,
    pub response_measures: Vec<ResponseMeasure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtractionOutcome {
    Accepted(TreatmentPlan),
    Rejected { tumor_id: i64, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReporting {
    FirstFailure,
    AllFailures,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleSet {
    Standard,
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub log_filtered_records: bool,
    pub rejection_reporting: RejectionReporting,
    pub rule_set: RuleSet,
    pub output_path: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            log_filtered_records: false,
            rejection_reporting: RejectionReporting::FirstFailure,
            rule_set: RuleSet::Standard,
            output_path: "./ncr_results".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedTumor {
    pub tumor_id: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedTumor {
    pub tumor_id: i64,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    pub plans: Vec<TreatmentPlan>,
    pub rejected: Vec<RejectedTumor>,
    pub failed: Vec<FailedTumor>,
}

impl BatchResults {
    pub fn total_tumors(&self) -> usize {
        self.plans.len() + self.rejected.len() + self.failed.len()
    }
}

impl RawEpisodeRecord {
    /// An otherwise empty record with the identifying fields set.
    pub fn new(
        patient_id: i64,
        tumor_id: i64,
        episode_id: i64,
        episode_order: i32,
        episode_type: EpisodeType,
    ) -> Self {
        RawEpisodeRecord {
            identification: Identification {
                patient_id,
                tumor_id,
                episode_id,
                episode_order,
                episode_type,
                metastatic_detection: MetastaticDetection::Absent,
            },
            patient: PatientCharacteristics::default(),
            clinical: ClinicalCharacteristics::default(),
            primary_diagnosis: PrimaryDiagnosis::default(),
            molecular: MolecularCharacteristics::default(),
            metastatic_diagnosis: MetastaticDiagnosis::default(),
            comorbidities: CharlsonComorbidities::default(),
            treatment: TreatmentFields::default(),
            response: TreatmentResponse::default(),
        }
    }

    pub fn tumor_id(&self) -> i64 {
        self.identification.tumor_id
    }

    pub fn is_diagnosis(&self) -> bool {
        self.identification.episode_type == EpisodeType::Diagnosis
    }
}
