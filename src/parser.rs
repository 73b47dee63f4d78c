use crate::codes::{decode_episode_type, decode_metastatic_detection};
use crate::{errors::ConsolidationError, models::*, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reader for `;`-separated registry exports with a header row. Empty cells are null.
pub struct NcrParser;

impl NcrParser {
    pub fn parse_file<P: AsRef<Path>>(file_path: P) -> Result<Vec<RawEpisodeRecord>> {
        let file = File::open(file_path)?;
        Self::parse_reader(file)
    }

    pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<RawEpisodeRecord>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();

        for column in MANDATORY_COLUMNS {
            if !headers.contains_key(*column) {
                return Err(ConsolidationError::MissingColumn(column.to_string()));
            }
        }

        let mut records = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result?;
            let row = Row {
                headers: &headers,
                record: &record,
                line: index + 2,
            };
            records.push(row.to_episode()?);
        }

        log::info!("Parsed {} episode records", records.len());
        Ok(records)
    }

    /// Every column the parser understands, in export order.
    pub fn columns() -> Vec<String> {
        let mut columns: Vec<String> = MANDATORY_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(
            ["gesl", "leeft", "vit_stat", "vit_stat_int", "dubbeltum", "anus_afst", "incjr", "morf_cat"]
                .map(String::from),
        );
        columns.extend(["msi_stat", "braf_mut", "ras_mut"].map(String::from));
        columns.extend(numbered(&["meta_topo_sublok", "meta_int", "meta_prog"], METASTASIS_COUNT));
        columns.extend(COMORBIDITY_COLUMNS.iter().map(|c| c.to_string()));
        columns.push("tumgericht_ther".to_string());
        columns.push("chir".to_string());
        columns.extend(numbered(&["chir_type", "chir_int"], 2));
        columns.extend(["rt", "chemort"].map(String::from));
        columns.extend(numbered(&["rt_type", "rt_start_int", "rt_stop_int"], 2));
        columns.push("mdl_res".to_string());
        columns.extend(numbered(&["mdl_res_type", "mdl_res_int"], 2));
        columns.extend(["hipec", "hipec_int1", "chemo", "target"].map(String::from));
        columns.extend(numbered(
            &["syst_code", "syst_schemanum", "syst_kuren", "syst_start_int", "syst_stop_int", "syst_prepost"],
            DRUG_SLOT_COUNT,
        ));
        columns.extend(numbered(&["meta_chir_code", "meta_chir_int", "meta_chir_rad"], METASTATIC_SURGERY_COUNT));
        columns.extend(numbered(
            &["meta_rt_code", "meta_rt_start_int", "meta_rt_stop_int"],
            METASTATIC_RADIOTHERAPY_COUNT,
        ));
        columns.extend(["respons_uitslag", "respons_int"].map(String::from));
        columns.extend(numbered(&["pfs_event", "fup_event_type", "pfs_int"], OUTCOME_FIELD_COUNT));
        columns
    }
}

const MANDATORY_COLUMNS: &[&str] = &["key_nkr", "key_zid", "key_eid", "teller", "epis", "meta_epis"];

const COMORBIDITY_COLUMNS: [&str; 19] = [
    "cci",
    "cci_aids",
    "cci_cat",
    "cci_chf",
    "cci_collagenosis",
    "cci_copd",
    "cci_cvd",
    "cci_dementia",
    "cci_dm",
    "cci_eod_dm",
    "cci_malignancy",
    "cci_metastatic",
    "cci_mi",
    "cci_mild_liver",
    "cci_plegia",
    "cci_pvd",
    "cci_renal",
    "cci_severe_liver",
    "cci_ulcer",
];

/// `prefix1..prefixN` for each prefix, grouped by index.
fn numbered(prefixes: &[&str], count: usize) -> Vec<String> {
    (1..=count)
        .flat_map(|i| prefixes.iter().map(move |prefix| format!("{}{}", prefix, i)))
        .collect()
}

struct Row<'a> {
    headers: &'a HashMap<String, usize>,
    record: &'a StringRecord,
    line: usize,
}

impl Row<'_> {
    fn string(&self, column: &str) -> Option<String> {
        let index = *self.headers.get(column)?;
        let value = self.record.get(index)?;
        (!value.is_empty()).then(|| value.to_string())
    }

    fn int(&self, column: &str) -> Result<Option<i32>> {
        self.string(column)
            .map(|value| {
                value.parse::<i32>().map_err(|_| {
                    ConsolidationError::ParseError(format!(
                        "Invalid integer '{}' for {} on line {}",
                        value, column, self.line
                    ))
                })
            })
            .transpose()
    }

    fn required_int(&self, column: &str) -> Result<i32> {
        self.int(column)?.ok_or_else(|| {
            ConsolidationError::ParseError(format!("Missing value for {} on line {}", column, self.line))
        })
    }

    fn required_id(&self, column: &str) -> Result<i64> {
        let value = self.required_string(column)?;
        value.parse::<i64>().map_err(|_| {
            ConsolidationError::ParseError(format!(
                "Invalid id '{}' for {} on line {}",
                value, column, self.line
            ))
        })
    }

    fn required_string(&self, column: &str) -> Result<String> {
        self.string(column).ok_or_else(|| {
            ConsolidationError::ParseError(format!("Missing value for {} on line {}", column, self.line))
        })
    }

    fn int_n(&self, prefix: &str, n: usize) -> Result<Option<i32>> {
        self.int(&format!("{}{}", prefix, n))
    }

    fn int_pair(&self, prefix: &str) -> Result<[Option<i32>; 2]> {
        Ok([self.int_n(prefix, 1)?, self.int_n(prefix, 2)?])
    }

    fn string_n(&self, prefix: &str, n: usize) -> Option<String> {
        self.string(&format!("{}{}", prefix, n))
    }

    fn to_episode(&self) -> Result<RawEpisodeRecord> {
        let identification = Identification {
            patient_id: self.required_id("key_nkr")?,
            tumor_id: self.required_id("key_zid")?,
            episode_id: self.required_id("key_eid")?,
            episode_order: self.required_int("teller")?,
            episode_type: decode_episode_type(&self.required_string("epis")?)?,
            metastatic_detection: decode_metastatic_detection(self.required_int("meta_epis")?)?,
        };

        Ok(RawEpisodeRecord {
            identification,
            patient: PatientCharacteristics {
                sex: self.int("gesl")?,
                age: self.int("leeft")?,
                vital_status: self.int("vit_stat")?,
                vital_status_interval: self.int("vit_stat_int")?,
            },
            clinical: ClinicalCharacteristics {
                double_primary_tumor: self.int("dubbeltum")?,
                anal_distance: self.int("anus_afst")?,
            },
            primary_diagnosis: PrimaryDiagnosis {
                incidence_year: self.int("incjr")?,
                morphology_category: self.int("morf_cat")?,
            },
            molecular: MolecularCharacteristics {
                msi_status: self.int("msi_stat")?,
                braf_mutation: self.int("braf_mut")?,
                ras_mutation: self.int("ras_mut")?,
            },
            metastatic_diagnosis: self.metastatic_diagnosis()?,
            comorbidities: self.comorbidities()?,
            treatment: self.treatment()?,
            response: self.response()?,
        })
    }

    fn metastatic_diagnosis(&self) -> Result<MetastaticDiagnosis> {
        let mut metastases: [MetastasisEntry; METASTASIS_COUNT] = Default::default();
        for (i, entry) in metastases.iter_mut().enumerate() {
            let n = i + 1;
            *entry = MetastasisEntry {
                location: self.string_n("meta_topo_sublok", n),
                interval_days: self.int_n("meta_int", n)?,
                progression: self.int_n("meta_prog", n)?,
            };
        }
        Ok(MetastaticDiagnosis { metastases })
    }

    fn comorbidities(&self) -> Result<CharlsonComorbidities> {
        let mut values = [None; 19];
        for (value, column) in values.iter_mut().zip(COMORBIDITY_COLUMNS) {
            *value = self.int(column)?;
        }
        let [cci, aids, cat, chf, collagenosis, copd, cvd, dementia, dm, eod_dm, malignancy, metastatic, mi, mild_liver, plegia, pvd, renal, severe_liver, ulcer] =
            values;
        Ok(CharlsonComorbidities {
            cci,
            aids,
            cat,
            chf,
            collagenosis,
            copd,
            cvd,
            dementia,
            dm,
            eod_dm,
            malignancy,
            metastatic,
            mi,
            mild_liver,
            plegia,
            pvd,
            renal,
            severe_liver,
            ulcer,
        })
    }

    fn treatment(&self) -> Result<TreatmentFields> {
        let mut slots: [DrugAdministrationSlot; DRUG_SLOT_COUNT] = Default::default();
        for (i, slot) in slots.iter_mut().enumerate() {
            let n = i + 1;
            *slot = DrugAdministrationSlot {
                drug_code: self.string_n("syst_code", n),
                scheme_number: self.int_n("syst_schemanum", n)?,
                cycle_code: self.int_n("syst_kuren", n)?,
                start_day: self.int_n("syst_start_int", n)?,
                stop_day: self.int_n("syst_stop_int", n)?,
                pre_post_surgery_code: self.int_n("syst_prepost", n)?,
            };
        }

        let mut metastatic_surgery: [MetastaticSurgery; METASTATIC_SURGERY_COUNT] = Default::default();
        for (i, surgery) in metastatic_surgery.iter_mut().enumerate() {
            let n = i + 1;
            *surgery = MetastaticSurgery {
                code: self.string_n("meta_chir_code", n),
                radicality: self.int_n("meta_chir_rad", n)?,
                interval_days: self.int_n("meta_chir_int", n)?,
            };
        }

        let mut metastatic_radiotherapy: [MetastaticRadiotherapy; METASTATIC_RADIOTHERAPY_COUNT] =
            Default::default();
        for (i, radiotherapy) in metastatic_radiotherapy.iter_mut().enumerate() {
            let n = i + 1;
            *radiotherapy = MetastaticRadiotherapy {
                code: self.string_n("meta_rt_code", n),
                start_interval: self.int_n("meta_rt_start_int", n)?,
                stop_interval: self.int_n("meta_rt_stop_int", n)?,
            };
        }

        Ok(TreatmentFields {
            tumor_directed_therapy: self.int("tumgericht_ther")?,
            primary_surgery: PrimarySurgery {
                performed: self.int("chir")?,
                types: self.int_pair("chir_type")?,
                intervals: self.int_pair("chir_int")?,
            },
            primary_radiotherapy: PrimaryRadiotherapy {
                given: self.int("rt")?,
                chemoradiation: self.int("chemort")?,
                types: self.int_pair("rt_type")?,
                start_intervals: self.int_pair("rt_start_int")?,
                stop_intervals: self.int_pair("rt_stop_int")?,
            },
            gastro_resection: GastroResection {
                performed: self.int("mdl_res")?,
                types: self.int_pair("mdl_res_type")?,
                intervals: self.int_pair("mdl_res_int")?,
            },
            hipec: Hipec {
                performed: self.int("hipec")?,
                interval: self.int("hipec_int1")?,
            },
            systemic: SystemicTreatment {
                chemo: self.int("chemo")?,
                targeted: self.int("target")?,
                slots,
            },
            metastatic_surgery,
            metastatic_radiotherapy,
        })
    }

    fn response(&self) -> Result<TreatmentResponse> {
        let mut outcome_fields: [RawOutcomeField; OUTCOME_FIELD_COUNT] = Default::default();
        for (i, field) in outcome_fields.iter_mut().enumerate() {
            let n = i + 1;
            *field = RawOutcomeField {
                event_code: self.int_n("pfs_event", n)?,
                follow_up_event_code: self.int_n("fup_event_type", n)?,
                interval_days: self.int_n("pfs_int", n)?,
            };
        }
        Ok(TreatmentResponse {
            response_code: self.string("respons_uitslag"),
            response_interval: self.int("respons_int")?,
            outcome_fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "key_nkr;key_zid;key_eid;teller;epis;meta_epis;gesl;vit_stat;vit_stat_int;syst_code1;syst_schemanum1;syst_kuren1;pfs_event1;pfs_int1";

    #[test]
    fn test_parse_minimal_export() {
        let data = format!(
            "{}\n1;10;100;1;DIA;0;2;0;365;L01BC06;1;8;1;200\n1;10;101;2;VERB;2;2;;;;;;;\n",
            HEADER
        );
        let records = NcrParser::parse_reader(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        let diagnosis = &records[0];
        assert_eq!(diagnosis.identification.tumor_id, 10);
        assert!(diagnosis.is_diagnosis());
        assert_eq!(diagnosis.patient.vital_status_interval, Some(365));
        assert_eq!(diagnosis.treatment.systemic.slots[0].drug_code.as_deref(), Some("L01BC06"));
        assert_eq!(diagnosis.treatment.systemic.slots[0].cycle_code, Some(8));
        assert_eq!(diagnosis.treatment.systemic.slots[1].drug_code, None);
        assert_eq!(diagnosis.response.outcome_fields[0].interval_days, Some(200));

        let follow_up = &records[1];
        assert_eq!(follow_up.identification.episode_type, EpisodeType::FollowUp);
        assert_eq!(follow_up.identification.metastatic_detection, MetastaticDetection::AtProgression);
        assert_eq!(follow_up.patient.vital_status, None);
    }

    #[test]
    fn test_missing_identification_column() {
        let data = "key_nkr;key_zid;teller;epis;meta_epis\n1;10;1;DIA;0\n";
        let err = NcrParser::parse_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ConsolidationError::MissingColumn(ref c) if c == "key_eid"));
    }

    #[test]
    fn test_invalid_integer_reports_line() {
        let data = format!("{}\n1;10;100;1;DIA;0;x;0;365;;;;;\n", HEADER);
        let err = NcrParser::parse_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("gesl on line 2"));
    }

    #[test]
    fn test_unknown_episode_code() {
        let data = format!("{}\n1;10;100;1;XYZ;0;1;0;365;;;;;\n", HEADER);
        assert!(NcrParser::parse_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_column_list_is_complete() {
        let columns = NcrParser::columns();
        assert!(columns.contains(&"syst_prepost14".to_string()));
        assert!(columns.contains(&"meta_prog10".to_string()));
        assert!(columns.contains(&"pfs_int4".to_string()));
        assert!(columns.contains(&"cci_ulcer".to_string()));
        assert_eq!(columns.iter().filter(|c| c.starts_with("syst_code")).count(), DRUG_SLOT_COUNT);
    }
}
