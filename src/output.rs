use crate::{models::*, Result};
use chrono::Local;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub struct OutputManager;

impl OutputManager {
    pub fn save_results<P: AsRef<Path>>(
        results: &BatchResults,
        config: &ExtractionConfig,
        output_path: P,
    ) -> Result<()> {
        let output_dir = output_path.as_ref();
        fs::create_dir_all(output_dir)?;

        Self::save_treatment_plans(&results.plans, output_dir)?;
        Self::save_schemes(&results.plans, output_dir)?;
        Self::save_rejection_log(results, output_dir)?;
        Self::save_json_results(results, output_dir)?;
        Self::generate_extraction_report(results, config, output_dir)?;

        log::info!("Results saved to: {}", output_dir.display());
        Ok(())
    }

    fn save_treatment_plans(plans: &[TreatmentPlan], output_dir: &Path) -> Result<()> {
        let file_path = output_dir.join("treatment_plans.csv");
        let mut file = File::create(file_path)?;

        writeln!(file, "PATIENT_ID,TUMOR_ID,CLASSIFICATION,GROUP,SCHEMES,PLAN_START,PLAN_STOP,PFS_DAYS,PFS_EVENT,DAYS_TO_RESPONSE,DAYS_TO_LATEST_ALIVE_STATUS")?;

        for plan in plans {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{},{},{}",
                plan.patient_id,
                plan.tumor_id,
                plan.classification,
                plan.group,
                plan.schemes.len(),
                na(plan.plan_start_day),
                na(plan.plan_stop_day),
                na(plan.observed_pfs_days),
                na(plan.had_progression_event),
                na(plan.days_plan_start_to_response),
                na(plan.days_plan_start_to_latest_alive_status),
            )?;
        }

        Ok(())
    }

    fn save_schemes(plans: &[TreatmentPlan], output_dir: &Path) -> Result<()> {
        let file_path = output_dir.join("treatment_schemes.csv");
        let mut file = File::create(file_path)?;

        writeln!(file, "TUMOR_ID,SCHEME,DRUGS,START_MIN,START_MAX,STOP_MIN,STOP_MAX")?;

        for plan in plans {
            for scheme in &plan.schemes {
                let drugs = scheme.components.iter().map(|c| format!("{:?}", c.drug)).join("|");
                writeln!(
                    file,
                    "{},{},{},{},{},{},{}",
                    plan.tumor_id,
                    na(scheme.scheme_number),
                    drugs,
                    na(scheme.start_min),
                    na(scheme.start_max),
                    na(scheme.stop_min),
                    na(scheme.stop_max),
                )?;
            }
        }

        Ok(())
    }

    fn save_rejection_log(results: &BatchResults, output_dir: &Path) -> Result<()> {
        let file_path = output_dir.join("rejected_tumors.log");
        let mut file = File::create(file_path)?;

        writeln!(file, "REJECTED TUMOR LOG")?;
        writeln!(file, "==================")?;
        writeln!(file)?;
        writeln!(file, "Rejected by quality filter: {}", results.rejected.len())?;
        writeln!(file, "Failed with errors: {}", results.failed.len())?;
        writeln!(file)?;

        for rejected in &results.rejected {
            writeln!(file, "Tumor ID: {}", rejected.tumor_id)?;
            writeln!(file, "Reason: {}", rejected.reason)?;
            writeln!(file, "---")?;
        }

        for failed in &results.failed {
            writeln!(file, "Tumor ID: {}", failed.tumor_id)?;
            writeln!(file, "Error: {}", failed.error)?;
            writeln!(file, "---")?;
        }

        Ok(())
    }

    fn save_json_results(results: &BatchResults, output_dir: &Path) -> Result<()> {
        let file_path = output_dir.join("complete_results.json");
        let json_string = serde_json::to_string_pretty(results)?;
        fs::write(file_path, json_string)?;
        Ok(())
    }

    fn generate_extraction_report(
        results: &BatchResults,
        config: &ExtractionConfig,
        output_dir: &Path,
    ) -> Result<()> {
        let file_path = output_dir.join("extraction_report.txt");
        let mut file = File::create(file_path)?;

        writeln!(file, "TREATMENT TIMELINE EXTRACTION REPORT")?;
        writeln!(file, "====================================")?;
        writeln!(file, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file)?;

        writeln!(file, "Extraction Configuration:")?;
        writeln!(file, "- Rule set: {:?}", config.rule_set)?;
        writeln!(file, "- Rejection reporting: {:?}", config.rejection_reporting)?;
        writeln!(file, "- Log filtered records: {}", config.log_filtered_records)?;
        writeln!(file, "- Output path: {}", config.output_path)?;
        writeln!(file)?;

        writeln!(file, "Tumor Summary:")?;
        writeln!(file, "- Total tumors: {}", results.total_tumors())?;
        writeln!(file, "- Treatment plans: {}", results.plans.len())?;
        writeln!(file, "- Rejected: {}", results.rejected.len())?;
        if !results.failed.is_empty() {
            writeln!(file, "- Failed: {}", results.failed.len())?;
        }
        writeln!(file)?;

        writeln!(file, "Plans per Classification:")?;
        for (classification, count) in Self::classification_counts(&results.plans) {
            writeln!(file, "- {}: {}", classification, count)?;
        }
        writeln!(file)?;

        let with_pfs = results.plans.iter().filter(|p| p.observed_pfs_days.is_some()).count();
        let with_event = results
            .plans
            .iter()
            .filter(|p| p.had_progression_event == Some(true))
            .count();
        writeln!(file, "Outcomes:")?;
        writeln!(file, "- Plans with observed PFS: {}", with_pfs)?;
        writeln!(file, "- Plans with progression event: {}", with_event)?;

        Ok(())
    }

    pub fn classification_counts(plans: &[TreatmentPlan]) -> BTreeMap<String, usize> {
        plans
            .iter()
            .map(|p| p.classification.to_string())
            .counts()
            .into_iter()
            .collect()
    }
}

fn na<T: ToString>(value: Option<T>) -> String {
    value.map_or("NA".to_string(), |v| v.to_string())
}
