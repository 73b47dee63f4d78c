use crate::{parser::NcrParser, Result};
use csv::WriterBuilder;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::path::Path;

const FIRST_LINE_REGIMENS: &[&[&str]] = &[
    &["L01BC06", "L01XA03"],
    &["L01BC06", "L01XA03", "L01FG01"],
    &["L01BC02", "L01XA03"],
    &["L01BC02", "L01CE02"],
    &["L01BC02", "L01CE02", "L01FE02"],
    &["L01BC02", "L01XA03", "L01CE02", "L01FG01"],
    &["L01BC06"],
    &["L01FF02"],
];

const SECOND_LINE_REGIMENS: &[&[&str]] = &[&["L01BC06"], &["L01CE02"], &["L01BC59"], &["L01FE01"]];

type Row = HashMap<String, String>;

/// Synthetic registry exports in the same layout the parser reads.
pub struct ExampleDataGenerator;

impl ExampleDataGenerator {
    pub fn generate_dataset<P: AsRef<Path>>(output_path: P, n_tumors: usize) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let columns = NcrParser::columns();

        let mut writer = WriterBuilder::new().delimiter(b';').from_path(output_path)?;
        writer.write_record(&columns)?;

        for tumor in 1..=n_tumors {
            for row in Self::generate_tumor(&mut rng, tumor as i64) {
                let values = columns.iter().map(|c| row.get(c).map(String::as_str).unwrap_or(""));
                writer.write_record(values)?;
            }
        }
        writer.flush()?;

        log::info!("Generated example dataset with {} tumors", n_tumors);
        Ok(())
    }

    fn generate_tumor(rng: &mut StdRng, tumor: i64) -> Vec<Row> {
        let patient_id = tumor;
        let tumor_id = 1000 + tumor;
        let sex = rng.gen_range(1..=2);
        let incidence_year = rng.gen_range(2015..=2022);

        let mut diagnosis = Row::new();
        set(&mut diagnosis, "key_nkr", patient_id);
        set(&mut diagnosis, "key_zid", tumor_id);
        set(&mut diagnosis, "key_eid", tumor_id * 10 + 1);
        set(&mut diagnosis, "teller", 1);
        set(&mut diagnosis, "epis", "DIA");
        set(&mut diagnosis, "meta_epis", 1);
        set(&mut diagnosis, "gesl", sex);
        set(&mut diagnosis, "leeft", rng.gen_range(40..=85));
        set(&mut diagnosis, "incjr", incidence_year);
        set(&mut diagnosis, "morf_cat", 1);
        set(&mut diagnosis, "dubbeltum", 0);
        set(&mut diagnosis, "msi_stat", rng.gen_range(0..=1));
        set(&mut diagnosis, "meta_topo_sublok1", "C220");
        set(&mut diagnosis, "meta_int1", 0);
        set(&mut diagnosis, "meta_prog1", 0);

        let vital_status = rng.gen_range(0..=1);
        set(&mut diagnosis, "vit_stat", vital_status);
        set(&mut diagnosis, "vit_stat_int", rng.gen_range(200..=1500));

        let treated = rng.gen_bool(0.85);
        set(&mut diagnosis, "tumgericht_ther", if treated { 1 } else { 0 });
        set(&mut diagnosis, "chemo", if treated { 1 } else { 0 });
        set(&mut diagnosis, "target", 0);

        let mut slot = 0;
        let mut day = rng.gen_range(10..=40);
        if treated {
            let lines = if rng.gen_bool(0.4) { 2 } else { 1 };
            for line in 1..=lines {
                let regimen = match line {
                    1 => FIRST_LINE_REGIMENS.choose(rng),
                    _ => SECOND_LINE_REGIMENS.choose(rng),
                };
                let duration = rng.gen_range(60..=180);
                for code in regimen.copied().unwrap_or_default() {
                    slot += 1;
                    set(&mut diagnosis, &format!("syst_code{}", slot), code);
                    set(&mut diagnosis, &format!("syst_schemanum{}", slot), line);
                    set(&mut diagnosis, &format!("syst_kuren{}", slot), rng.gen_range(2..=12));
                    set(&mut diagnosis, &format!("syst_start_int{}", slot), day);
                    set(&mut diagnosis, &format!("syst_stop_int{}", slot), day + duration);
                    set(&mut diagnosis, &format!("syst_prepost{}", slot), 0);
                }
                day += duration + rng.gen_range(10..=60);
            }
            set(&mut diagnosis, "respons_uitslag", ["CR", "PR", "SD", "PD"].choose(rng).copied().unwrap_or("SD"));
            set(&mut diagnosis, "respons_int", day);
        }

        set(&mut diagnosis, "pfs_event1", 1);
        set(&mut diagnosis, "fup_event_type1", rng.gen_range(1..=3));
        set(&mut diagnosis, "pfs_int1", day + rng.gen_range(30..=300));

        let mut rows = vec![diagnosis];

        if rng.gen_bool(0.5) {
            let mut follow_up = Row::new();
            set(&mut follow_up, "key_nkr", patient_id);
            set(&mut follow_up, "key_zid", tumor_id);
            set(&mut follow_up, "key_eid", tumor_id * 10 + 2);
            set(&mut follow_up, "teller", 2);
            set(&mut follow_up, "epis", "VERB");
            set(&mut follow_up, "meta_epis", 0);
            set(&mut follow_up, "gesl", sex);
            set(&mut follow_up, "incjr", incidence_year);
            set(&mut follow_up, "dubbeltum", 0);
            set(&mut follow_up, "tumgericht_ther", 0);
            set(&mut follow_up, "chemo", 0);
            set(&mut follow_up, "target", 0);
            let event = if vital_status == 1 { 2 } else { 1 };
            set(&mut follow_up, "pfs_event1", event);
            set(&mut follow_up, "pfs_int1", day + rng.gen_range(301..=600));
            rows.push(follow_up);
        }

        // Every tenth tumor carries molecular data on its follow-up episode.
        if tumor % 10 == 0 {
            if let Some(follow_up) = rows.get_mut(1) {
                set(follow_up, "msi_stat", 1);
            }
        }

        rows
    }
}

fn set<V: ToString>(row: &mut Row, column: &str, value: V) {
    row.insert(column.to_string(), value.to_string());
}
