use crate::codes::{decode_cycles, decode_pre_post_surgery};
use crate::{drugs::Drug, models::*, regimens::TreatmentClassification, Result};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

pub struct TreatmentSchemeConsolidator;

impl TreatmentSchemeConsolidator {
    /// Group used drug slots into schemes, ordered by scheme number.
    ///
    /// Slots without a drug code are skipped. Slots without a scheme number all land in a
    /// single ungrouped scheme which sorts before every numbered one.
    pub fn consolidate<'a, I>(slots: I) -> Result<Vec<TreatmentScheme>>
    where
        I: IntoIterator<Item = &'a DrugAdministrationSlot>,
    {
        let mut grouped: BTreeMap<Option<i32>, Vec<SchemeDrug>> = BTreeMap::new();

        for slot in slots {
            let Some(code) = slot.drug_code.as_deref() else {
                continue;
            };
            let component = Self::decode_slot(code, slot)?;
            grouped.entry(slot.scheme_number).or_default().push(component);
        }

        let schemes = grouped
            .into_iter()
            .map(|(scheme_number, components)| {
                let (start_min, start_max) = bounds(components.iter().filter_map(|c| c.start_day));
                let (stop_min, stop_max) = bounds(components.iter().filter_map(|c| c.stop_day));
                TreatmentScheme {
                    scheme_number,
                    components,
                    start_min,
                    start_max,
                    stop_min,
                    stop_max,
                }
            })
            .collect();

        Ok(schemes)
    }

    fn decode_slot(code: &str, slot: &DrugAdministrationSlot) -> Result<SchemeDrug> {
        let drug = Drug::from_code(code)?;
        let (cycles, cycle_details) = decode_cycles(slot.cycle_code)?;
        let (pre_surgery, post_surgery) = decode_pre_post_surgery(slot.pre_post_surgery_code)?;
        Ok(SchemeDrug {
            drug,
            cycles,
            cycle_details,
            start_day: slot.start_day,
            stop_day: slot.stop_day,
            pre_surgery,
            post_surgery,
        })
    }

    /// Classify the plan by its first line, tolerating later fluoropyrimidine swaps.
    pub fn classify(schemes: &[TreatmentScheme]) -> TreatmentClassification {
        let Some(first_index) = Self::first_scheme_index(schemes) else {
            return TreatmentClassification::None;
        };

        let first_drugs: BTreeSet<Drug> = scheme_drugs(&schemes[first_index]).collect();
        let later_drugs: BTreeSet<Drug> = schemes
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != first_index)
            .flat_map(|(_, scheme)| scheme_drugs(scheme))
            .collect();

        let substitutions_allowed = first_drugs.iter().any(Drug::is_substitutable);
        let unexplained = later_drugs
            .iter()
            .filter(|drug| !first_drugs.contains(*drug))
            .filter(|drug| !(substitutions_allowed && drug.is_substitutable()))
            .count();

        if unexplained == 0 {
            TreatmentClassification::find_for_drugs(&first_drugs)
        } else {
            TreatmentClassification::Other
        }
    }

    /// Earliest known start; ties and unknown starts fall back to scheme order.
    fn first_scheme_index(schemes: &[TreatmentScheme]) -> Option<usize> {
        schemes
            .iter()
            .enumerate()
            .min_by_key(|(index, scheme)| (scheme.start_min.is_none(), scheme.start_min, *index))
            .map(|(index, _)| index)
    }

    /// Start bound of the same first scheme that drives classification.
    pub fn plan_start(schemes: &[TreatmentScheme]) -> Option<i32> {
        Self::first_scheme_index(schemes).and_then(|index| schemes[index].start_min)
    }

    /// Stop bound of the last scheme. An ongoing last line leaves the plan open.
    pub fn plan_stop(schemes: &[TreatmentScheme]) -> Option<i32> {
        schemes.last().and_then(|s| s.stop_max)
    }
}

fn scheme_drugs(scheme: &TreatmentScheme) -> impl Iterator<Item = Drug> + '_ {
    scheme.components.iter().map(|c| c.drug)
}

fn bounds(days: impl Iterator<Item = i32>) -> (Option<i32>, Option<i32>) {
    match days.minmax().into_option() {
        Some((min, max)) => (Some(min), Some(max)),
        None => (None, None),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn slot(code: &str, scheme: Option<i32>, day: i32) -> DrugAdministrationSlot {
        DrugAdministrationSlot {
            drug_code: Some(code.to_string()),
            scheme_number: scheme,
            cycle_code: Some(day),
            start_day: Some(day),
            stop_day: Some(day),
            pre_post_surgery_code: None,
        }
    }

    pub(crate) fn line(code: &str, scheme: Option<i32>, start: i32, stop: Option<i32>) -> DrugAdministrationSlot {
        DrugAdministrationSlot {
            drug_code: Some(code.to_string()),
            scheme_number: scheme,
            start_day: Some(start),
            stop_day: stop,
            ..DrugAdministrationSlot::default()
        }
    }

    pub(crate) fn mixed_regimen_slots() -> Vec<DrugAdministrationSlot> {
        let pre_post = [Some(1), Some(2), Some(3), Some(4), Some(0), None, Some(0)];
        let mut slots = vec![
            slot("L01XA03", Some(1), 1),
            slot("L01FG01", Some(1), 2),
            slot("L01CE02", Some(1), 3),
            slot("L01BC02", Some(1), 4),
            slot("L01BC06", Some(2), 5),
            slot("L01CE02", Some(2), 6),
            slot("L01BC53", Some(3), 7),
        ];
        for (slot, code) in slots.iter_mut().zip(pre_post) {
            slot.pre_post_surgery_code = code;
        }
        slots
    }

    #[test]
    fn test_mixed_regimen_consolidation() {
        let schemes = TreatmentSchemeConsolidator::consolidate(&mixed_regimen_slots()).unwrap();

        assert_eq!(schemes.len(), 3);
        assert_eq!(schemes[0].scheme_number, Some(1));
        assert_eq!(schemes[0].components.len(), 4);
        assert_eq!((schemes[0].start_min, schemes[0].start_max), (Some(1), Some(4)));
        assert_eq!((schemes[1].stop_min, schemes[1].stop_max), (Some(5), Some(6)));
        assert!(schemes[0].components[2].pre_surgery);
        assert!(schemes[0].components[2].post_surgery);
        assert_eq!(schemes[0].components[0].cycles, Some(1));

        assert_eq!(
            TreatmentSchemeConsolidator::classify(&schemes),
            TreatmentClassification::FolfoxiriB
        );
        assert_eq!(TreatmentSchemeConsolidator::plan_start(&schemes), Some(1));
        assert_eq!(TreatmentSchemeConsolidator::plan_stop(&schemes), Some(7));
    }

    #[test]
    fn test_unexplained_later_drug_makes_plan_other() {
        let mut slots = mixed_regimen_slots();
        slots[6].drug_code = Some("L01FE02".to_string());
        let schemes = TreatmentSchemeConsolidator::consolidate(&slots).unwrap();
        assert_eq!(TreatmentSchemeConsolidator::classify(&schemes), TreatmentClassification::Other);
    }

    #[test]
    fn test_substitution_requires_fluoropyrimidine_in_first_line() {
        let slots = vec![
            slot("L01CE02", Some(1), 1),
            slot("L01BC06", Some(2), 10),
        ];
        let schemes = TreatmentSchemeConsolidator::consolidate(&slots).unwrap();
        assert_eq!(TreatmentSchemeConsolidator::classify(&schemes), TreatmentClassification::Other);

        let slots = vec![
            slot("L01BC02", Some(1), 1),
            slot("L01XA03", Some(1), 1),
            slot("L01BC06", Some(2), 10),
        ];
        let schemes = TreatmentSchemeConsolidator::consolidate(&slots).unwrap();
        assert_eq!(TreatmentSchemeConsolidator::classify(&schemes), TreatmentClassification::Folfox);
    }

    #[test]
    fn test_unnumbered_slots_form_their_own_scheme() {
        let mut slots = vec![
            slot("L01BC06", None, 3),
            slot("L01XA03", Some(1), 1),
            slot("L01FG01", None, 4),
        ];
        slots.push(DrugAdministrationSlot::default());
        let schemes = TreatmentSchemeConsolidator::consolidate(&slots).unwrap();

        assert_eq!(schemes.len(), 2);
        assert_eq!(schemes[0].scheme_number, None);
        assert_eq!(schemes[0].components.len(), 2);
        assert_eq!(schemes[1].scheme_number, Some(1));
        assert_eq!(schemes[1].components.len(), 1);
    }

    #[test]
    fn test_bounds_ignore_missing_days() {
        let mut slots = vec![slot("L01BC06", Some(1), 3), slot("L01XA03", Some(1), 9)];
        slots[1].stop_day = None;
        slots[0].start_day = None;
        let schemes = TreatmentSchemeConsolidator::consolidate(&slots).unwrap();
        assert_eq!((schemes[0].start_min, schemes[0].start_max), (Some(9), Some(9)));
        assert_eq!((schemes[0].stop_min, schemes[0].stop_max), (Some(3), Some(3)));

        slots[1].start_day = None;
        let schemes = TreatmentSchemeConsolidator::consolidate(&slots).unwrap();
        assert_eq!((schemes[0].start_min, schemes[0].start_max), (None, None));
    }

    #[test]
    fn test_unknown_drug_code_is_fatal() {
        let slots = vec![slot("NOPE", Some(1), 1)];
        assert!(TreatmentSchemeConsolidator::consolidate(&slots).is_err());
    }

    #[test]
    fn test_no_schemes_classify_as_none() {
        let schemes = TreatmentSchemeConsolidator::consolidate(&Vec::<DrugAdministrationSlot>::new()).unwrap();
        assert!(schemes.is_empty());
        assert_eq!(TreatmentSchemeConsolidator::classify(&schemes), TreatmentClassification::None);
        assert_eq!(TreatmentSchemeConsolidator::plan_start(&schemes), None);
    }

    #[test]
    fn test_ongoing_last_line_leaves_plan_open() {
        let slots = vec![
            line("L01BC06", Some(1), 10, Some(100)),
            line("L01XA03", Some(1), 10, Some(100)),
            line("L01BC06", Some(2), 120, None),
        ];
        let schemes = TreatmentSchemeConsolidator::consolidate(&slots).unwrap();

        assert_eq!(schemes[1].stop_max, None);
        assert_eq!(TreatmentSchemeConsolidator::plan_start(&schemes), Some(10));
        assert_eq!(TreatmentSchemeConsolidator::plan_stop(&schemes), None);
    }

    #[test]
    fn test_plan_start_comes_from_first_scheme_only() {
        let slots = vec![
            line("L01BC06", Some(1), 40, Some(90)),
            line("L01XA03", Some(1), 60, Some(500)),
            line("L01BC06", Some(2), 200, Some(200)),
        ];
        let schemes = TreatmentSchemeConsolidator::consolidate(&slots).unwrap();

        assert_eq!(TreatmentSchemeConsolidator::plan_start(&schemes), Some(40));
        assert_eq!(TreatmentSchemeConsolidator::plan_stop(&schemes), Some(200));
    }

    #[test]
    fn test_earliest_scheme_drives_classification() {
        // Scheme 2 (CAPOX) starts before scheme 1 (capecitabine alone).
        let slots = vec![
            line("L01BC06", Some(1), 200, Some(200)),
            line("L01BC06", Some(2), 10, Some(10)),
            line("L01XA03", Some(2), 12, Some(12)),
        ];
        let schemes = TreatmentSchemeConsolidator::consolidate(&slots).unwrap();

        assert_eq!(schemes[0].scheme_number, Some(1));
        assert_eq!(TreatmentSchemeConsolidator::classify(&schemes), TreatmentClassification::Capox);
        assert_eq!(TreatmentSchemeConsolidator::plan_start(&schemes), Some(10));

        let swapped = vec![
            line("L01BC06", Some(1), 10, Some(10)),
            line("L01BC06", Some(2), 200, Some(200)),
            line("L01XA03", Some(2), 202, Some(202)),
        ];
        let schemes = TreatmentSchemeConsolidator::consolidate(&swapped).unwrap();
        assert_eq!(TreatmentSchemeConsolidator::classify(&schemes), TreatmentClassification::Other);
    }

    #[test]
    fn test_late_ungrouped_scheme_is_not_first() {
        let slots = vec![
            line("L01BC06", None, 300, Some(300)),
            line("L01BC02", Some(1), 10, Some(10)),
            line("L01XA03", Some(1), 10, Some(10)),
        ];
        let schemes = TreatmentSchemeConsolidator::consolidate(&slots).unwrap();

        assert_eq!(schemes[0].scheme_number, None);
        assert_eq!(TreatmentSchemeConsolidator::classify(&schemes), TreatmentClassification::Folfox);
        assert_eq!(TreatmentSchemeConsolidator::plan_start(&schemes), Some(10));
    }
}
