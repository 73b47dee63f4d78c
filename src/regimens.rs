use crate::drugs::Drug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Regimen groups used when comparing outcomes across similar treatments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreatmentGroup {
    CapecitabineOrFluorouracil,
    CapecitabineBOrFluorouracilB,
    CapoxOrFolfox,
    CapoxBOrFolfoxB,
    Folfiri,
    FolfiriB,
    FolfiriP,
    FolfoxP,
    Folfoxiri,
    FolfoxiriB,
    Irinotecan,
    Nivolumab,
    Pembrolizumab,
    Other,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreatmentClassification {
    Capecitabine,
    CapecitabineBevacizumab,
    Capox,
    CapoxB,
    Folfiri,
    FolfiriB,
    FolfiriP,
    Folfox,
    FolfoxB,
    FolfoxP,
    Folfoxiri,
    FolfoxiriB,
    Fluorouracil,
    FluorouracilBevacizumab,
    Irinotecan,
    Nivolumab,
    Pembrolizumab,
    Other,
    None,
}

const REGIMEN_TABLE: &[(TreatmentClassification, &[Drug])] = &[
    (TreatmentClassification::Capecitabine, &[Drug::Capecitabine]),
    (TreatmentClassification::CapecitabineBevacizumab, &[Drug::Capecitabine, Drug::Bevacizumab]),
    (TreatmentClassification::Capox, &[Drug::Capecitabine, Drug::Oxaliplatin]),
    (TreatmentClassification::CapoxB, &[Drug::Capecitabine, Drug::Oxaliplatin, Drug::Bevacizumab]),
    (TreatmentClassification::Folfiri, &[Drug::Fluorouracil, Drug::Irinotecan]),
    (TreatmentClassification::FolfiriB, &[Drug::Fluorouracil, Drug::Irinotecan, Drug::Bevacizumab]),
    (TreatmentClassification::FolfiriP, &[Drug::Fluorouracil, Drug::Irinotecan, Drug::Panitumumab]),
    (TreatmentClassification::Folfox, &[Drug::Fluorouracil, Drug::Oxaliplatin]),
    (TreatmentClassification::FolfoxB, &[Drug::Fluorouracil, Drug::Oxaliplatin, Drug::Bevacizumab]),
    (TreatmentClassification::FolfoxP, &[Drug::Fluorouracil, Drug::Oxaliplatin, Drug::Panitumumab]),
    (TreatmentClassification::Folfoxiri, &[Drug::Fluorouracil, Drug::Oxaliplatin, Drug::Irinotecan]),
    (
        TreatmentClassification::FolfoxiriB,
        &[Drug::Fluorouracil, Drug::Oxaliplatin, Drug::Irinotecan, Drug::Bevacizumab],
    ),
    (TreatmentClassification::Fluorouracil, &[Drug::Fluorouracil]),
    (TreatmentClassification::FluorouracilBevacizumab, &[Drug::Fluorouracil, Drug::Bevacizumab]),
    (TreatmentClassification::Irinotecan, &[Drug::Irinotecan]),
    (TreatmentClassification::Nivolumab, &[Drug::Nivolumab]),
    (TreatmentClassification::Pembrolizumab, &[Drug::Pembrolizumab]),
];

impl TreatmentClassification {
    /// Exact-set lookup; any set not in the regimen table is `Other`.
    pub fn find_for_drugs(drugs: &BTreeSet<Drug>) -> TreatmentClassification {
        REGIMEN_TABLE
            .iter()
            .find(|(_, regimen)| {
                regimen.len() == drugs.len() && regimen.iter().all(|drug| drugs.contains(drug))
            })
            .map(|(classification, _)| *classification)
            .unwrap_or(TreatmentClassification::Other)
    }

    pub fn drugs(&self) -> BTreeSet<Drug> {
        REGIMEN_TABLE
            .iter()
            .find(|(classification, _)| classification == self)
            .map(|(_, regimen)| regimen.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn group(&self) -> TreatmentGroup {
        use TreatmentClassification as C;
        match self {
            C::Capecitabine | C::Fluorouracil => TreatmentGroup::CapecitabineOrFluorouracil,
            C::CapecitabineBevacizumab | C::FluorouracilBevacizumab => {
                TreatmentGroup::CapecitabineBOrFluorouracilB
            }
            C::Capox | C::Folfox => TreatmentGroup::CapoxOrFolfox,
            C::CapoxB | C::FolfoxB => TreatmentGroup::CapoxBOrFolfoxB,
            C::Folfiri => TreatmentGroup::Folfiri,
            C::FolfiriB => TreatmentGroup::FolfiriB,
            C::FolfiriP => TreatmentGroup::FolfiriP,
            C::FolfoxP => TreatmentGroup::FolfoxP,
            C::Folfoxiri => TreatmentGroup::Folfoxiri,
            C::FolfoxiriB => TreatmentGroup::FolfoxiriB,
            C::Irinotecan => TreatmentGroup::Irinotecan,
            C::Nivolumab => TreatmentGroup::Nivolumab,
            C::Pembrolizumab => TreatmentGroup::Pembrolizumab,
            C::Other => TreatmentGroup::Other,
            C::None => TreatmentGroup::None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        use TreatmentClassification as C;
        match self {
            C::Capecitabine => "CAPECITABINE",
            C::CapecitabineBevacizumab => "CAPECITABINE-B",
            C::Capox => "CAPOX",
            C::CapoxB => "CAPOX-B",
            C::Folfiri => "FOLFIRI",
            C::FolfiriB => "FOLFIRI-B",
            C::FolfiriP => "FOLFIRI-P",
            C::Folfox => "FOLFOX",
            C::FolfoxB => "FOLFOX-B",
            C::FolfoxP => "FOLFOX-P",
            C::Folfoxiri => "FOLFOXIRI",
            C::FolfoxiriB => "FOLFOXIRI-B",
            C::Fluorouracil => "FLUOROURACIL",
            C::FluorouracilBevacizumab => "FLUOROURACIL-B",
            C::Irinotecan => "IRINOTECAN",
            C::Nivolumab => "NIVOLUMAB",
            C::Pembrolizumab => "PEMBROLIZUMAB",
            C::Other => "OTHER",
            C::None => "NONE",
        }
    }
}

impl fmt::Display for TreatmentClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl fmt::Display for TreatmentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TreatmentGroup::CapecitabineOrFluorouracil => "CAPECITABINE_OR_FLUOROURACIL",
            TreatmentGroup::CapecitabineBOrFluorouracilB => "CAPECITABINE_B_OR_FLUOROURACIL_B",
            TreatmentGroup::CapoxOrFolfox => "CAPOX_OR_FOLFOX",
            TreatmentGroup::CapoxBOrFolfoxB => "CAPOX_B_OR_FOLFOX_B",
            TreatmentGroup::Folfiri => "FOLFIRI",
            TreatmentGroup::FolfiriB => "FOLFIRI_B",
            TreatmentGroup::FolfiriP => "FOLFIRI_P",
            TreatmentGroup::FolfoxP => "FOLFOX_P",
            TreatmentGroup::Folfoxiri => "FOLFOXIRI",
            TreatmentGroup::FolfoxiriB => "FOLFOXIRI_B",
            TreatmentGroup::Irinotecan => "IRINOTECAN",
            TreatmentGroup::Nivolumab => "NIVOLUMAB",
            TreatmentGroup::Pembrolizumab => "PEMBROLIZUMAB",
            TreatmentGroup::Other => "OTHER",
            TreatmentGroup::None => "NONE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(drugs: &[Drug]) -> BTreeSet<Drug> {
        drugs.iter().copied().collect()
    }

    #[test]
    fn test_exact_set_lookup() {
        assert_eq!(
            TreatmentClassification::find_for_drugs(&set(&[Drug::Oxaliplatin, Drug::Capecitabine])),
            TreatmentClassification::Capox
        );
        assert_eq!(
            TreatmentClassification::find_for_drugs(&set(&[
                Drug::Bevacizumab,
                Drug::Irinotecan,
                Drug::Oxaliplatin,
                Drug::Fluorouracil
            ])),
            TreatmentClassification::FolfoxiriB
        );
    }

    #[test]
    fn test_superset_is_other() {
        let drugs = set(&[Drug::Capecitabine, Drug::Oxaliplatin, Drug::Irinotecan]);
        assert_eq!(TreatmentClassification::find_for_drugs(&drugs), TreatmentClassification::Other);
        assert_eq!(TreatmentClassification::find_for_drugs(&BTreeSet::new()), TreatmentClassification::Other);
    }

    #[test]
    fn test_every_regimen_round_trips_through_lookup() {
        for (classification, _) in REGIMEN_TABLE {
            assert_eq!(TreatmentClassification::find_for_drugs(&classification.drugs()), *classification);
        }
    }

    #[test]
    fn test_groups_and_display() {
        assert_eq!(TreatmentClassification::Folfox.group(), TreatmentGroup::CapoxOrFolfox);
        assert_eq!(TreatmentClassification::Capox.group(), TreatmentGroup::CapoxOrFolfox);
        assert_eq!(TreatmentClassification::CapoxB.to_string(), "CAPOX-B");
        assert_eq!(TreatmentGroup::CapoxBOrFolfoxB.to_string(), "CAPOX_B_OR_FOLFOX_B");
    }
}
