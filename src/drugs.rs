use crate::{errors::ConsolidationError, Result};
use serde::{Deserialize, Serialize};

/// Systemic treatments recorded in the registry, keyed by ATC or registry-local code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Drug {
    ExternalRadiotherapyWithSensitizer,
    IntensiveChemotherapy,
    SystemicChemotherapy,
    TaxaneContainingChemotherapy,
    PlatinumContainingChemotherapy,
    AnthracyclineContainingChemotherapy,
    AnthracyclineAndTaxaneContainingChemotherapy,
    ChemotherapyAbroad,
    Cyclophosphamide,
    ChlorambucilLeukeran,
    Melphalan,
    Bendamustine,
    Methotrexate,
    Raltitrexed,
    Pemetrexed,
    Cladribine,
    Cytarabine,
    Fluorouracil,
    Tegafur,
    GemcitabineSystemic,
    Capecitabine,
    TegafurOrGimeracilOrOteracil,
    TrifluridineAndTipiracil,
    Vincristine,
    Etoposide,
    Paclitaxel,
    Docetaxel,
    Irinotecan,
    DoxorubicinAdriamycin,
    Daunorubicin,
    EpirubicinSystemic,
    MitomycinSystemic,
    Cisplatin,
    Carboplatin,
    Oxaliplatin,
    HydroreaOrHydroxyurea,
    AtoArsenicTrioxide,
    HormonalTherapyNno,
    HormonalTherapyThroughSurgery,
    DrugHormonalTherapy,
    Octreotide,
    MegestrolMegace,
    GonadorelinAgonistsLhrh,
    LeuprorelinEligardOrLucrin,
    GoserelinZoladex,
    TriptorelinPamorelin,
    Tamoxifen,
    AntiAndrogens,
    BicalutamideBiluronOrCasodex,
    AromataseInhibitors,
    Anastrozole,
    LetrozoleFemara,
    GonadorelinAntagonistsLhrh,
    AbirateroneZytigaAndPrednisone,
    Dexamethasone,
    Prednisone,
    InterferonAlpha2a,
    TargetedTherapy,
    AngiogenesisInhibitor,
    Bevacizumab,
    TargetedTherapyAbroad,
    StudyMedicationImmunotherapy,
    ProteinKinaseInhibitors,
    Imatinib,
    Erlotinib,
    Vemurafenib,
    Dabrafenib,
    Encorafenib,
    Trametinib,
    Binimetinib,
    Ruxolitinib,
    Axitinib,
    Ibrutinib,
    Pazopanib,
    Cabozantinib,
    MonoclonalAntibodies,
    Rituximab,
    TrastuzumabHerceptin,
    Pertuzumab,
    Cetuximab,
    Panitumumab,
    Nivolumab,
    Pembrolizumab,
    Durvalumab,
    Atezolizumab,
    Ipilimumab,
    Tremelimumab,
    Bortezomib,
    Thalidomide,
    Lenalidomide,
}

impl Drug {
    /// Fluoropyrimidines that may stand in for one another across treatment lines.
    pub const SUBSTITUTABLE: [Drug; 4] = [
        Drug::Fluorouracil,
        Drug::Capecitabine,
        Drug::Tegafur,
        Drug::TegafurOrGimeracilOrOteracil,
    ];

    pub fn is_substitutable(&self) -> bool {
        Self::SUBSTITUTABLE.contains(self)
    }

    pub fn from_code(code: &str) -> Result<Drug> {
        let drug = match code {
            "214000" => Drug::ExternalRadiotherapyWithSensitizer,
            "420INT" => Drug::IntensiveChemotherapy,
            "420000" => Drug::SystemicChemotherapy,
            "421000" => Drug::TaxaneContainingChemotherapy,
            "422000" => Drug::PlatinumContainingChemotherapy,
            "426000" => Drug::AnthracyclineContainingChemotherapy,
            "427000" => Drug::AnthracyclineAndTaxaneContainingChemotherapy,
            "690420" => Drug::ChemotherapyAbroad,
            "L01AA01" => Drug::Cyclophosphamide,
            "L01AA02" => Drug::ChlorambucilLeukeran,
            "L01AA03" => Drug::Melphalan,
            "L01AA09" => Drug::Bendamustine,
            "L01BA01" => Drug::Methotrexate,
            "L01BA03" => Drug::Raltitrexed,
            "L01BA04" => Drug::Pemetrexed,
            // L01BB05 is fludarabine, recorded under cladribine until it gets its own entry
            "L01BB04" | "L01BB05" => Drug::Cladribine,
            "L01BC01" => Drug::Cytarabine,
            "L01BC02" => Drug::Fluorouracil,
            "L01BC03" => Drug::Tegafur,
            "L01BC05" => Drug::GemcitabineSystemic,
            "L01BC06" => Drug::Capecitabine,
            "L01BC53" => Drug::TegafurOrGimeracilOrOteracil,
            "L01BC59" => Drug::TrifluridineAndTipiracil,
            "L01CA02" => Drug::Vincristine,
            "L01CB01" => Drug::Etoposide,
            "L01CD01" => Drug::Paclitaxel,
            "L01CD02" => Drug::Docetaxel,
            "L01CE02" => Drug::Irinotecan,
            "L01DB01" => Drug::DoxorubicinAdriamycin,
            "L01DB02" => Drug::Daunorubicin,
            "L01DB03" | "L01DB06" => Drug::EpirubicinSystemic,
            "L01DC03" => Drug::MitomycinSystemic,
            "L01XA01" => Drug::Cisplatin,
            "L01XA02" => Drug::Carboplatin,
            "L01XA03" => Drug::Oxaliplatin,
            "L01XX05" => Drug::HydroreaOrHydroxyurea,
            "L01XX27" => Drug::AtoArsenicTrioxide,
            "500000" => Drug::HormonalTherapyNno,
            "510000" => Drug::HormonalTherapyThroughSurgery,
            "540000" => Drug::DrugHormonalTherapy,
            "H01CB02" => Drug::Octreotide,
            "L02AB01" => Drug::MegestrolMegace,
            "L02AE" => Drug::GonadorelinAgonistsLhrh,
            "L02AE02" => Drug::LeuprorelinEligardOrLucrin,
            "L02AE03" => Drug::GoserelinZoladex,
            "L02AE04" => Drug::TriptorelinPamorelin,
            "L02BA01" => Drug::Tamoxifen,
            "L02BB" => Drug::AntiAndrogens,
            "L02BB03" => Drug::BicalutamideBiluronOrCasodex,
            "L02BG" => Drug::AromataseInhibitors,
            "L02BG03" => Drug::Anastrozole,
            "L02BG04" => Drug::LetrozoleFemara,
            "L02BX" => Drug::GonadorelinAntagonistsLhrh,
            "L02BX03" | "L02BX53" => Drug::AbirateroneZytigaAndPrednisone,
            "H02AB02" => Drug::Dexamethasone,
            "H02AB07" => Drug::Prednisone,
            "L03AB04" => Drug::InterferonAlpha2a,
            "430000" | "L01FC01" => Drug::TargetedTherapy,
            "433000" => Drug::AngiogenesisInhibitor,
            "445000" | "L01FG01" => Drug::Bevacizumab,
            "690430" => Drug::TargetedTherapyAbroad,
            "699005" => Drug::StudyMedicationImmunotherapy,
            "L01E" => Drug::ProteinKinaseInhibitors,
            "L01EA01" => Drug::Imatinib,
            "L01EB02" | "L01EB04" => Drug::Erlotinib,
            "L01EC01" => Drug::Vemurafenib,
            "L01EC02" => Drug::Dabrafenib,
            "L01EC03" => Drug::Encorafenib,
            "L01EE01" => Drug::Trametinib,
            "L01EE03" => Drug::Binimetinib,
            "L01EJ01" => Drug::Ruxolitinib,
            "L01EK01" => Drug::Axitinib,
            "L01EL01" => Drug::Ibrutinib,
            "L01EX03" => Drug::Pazopanib,
            "L01EX07" | "L01EX17" => Drug::Cabozantinib,
            "L01F" => Drug::MonoclonalAntibodies,
            "L01FA01" => Drug::Rituximab,
            "L01FD01" => Drug::TrastuzumabHerceptin,
            "L01FD02" => Drug::Pertuzumab,
            "L01FE01" => Drug::Cetuximab,
            "L01FE02" => Drug::Panitumumab,
            "L01FF01" => Drug::Nivolumab,
            "L01FF02" => Drug::Pembrolizumab,
            "L01FF03" => Drug::Durvalumab,
            "L01FF05" => Drug::Atezolizumab,
            "L01FX04" => Drug::Ipilimumab,
            "L01FX20" => Drug::Tremelimumab,
            "L01XG01" => Drug::Bortezomib,
            "L04AX02" => Drug::Thalidomide,
            "L04AX04" => Drug::Lenalidomide,
            _ => return Err(ConsolidationError::unknown_code("treatment", code)),
        };
        Ok(drug)
    }
}
