//! Cancer registry record consolidation and treatment-timeline derivation.
//!
//! Raw episode records for a tumor are checked by a quality gate, their systemic drug
//! administrations are grouped into treatment schemes and classified, and follow-up
//! events are reduced to a single progression-free survival observation.

pub mod models;
pub mod codes;
pub mod drugs;
pub mod regimens;
pub mod quality_filter;
pub mod schemes;
pub mod pfs;
pub mod extractor;
pub mod batch;
pub mod parser;
pub mod output;
pub mod example_data;
pub mod errors;

pub use models::*;
pub use errors::*;
pub use extractor::TreatmentEpisodeExtractor;

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, ConsolidationError>;
