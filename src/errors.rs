use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsolidationError {
    /// A coded field held a value no mapping table recognizes.
    #[error("Unknown {field} code: {code}")]
    UnknownCode { field: &'static str, code: String },

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl ConsolidationError {
    pub fn unknown_code(field: &'static str, code: impl ToString) -> Self {
        ConsolidationError::UnknownCode {
            field,
            code: code.to_string(),
        }
    }
}
