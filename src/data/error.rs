use thiserror::Error;

/// Structural problems with the source table or with values handed to the
/// engine from outside (command line, configuration).
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Row {row}: '{column}' value '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Row {row}: missing time_ms")]
    MissingTime { row: usize },

    #[error("Unknown {kind} feature '{value}'")]
    UnknownFeature { kind: &'static str, value: String },

    #[error("Value '{value}' does not occur in column '{facet}'")]
    UnknownFacetValue { facet: &'static str, value: String },
}
