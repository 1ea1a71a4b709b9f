use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parameter 'analyzer' should be either 'char', 'word' or 'char_wb', got {0:?}")]
    InvalidAnalyzer(String),

    #[error("Parameter 'how' should be either 'left' or 'right', got {0:?}")]
    InvalidHow(String),

    #[error("Parameter 'encoder' should be a known vectorizer ('hashing' or 'count'), got {0:?}")]
    InvalidEncoder(String),

    #[error("Required parameter missing: either 'on' or 'left_on' & 'right_on' should be specified")]
    MissingKeys,

    #[error("Key column count mismatch: {left} left key(s) vs {right} right key(s)")]
    KeyCountMismatch { left: usize, right: usize },

    #[error("Parameter 'ngram_range' must satisfy 1 <= min <= max, got ({min}, {max})")]
    InvalidNgramRange { min: usize, max: usize },

    #[error("Parameter 'match_score' must be a finite number, got {0}")]
    InvalidMatchScore(f64),

    #[error("Column not found in {table} table: {name}")]
    ColumnNotFound { table: &'static str, name: String },

    #[error("Column '{name}' has type {actual}, expected {expected}")]
    ColumnType {
        name: String,
        expected: &'static str,
        actual: String,
    },

    #[error("Key columns '{main}' ({main_type}) and '{aux}' ({aux_type}) cannot be encoded together")]
    IncompatibleKeyTypes {
        main: String,
        main_type: String,
        aux: String,
        aux_type: String,
    },

    #[error("Key column '{column}' holds a non-finite value at row {row}")]
    NonFiniteKey { column: String, row: usize },

    #[error("Match distances must be finite, got {0}")]
    NonFiniteDistance(f64),

    #[error("The {0} table is empty")]
    EmptyTable(&'static str),

    #[error("No key column produced any features")]
    EmptyFeatureSpace,

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Columns overlap but no suffix specified: {0}")]
    SuffixCollision(String),

    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
