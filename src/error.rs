//! Error taxonomy for the assessment engine
//!
//! Only sampler and geometry failures (and malformed requests) abort an
//! operation. `OutOfRange` is raised by the interpolation resolver and is
//! always recovered inside the calculators with a per-call-site fallback.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Input lies outside the tabulated domain of a chart series
    #[error("value {input} out of range for table {table} (condition: {condition:?})")]
    OutOfRange {
        table: String,
        condition: Option<String>,
        input: f64,
    },

    /// Boundary/spacing constraints could not be met within the attempt budget
    #[error(
        "could only generate {generated} of {required} required points after {attempts} attempts; \
         field may be too small or constraints too restrictive"
    )]
    InsufficientPoints {
        generated: usize,
        required: usize,
        attempts: usize,
    },

    #[error("invalid field boundary: {0}")]
    InvalidBoundary(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn out_of_range(table: &str, condition: Option<&str>, input: f64) -> Self {
        EngineError::OutOfRange {
            table: table.to_string(),
            condition: condition.map(str::to_string),
            input,
        }
    }

    /// True for errors the calculators are expected to absorb locally
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::OutOfRange { .. })
    }
}
