// Extraction error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Extraction error code constants
///
/// Single source of truth for the codes written into batch failure
/// records and CLI reports.
///
/// Error code range: 3001-3005
pub struct ExtractionErrorCodes;

impl ExtractionErrorCodes {
    /// Clip has fewer than two samples or an unusable duration
    pub const INVALID_INPUT: i32 = 3001;

    /// Clip could not be read or decoded
    pub const DECODE_FAILURE: i32 = 3002;

    /// Magnitude spectrum sums to zero, energy distribution is undefined
    pub const DEGENERATE_SPECTRUM: i32 = 3003;

    /// Classifier model file is missing fields or malformed
    pub const INVALID_MODEL: i32 = 3004;

    /// Filesystem error outside of decoding (enumeration, writing reports)
    pub const IO: i32 = 3005;
}

/// Log an extraction error with structured context
///
/// Emits the numeric code, the failing component and the message so log
/// lines can be matched against batch failure records.
pub fn log_extraction_error(err: &ExtractionError, context: &str) {
    error!(
        "Extraction error in {}: code={}, component=FeaturePipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised by the feature pipeline
///
/// `InvalidInput` and `DecodeFailure` abort processing of a single clip.
/// `DegenerateSpectrum` never aborts extraction; it is only produced when a
/// caller asks for a defined energy distribution and the clip was silent.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Clip violates an input precondition
    InvalidInput { reason: String },

    /// Clip could not be read or decoded
    DecodeFailure { file_name: String, reason: String },

    /// Spectrum sums to zero (silent clip)
    DegenerateSpectrum,

    /// Classifier model is unusable
    InvalidModel { reason: String },

    /// Filesystem error
    Io { details: String },
}

impl ExtractionError {
    /// Shorthand for the "too few samples" precondition failure
    pub fn too_few_samples(file_name: &str, len: usize) -> Self {
        ExtractionError::InvalidInput {
            reason: format!("clip '{}' has {} samples, need at least 2", file_name, len),
        }
    }
}

impl ErrorCode for ExtractionError {
    fn code(&self) -> i32 {
        match self {
            ExtractionError::InvalidInput { .. } => ExtractionErrorCodes::INVALID_INPUT,
            ExtractionError::DecodeFailure { .. } => ExtractionErrorCodes::DECODE_FAILURE,
            ExtractionError::DegenerateSpectrum => ExtractionErrorCodes::DEGENERATE_SPECTRUM,
            ExtractionError::InvalidModel { .. } => ExtractionErrorCodes::INVALID_MODEL,
            ExtractionError::Io { .. } => ExtractionErrorCodes::IO,
        }
    }

    fn message(&self) -> String {
        match self {
            ExtractionError::InvalidInput { reason } => format!("Invalid input: {}", reason),
            ExtractionError::DecodeFailure { file_name, reason } => {
                format!("Failed to decode '{}': {}", file_name, reason)
            }
            ExtractionError::DegenerateSpectrum => {
                "Magnitude spectrum is all zero; energy distribution is undefined".to_string()
            }
            ExtractionError::InvalidModel { reason } => {
                format!("Invalid classifier model: {}", reason)
            }
            ExtractionError::Io { details } => format!("I/O error: {}", details),
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message(), self.code())
    }
}

impl std::error::Error for ExtractionError {}

impl From<std::io::Error> for ExtractionError {
    fn from(err: std::io::Error) -> Self {
        ExtractionError::Io {
            details: err.to_string(),
        }
    }
}
