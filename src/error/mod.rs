// Error types for the speech/music feature pipeline
//
// This module defines the typed errors raised while decoding clips,
// extracting features and consulting the classifier. Each error carries a
// stable numeric code so batch reports can record failures without
// depending on message text.

mod extraction;

pub use extraction::{log_extraction_error, ExtractionError, ExtractionErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so failures can be serialized into batch
/// reports alongside successful results.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
