//! Clip sources: enumeration and decoding of input clips.
//!
//! Decoding is the pipeline's only blocking boundary. A source lists the
//! clips it can provide (in any order) and decodes one clip on request, so
//! workers can decode in parallel.

mod memory;
mod wav;

pub use memory::MemoryClipSource;
pub use wav::{read_wav, WavDirectorySource};

use crate::analysis::features::Clip;
use crate::error::ExtractionError;

/// An enumerated clip that has not been decoded yet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClipEntry {
    pub file_name: String,
}

impl ClipEntry {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// Provider of decoded clips.
///
/// `load` must return mono samples normalized to [-1.0, 1.0] and the clip
/// duration in seconds. Failures to read or decode a clip are reported as
/// `ExtractionError::DecodeFailure`.
pub trait ClipSource: Sync {
    fn enumerate(&self) -> Result<Vec<ClipEntry>, ExtractionError>;

    fn load(&self, entry: &ClipEntry) -> Result<Clip, ExtractionError>;
}
