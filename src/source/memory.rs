//! In-memory clip source for synthetic input and tests.

use std::collections::BTreeMap;

use super::{ClipEntry, ClipSource};
use crate::analysis::features::Clip;
use crate::error::ExtractionError;

/// Clips held in memory, enumerated in insertion order.
///
/// Entries registered with [`MemoryClipSource::with_failure`] enumerate
/// like any other clip but fail to decode.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipSource {
    order: Vec<String>,
    clips: BTreeMap<String, Clip>,
    failures: BTreeMap<String, String>,
}

impl MemoryClipSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clip: Clip) {
        if !self.order.contains(&clip.file_name) {
            self.order.push(clip.file_name.clone());
        }
        self.failures.remove(&clip.file_name);
        self.clips.insert(clip.file_name.clone(), clip);
    }

    pub fn with_clip(mut self, clip: Clip) -> Self {
        self.push(clip);
        self
    }

    /// Register a clip name whose decode always fails with `reason`.
    pub fn with_failure(mut self, file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        let file_name = file_name.into();
        self.clips.remove(&file_name);
        if !self.order.contains(&file_name) {
            self.order.push(file_name.clone());
        }
        self.failures.insert(file_name, reason.into());
        self
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<Clip> for MemoryClipSource {
    fn from_iter<I: IntoIterator<Item = Clip>>(iter: I) -> Self {
        let mut source = Self::new();
        for clip in iter {
            source.push(clip);
        }
        source
    }
}

impl ClipSource for MemoryClipSource {
    fn enumerate(&self) -> Result<Vec<ClipEntry>, ExtractionError> {
        Ok(self.order.iter().map(ClipEntry::new).collect())
    }

    fn load(&self, entry: &ClipEntry) -> Result<Clip, ExtractionError> {
        if let Some(reason) = self.failures.get(&entry.file_name) {
            return Err(ExtractionError::DecodeFailure {
                file_name: entry.file_name.clone(),
                reason: reason.clone(),
            });
        }
        self.clips
            .get(&entry.file_name)
            .cloned()
            .ok_or_else(|| ExtractionError::DecodeFailure {
                file_name: entry.file_name.clone(),
                reason: "no such clip".to_string(),
            })
    }
}
