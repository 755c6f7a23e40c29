//! WAV directory source backed by `hound`.

use std::fs;
use std::path::{Path, PathBuf};

use super::{ClipEntry, ClipSource};
use crate::analysis::features::Clip;
use crate::error::ExtractionError;

/// Enumerates and decodes mono WAV clips from one directory.
///
/// Only regular, non-hidden files whose extension matches (ignoring case)
/// are listed. Subdirectories are not searched.
#[derive(Debug, Clone)]
pub struct WavDirectorySource {
    root: PathBuf,
    extension: String,
}

impl WavDirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            extension: "wav".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn matches(&self, path: &Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(true, |name| name.starts_with('.'));
        let extension_ok = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension));
        !hidden && extension_ok
    }
}

impl ClipSource for WavDirectorySource {
    fn enumerate(&self) -> Result<Vec<ClipEntry>, ExtractionError> {
        let io_err = |err: std::io::Error| ExtractionError::Io {
            details: format!("listing {}: {}", self.root.display(), err),
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if !entry.file_type().map_err(io_err)?.is_file() {
                continue;
            }
            let path = entry.path();
            if !self.matches(&path) {
                continue;
            }
            match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => entries.push(ClipEntry::new(name)),
                None => tracing::warn!(
                    "[WavDirectorySource] Skipping non UTF-8 file name {:?}",
                    path
                ),
            }
        }

        tracing::debug!(
            "[WavDirectorySource] Found {} clips in {}",
            entries.len(),
            self.root.display()
        );
        Ok(entries)
    }

    fn load(&self, entry: &ClipEntry) -> Result<Clip, ExtractionError> {
        let path = self.root.join(&entry.file_name);
        let (samples, sample_rate) =
            read_wav(&path).map_err(|reason| ExtractionError::DecodeFailure {
                file_name: entry.file_name.clone(),
                reason,
            })?;
        let duration_secs = samples.len() as f64 / sample_rate as f64;
        Ok(Clip::new(entry.file_name.clone(), samples, duration_secs))
    }
}

/// Decode a mono WAV file into normalized f32 samples and its sample rate.
///
/// Integer PCM is divided by `2^(bits-1)` so full scale lands in [-1.0, 1.0);
/// float PCM is passed through.
/// Errors are returned as a human-readable reason.
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32), String> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|err| format!("opening {}: {}", path.display(), err))?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(format!(
            "{} must be mono (found {} channels)",
            path.display(),
            spec.channels
        ));
    }
    if spec.sample_rate == 0 {
        return Err(format!("{} declares a sample rate of 0", path.display()));
    }

    let sample_rate = spec.sample_rate;
    let decode_err = |err: hound::Error| format!("decoding {}: {}", path.display(), err);

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(decode_err))
            .collect::<Result<Vec<f32>, String>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            bits @ (8 | 16 | 24 | 32) => {
                let full_scale = (1i64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| {
                        sample
                            .map(|value| value as f32 / full_scale)
                            .map_err(decode_err)
                    })
                    .collect::<Result<Vec<f32>, String>>()?
            }
            other => {
                return Err(format!(
                    "unsupported bits per sample {} in {}",
                    other,
                    path.display()
                ))
            }
        },
    };

    Ok((samples, sample_rate))
}
