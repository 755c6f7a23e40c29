// FeatureExtractor - DSP feature extraction for speech/music classification
//
// This module extracts the three features a trained speech/music classifier
// consumes. One set of features describes one whole clip.
//
// Module organization:
// - types: Data structures (Clip, MagnitudeSpectrum, FeatureTriple)
// - fft: Hann-windowed packed real FFT over the whole clip
// - spectral: Frequency-domain features (energy distribution)
// - temporal: Time-domain features (zero-crossing rate, average energy)
// - mod.rs: Coordinator (FeatureExtractor)
//
// Features extracted:
// 1. Energy Distribution: spectral centroid against a duration-derived rate
// 2. Zero-Crossing Rate: normalized rate of sign changes
// 3. Average Energy: mean squared amplitude

mod fft;
mod spectral;
mod temporal;
mod types;

pub use fft::{fft_size_for, hann_window, SpectrumAnalyzer, MIN_SAMPLES};
pub use spectral::{effective_sample_rate, energy_distribution};
pub use temporal::{average_energy, zero_crossing_rate};
pub use types::{Clip, FeatureTriple, FeatureVector, MagnitudeSpectrum};

use crate::error::ExtractionError;

/// FeatureExtractor coordinates the per-clip feature pipeline
///
/// Holds the spectrum analyzer (planner, window cache, scratch buffers), so
/// each worker thread owns exactly one extractor.
pub struct FeatureExtractor {
    analyzer: SpectrumAnalyzer,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            analyzer: SpectrumAnalyzer::new(),
        }
    }

    /// Extract all features from a clip
    ///
    /// 1. Compute the magnitude spectrum
    /// 2. Derive the effective sample rate from spectrum length and duration
    /// 3. Compute energy distribution from the spectrum
    /// 4. Compute zero-crossing rate and average energy from the raw samples
    ///
    /// # Errors
    /// `InvalidInput` for fewer than 2 samples or a duration that is not a
    /// positive finite number. A silent clip is not an error: its
    /// `energy_distribution` is NaN.
    pub fn extract(&mut self, clip: &Clip) -> Result<FeatureTriple, ExtractionError> {
        if clip.samples.len() < MIN_SAMPLES {
            return Err(ExtractionError::too_few_samples(
                &clip.file_name,
                clip.samples.len(),
            ));
        }
        if !clip.duration_secs.is_finite() || clip.duration_secs <= 0.0 {
            return Err(ExtractionError::InvalidInput {
                reason: format!(
                    "clip '{}' has unusable duration {}s",
                    clip.file_name, clip.duration_secs
                ),
            });
        }

        let spectrum = self.analyzer.compute_magnitude_spectrum(&clip.samples)?;
        let sample_rate = effective_sample_rate(spectrum.len(), clip.duration_secs);

        let features = FeatureTriple {
            file_name: clip.file_name.clone(),
            energy_distribution: energy_distribution(&spectrum, sample_rate),
            zero_crossing_rate: zero_crossing_rate(&clip.samples),
            average_energy: average_energy(&clip.samples),
        };

        if features.is_degenerate() {
            tracing::warn!(
                "[FeatureExtractor] '{}' has an all-zero spectrum, energy distribution undefined",
                clip.file_name
            );
        }

        Ok(features)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
