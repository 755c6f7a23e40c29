// Types module - Data structures for clip features
//
// This module defines the core data structures used throughout the feature
// extraction pipeline: the decoded clip, its magnitude spectrum and the
// per-clip feature triple handed to the classifier.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;

use crate::error::ExtractionError;

/// One decoded audio clip
///
/// Samples are mono amplitudes, normally in [-1.0, 1.0]. The duration is
/// supplied by the decoder and is independent of the sample count.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// File name as enumerated by the clip source, extension included
    pub file_name: String,
    /// Mono PCM amplitudes
    pub samples: Vec<f32>,
    /// Clip duration in seconds as reported by the decoder
    pub duration_secs: f64,
}

impl Clip {
    pub fn new(file_name: impl Into<String>, samples: Vec<f32>, duration_secs: f64) -> Self {
        Self {
            file_name: file_name.into(),
            samples,
            duration_secs,
        }
    }
}

/// Normalized FFT magnitude spectrum of one clip
///
/// Length is half the power-of-two FFT size. All values are non-negative.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MagnitudeSpectrum(Vec<f32>);

impl MagnitudeSpectrum {
    pub fn new(magnitudes: Vec<f32>) -> Self {
        Self(magnitudes)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl Deref for MagnitudeSpectrum {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.0
    }
}

/// The three classifier inputs, without the clip name
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Energy-weighted mean frequency (NaN for a silent clip)
    #[serde(
        serialize_with = "serialize_nan_as_null",
        deserialize_with = "deserialize_null_as_nan"
    )]
    pub energy_distribution: f32,

    /// Normalized zero-crossing rate (0.0 to 1.0)
    pub zero_crossing_rate: f64,

    /// Mean squared amplitude
    pub average_energy: f64,
}

impl FeatureVector {
    /// True when the spectrum was all zero and the energy distribution is undefined
    pub fn is_degenerate(&self) -> bool {
        self.energy_distribution.is_nan()
    }
}

/// Features extracted from one clip
///
/// Immutable once produced by the pipeline. `energy_distribution` is NaN
/// only when the clip's magnitude spectrum sums to zero; callers must treat
/// that as "undefined" rather than as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTriple {
    pub file_name: String,

    #[serde(
        serialize_with = "serialize_nan_as_null",
        deserialize_with = "deserialize_null_as_nan"
    )]
    pub energy_distribution: f32,

    pub zero_crossing_rate: f64,

    pub average_energy: f64,
}

impl FeatureTriple {
    /// Classifier input for this clip
    pub fn features(&self) -> FeatureVector {
        FeatureVector {
            energy_distribution: self.energy_distribution,
            zero_crossing_rate: self.zero_crossing_rate,
            average_energy: self.average_energy,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.energy_distribution.is_nan()
    }

    /// Energy distribution, or `DegenerateSpectrum` when it is undefined
    pub fn checked_energy_distribution(&self) -> Result<f32, ExtractionError> {
        if self.is_degenerate() {
            Err(ExtractionError::DegenerateSpectrum)
        } else {
            Ok(self.energy_distribution)
        }
    }
}

fn serialize_nan_as_null<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_none()
    } else {
        serializer.serialize_some(value)
    }
}

fn deserialize_null_as_nan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::NAN))
}
