// Spectral module - Frequency-domain feature extraction
//
// The energy distribution is a spectral centroid computed against an
// "effective" sample rate: spectrum length divided by clip duration. It is
// not the decoder's sample rate. Trained classifiers expect this scale, so
// it must not be replaced with the physical rate.

/// Effective sample rate tying bin index to clip duration
///
/// Formula: rate = spectrum_len / duration_secs (single precision)
pub fn effective_sample_rate(spectrum_len: usize, duration_secs: f64) -> f32 {
    spectrum_len as f32 / duration_secs as f32
}

/// Compute energy distribution (spectral centroid)
///
/// Formula: ED = Σ(f_k × |X[k]|) / Σ|X[k]|, f_k = (k / K) × sample_rate
///
/// Accumulates in single precision in bin order.
///
/// # Arguments
/// * `spectrum` - Magnitude spectrum (K bins)
/// * `sample_rate` - Effective sample rate, see [`effective_sample_rate`]
///
/// # Returns
/// Energy-weighted mean frequency. NaN when the spectrum sums to zero
/// (silent clip) or is empty; this is not an error.
pub fn energy_distribution(spectrum: &[f32], sample_rate: f32) -> f32 {
    let bins = spectrum.len() as f32;
    let mut numerator = 0.0f32;
    let mut denominator = 0.0f32;

    for (k, &magnitude) in spectrum.iter().enumerate() {
        let freq = k as f32 / bins * sample_rate;
        numerator += freq * magnitude;
        denominator += magnitude;
    }

    numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_sample_rate() {
        assert_eq!(effective_sample_rate(32_768, 2.0), 16_384.0);
        assert_eq!(effective_sample_rate(512, 0.5), 1024.0);
    }

    #[test]
    fn test_single_bin_centroid() {
        // All energy in bin 2 of 4 -> (2/4) * rate
        let spectrum = [0.0, 0.0, 3.0, 0.0];
        assert_eq!(energy_distribution(&spectrum, 100.0), 50.0);
    }

    #[test]
    fn test_centroid_is_weighted_mean() {
        let spectrum = [1.0, 1.0];
        // bins at 0 and rate/2, equal weight
        assert_eq!(energy_distribution(&spectrum, 8.0), 2.0);
    }

    #[test]
    fn test_centroid_ignores_overall_scale() {
        let spectrum = [0.2, 0.7, 0.1, 0.4];
        let louder: Vec<f32> = spectrum.iter().map(|m| m * 10.0).collect();
        let a = energy_distribution(&spectrum, 1000.0);
        let b = energy_distribution(&louder, 1000.0);
        assert!((a - b).abs() < 1e-3);
    }

    #[test]
    fn test_zero_spectrum_is_nan() {
        assert!(energy_distribution(&[0.0; 16], 44_100.0).is_nan());
        assert!(energy_distribution(&[], 44_100.0).is_nan());
    }
}
