// Temporal module - Time-domain feature extraction
//
// These features are computed on the raw, un-windowed samples of the whole
// clip, including any tail past the FFT size.

/// Compute average energy (mean power)
///
/// Formula: E = (1 / N) × Σ x[n]²
///
/// Each square is taken in single precision and accumulated in double
/// precision. Music with sustained energy tends to score higher than
/// speech, which is broken up by pauses.
///
/// # Returns
/// Mean squared amplitude (0.0 for an empty input)
pub fn average_energy(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: f64 = samples.iter().map(|&s| (s * s) as f64).sum();
    sum / samples.len() as f64
}

/// Compute zero-crossing rate (ZCR)
///
/// Formula: ZCR = Σ 2·[pos(x[n]) ≠ pos(x[n-1])] / (2·(N-1)), pos(x) = x > 0
///
/// Zero counts as non-positive, so a step from 0.0 to a negative sample is
/// not a crossing. Speech (especially sibilants) gives high rates, music
/// tends to give lower, steadier ones.
///
/// # Returns
/// Zero-crossing rate (0.0 to 1.0; 0.0 for fewer than 2 samples)
pub fn zero_crossing_rate(samples: &[f32]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let sum: f64 = samples
        .windows(2)
        .filter(|pair| (pair[1] > 0.0) != (pair[0] > 0.0))
        .map(|_| 2.0)
        .sum();

    sum / (2.0 * (samples.len() - 1) as f64)
}
