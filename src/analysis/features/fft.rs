// FFT module - windowed magnitude spectrum of a whole clip
//
// The clip is truncated to the largest power of two that fits, Hann
// windowed, and transformed with the packed real-FFT scheme: the M real
// samples become M/2 complex values (even samples real, odd samples
// imaginary), a complex FFT of size M/2 runs over them, and the result is
// split back into the M/2 bins of the real spectrum. Bin 0 carries DC in
// its real part and Nyquist in its imaginary part.

use rustfft::{num_complex::Complex, FftPlanner};
use std::collections::HashMap;
use std::f32::consts::PI;

use super::types::MagnitudeSpectrum;
use crate::error::ExtractionError;

/// Fewest samples the analyzer accepts (one FFT of size 2)
pub const MIN_SAMPLES: usize = 2;

/// Largest power of two that is `<= len` (0 for an empty input)
///
/// Clips whose length is not a power of two are truncated to this size;
/// the tail past it does not contribute to the spectrum.
pub fn fft_size_for(len: usize) -> usize {
    if len == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - len.leading_zeros())
    }
}

/// Hann window of `size` points: `0.5 * (1 - cos(2*pi*i / (size - 1)))`
pub fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - ((2.0 * PI * i as f32) / (size as f32 - 1.0)).cos()))
        .collect()
}

/// Computes magnitude spectra of whole clips
///
/// Owns its FFT planner, a window per FFT size and the packed/scratch
/// buffers, so repeated calls do not reallocate. One analyzer belongs to
/// one worker; it is `Send` but deliberately not shared.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f32>,
    windows: HashMap<usize, Vec<f32>>,
    packed: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            windows: HashMap::new(),
            packed: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Compute the normalized magnitude spectrum of `samples`
    ///
    /// Steps:
    /// 1. M = largest power of two <= N, keep the first M samples
    /// 2. Multiply by a Hann window of length M
    /// 3. Pack into M/2 complex values and run the forward FFT
    /// 4. Split into real-spectrum bins (scaled by 2, packed convention)
    /// 5. Magnitude = sqrt(re^2 + im^2) * 2 / (M/2)
    ///
    /// # Returns
    /// Spectrum of length M/2, or `InvalidInput` for fewer than 2 samples
    pub fn compute_magnitude_spectrum(
        &mut self,
        samples: &[f32],
    ) -> Result<MagnitudeSpectrum, ExtractionError> {
        if samples.len() < MIN_SAMPLES {
            return Err(ExtractionError::InvalidInput {
                reason: format!(
                    "spectrum needs at least {} samples, got {}",
                    MIN_SAMPLES,
                    samples.len()
                ),
            });
        }

        let fft_size = fft_size_for(samples.len());
        let half = fft_size / 2;
        let window = self
            .windows
            .entry(fft_size)
            .or_insert_with(|| hann_window(fft_size));

        // Even samples -> real part, odd samples -> imaginary part
        self.packed.clear();
        self.packed.extend(
            samples[..fft_size]
                .chunks_exact(2)
                .zip(window.chunks_exact(2))
                .map(|(s, w)| Complex::new(s[0] * w[0], s[1] * w[1])),
        );

        let fft = self.planner.plan_fft_forward(half);
        let scratch_len = fft.get_inplace_scratch_len();
        if self.scratch.len() < scratch_len {
            self.scratch.resize(scratch_len, Complex::new(0.0, 0.0));
        }
        fft.process_with_scratch(&mut self.packed, &mut self.scratch[..scratch_len]);

        let scale = 2.0 / half as f32;
        let mut magnitudes = Vec::with_capacity(half);

        let z0 = self.packed[0];
        let dc = 2.0 * (z0.re + z0.im);
        let nyquist = 2.0 * (z0.re - z0.im);
        magnitudes.push((dc * dc + nyquist * nyquist).sqrt() * scale);

        for k in 1..half {
            let z = self.packed[k];
            let mirror = self.packed[half - k].conj();
            let even = z + mirror;
            let odd = z - mirror;
            let (sin, cos) = (-2.0 * PI * k as f32 / fft_size as f32).sin_cos();
            let twiddle = Complex::new(cos, sin);
            // odd holds 2i*O[k]; multiplying by -i recovers 2*O[k]
            let bin = even + twiddle * Complex::new(odd.im, -odd.re);
            magnitudes.push(bin.norm_sqr().sqrt() * scale);
        }

        Ok(MagnitudeSpectrum::new(magnitudes))
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
