// Batch pipeline - feature extraction over every clip of a source
//
// Clips are independent: each worker owns its own FeatureExtractor (FFT
// planner, window cache, scratch buffers) and a clip's samples never leave
// the worker that decoded them. Results are collected from a bounded rayon
// pool and then sorted by file name, so the batch order never depends on
// completion order or worker count.
//
// Flow per clip:
// 1. Decode via the ClipSource (retried on DecodeFailure)
// 2. Magnitude spectrum -> effective sample rate -> feature triple
// 3. Collect; failures are recorded or abort the batch per FailurePolicy

use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::analysis::features::{Clip, FeatureExtractor, FeatureTriple};
use crate::config::{FailurePolicy, PipelineConfig};
use crate::error::{log_extraction_error, ErrorCode, ExtractionError};
use crate::source::{ClipEntry, ClipSource};

/// Cooperative batch cancellation
///
/// Once cancelled, no further clips are dispatched. Clips already being
/// processed finish and are kept in the batch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A clip that could not be turned into features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipFailure {
    pub file_name: String,
    pub code: i32,
    pub message: String,
}

impl ClipFailure {
    fn new(file_name: String, err: &ExtractionError) -> Self {
        Self {
            file_name,
            code: err.code(),
            message: err.message(),
        }
    }
}

/// Features of every successfully processed clip, sorted by file name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureBatch {
    pub features: Vec<FeatureTriple>,
    /// Clips skipped under `FailurePolicy::Skip`, sorted by file name
    pub failures: Vec<ClipFailure>,
    /// True when cancellation stopped dispatch before every clip ran
    pub cancelled: bool,
}

impl FeatureBatch {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureTriple> {
        self.features.iter()
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.file_name.as_str()).collect()
    }

    /// Look up a clip by file name
    ///
    /// Batches from `extract_all` are sorted, but `features` is public and a
    /// hand-built batch may not be, so this scans instead of bisecting.
    pub fn get(&self, file_name: &str) -> Option<&FeatureTriple> {
        self.features.iter().find(|f| f.file_name == file_name)
    }
}

/// Outcome of one dispatched (or undispatched) clip
enum ClipOutcome {
    Extracted(FeatureTriple),
    Failed(String, ExtractionError),
    NotDispatched,
    /// Sorted after a fail-fast failure; never run
    Abandoned,
}

/// Runs the feature extractor over every clip of a source
pub struct BatchPipeline {
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl BatchPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract features for every clip the source enumerates
    ///
    /// # Returns
    /// A `FeatureBatch` sorted by file name. Under `FailurePolicy::Skip`
    /// failing clips are listed in `failures`.
    ///
    /// # Errors
    /// Enumeration errors, pool construction errors, and under
    /// `FailurePolicy::FailFast` the error of the first failing clip by file
    /// name, whatever the worker count.
    pub fn extract_all<S: ClipSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<FeatureBatch, ExtractionError> {
        let start = Instant::now();
        let mut entries = source.enumerate()?;
        // Dispatch in name order so a single worker processes clips deterministically
        entries.sort();

        tracing::info!(
            "[BatchPipeline] Extracting features from {} clips ({} workers, policy {:?})",
            entries.len(),
            self.config.workers,
            self.config.failure_policy
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|idx| format!("feature-worker-{}", idx))
            .build()
            .map_err(|err| ExtractionError::InvalidInput {
                reason: format!("cannot start worker pool: {}", err),
            })?;

        // Lowest failing index under FailFast. Entries are in name order, so
        // clips below it still run and the first failure by name is always found.
        let first_failure = AtomicUsize::new(usize::MAX);
        let outcomes: Vec<ClipOutcome> = pool.install(|| {
            entries
                .par_iter()
                .enumerate()
                .map_init(FeatureExtractor::new, |extractor, (idx, entry)| {
                    if self.cancel.is_cancelled() {
                        return ClipOutcome::NotDispatched;
                    }
                    if idx > first_failure.load(Ordering::SeqCst) {
                        return ClipOutcome::Abandoned;
                    }
                    match self.process_clip(source, extractor, entry) {
                        Ok(features) => ClipOutcome::Extracted(features),
                        Err(err) => {
                            if self.config.failure_policy == FailurePolicy::FailFast {
                                first_failure.fetch_min(idx, Ordering::SeqCst);
                            }
                            ClipOutcome::Failed(entry.file_name.clone(), err)
                        }
                    }
                })
                .collect()
        });

        let mut batch = FeatureBatch::default();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                ClipOutcome::Extracted(features) => batch.features.push(features),
                ClipOutcome::Failed(file_name, err) => errors.push((file_name, err)),
                ClipOutcome::NotDispatched => batch.cancelled = true,
                ClipOutcome::Abandoned => {}
            }
        }

        batch.features.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        errors.sort_by(|a, b| a.0.cmp(&b.0));

        if self.config.failure_policy == FailurePolicy::FailFast {
            if let Some((file_name, err)) = errors.into_iter().next() {
                log_extraction_error(&err, &format!("clip '{}'", file_name));
                return Err(err);
            }
        } else {
            for (file_name, err) in errors {
                tracing::warn!(
                    "[BatchPipeline] Skipping '{}': code={} {}",
                    file_name,
                    err.code(),
                    err.message()
                );
                batch.failures.push(ClipFailure::new(file_name, &err));
            }
        }

        tracing::info!(
            "[BatchPipeline] Extracted {} clips, {} failed{} in {:.1} ms",
            batch.features.len(),
            batch.failures.len(),
            if batch.cancelled { " (cancelled)" } else { "" },
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(batch)
    }

    fn process_clip<S: ClipSource + ?Sized>(
        &self,
        source: &S,
        extractor: &mut FeatureExtractor,
        entry: &ClipEntry,
    ) -> Result<FeatureTriple, ExtractionError> {
        let clip = self.load_with_retries(source, entry)?;
        let features = extractor.extract(&clip)?;
        tracing::debug!(
            "[BatchPipeline] {}: ed={} zcr={:.5} energy={:.6}",
            features.file_name,
            features.energy_distribution,
            features.zero_crossing_rate,
            features.average_energy
        );
        Ok(features)
    }

    fn load_with_retries<S: ClipSource + ?Sized>(
        &self,
        source: &S,
        entry: &ClipEntry,
    ) -> Result<Clip, ExtractionError> {
        let mut attempt = 0;
        loop {
            match source.load(entry) {
                Ok(clip) => return Ok(clip),
                Err(err @ ExtractionError::DecodeFailure { .. })
                    if attempt < self.config.decode_retries =>
                {
                    attempt += 1;
                    tracing::warn!(
                        "[BatchPipeline] Decode of '{}' failed ({}), retry {}/{}",
                        entry.file_name,
                        err.message(),
                        attempt,
                        self.config.decode_retries
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for BatchPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionErrorCodes;
    use crate::source::MemoryClipSource;

    fn tone(name: &str, frequency: f32) -> Clip {
        let samples: Vec<f32> = (0..4096)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * frequency * i as f32 / 8000.0).sin())
            .collect();
        Clip::new(name, samples, 4096.0 / 8000.0)
    }

    fn pipeline(workers: usize, failure_policy: FailurePolicy) -> BatchPipeline {
        BatchPipeline::new(PipelineConfig {
            workers,
            failure_policy,
            decode_retries: 0,
        })
    }

    #[test]
    fn test_batch_sorted_regardless_of_enumeration_order() {
        let source: MemoryClipSource = [
            tone("b.wav", 300.0),
            tone("a.wav", 500.0),
            tone("c.wav", 700.0),
        ]
        .into_iter()
        .collect();

        let batch = pipeline(1, FailurePolicy::Skip).extract_all(&source).unwrap();
        assert_eq!(batch.file_names(), vec!["a.wav", "b.wav", "c.wav"]);
        assert!(batch.failures.is_empty());
        assert!(!batch.cancelled);
    }

    #[test]
    fn test_worker_count_does_not_change_results() {
        let source: MemoryClipSource = (0..12)
            .rev()
            .map(|i| tone(&format!("clip_{:02}.wav", i), 100.0 + 150.0 * i as f32))
            .collect();

        let sequential = pipeline(1, FailurePolicy::Skip).extract_all(&source).unwrap();
        let parallel = pipeline(4, FailurePolicy::Skip).extract_all(&source).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.len(), 12);
    }

    #[test]
    fn test_skip_policy_records_failures() {
        let source = MemoryClipSource::new()
            .with_clip(tone("mu_1.wav", 440.0))
            .with_failure("broken.wav", "bad header")
            .with_clip(Clip::new("short.wav", vec![0.3], 1.0));

        let batch = pipeline(2, FailurePolicy::Skip).extract_all(&source).unwrap();
        assert_eq!(batch.file_names(), vec!["mu_1.wav"]);
        assert_eq!(batch.failures.len(), 2);
        assert_eq!(batch.failures[0].file_name, "broken.wav");
        assert_eq!(batch.failures[0].code, ExtractionErrorCodes::DECODE_FAILURE);
        assert_eq!(batch.failures[1].file_name, "short.wav");
        assert_eq!(batch.failures[1].code, ExtractionErrorCodes::INVALID_INPUT);
    }

    #[test]
    fn test_fail_fast_returns_error() {
        let source = MemoryClipSource::new()
            .with_clip(tone("a.wav", 440.0))
            .with_failure("b.wav", "bad header");

        let err = pipeline(1, FailurePolicy::FailFast)
            .extract_all(&source)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::DecodeFailure { .. }));
    }

    #[test]
    fn test_fail_fast_reports_first_failure_for_any_worker_count() {
        let source = (0..400)
            .filter(|i| *i != 20 && *i != 300)
            .map(|i| tone(&format!("clip_{:04}.wav", i), 200.0 + i as f32))
            .collect::<MemoryClipSource>()
            .with_failure("clip_0300.wav", "bad header")
            .with_failure("clip_0020.wav", "bad header");

        for workers in [1, 2, 4, 8] {
            for _ in 0..3 {
                let err = pipeline(workers, FailurePolicy::FailFast)
                    .extract_all(&source)
                    .unwrap_err();
                match err {
                    ExtractionError::DecodeFailure { file_name, .. } => {
                        assert_eq!(file_name, "clip_0020.wav", "workers={}", workers)
                    }
                    other => panic!("Expected DecodeFailure, got {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_get_on_unsorted_batch() {
        let batch = FeatureBatch {
            features: vec![
                FeatureTriple {
                    file_name: "z.wav".to_string(),
                    energy_distribution: 100.0,
                    zero_crossing_rate: 0.1,
                    average_energy: 0.2,
                },
                FeatureTriple {
                    file_name: "a.wav".to_string(),
                    energy_distribution: 200.0,
                    zero_crossing_rate: 0.3,
                    average_energy: 0.4,
                },
            ],
            failures: vec![],
            cancelled: false,
        };
        assert_eq!(batch.get("a.wav").unwrap().energy_distribution, 200.0);
        assert_eq!(batch.get("z.wav").unwrap().energy_distribution, 100.0);
        assert!(batch.get("m.wav").is_none());
    }

    #[test]
    fn test_silent_clip_does_not_abort() {
        let source = MemoryClipSource::new()
            .with_clip(Clip::new("silence.wav", vec![0.0; 2048], 0.25))
            .with_clip(tone("tone.wav", 440.0));

        let batch = pipeline(1, FailurePolicy::FailFast)
            .extract_all(&source)
            .unwrap();
        assert_eq!(batch.len(), 2);
        let silent = batch.get("silence.wav").unwrap();
        assert!(silent.energy_distribution.is_nan());
        assert_eq!(silent.average_energy, 0.0);
        assert_eq!(silent.zero_crossing_rate, 0.0);
        assert!(!batch.get("tone.wav").unwrap().is_degenerate());
    }

    #[test]
    fn test_cancelled_before_start_dispatches_nothing() {
        let source: MemoryClipSource = [tone("a.wav", 440.0), tone("b.wav", 880.0)]
            .into_iter()
            .collect();
        let pipeline = pipeline(1, FailurePolicy::Skip);
        pipeline.cancellation_token().cancel();

        let batch = pipeline.extract_all(&source).unwrap();
        assert!(batch.is_empty());
        assert!(batch.cancelled);
    }

    /// Fails the first `failures` decodes of every clip
    struct FlakySource {
        inner: MemoryClipSource,
        failures: usize,
        attempts: AtomicUsize,
    }

    impl ClipSource for FlakySource {
        fn enumerate(&self) -> Result<Vec<ClipEntry>, ExtractionError> {
            self.inner.enumerate()
        }

        fn load(&self, entry: &ClipEntry) -> Result<Clip, ExtractionError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                return Err(ExtractionError::DecodeFailure {
                    file_name: entry.file_name.clone(),
                    reason: "transient".to_string(),
                });
            }
            self.inner.load(entry)
        }
    }

    #[test]
    fn test_decode_retries() {
        let flaky = FlakySource {
            inner: MemoryClipSource::new().with_clip(tone("a.wav", 440.0)),
            failures: 2,
            attempts: AtomicUsize::new(0),
        };

        let mut config = PipelineConfig {
            workers: 1,
            ..PipelineConfig::default()
        };
        let batch = BatchPipeline::new(config.clone()).extract_all(&flaky).unwrap();
        assert_eq!(batch.failures.len(), 1);

        flaky.attempts.store(0, Ordering::SeqCst);
        config.decode_retries = 2;
        let batch = BatchPipeline::new(config).extract_all(&flaky).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.failures.is_empty());
        assert_eq!(flaky.attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_empty_source() {
        let batch = BatchPipeline::default()
            .extract_all(&MemoryClipSource::new())
            .unwrap();
        assert!(batch.is_empty());
        assert!(batch.failures.is_empty());
    }
}
