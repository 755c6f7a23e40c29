// Speech/Music Core - clip feature extraction for music/speech classification
// Whole-clip windowed FFT features computed over a batch of decoded clips

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;

// Re-exports for convenience
pub use analysis::{
    classify_batch, Clip, ClipClassifier, FeatureExtractor, FeatureTriple, FeatureVector, Label,
    LinearModel, MagnitudeSpectrum,
};
pub use config::{AppConfig, FailurePolicy, PipelineConfig};
pub use error::{ErrorCode, ExtractionError};
pub use pipeline::{BatchPipeline, CancellationToken, ClipFailure, FeatureBatch};
pub use source::{ClipEntry, ClipSource, MemoryClipSource, WavDirectorySource};

use std::sync::Once;

static LOGGING: Once = Once::new();

/// Install the stderr `tracing` subscriber (idempotent)
///
/// `log` records from dependencies are bridged into it. Output goes to
/// stderr so JSON written to stdout stays machine-readable.
pub fn init_logging(verbose: bool) {
    LOGGING.call_once(|| {
        let level = if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
