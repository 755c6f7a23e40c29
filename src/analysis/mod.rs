// Analysis - feature extraction and classification of whole clips
//
// features: spectrum analyzer + the three scalar features
// classifier: boundary to an externally trained music/speech model
// report: ground truth, per-clip verdicts and accuracy

pub mod classifier;
pub mod features;
pub mod report;

pub use classifier::{ClipClassifier, Label, LinearModel};
pub use features::{Clip, FeatureExtractor, FeatureTriple, FeatureVector, MagnitudeSpectrum};
pub use report::{classify_batch, ClassificationReport, ClassifiedClip};
