// Report - per-clip verdicts against filename-derived ground truth
//
// Ground truth is a heuristic on the file name: a clip whose name contains
// the music marker ("mu" by default) is music. Rows show the file name
// without its extension, the classifier's label, the ground truth and
// whether they match.

use serde::{Serialize, Serializer};

use crate::analysis::classifier::{ClipClassifier, Label};
use crate::error::ExtractionError;
use crate::pipeline::{ClipFailure, FeatureBatch};

/// Default ground-truth marker for music clips
pub const DEFAULT_MUSIC_MARKER: &str = "mu";

/// Ground truth derived from the full file name
pub fn ground_truth(file_name: &str, music_marker: &str) -> Label {
    Label::from_is_music(file_name.contains(music_marker))
}

/// File name with its final extension removed ("a.b.wav" -> "a.b")
pub fn display_name(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// One classified clip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedClip {
    pub file_name: String,
    /// `None` when the features were degenerate; written as "undefined"
    #[serde(serialize_with = "serialize_label")]
    pub label: Option<Label>,
    pub ground_truth: Label,
    pub matched: bool,
}

/// Verdicts for a whole batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub clips: Vec<ClassifiedClip>,
    /// Share of clips with a defined label that match ground truth
    pub accuracy: Option<f64>,
    pub undefined: usize,
    pub failures: Vec<ClipFailure>,
}

fn serialize_label<S: Serializer>(label: &Option<Label>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(label.map_or("undefined", |l| l.as_str()))
}

/// Classify every clip of a batch and score it against ground truth
///
/// Degenerate clips get an undefined label and are left out of accuracy.
/// Any other classifier error aborts the report.
pub fn classify_batch(
    batch: &FeatureBatch,
    classifier: &dyn ClipClassifier,
    music_marker: &str,
) -> Result<ClassificationReport, ExtractionError> {
    let mut report = ClassificationReport {
        failures: batch.failures.clone(),
        ..ClassificationReport::default()
    };
    let mut matched = 0usize;

    for features in batch.iter() {
        let label = match classifier.classify(&features.features()) {
            Ok(label) => Some(label),
            Err(ExtractionError::DegenerateSpectrum) => {
                report.undefined += 1;
                None
            }
            Err(err) => return Err(err),
        };
        let truth = ground_truth(&features.file_name, music_marker);
        let is_match = label == Some(truth);
        if is_match {
            matched += 1;
        }

        report.clips.push(ClassifiedClip {
            file_name: display_name(&features.file_name).to_string(),
            label,
            ground_truth: truth,
            matched: is_match,
        });
    }

    let defined = report.clips.len() - report.undefined;
    report.accuracy = (defined > 0).then(|| matched as f64 / defined as f64);

    tracing::info!(
        "[Report] {} clips classified, {} undefined, accuracy {:?}",
        report.clips.len(),
        report.undefined,
        report.accuracy
    );
    Ok(report)
}
