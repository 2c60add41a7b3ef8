//! Ordering and filtering of label similarity scores

use serde::{Deserialize, Serialize};

/// Scores at or below this are not shown.
pub const SIMILARITY_THRESHOLD: f64 = 20.0;

/// Similarity of one configured label to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaInfo {
    pub label: String,
    #[serde(alias = "similarity")]
    pub similarity_score: f64,
    #[serde(default)]
    pub distance: f64,
}

impl MetaInfo {
    pub fn new(label: impl Into<String>, similarity_score: f64, distance: f64) -> Self {
        Self {
            label: label.into(),
            similarity_score,
            distance,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct MetaInfoResponse {
    #[serde(default)]
    pub meta_info: Vec<MetaInfo>,
}

/// Sort by descending score and drop everything at or below the threshold.
pub fn rank(mut meta_info: Vec<MetaInfo>) -> Vec<MetaInfo> {
    meta_info.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
    meta_info.retain(|m| m.similarity_score > SIMILARITY_THRESHOLD);
    meta_info
}

/// Best match of an already ranked list
pub fn top(ranked: &[MetaInfo]) -> Option<&MetaInfo> {
    ranked.first()
}

/// Plain-text table of a ranked list, one label per line.
pub fn render(ranked: &[MetaInfo]) -> String {
    let width = ranked
        .iter()
        .map(|m| m.label.chars().count())
        .max()
        .unwrap_or(0)
        .max("label".len());

    let mut lines = vec![format!("{:<width$}  {:>7}  {:>8}", "label", "score", "distance")];
    for m in ranked {
        lines.push(format!(
            "{:<width$}  {:>6.2}%  {:>8.2}",
            m.label, m.similarity_score, m.distance
        ));
    }
    lines.join("\n")
}
