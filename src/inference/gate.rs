use std::sync::Arc;

use crate::inference::model::{ModelError, Scorer};
use crate::inference::preprocess::ImageTensor;

/// Coarse verdict on whether an upload is a usable tomato leaf photo.
/// The fine-grained disease model only runs on `ValidLeaf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    NotALeaf,
    InvalidInput,
    ValidLeaf,
    Unknown,
}

impl GateVerdict {
    /// Argmax of the gate model's score vector: index 0, 1 and 2 are the
    /// trained classes, anything else (including an empty vector) is
    /// `Unknown`. Ties resolve to the lowest index.
    pub fn from_scores(scores: &[f32]) -> Self {
        match argmax(scores) {
            Some(0) => Self::NotALeaf,
            Some(1) => Self::InvalidInput,
            Some(2) => Self::ValidLeaf,
            _ => Self::Unknown,
        }
    }
}

pub(crate) fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        let replace = match best {
            None => true,
            Some((_, top)) => score > top,
        };
        if replace {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

#[derive(Clone)]
pub struct GateClassifier {
    scorer: Arc<dyn Scorer>,
}

impl GateClassifier {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    pub fn classify(&self, tensor: &ImageTensor) -> Result<GateVerdict, ModelError> {
        let scores = self.scorer.scores(tensor)?;
        Ok(GateVerdict::from_scores(&scores))
    }
}
