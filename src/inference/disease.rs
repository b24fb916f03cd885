use std::sync::Arc;

use thiserror::Error;

use crate::inference::gate::argmax;
use crate::inference::model::{ModelError, Scorer};
use crate::inference::preprocess::ImageTensor;

/// Closed set of classes the disease model was trained on. Indices 0..=9 are
/// genuine tomato disease/health states; the last two are sentinel classes
/// that duplicate the gate verdicts. They exist in the model's output space
/// and in the treatment catalog, but once an image has passed the gate they
/// must never surface - the pipeline rejects them as a consistency fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiseaseLabel {
    BacterialSpot,
    EarlyBlight,
    LateBlight,
    LeafMold,
    SeptoriaLeafSpot,
    SpiderMites,
    TargetSpot,
    YellowLeafCurlVirus,
    MosaicVirus,
    Healthy,
    NotTomatoLeaf,
    InvalidInput,
}

impl DiseaseLabel {
    pub const ALL: [DiseaseLabel; 12] = [
        DiseaseLabel::BacterialSpot,
        DiseaseLabel::EarlyBlight,
        DiseaseLabel::LateBlight,
        DiseaseLabel::LeafMold,
        DiseaseLabel::SeptoriaLeafSpot,
        DiseaseLabel::SpiderMites,
        DiseaseLabel::TargetSpot,
        DiseaseLabel::YellowLeafCurlVirus,
        DiseaseLabel::MosaicVirus,
        DiseaseLabel::Healthy,
        DiseaseLabel::NotTomatoLeaf,
        DiseaseLabel::InvalidInput,
    ];

    /// Output-vector position, matching the training class order.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Wire label as the trained dataset names it.
    pub fn as_str(self) -> &'static str {
        match self {
            DiseaseLabel::BacterialSpot => "Tomato___Bacterial_spot",
            DiseaseLabel::EarlyBlight => "Tomato___Early_blight",
            DiseaseLabel::LateBlight => "Tomato___Late_blight",
            DiseaseLabel::LeafMold => "Tomato___Leaf_Mold",
            DiseaseLabel::SeptoriaLeafSpot => "Tomato___Septoria_leaf_spot",
            DiseaseLabel::SpiderMites => "Tomato___Spider_mites Two-spotted_spider_mite",
            DiseaseLabel::TargetSpot => "Tomato___Target_Spot",
            DiseaseLabel::YellowLeafCurlVirus => "Tomato___Tomato_Yellow_Leaf_Curl_Virus",
            DiseaseLabel::MosaicVirus => "Tomato___Tomato_mosaic_virus",
            DiseaseLabel::Healthy => "Tomato___healthy",
            DiseaseLabel::NotTomatoLeaf => "Not a tomato leaf",
            DiseaseLabel::InvalidInput => "Invalid input",
        }
    }

    pub fn is_sentinel(self) -> bool {
        matches!(self, DiseaseLabel::NotTomatoLeaf | DiseaseLabel::InvalidInput)
    }
}

#[derive(Debug, Error)]
pub enum DiseaseError {
    #[error(transparent)]
    Model(ModelError),
    #[error("disease model returned an empty score vector")]
    EmptyScores,
    #[error("disease model argmax {0} is outside the known label set")]
    UnexpectedIndex(usize),
}

#[derive(Clone)]
pub struct DiseaseClassifier {
    scorer: Arc<dyn Scorer>,
}

impl DiseaseClassifier {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    pub fn classify(&self, tensor: &ImageTensor) -> Result<DiseaseLabel, DiseaseError> {
        let scores = self.scorer.scores(tensor).map_err(DiseaseError::Model)?;
        let index = argmax(&scores).ok_or(DiseaseError::EmptyScores)?;
        DiseaseLabel::from_index(index).ok_or(DiseaseError::UnexpectedIndex(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_cover_the_training_order() {
        assert_eq!(
            DiseaseLabel::from_index(0),
            Some(DiseaseLabel::BacterialSpot)
        );
        assert_eq!(DiseaseLabel::from_index(9), Some(DiseaseLabel::Healthy));
        assert_eq!(
            DiseaseLabel::from_index(10),
            Some(DiseaseLabel::NotTomatoLeaf)
        );
        assert_eq!(
            DiseaseLabel::from_index(11),
            Some(DiseaseLabel::InvalidInput)
        );
        assert_eq!(DiseaseLabel::from_index(12), None);
    }

    #[test]
    fn only_the_last_two_classes_are_sentinels() {
        let sentinels: Vec<_> = DiseaseLabel::ALL
            .iter()
            .filter(|label| label.is_sentinel())
            .collect();
        assert_eq!(
            sentinels,
            vec![&DiseaseLabel::NotTomatoLeaf, &DiseaseLabel::InvalidInput]
        );
    }

    #[test]
    fn healthy_wire_label_matches_dataset_naming() {
        assert_eq!(DiseaseLabel::Healthy.as_str(), "Tomato___healthy");
    }

    #[test]
    fn wire_labels_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for label in DiseaseLabel::ALL {
            assert!(seen.insert(label.as_str()), "duplicate {}", label.as_str());
        }
    }
}
