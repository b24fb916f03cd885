use std::time::Duration;

use thiserror::Error;
use tokio::task::{self, JoinHandle};
use tokio::time;

use crate::catalog;
use crate::inference::disease::{DiseaseClassifier, DiseaseError, DiseaseLabel};
use crate::inference::gate::{GateClassifier, GateVerdict};
use crate::inference::model::ModelError;
use crate::inference::preprocess::{self, ImageTensor};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("model inference failed: {0}")]
    Inference(String),
    #[error("inference did not finish within {0:?}")]
    Timeout(Duration),
    #[error("gate model scored a class outside its known verdicts")]
    UnknownVerdict,
    #[error("disease model argmax {0} is outside the known label set")]
    UnexpectedClassIndex(usize),
    #[error("disease model selected sentinel class \"{}\" for a gated image", .0.as_str())]
    SentinelLabel(DiseaseLabel),
}

impl From<ModelError> for PipelineError {
    fn from(err: ModelError) -> Self {
        PipelineError::Inference(err.to_string())
    }
}

impl From<DiseaseError> for PipelineError {
    fn from(err: DiseaseError) -> Self {
        match err {
            DiseaseError::Model(inner) => PipelineError::Inference(inner.to_string()),
            DiseaseError::EmptyScores => {
                PipelineError::Inference("disease model returned an empty score vector".to_string())
            }
            DiseaseError::UnexpectedIndex(index) => PipelineError::UnexpectedClassIndex(index),
        }
    }
}

/// Terminal outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnosis {
    NotALeaf,
    InvalidInput,
    Diagnosed {
        disease: DiseaseLabel,
        treatment: &'static str,
    },
}

/// Orchestrates preprocess -> gate -> (conditionally) disease -> catalog.
///
/// Both classifiers are injected, never ambient; each scoring call runs on
/// the blocking pool under a bounded timeout. One run owns its tensor and
/// produces exactly one outcome; nothing is retried.
#[derive(Clone)]
pub struct DiagnosisPipeline {
    gate: GateClassifier,
    disease: DiseaseClassifier,
    timeout: Duration,
}

impl DiagnosisPipeline {
    pub fn new(gate: GateClassifier, disease: DiseaseClassifier, timeout: Duration) -> Self {
        Self {
            gate,
            disease,
            timeout,
        }
    }

    pub async fn diagnose(&self, bytes: &[u8]) -> Result<Diagnosis, PipelineError> {
        let tensor = preprocess::preprocess(bytes)?;

        let gate = self.gate.clone();
        let input = tensor.shallow_clone();
        let verdict = self
            .bounded(task::spawn_blocking(move || gate.classify(&input)))
            .await??;

        match verdict {
            GateVerdict::NotALeaf => Ok(Diagnosis::NotALeaf),
            GateVerdict::InvalidInput => Ok(Diagnosis::InvalidInput),
            GateVerdict::Unknown => Err(PipelineError::UnknownVerdict),
            GateVerdict::ValidLeaf => {
                let disease = self.disease.clone();
                let input = tensor.shallow_clone();
                let label = self
                    .bounded(task::spawn_blocking(move || disease.classify(&input)))
                    .await??;

                // The gate already admitted this image, so a sentinel class
                // here means the two models disagree about their contract.
                if label.is_sentinel() {
                    return Err(PipelineError::SentinelLabel(label));
                }

                Ok(Diagnosis::Diagnosed {
                    disease: label,
                    treatment: catalog::advisory_for(label),
                })
            }
        }
    }

    /// An elapsed timeout abandons the handle; the worker thread finishes on
    /// its own and its result is discarded.
    async fn bounded<T>(&self, handle: JoinHandle<T>) -> Result<T, PipelineError> {
        match time::timeout(self.timeout, handle).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(join_err)) => Err(PipelineError::Inference(join_err.to_string())),
            Err(_) => Err(PipelineError::Timeout(self.timeout)),
        }
    }
}
