use std::path::Path;
use std::sync::{Arc, Mutex};

use tch::{CModule, Device, Kind};
use thiserror::Error;

use crate::inference::preprocess::ImageTensor;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to load model: {0}")]
    Load(tch::TchError),
    #[error("model inference failed: {0}")]
    Forward(tch::TchError),
}

/// Scoring seam between the pipeline and whatever produces the score
/// vector, so classifiers can be exercised without a TorchScript artifact.
pub trait Scorer: Send + Sync {
    fn scores(&self, input: &ImageTensor) -> Result<Vec<f32>, ModelError>;
}

/// A TorchScript classifier loaded once at startup and shared for the
/// process lifetime. Forward passes are serialized behind the mutex since
/// CModule is not assumed re-entrant.
#[derive(Clone)]
pub struct ClassifierModel {
    module: Arc<Mutex<CModule>>,
    device: Device,
}

impl ClassifierModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let device = Device::cuda_if_available();
        let module = CModule::load_on_device(path, device).map_err(ModelError::Load)?;
        Ok(Self {
            module: Arc::new(Mutex::new(module)),
            device,
        })
    }

    pub fn into_scorer(self) -> Arc<dyn Scorer> {
        Arc::new(self)
    }
}

impl Scorer for ClassifierModel {
    fn scores(&self, input: &ImageTensor) -> Result<Vec<f32>, ModelError> {
        let tensor = input.as_tensor().to_device(self.device);
        let output = self
            .module
            .lock()
            .unwrap()
            .forward_ts(&[tensor])
            .map_err(ModelError::Forward)?;
        let probs = output.softmax(-1, Kind::Float);
        let flat = probs.to_kind(Kind::Float).view([-1]);
        let num_elements = flat.size()[0] as usize;
        let mut scores = vec![0.0f32; num_elements];
        flat.copy_data(&mut scores, num_elements);
        Ok(scores)
    }
}
