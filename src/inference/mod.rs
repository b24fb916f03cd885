pub mod disease;
pub mod gate;
pub mod model;
pub mod pipeline;
pub mod preprocess;

pub use disease::{DiseaseClassifier, DiseaseError, DiseaseLabel};
pub use gate::{GateClassifier, GateVerdict};
pub use model::{ClassifierModel, ModelError, Scorer};
pub use pipeline::{Diagnosis, DiagnosisPipeline, PipelineError};
pub use preprocess::{ImageTensor, preprocess};
