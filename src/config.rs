use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, read once at startup. Every knob has a default so
/// the service comes up in a dev checkout with nothing but the model files.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gate_model_path: PathBuf,
    pub disease_model_path: PathBuf,
    pub upload_dir: PathBuf,
    pub inference_timeout: Duration,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let gate_model_path =
            env::var("GATE_MODEL_PATH").unwrap_or_else(|_| "models/gate.pt".to_string());
        let disease_model_path =
            env::var("DISEASE_MODEL_PATH").unwrap_or_else(|_| "models/disease.pt".to_string());
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        let timeout_ms = env::var("INFERENCE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30_000);
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8081);

        Self {
            gate_model_path: PathBuf::from(gate_model_path),
            disease_model_path: PathBuf::from(disease_model_path),
            upload_dir: PathBuf::from(upload_dir),
            inference_timeout: Duration::from_millis(timeout_ms),
            port,
        }
    }
}
