use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{error, warn};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::io::Write;

use crate::inference::pipeline::{Diagnosis, DiagnosisPipeline, PipelineError};
use crate::storage::ScratchStore;

const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct DiagnosisResponse {
    disease: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    treatment: Option<String>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/analyze").route(web::post().to(handle_analyze)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Lowercased extension if the filename carries an allowed one.
fn allowed_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

async fn handle_analyze(
    pipeline: web::Data<DiagnosisPipeline>,
    scratch: web::Data<ScratchStore>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let Some(disposition) = field.content_disposition() else {
            continue;
        };
        if disposition.get_name() != Some("image") {
            continue;
        }
        let filename = disposition.get_filename().unwrap_or_default().to_owned();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            data.write_all(&chunk?)?;
        }
        upload = Some((filename, data));
    }

    let Some((filename, data)) = upload else {
        return Ok(bad_request("No image provided"));
    };
    if filename.is_empty() {
        return Ok(bad_request("No selected file"));
    }
    let Some(extension) = allowed_extension(&filename) else {
        return Ok(bad_request("Invalid file type"));
    };

    // The upload sits on disk only while the pipeline runs; the guard removes
    // it before the response leaves the handler, on every path.
    let stashed = match scratch.stash(&extension, &data) {
        Ok(file) => file,
        Err(err) => {
            error!("failed to stash upload: {err}");
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to store upload".to_string(),
            }));
        }
    };

    let outcome = match fs::read(stashed.path()) {
        Ok(bytes) => pipeline.diagnose(&bytes).await,
        Err(err) => {
            error!("failed to read back scratch file: {err}");
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to read upload".to_string(),
            }));
        }
    };
    drop(stashed);

    Ok(match outcome {
        Ok(Diagnosis::NotALeaf) => HttpResponse::Ok().json(DiagnosisResponse {
            disease: "Not a tomato leaf".to_string(),
            treatment: None,
        }),
        Ok(Diagnosis::InvalidInput) => HttpResponse::Ok().json(DiagnosisResponse {
            disease: "Invalid input".to_string(),
            treatment: None,
        }),
        Ok(Diagnosis::Diagnosed { disease, treatment }) => HttpResponse::Ok().json(
            DiagnosisResponse {
                disease: disease.as_str().to_string(),
                treatment: Some(treatment.to_string()),
            },
        ),
        Err(err) => error_response(err),
    })
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: message.to_string(),
    })
}

fn error_response(err: PipelineError) -> HttpResponse {
    match err {
        // Unreadable upload bytes are the caller's problem, not ours.
        PipelineError::Decode(_) => {
            warn!("rejected undecodable upload: {err}");
            HttpResponse::BadRequest().json(ErrorResponse {
                error: err.to_string(),
            })
        }
        PipelineError::UnknownVerdict => {
            error!("gate model verdict out of range");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Unknown classification".to_string(),
            })
        }
        PipelineError::SentinelLabel(_) | PipelineError::UnexpectedClassIndex(_) => {
            error!("internal consistency fault: {err}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: err.to_string(),
            })
        }
        PipelineError::Inference(_) | PipelineError::Timeout(_) => {
            error!("pipeline failure: {err}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: err.to_string(),
            })
        }
    }
}
