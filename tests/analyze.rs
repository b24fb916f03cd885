use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, test, web};
use serde_json::Value;

use leafscan::inference::model::{ModelError, Scorer};
use leafscan::inference::pipeline::DiagnosisPipeline;
use leafscan::inference::preprocess::ImageTensor;
use leafscan::inference::{DiseaseClassifier, GateClassifier};
use leafscan::routes::configure_routes;
use leafscan::storage::ScratchStore;

struct FixedScorer(Vec<f32>);

impl Scorer for FixedScorer {
    fn scores(&self, _input: &ImageTensor) -> Result<Vec<f32>, ModelError> {
        Ok(self.0.clone())
    }
}

struct FailingScorer;

impl Scorer for FailingScorer {
    fn scores(&self, _input: &ImageTensor) -> Result<Vec<f32>, ModelError> {
        Err(ModelError::Forward(tch::TchError::Torch(
            "backend exploded".to_string(),
        )))
    }
}

fn one_hot(len: usize, hot: usize) -> Vec<f32> {
    let mut v = vec![0.0; len];
    v[hot] = 1.0;
    v
}

fn pipeline(gate: Arc<dyn Scorer>, disease: Arc<dyn Scorer>) -> DiagnosisPipeline {
    DiagnosisPipeline::new(
        GateClassifier::new(gate),
        DiseaseClassifier::new(disease),
        Duration::from_secs(5),
    )
}

macro_rules! test_app {
    ($gate:expr, $disease:expr, $dir:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(pipeline($gate, $disease)))
                .app_data(web::Data::new(ScratchStore::new($dir).unwrap()))
                .configure(configure_routes),
        )
        .await
    };
}

fn leaf_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(48, 48, image::Rgb([40, 160, 60]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

const BOUNDARY: &str = "------------------------leafscan";

fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    write!(
        body,
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .unwrap();
    body.extend_from_slice(bytes);
    write!(body, "\r\n--{BOUNDARY}--\r\n").unwrap();
    body
}

fn analyze_request(field: &str, filename: &str, bytes: &[u8]) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/analyze")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body(field, filename, bytes))
        .to_request()
}

fn assert_scratch_empty(dir: &Path) {
    assert_eq!(
        fs::read_dir(dir).unwrap().count(),
        0,
        "scratch file leaked in {}",
        dir.display()
    );
}

#[actix_web::test]
async fn healthy_leaf_gets_a_diagnosis_and_treatment() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(
        Arc::new(FixedScorer(one_hot(3, 2))),
        Arc::new(FixedScorer(one_hot(12, 9))),
        dir.path()
    );

    let resp = test::call_service(&app, analyze_request("image", "leaf.png", &leaf_png())).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["disease"], "Tomato___healthy");
    assert_eq!(
        body["treatment"],
        "No treatment needed, continue regular plant care and monitoring."
    );
    assert_scratch_empty(dir.path());
}

#[actix_web::test]
async fn diseased_leaf_maps_to_its_advisory() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(
        Arc::new(FixedScorer(one_hot(3, 2))),
        Arc::new(FixedScorer(one_hot(12, 0))),
        dir.path()
    );

    let resp = test::call_service(&app, analyze_request("image", "leaf.jpg", &leaf_png())).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["disease"], "Tomato___Bacterial_spot");
    assert_eq!(
        body["treatment"],
        "Remove infected leaves, apply copper-based bactericides, and ensure good air circulation."
    );
}

#[actix_web::test]
async fn gate_rejections_come_back_without_treatment() {
    let dir = tempfile::tempdir().unwrap();

    for (hot, expected) in [(0, "Not a tomato leaf"), (1, "Invalid input")] {
        let app = test_app!(
            Arc::new(FixedScorer(one_hot(3, hot))),
            Arc::new(FailingScorer),
            dir.path()
        );
        let resp =
            test::call_service(&app, analyze_request("image", "leaf.png", &leaf_png())).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["disease"], expected);
        assert!(body.get("treatment").is_none());
    }
    assert_scratch_empty(dir.path());
}

#[actix_web::test]
async fn missing_image_field_is_a_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(
        Arc::new(FixedScorer(one_hot(3, 2))),
        Arc::new(FixedScorer(one_hot(12, 9))),
        dir.path()
    );

    let resp = test::call_service(&app, analyze_request("other", "leaf.png", &leaf_png())).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No image provided");
}

#[actix_web::test]
async fn empty_filename_is_a_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(
        Arc::new(FixedScorer(one_hot(3, 2))),
        Arc::new(FixedScorer(one_hot(12, 9))),
        dir.path()
    );

    let resp = test::call_service(&app, analyze_request("image", "", &leaf_png())).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No selected file");
}

#[actix_web::test]
async fn gif_extension_is_an_invalid_file_type() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(
        Arc::new(FixedScorer(one_hot(3, 2))),
        Arc::new(FixedScorer(one_hot(12, 9))),
        dir.path()
    );

    let resp = test::call_service(&app, analyze_request("image", "leaf.gif", &leaf_png())).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid file type");
    assert_scratch_empty(dir.path());
}

#[actix_web::test]
async fn undecodable_png_is_a_400_and_leaves_no_scratch_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(
        Arc::new(FixedScorer(one_hot(3, 2))),
        Arc::new(FixedScorer(one_hot(12, 9))),
        dir.path()
    );

    let resp = test::call_service(
        &app,
        analyze_request("image", "leaf.png", b"these bytes are not a png"),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("decode"), "unexpected error: {message}");
    assert_scratch_empty(dir.path());
}

#[actix_web::test]
async fn unknown_gate_verdict_is_a_500_unknown_classification() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(
        Arc::new(FixedScorer(one_hot(4, 3))),
        Arc::new(FailingScorer),
        dir.path()
    );

    let resp = test::call_service(&app, analyze_request("image", "leaf.png", &leaf_png())).await;
    assert_eq!(resp.status(), 500);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Unknown classification");
    assert_scratch_empty(dir.path());
}

#[actix_web::test]
async fn model_failure_is_a_500_and_leaves_no_scratch_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(Arc::new(FailingScorer), Arc::new(FailingScorer), dir.path());

    let resp = test::call_service(&app, analyze_request("image", "leaf.png", &leaf_png())).await;
    assert_eq!(resp.status(), 500);
    assert_scratch_empty(dir.path());
}

#[actix_web::test]
async fn sentinel_disease_class_is_a_500_consistency_fault() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(
        Arc::new(FixedScorer(one_hot(3, 2))),
        Arc::new(FixedScorer(one_hot(12, 10))),
        dir.path()
    );

    let resp = test::call_service(&app, analyze_request("image", "leaf.png", &leaf_png())).await;
    assert_eq!(resp.status(), 500);
    let body: Value = test::read_body_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("sentinel"), "unexpected error: {message}");
    assert_scratch_empty(dir.path());
}

#[actix_web::test]
async fn health_endpoint_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(
        Arc::new(FixedScorer(one_hot(3, 2))),
        Arc::new(FixedScorer(one_hot(12, 9))),
        dir.path()
    );

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}
