use actix_cors::Cors;
use actix_web::{App, HttpServer, web};

use leafscan::config::AppConfig;
use leafscan::inference::model::ClassifierModel;
use leafscan::inference::pipeline::DiagnosisPipeline;
use leafscan::inference::{DiseaseClassifier, GateClassifier};
use leafscan::routes::configure_routes;
use leafscan::storage::ScratchStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let config = AppConfig::from_env();

    let gate_model = ClassifierModel::load(&config.gate_model_path).map_err(|e| {
        log::error!("failed to load gate model: {e}");
        std::io::Error::other(format!("gate model loading failed: {e}"))
    })?;
    log::info!("loaded gate model from {}", config.gate_model_path.display());

    let disease_model = ClassifierModel::load(&config.disease_model_path).map_err(|e| {
        log::error!("failed to load disease model: {e}");
        std::io::Error::other(format!("disease model loading failed: {e}"))
    })?;
    log::info!(
        "loaded disease model from {}",
        config.disease_model_path.display()
    );

    let pipeline = DiagnosisPipeline::new(
        GateClassifier::new(gate_model.into_scorer()),
        DiseaseClassifier::new(disease_model.into_scorer()),
        config.inference_timeout,
    );
    let scratch = ScratchStore::new(&config.upload_dir)?;

    let bind_address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(pipeline.clone()))
            .app_data(web::Data::new(scratch.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
