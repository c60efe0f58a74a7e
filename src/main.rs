use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use task_hub::config::Config;
use task_hub::state::AppState;
use task_hub::{db, routes, storage};

fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header()
            .max_age(3600),
        None => Cors::permissive(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok(); // Load environment variables from .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let db = db::connect(&config.database_url, &config.database_name)
        .await
        .map_err(|e| {
            log::error!("failed to connect to MongoDB: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;

    let images = storage::from_config(&config.storage).await.map_err(|e| {
        log::error!("failed to initialise image storage: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let state = web::Data::new(AppState::with_mongo(&db, images, &config));
    let cors_origin = config.cors_origin.clone();

    log::info!(
        "server running on {}:{} ({})",
        config.host,
        config.port,
        config.environment
    );

    HttpServer::new(move || {
        App::new()
            .wrap(cors(cors_origin.as_deref()))
            .wrap(Logger::default())
            .configure(routes::configure(state.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
