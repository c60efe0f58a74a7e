use actix_files::Files;
use actix_web::{guard, web};

use crate::error::ApiError;
use crate::handlers::{auth, health, images, products, tasks};
use crate::middleware::AuthMiddleware;
use crate::state::AppState;

/// Mounts the whole HTTP surface. Product reads and auth issuance are public;
/// everything else sits behind [`AuthMiddleware`].
pub fn configure(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        let guard_auth = AuthMiddleware::new(state.tokens.clone());
        let local_dir = state.images.local_dir().map(|dir| dir.to_path_buf());

        cfg.app_data(state)
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                ApiError::Validation(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                ApiError::Validation(err.to_string()).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                ApiError::Validation(err.to_string()).into()
            }))
            .route("/", web::get().to(health::index))
            .route("/api/health", web::get().to(health::health))
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login)),
            )
            .service(
                web::resource("/api/products")
                    .guard(guard::Get())
                    .to(products::list_products),
            )
            .service(
                web::scope("/api/products")
                    .wrap(guard_auth.clone())
                    .route("", web::post().to(products::create_product))
                    .route("/{id}", web::put().to(products::update_product))
                    .route("/{id}", web::delete().to(products::delete_product)),
            )
            .service(
                web::scope("/api/tasks")
                    .wrap(guard_auth.clone())
                    .route("", web::get().to(tasks::list_tasks))
                    .route("", web::post().to(tasks::create_task))
                    .route("/{id}", web::put().to(tasks::update_task))
                    .route("/{id}", web::delete().to(tasks::delete_task)),
            )
            .service(
                web::scope("/api/images")
                    .wrap(guard_auth)
                    .route("", web::get().to(images::list_images))
                    .route("/upload", web::post().to(images::upload_image))
                    .route("/{filename:.*}", web::delete().to(images::delete_image)),
            );

        if let Some(dir) = local_dir {
            cfg.service(Files::new("/uploads", dir));
        }

        cfg.default_service(web::to(health::not_found));
    }
}
