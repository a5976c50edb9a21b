pub mod admin;
pub mod auth;
pub mod documents;
pub mod health;
pub mod uploads;
pub mod users;

use actix_web::web;

use crate::errors::AppError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Erreurs d'extraction => même format d'erreur que le reste de l'API
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation {
            message: format!("Invalid JSON body: {}", err),
            field: None,
        }
        .into()
    });

    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        AppError::Validation {
            message: format!("Invalid query string: {}", err),
            field: None,
        }
        .into()
    });

    // /api/documents/abc : aucune ressource ne peut correspondre
    let path_config = web::PathConfig::default().error_handler(|err, _req| {
        tracing::debug!("path rejected: {}", err);
        AppError::NotFound("Resource").into()
    });

    cfg.app_data(json_config)
        .app_data(query_config)
        .app_data(path_config)
        .service(
            web::scope("/api")
                .service(health::health_check)
                .configure(auth::auth_routes)
                .configure(users::user_routes)
                .configure(documents::document_routes)
                .configure(admin::admin_routes)
        )
        .service(uploads::serve_upload);
}
