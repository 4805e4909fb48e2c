//! # mc-api
//!
//! The web routing and orchestration layer for Mairie-Contact.

pub mod admin;
pub mod handlers;
pub mod middleware;

use actix_web::{error::InternalError, web, HttpResponse};

/// Configures the public and admin routes.
///
/// # Developer Note
/// Mounted as a `configure` callback so the binary and the integration tests
/// build the exact same route table.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(|err, _req| {
        let body = handlers::SendResponse::failure("Invalid request.");
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    }))
    .route("/", web::get().to(handlers::contact_page))
    .route("/health", web::get().to(handlers::health))
    .service(
        web::scope("/contact")
            .route("/bootstrap", web::get().to(handlers::bootstrap))
            .route("/send", web::post().to(handlers::send_message)),
    )
    .service(
        web::scope("/admin")
            .route("/commands", web::post().to(admin::run_command))
            .route("/export/{kind}", web::get().to(admin::export))
            .route("/stats", web::get().to(admin::stats)),
    );
}
