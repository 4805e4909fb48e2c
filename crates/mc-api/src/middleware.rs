//! mairie-contact/crates/mc-api/src/middleware.rs Middleware
//!
//! Request logging and cross-origin policy.

use actix_cors::Cors;
use actix_web::middleware::Logger;

/// Access log line per request:
/// remote-ip "request-line" status-code response-size "referrer" "user-agent" duration
pub fn standard_middleware() -> Logger {
    Logger::new(r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#)
}

/// The contact page may be embedded on the municipality's own site, so the
/// public endpoints accept any origin. Admin calls carry a custom header and
/// are only allowed same-origin.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_header(actix_web::http::header::CONTENT_TYPE)
        .max_age(3600)
}
