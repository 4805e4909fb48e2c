//! Admin endpoints. Every request must carry the admin password in the
//! `X-Admin-Password` header.

use crate::handlers::{error_response, AppState, SendResponse};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use mc_core::admin::{AdminCommand, ExportKind};

pub const ADMIN_PASSWORD_HEADER: &str = "X-Admin-Password";

async fn authorize(data: &AppState, req: &HttpRequest) -> Result<(), HttpResponse> {
    let password = req
        .headers()
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !password.is_empty() && data.auth.verify_admin_password(password).await {
        return Ok(());
    }
    log::warn!("Refused admin request to {}", req.path());
    Err(HttpResponse::Unauthorized().json(SendResponse::failure("Unauthorized.")))
}

/// Handles `POST /admin/commands`.
pub async fn run_command(
    data: web::Data<AppState>,
    req: HttpRequest,
    command: web::Json<AdminCommand>,
) -> impl Responder {
    if let Err(denied) = authorize(&data, &req).await {
        return denied;
    }

    match data.admin.execute(command.into_inner()).await {
        Ok(notice) => HttpResponse::Ok().json(notice),
        Err(e) => error_response(&e),
    }
}

/// Handles `GET /admin/export/{kind}`: a `;`-separated CSV attachment.
pub async fn export(data: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> impl Responder {
    if let Err(denied) = authorize(&data, &req).await {
        return denied;
    }

    let kind: ExportKind = match path.into_inner().parse() {
        Ok(kind) => kind,
        Err(e) => return error_response(&e),
    };

    match data.admin.export(kind).await {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(kind.file_name().to_string())],
            })
            .body(csv),
        Err(e) => error_response(&e),
    }
}

/// Handles `GET /admin/stats`.
pub async fn stats(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(denied) = authorize(&data, &req).await {
        return denied;
    }

    match data.admin.stats().await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => error_response(&e),
    }
}
