//! # mc-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core
//! services: the public contact page, its bootstrap data and the
//! submission endpoint.

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use mc_core::admin::AdminService;
use mc_core::audit::AuditLogger;
use mc_core::catalog::{index_by_category, TemplateView};
use mc_core::error::AppError;
use mc_core::models::{Category, CommuneOption, RawSubmission};
use mc_core::pipeline::SubmissionPipeline;
use mc_core::registry::CommuneRegistry;
use mc_core::traits::{AuditStore, AuthProvider, Clock, CommuneRepo, ForbiddenWordRepo, MailTransport, TemplateRepo};
use mc_ui::{script_safe, ContactTemplate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const INVALID_NONCE_MESSAGE: &str = "Invalid request token.";
const UNAVAILABLE_IP: &str = "N/A";
const PAGE_TITLE: &str = "Contact your town hall";

/// State shared across all Actix-web workers.
pub struct AppState {
    pub pipeline: SubmissionPipeline,
    pub admin: AdminService,
    pub registry: CommuneRegistry,
    pub templates: Arc<dyn TemplateRepo>,
    pub auth: Box<dyn AuthProvider>,
    /// Submission URL handed to the page (`ajax_url`)
    pub public_url: String,
}

impl AppState {
    /// Wires the core services around one storage backend that serves
    /// every registry and the audit log.
    pub fn new<S>(
        store: Arc<S>,
        transport: Arc<dyn MailTransport>,
        auth: Box<dyn AuthProvider>,
        clock: Arc<dyn Clock>,
        public_url: impl Into<String>,
    ) -> Self
    where
        S: CommuneRepo + TemplateRepo + ForbiddenWordRepo + AuditStore + 'static,
    {
        let communes: Arc<dyn CommuneRepo> = store.clone();
        let templates: Arc<dyn TemplateRepo> = store.clone();
        let forbidden: Arc<dyn ForbiddenWordRepo> = store.clone();
        let audit_store: Arc<dyn AuditStore> = store;

        let registry = CommuneRegistry::new(communes.clone());
        let pipeline = SubmissionPipeline::new(
            registry.clone(),
            forbidden.clone(),
            transport,
            AuditLogger::new(audit_store.clone(), clock),
        );
        let admin = AdminService::new(communes, templates.clone(), forbidden, audit_store);

        Self {
            pipeline,
            admin,
            registry,
            templates,
            auth,
            public_url: public_url.into(),
        }
    }
}

/// JSON envelope of the submission endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResponse {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, error: Some(message.into()) }
    }
}

/// Form fields posted by the contact page.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendForm {
    pub nonce: String,
    pub commune: String,
    pub email: String,
    pub message: String,
    pub category: Option<String>,
    pub category_label: Option<String>,
}

impl From<SendForm> for RawSubmission {
    fn from(form: SendForm) -> Self {
        RawSubmission {
            commune: form.commune,
            email: form.email,
            message: form.message,
            category: form.category,
            category_label: form.category_label,
        }
    }
}

/// Everything the page needs to drive the cascading selects.
#[derive(Debug, Serialize)]
pub struct Bootstrap {
    pub communes: Vec<CommuneOption>,
    pub templates: Vec<TemplateView>,
    pub categories: Vec<Category>,
    pub ajax_url: String,
    pub nonce: String,
}

async fn load_bootstrap(state: &AppState) -> Result<Bootstrap, AppError> {
    let communes = state.registry.list_for_client().await?;
    let templates = state.templates.list_templates().await?;
    let index = index_by_category(&templates);

    Ok(Bootstrap {
        communes,
        templates: templates.iter().filter(|t| !t.id.is_empty()).map(TemplateView::from).collect(),
        categories: index.categories,
        ajax_url: state.public_url.clone(),
        nonce: state.auth.issue_nonce(),
    })
}

/// Maps an `AppError` to a JSON error response.
pub fn error_response(err: &AppError) -> HttpResponse {
    let body = SendResponse::failure(err.to_string());
    match err {
        AppError::NotFound(..) => HttpResponse::NotFound().json(body),
        AppError::ValidationError(_) | AppError::Import(_) => HttpResponse::BadRequest().json(body),
        AppError::Unauthorized(_) => HttpResponse::Unauthorized().json(body),
        AppError::Internal(msg) => {
            log::error!("Internal error: {msg}");
            HttpResponse::InternalServerError().json(SendResponse::failure("Internal server error."))
        }
    }
}

/// Handles `POST /contact/send`.
///
/// The nonce is checked before anything else; a bad token never reaches the
/// pipeline and is not audited.
pub async fn send_message(
    data: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<SendForm>,
) -> impl Responder {
    let form = form.into_inner();

    if !data.auth.verify_nonce(&form.nonce) {
        log::warn!("Rejected submission with an invalid nonce");
        return HttpResponse::Forbidden().json(SendResponse::failure(INVALID_NONCE_MESSAGE));
    }

    let sender_ip = req
        .peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNAVAILABLE_IP.to_string());

    match data.pipeline.submit(&form.into(), &sender_ip).await {
        Ok(_) => HttpResponse::Ok().json(SendResponse::ok()),
        Err(err) => HttpResponse::Ok().json(SendResponse::failure(err.user_message())),
    }
}

/// Handles `GET /contact/bootstrap`.
pub async fn bootstrap(data: web::Data<AppState>) -> impl Responder {
    match load_bootstrap(&data).await {
        Ok(payload) => HttpResponse::Ok().json(payload),
        Err(e) => error_response(&e),
    }
}

/// Renders the contact page for "/".
pub async fn contact_page(data: web::Data<AppState>) -> impl Responder {
    let payload = match load_bootstrap(&data).await {
        Ok(payload) => payload,
        Err(e) => return error_response(&e),
    };

    let json = match serde_json::to_string(&payload) {
        Ok(json) => json,
        Err(e) => return error_response(&AppError::Internal(e.to_string())),
    };

    let rendered = ContactTemplate {
        title: PAGE_TITLE,
        communes: &payload.communes,
        categories: &payload.categories,
        ajax_url: &payload.ajax_url,
        nonce: &payload.nonce,
        bootstrap_json: script_safe(&json),
    }
    .render();

    match rendered {
        Ok(html) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html),
        Err(e) => error_response(&AppError::Internal(format!("template rendering failed: {e}"))),
    }
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
