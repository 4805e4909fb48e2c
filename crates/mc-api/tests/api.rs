use actix_web::{test, web, App};
use mc_api::admin::ADMIN_PASSWORD_HEADER;
use mc_api::configure_routes;
use mc_api::handlers::{AppState, INVALID_NONCE_MESSAGE};
use mc_core::models::{Commune, ForbiddenTerm, MessageTemplate, SubmissionStatus};
use mc_core::traits::{AuditStore, CommuneRepo, ForbiddenWordRepo, MockAuthProvider, MockMailTransport, SystemClock, TemplateRepo};
use mc_db_sqlite::SqliteStore;
use serde_json::Value;
use std::sync::Arc;

const NONCE: &str = "0123456789abcdef0123";
const ADMIN_PASSWORD: &str = "correct horse";

fn auth() -> MockAuthProvider {
    let mut auth = MockAuthProvider::new();
    auth.expect_issue_nonce().returning(|| NONCE.to_string());
    auth.expect_verify_nonce().returning(|nonce| nonce == NONCE);
    auth.expect_verify_admin_password()
        .returning(|password| password == ADMIN_PASSWORD);
    auth
}

async fn seeded_store() -> Arc<SqliteStore> {
    let store = Arc::new(SqliteStore::new("sqlite::memory:").await.unwrap());
    store
        .upsert_commune(Commune {
            slug: "lyon".into(),
            label: "Lyon".into(),
            email: "mairie-lyon@example.com".into(),
        })
        .await
        .unwrap();
    store
        .upsert_template(MessageTemplate {
            id: "voirie-1".into(),
            label: "Nid de poule".into(),
            category: "Voirie".into(),
            content: "Bonjour, un nid de poule est apparu rue Centrale.".into(),
        })
        .await
        .unwrap();
    store
}

fn state(store: Arc<SqliteStore>, transport: MockMailTransport) -> web::Data<AppState> {
    web::Data::new(AppState::new(
        store,
        Arc::new(transport),
        Box::new(auth()),
        Arc::new(SystemClock),
        "/contact/send",
    ))
}

fn delivering(times: usize) -> MockMailTransport {
    let mut transport = MockMailTransport::new();
    transport.expect_send().times(times).returning(|_| Ok(()));
    transport
}

fn submission<'a>(nonce: &'a str, email: &'a str, message: &'a str) -> Vec<(&'static str, &'a str)> {
    vec![
        ("nonce", nonce),
        ("commune", "lyon"),
        ("email", email),
        ("message", message),
    ]
}

#[actix_web::test]
async fn sends_valid_submission_and_logs_it() {
    let store = seeded_store().await;
    let mut transport = MockMailTransport::new();
    transport
        .expect_send()
        .withf(|mail| mail.to == "mairie-lyon@example.com" && mail.body.contains("Sender IP: 10.0.0.7"))
        .times(1)
        .returning(|_| Ok(()));
    let app = test::init_service(App::new().app_data(state(store.clone(), transport)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/contact/send")
        .peer_addr("10.0.0.7:4242".parse().unwrap())
        .set_form(submission(NONCE, "a@b.com", "Bonjour"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, serde_json::json!({ "success": true }));
    let records = store.list_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, SubmissionStatus::Sent);
    assert_eq!(records[0].commune_label, "Lyon");
    assert_eq!(records[0].sender_ip, "10.0.0.7");
}

#[actix_web::test]
async fn blocked_message_gets_generic_error() {
    let store = seeded_store().await;
    store
        .replace_forbidden_terms(vec![ForbiddenTerm {
            original: "Interdit".into(),
            normalized: "interdit".into(),
        }])
        .await
        .unwrap();
    let app = test::init_service(App::new().app_data(state(store.clone(), delivering(0))).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/contact/send")
        .set_form(submission(NONCE, "a@b.com", "Ceci contient un mot INTERDIT"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Your message contains a disallowed term. Please rephrase it.");
    let records = store.list_records().await.unwrap();
    assert_eq!(records[0].status, SubmissionStatus::Blocked);
    assert_eq!(records[0].sender_ip, "N/A");
}

#[actix_web::test]
async fn missing_email_is_rejected_and_logged() {
    let store = seeded_store().await;
    let app = test::init_service(App::new().app_data(state(store.clone(), delivering(0))).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/contact/send")
        .set_form(submission(NONCE, "", "Bonjour"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Please enter your email address."));
    let records = store.list_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, SubmissionStatus::Error);
    assert_eq!(records[0].commune_label, "");
}

#[actix_web::test]
async fn invalid_nonce_short_circuits_without_audit() {
    let store = seeded_store().await;
    let app = test::init_service(App::new().app_data(state(store.clone(), delivering(0))).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/contact/send")
        .set_form(submission("forged", "a@b.com", "Bonjour"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], INVALID_NONCE_MESSAGE);
    assert!(store.list_records().await.unwrap().is_empty());
}

#[actix_web::test]
async fn bootstrap_exposes_selectors_and_nonce() {
    let store = seeded_store().await;
    let app = test::init_service(App::new().app_data(state(store, delivering(0))).configure(configure_routes)).await;

    let req = test::TestRequest::get().uri("/contact/bootstrap").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["communes"][0]["slug"], "lyon");
    assert_eq!(body["categories"][0]["slug"], "voirie");
    assert_eq!(body["templates"][0]["category_slug"], "voirie");
    assert_eq!(body["ajax_url"], "/contact/send");
    assert_eq!(body["nonce"], NONCE);
}

#[actix_web::test]
async fn contact_page_renders() {
    let store = seeded_store().await;
    let app = test::init_service(App::new().app_data(state(store, delivering(0))).configure(configure_routes)).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains(r#"<option value="lyon">Lyon</option>"#));
    assert!(html.contains(NONCE));
}

#[actix_web::test]
async fn admin_routes_require_password() {
    let store = seeded_store().await;
    let app = test::init_service(App::new().app_data(state(store, delivering(0))).configure(configure_routes)).await;

    let req = test::TestRequest::get().uri("/admin/stats").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get()
        .uri("/admin/stats")
        .insert_header((ADMIN_PASSWORD_HEADER, "wrong"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);
}

#[actix_web::test]
async fn admin_commands_and_exports() {
    let store = seeded_store().await;
    let app = test::init_service(App::new().app_data(state(store.clone(), delivering(0))).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/admin/commands")
        .insert_header((ADMIN_PASSWORD_HEADER, ADMIN_PASSWORD))
        .set_json(serde_json::json!({
            "command": "import_communes",
            "csv": "Nom;Email\nVilleurbanne;mairie@villeurbanne.fr\nBron;pas-un-email\n",
        }))
        .to_request();
    let notice: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(notice["kind"], "updated");
    assert_eq!(notice["message"], "1 communes imported.");
    assert!(store.get_commune("villeurbanne").await.unwrap().is_some());

    let req = test::TestRequest::get()
        .uri("/admin/export/communes")
        .insert_header((ADMIN_PASSWORD_HEADER, ADMIN_PASSWORD))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let csv = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(csv.starts_with("Nom;Email"));
    assert!(csv.contains("Villeurbanne;mairie@villeurbanne.fr"));

    let req = test::TestRequest::get()
        .uri("/admin/export/unknown")
        .insert_header((ADMIN_PASSWORD_HEADER, ADMIN_PASSWORD))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn stats_count_sent_messages() {
    let store = seeded_store().await;
    let app = test::init_service(App::new().app_data(state(store, delivering(1))).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/contact/send")
        .set_form(submission(NONCE, "a@b.com", "Bonjour"))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/admin/stats")
        .insert_header((ADMIN_PASSWORD_HEADER, ADMIN_PASSWORD))
        .to_request();
    let stats: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["by_commune"][0]["label"], "Lyon");
    assert_eq!(stats["by_status"][0], serde_json::json!({ "label": "sent", "total": 1 }));
}

#[actix_web::test]
async fn health_reports_version() {
    let store = seeded_store().await;
    let app = test::init_service(App::new().app_data(state(store, delivering(0))).configure(configure_routes)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}
