//! # Mairie-Contact Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use mc_api::{configure_routes, handlers::AppState, middleware};
use mc_config::Settings;
use mc_core::traits::SystemClock;
use secrecy::ExposeSecret;
use std::io;
use std::sync::Arc;

#[cfg(not(all(feature = "db-sqlite", feature = "mail-smtp", feature = "auth-simple")))]
compile_error!("mairie-contact needs the db-sqlite, mail-smtp and auth-simple features");

#[cfg(feature = "db-sqlite")]
use mc_db_sqlite::SqliteStore;

#[cfg(feature = "mail-smtp")]
use mc_mail_smtp::{SmtpMailTransport, SmtpSettings};

#[cfg(feature = "auth-simple")]
use mc_auth_simple::SimpleAuthProvider;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().map_err(io::Error::other)?;

    // 1. Storage: registries and audit log share one database
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(SqliteStore::new(&settings.database.url).await.map_err(io::Error::other)?);

    // 2. Outbound mail
    #[cfg(feature = "mail-smtp")]
    let transport = SmtpMailTransport::new(SmtpSettings {
        host: settings.mail.host.clone(),
        port: settings.mail.port,
        username: settings.mail.username.clone(),
        password: settings.mail.password.as_ref().map(|p| p.expose_secret().to_string()),
        from: settings.mail.from.clone(),
        starttls: settings.mail.starttls,
    })
    .map_err(io::Error::other)?;

    // 3. Nonces and admin password
    #[cfg(feature = "auth-simple")]
    let auth = SimpleAuthProvider::new(
        settings
            .auth
            .nonce_secret
            .as_ref()
            .map(|s| s.expose_secret())
            .unwrap_or_default(),
        settings.auth.nonce_lifetime_secs,
        settings
            .auth
            .admin_password_hash
            .as_ref()
            .map(|h| h.expose_secret().to_string()),
    );
    if settings.auth.admin_password_hash.is_none() {
        log::warn!("No admin password hash configured; admin endpoints are disabled");
    }

    let state = web::Data::new(AppState::new(
        store,
        Arc::new(transport),
        Box::new(auth),
        Arc::new(SystemClock),
        settings.server.public_url.clone(),
    ));

    let static_dir = settings
        .server
        .static_dir
        .clone()
        .unwrap_or_else(|| mc_ui::STATIC_DIR.to_string());
    let (host, port) = settings.bind_address();

    log::info!("Mairie-Contact starting on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::cors_policy())
            .wrap(middleware::standard_middleware())
            .app_data(state.clone())
            .service(Files::new("/static", static_dir.clone()))
            .configure(configure_routes)
    })
    .bind((host, port))?
    .run()
    .await
}
