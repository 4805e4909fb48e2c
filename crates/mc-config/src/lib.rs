//! mairie-contact/crates/mc-config/src/lib.rs
//!
//! Typed runtime settings. Sources, lowest precedence first: built-in
//! defaults, an optional TOML file, then `MAIRIE_CONTACT__*` environment
//! variables (`__` separates nested keys, e.g. `MAIRIE_CONTACT__MAIL__HOST`).

use config::{Config, Environment, File, Map};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "MAIRIE_CONTACT";
pub const CONFIG_PATH_VAR: &str = "MAIRIE_CONTACT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "mairie-contact.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub mail: MailSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Submission URL handed to the contact page
    pub public_url: String,
    /// Overrides the bundled `/static` asset directory
    #[serde(default)]
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct MailSettings {
    #[serde(default)]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    pub from: String,
    pub starttls: bool,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub nonce_secret: Option<SecretString>,
    pub nonce_lifetime_secs: u64,
    /// Argon2 PHC string; the admin endpoints refuse every request without it
    #[serde(default)]
    pub admin_password_hash: Option<SecretString>,
}

impl Settings {
    /// Loads `.env`, the config file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Ignoring unreadable .env file: {e}");
            }
        }
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_sources(Some(&path), None)
    }

    /// `env` replaces the process environment when given.
    pub fn from_sources(file: Option<&str>, env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.public_url", "/contact/send")?
            .set_default("database.url", "sqlite:mairie_contact.db")?
            .set_default("mail.port", 587)?
            .set_default("mail.from", "no-reply@localhost")?
            .set_default("mail.starttls", true)?
            .set_default("auth.nonce_lifetime_secs", 86_400)?;

        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.mail.host.trim().is_empty() {
            return Err(ConfigError::Missing("mail.host"));
        }
        match &self.auth.nonce_secret {
            Some(secret) if !secret.expose_secret().is_empty() => {}
            _ => return Err(ConfigError::Missing("auth.nonce_secret")),
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("MAIRIE_CONTACT__MAIL__HOST", "smtp.example.org"),
        ("MAIRIE_CONTACT__AUTH__NONCE_SECRET", "s3cret"),
    ];

    #[test]
    fn defaults_fill_everything_optional() {
        let settings = Settings::from_sources(None, env(REQUIRED)).unwrap();

        assert_eq!(settings.bind_address(), ("127.0.0.1".to_string(), 8080));
        assert_eq!(settings.server.public_url, "/contact/send");
        assert_eq!(settings.database.url, "sqlite:mairie_contact.db");
        assert_eq!(settings.mail.port, 587);
        assert!(settings.mail.starttls);
        assert_eq!(settings.auth.nonce_lifetime_secs, 86_400);
        assert!(settings.auth.admin_password_hash.is_none());
        assert_eq!(settings.mail.host, "smtp.example.org");
    }

    #[test]
    fn environment_overrides_nested_keys() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MAIRIE_CONTACT__SERVER__PORT", "9000"));
        pairs.push(("MAIRIE_CONTACT__MAIL__PASSWORD", "pw"));
        let settings = Settings::from_sources(None, env(&pairs)).unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.mail.password.as_ref().map(|p| p.expose_secret()), Some("pw"));
    }

    #[test]
    fn missing_required_keys_are_reported() {
        let err = Settings::from_sources(None, env(&[("MAIRIE_CONTACT__MAIL__HOST", "smtp")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("auth.nonce_secret")));

        let err = Settings::from_sources(None, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("mail.host")));
    }
}
