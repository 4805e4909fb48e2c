//! # mc-auth-simple
//!
//! HMAC-SHA-256 / Argon2 implementation of `AuthProvider`.
//! Issues the anti-forgery nonce embedded in the contact form and checks the
//! admin password against a stored Argon2 hash.

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use mc_core::traits::AuthProvider;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const NONCE_ACTION: &str = "mairie_contact_send";
const NONCE_LEN: usize = 20;

pub struct SimpleAuthProvider {
    /// Server secret mixed into every nonce
    secret: String,
    /// Width of one nonce bucket; a nonce stays valid for two buckets
    tick_secs: i64,
    /// PHC string of the admin password, `None` disables the admin surface
    admin_hash: Option<String>,
}

impl SimpleAuthProvider {
    /// `lifetime_secs` is the maximum age of a nonce.
    pub fn new(secret: &str, lifetime_secs: u64, admin_hash: Option<String>) -> Self {
        let tick_secs = ((lifetime_secs / 2).max(1)).min(i64::MAX as u64) as i64;
        Self {
            secret: secret.to_string(),
            tick_secs,
            admin_hash: admin_hash.filter(|h| !h.trim().is_empty()),
        }
    }

    fn tick(&self, at: DateTime<Utc>) -> i64 {
        at.timestamp().div_euclid(self.tick_secs)
    }

    fn mac_for_tick(&self, tick: i64) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(NONCE_ACTION.as_bytes());
        mac.update(b"|");
        mac.update(tick.to_string().as_bytes());
        mac
    }

    pub fn issue_nonce_at(&self, at: DateTime<Utc>) -> String {
        let tag = self.mac_for_tick(self.tick(at)).finalize().into_bytes();
        hex::encode(tag)[..NONCE_LEN].to_string()
    }

    /// Accepts nonces from the current or the previous tick. The tag is
    /// compared in constant time.
    pub fn verify_nonce_at(&self, nonce: &str, at: DateTime<Utc>) -> bool {
        let nonce = nonce.trim();
        if nonce.len() != NONCE_LEN {
            return false;
        }
        let Ok(tag) = hex::decode(nonce) else {
            return false;
        };
        let tick = self.tick(at);
        [tick, tick - 1]
            .into_iter()
            .any(|t| self.mac_for_tick(t).verify_truncated_left(&tag).is_ok())
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    fn issue_nonce(&self) -> String {
        self.issue_nonce_at(Utc::now())
    }

    fn verify_nonce(&self, nonce: &str) -> bool {
        self.verify_nonce_at(nonce, Utc::now())
    }

    /// Verifies the provided password against the configured Argon2 hash.
    async fn verify_admin_password(&self, password: &str) -> bool {
        let Some(hash) = self.admin_hash.as_deref() else {
            return false;
        };
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                log::error!("Configured admin password hash is unreadable: {e}");
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
