//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! The pipeline and the admin service only ever see these interfaces.

use crate::models::{
    Commune, ForbiddenTerm, MessageTemplate, NewSubmissionRecord, OutgoingMail, SubmissionRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Key-value registry of communes, keyed by slug.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CommuneRepo: Send + Sync {
    async fn get_commune(&self, slug: &str) -> anyhow::Result<Option<Commune>>;
    /// Communes in registration order.
    async fn list_communes(&self) -> anyhow::Result<Vec<Commune>>;
    /// Insert or update by slug; an update keeps the original position.
    async fn upsert_commune(&self, commune: Commune) -> anyhow::Result<()>;
    /// Returns false when no commune had this slug.
    async fn delete_commune(&self, slug: &str) -> anyhow::Result<bool>;
}

/// Key-value registry of message templates, keyed by id.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait TemplateRepo: Send + Sync {
    async fn list_templates(&self) -> anyhow::Result<Vec<MessageTemplate>>;
    async fn upsert_template(&self, template: MessageTemplate) -> anyhow::Result<()>;
    async fn delete_template(&self, id: &str) -> anyhow::Result<bool>;
}

/// Ordered forbidden-word list.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ForbiddenWordRepo: Send + Sync {
    async fn list_forbidden_terms(&self) -> anyhow::Result<Vec<ForbiddenTerm>>;
    /// Replaces the stored list wholesale.
    async fn replace_forbidden_terms(&self, terms: Vec<ForbiddenTerm>) -> anyhow::Result<()>;
}

/// Append-only relational store of submission outcomes.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Appends a record and returns its auto-incremented id.
    async fn insert_record(&self, record: NewSubmissionRecord) -> anyhow::Result<i64>;
    /// Deletes every record strictly older than `cutoff`; returns the count.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64>;
    /// All records, newest first.
    async fn list_records(&self) -> anyhow::Result<Vec<SubmissionRecord>>;
}

/// Outbound email delivery. No retry is expected from implementations.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()>;
}

/// Request nonce and admin credential checks.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Issues a nonce for the public form
    fn issue_nonce(&self) -> String;

    /// Accepts nonces issued during the current or previous time bucket
    fn verify_nonce(&self, nonce: &str) -> bool;

    /// Verifies an admin password against the configured hash
    async fn verify_admin_password(&self, password: &str) -> bool;
}

/// Source of the current time, injected so retention can be tested.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
