//! # mc-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `mc-core` domain models: the three registries (communes, templates,
//! forbidden words) and the submission audit log.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mc_core::models::{
    Commune, ForbiddenTerm, MessageTemplate, NewSubmissionRecord, SubmissionRecord, SubmissionStatus,
};
use mc_core::traits::{AuditStore, CommuneRepo, ForbiddenWordRepo, TemplateRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS communes (
        slug  TEXT PRIMARY KEY NOT NULL,
        label TEXT NOT NULL,
        email TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS templates (
        id       TEXT PRIMARY KEY NOT NULL,
        label    TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT '',
        content  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS forbidden_words (
        normalized TEXT PRIMARY KEY NOT NULL,
        original   TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS submission_logs (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        created_at    INTEGER NOT NULL,
        commune_slug  TEXT NOT NULL,
        commune_label TEXT NOT NULL,
        sender_email  TEXT NOT NULL,
        sender_ip     TEXT NOT NULL,
        message       TEXT NOT NULL,
        status        TEXT NOT NULL DEFAULT 'sent',
        category_slug TEXT NOT NULL DEFAULT ''
    )",
    "CREATE INDEX IF NOT EXISTS idx_logs_created_at ON submission_logs (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_logs_commune_slug ON submission_logs (commune_slug)",
    "CREATE INDEX IF NOT EXISTS idx_logs_status ON submission_logs (status)",
];

/// One pool serving every port. Registry listings follow insertion order
/// (rowid), which an upsert does not change.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects and creates the schema if needed.
    ///
    /// # Developer Note
    /// Every connection to `sqlite::memory:` opens its own empty database, so
    /// in-memory URLs are pinned to a single connection that never expires.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{url}'"))?
            .create_if_missing(true);

        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;
        log::info!("SQLite store ready at {url}");
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn millis_to_datetime(millis: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| anyhow!("timestamp out of range: {millis}"))
}

fn row_to_commune(row: &SqliteRow) -> Commune {
    Commune {
        slug: row.get("slug"),
        label: row.get("label"),
        email: row.get("email"),
    }
}

fn row_to_template(row: &SqliteRow) -> MessageTemplate {
    MessageTemplate {
        id: row.get("id"),
        label: row.get("label"),
        category: row.get("category"),
        content: row.get("content"),
    }
}

fn row_to_record(row: &SqliteRow) -> anyhow::Result<SubmissionRecord> {
    Ok(SubmissionRecord {
        id: row.get("id"),
        created_at: millis_to_datetime(row.get("created_at"))?,
        commune_slug: row.get("commune_slug"),
        commune_label: row.get("commune_label"),
        sender_email: row.get("sender_email"),
        sender_ip: row.get("sender_ip"),
        message: row.get("message"),
        status: row
            .get::<String, _>("status")
            .parse::<SubmissionStatus>()
            .map_err(anyhow::Error::msg)?,
        category_slug: row.get("category_slug"),
    })
}

#[async_trait]
impl CommuneRepo for SqliteStore {
    async fn get_commune(&self, slug: &str) -> anyhow::Result<Option<Commune>> {
        let row = sqlx::query("SELECT slug, label, email FROM communes WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_commune))
    }

    async fn list_communes(&self) -> anyhow::Result<Vec<Commune>> {
        let rows = sqlx::query("SELECT slug, label, email FROM communes ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_commune).collect())
    }

    async fn upsert_commune(&self, commune: Commune) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO communes (slug, label, email) VALUES (?, ?, ?)
             ON CONFLICT(slug) DO UPDATE SET label = excluded.label, email = excluded.email",
        )
        .bind(commune.slug)
        .bind(commune.label)
        .bind(commune.email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_commune(&self, slug: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM communes WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TemplateRepo for SqliteStore {
    async fn list_templates(&self) -> anyhow::Result<Vec<MessageTemplate>> {
        let rows = sqlx::query("SELECT id, label, category, content FROM templates ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_template).collect())
    }

    async fn upsert_template(&self, template: MessageTemplate) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO templates (id, label, category, content) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET label = excluded.label,
                 category = excluded.category, content = excluded.content",
        )
        .bind(template.id)
        .bind(template.label)
        .bind(template.category)
        .bind(template.content)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_template(&self, id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM templates WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ForbiddenWordRepo for SqliteStore {
    async fn list_forbidden_terms(&self) -> anyhow::Result<Vec<ForbiddenTerm>> {
        let rows = sqlx::query("SELECT normalized, original FROM forbidden_words ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| ForbiddenTerm {
                normalized: row.get("normalized"),
                original: row.get("original"),
            })
            .collect())
    }

    /// Atomic replace, so readers never observe a half-written list.
    async fn replace_forbidden_terms(&self, terms: Vec<ForbiddenTerm>) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM forbidden_words").execute(&mut *tx).await?;
        for term in terms {
            sqlx::query("INSERT OR IGNORE INTO forbidden_words (normalized, original) VALUES (?, ?)")
                .bind(term.normalized)
                .bind(term.original)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl AuditStore for SqliteStore {
    async fn insert_record(&self, record: NewSubmissionRecord) -> anyhow::Result<i64> {
        let result = sqlx::query(
            "INSERT INTO submission_logs
                (created_at, commune_slug, commune_label, sender_email, sender_ip, message, status, category_slug)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.created_at.timestamp_millis())
        .bind(record.commune_slug)
        .bind(record.commune_label)
        .bind(record.sender_email)
        .bind(record.sender_ip)
        .bind(record.message)
        .bind(record.status.as_str())
        .bind(record.category_slug)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM submission_logs WHERE created_at < ?")
            .bind(cutoff.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_records(&self) -> anyhow::Result<Vec<SubmissionRecord>> {
        let rows = sqlx::query("SELECT * FROM submission_logs ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_record).collect()
    }
}
