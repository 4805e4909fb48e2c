//! In-memory implementations of the storage ports, for tests.

use crate::models::{
    Commune, ForbiddenTerm, MessageTemplate, NewSubmissionRecord, SubmissionRecord,
};
use crate::traits::{AuditStore, Clock, CommuneRepo, ForbiddenWordRepo, TemplateRepo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Every registry plus the audit log, each behind its own lock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    communes: Mutex<Vec<Commune>>,
    templates: Mutex<Vec<MessageTemplate>>,
    forbidden: Mutex<Vec<ForbiddenTerm>>,
    records: Mutex<Vec<SubmissionRecord>>,
    next_id: Mutex<i64>,
}

impl InMemoryStore {
    pub fn put_commune(&self, commune: Commune) {
        let mut communes = self.communes.lock().unwrap();
        match communes.iter_mut().find(|c| c.slug == commune.slug) {
            Some(existing) => *existing = commune,
            None => communes.push(commune),
        }
    }

    pub fn put_template(&self, template: MessageTemplate) {
        let mut templates = self.templates.lock().unwrap();
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => templates.push(template),
        }
    }

    pub fn put_forbidden_words(&self, words: &[&str]) {
        let set = crate::moderation::ForbiddenWordSet::from_words(words);
        *self.forbidden.lock().unwrap() = set.terms().to_vec();
    }

    /// Records in insertion order.
    pub fn records(&self) -> Vec<SubmissionRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommuneRepo for InMemoryStore {
    async fn get_commune(&self, slug: &str) -> anyhow::Result<Option<Commune>> {
        Ok(self.communes.lock().unwrap().iter().find(|c| c.slug == slug).cloned())
    }

    async fn list_communes(&self) -> anyhow::Result<Vec<Commune>> {
        Ok(self.communes.lock().unwrap().clone())
    }

    async fn upsert_commune(&self, commune: Commune) -> anyhow::Result<()> {
        self.put_commune(commune);
        Ok(())
    }

    async fn delete_commune(&self, slug: &str) -> anyhow::Result<bool> {
        let mut communes = self.communes.lock().unwrap();
        let before = communes.len();
        communes.retain(|c| c.slug != slug);
        Ok(communes.len() != before)
    }
}

#[async_trait]
impl TemplateRepo for InMemoryStore {
    async fn list_templates(&self) -> anyhow::Result<Vec<MessageTemplate>> {
        Ok(self.templates.lock().unwrap().clone())
    }

    async fn upsert_template(&self, template: MessageTemplate) -> anyhow::Result<()> {
        self.put_template(template);
        Ok(())
    }

    async fn delete_template(&self, id: &str) -> anyhow::Result<bool> {
        let mut templates = self.templates.lock().unwrap();
        let before = templates.len();
        templates.retain(|t| t.id != id);
        Ok(templates.len() != before)
    }
}

#[async_trait]
impl ForbiddenWordRepo for InMemoryStore {
    async fn list_forbidden_terms(&self) -> anyhow::Result<Vec<ForbiddenTerm>> {
        Ok(self.forbidden.lock().unwrap().clone())
    }

    async fn replace_forbidden_terms(&self, terms: Vec<ForbiddenTerm>) -> anyhow::Result<()> {
        *self.forbidden.lock().unwrap() = terms;
        Ok(())
    }
}

#[async_trait]
impl AuditStore for InMemoryStore {
    async fn insert_record(&self, record: NewSubmissionRecord) -> anyhow::Result<i64> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let id = *next_id;
        self.records.lock().unwrap().push(SubmissionRecord {
            id,
            created_at: record.created_at,
            commune_slug: record.commune_slug,
            commune_label: record.commune_label,
            sender_email: record.sender_email,
            sender_ip: record.sender_ip,
            message: record.message,
            status: record.status,
            category_slug: record.category_slug,
        });
        Ok(id)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.created_at >= cutoff);
        Ok((before - records.len()) as u64)
    }

    async fn list_records(&self) -> anyhow::Result<Vec<SubmissionRecord>> {
        let mut records = self.records.lock().unwrap().clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}

/// A clock stuck at a given instant.
#[derive(Debug)]
pub struct FixedClock(pub Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}
