//! Audit logging of submission outcomes.
//!
//! Pruning is opportunistic: it runs after every append, never on a timer,
//! so stale records survive until the next write.

use crate::models::{NewSubmissionRecord, SubmissionRecord};
use crate::traits::{AuditStore, Clock};
use chrono::{DateTime, Duration, Utc};
use log::warn;
use std::sync::Arc;

/// How long a record is kept.
pub fn default_retention() -> Duration {
    Duration::days(365)
}

#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn AuditStore>,
    clock: Arc<dyn Clock>,
    retention: Duration,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn AuditStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            retention: default_retention(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Appends the record, then deletes everything older than the
    /// retention horizon. A failed prune does not fail the append.
    pub async fn record(&self, entry: NewSubmissionRecord) -> anyhow::Result<i64> {
        let id = self.store.insert_record(entry).await?;

        let cutoff = self.clock.now() - self.retention;
        if let Err(e) = self.store.delete_older_than(cutoff).await {
            warn!("Audit log pruning failed: {e:#}");
        }

        Ok(id)
    }

    /// All records, newest first.
    pub async fn records(&self) -> anyhow::Result<Vec<SubmissionRecord>> {
        self.store.list_records().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FixedClock, InMemoryStore};
    use crate::models::SubmissionStatus;
    use crate::traits::MockAuditStore;
    use chrono::TimeZone;

    fn entry(at: DateTime<Utc>, slug: &str) -> NewSubmissionRecord {
        NewSubmissionRecord {
            created_at: at,
            commune_slug: slug.into(),
            commune_label: String::new(),
            sender_email: "a@b.com".into(),
            sender_ip: "127.0.0.1".into(),
            message: "Bonjour".into(),
            status: SubmissionStatus::Sent,
            category_slug: String::new(),
        }
    }

    #[tokio::test]
    async fn prunes_past_the_retention_horizon_on_write() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let store = Arc::new(InMemoryStore::default());
        let logger = AuditLogger::new(store.clone(), Arc::new(FixedClock::at(now)));

        let horizon = now - default_retention();
        store.insert_record(entry(horizon - Duration::seconds(1), "stale")).await.unwrap();
        store.insert_record(entry(horizon + Duration::seconds(1), "fresh")).await.unwrap();

        logger.record(entry(now, "new")).await.unwrap();

        let slugs: Vec<_> = logger
            .records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.commune_slug)
            .collect();
        assert_eq!(slugs, vec!["new", "fresh"]);
    }

    #[tokio::test]
    async fn ids_increase_with_each_append() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let logger = AuditLogger::new(Arc::new(InMemoryStore::default()), Arc::new(FixedClock::at(now)));

        let first = logger.record(entry(now, "a")).await.unwrap();
        let second = logger.record(entry(now, "b")).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn prune_failure_does_not_fail_the_append() {
        let mut store = MockAuditStore::new();
        store.expect_insert_record().times(1).returning(|_| Ok(7));
        store
            .expect_delete_older_than()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("disk full")));

        let logger = AuditLogger::new(Arc::new(store), Arc::new(crate::traits::SystemClock));
        assert_eq!(logger.record(entry(Utc::now(), "x")).await.unwrap(), 7);
    }
}
