//! Aggregates of the audit log for the admin dashboard.

use crate::models::{SubmissionRecord, SubmissionStatus};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub label: String,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub total: u64,
    /// Sends per day (`YYYY-MM-DD`), oldest first
    pub daily: Vec<CountEntry>,
    /// Most contacted communes first
    pub by_commune: Vec<CountEntry>,
    /// Most used categories first, keyed by category slug
    pub by_category: Vec<CountEntry>,
    pub by_status: Vec<CountEntry>,
}

pub fn compute_stats(records: &[SubmissionRecord]) -> LogStats {
    let mut daily: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_commune: HashMap<String, u64> = HashMap::new();
    let mut by_category: HashMap<String, u64> = HashMap::new();
    let mut by_status: HashMap<SubmissionStatus, u64> = HashMap::new();

    for record in records {
        *by_status.entry(record.status).or_default() += 1;

        if record.status != SubmissionStatus::Sent {
            continue;
        }
        *daily
            .entry(record.created_at.format("%Y-%m-%d").to_string())
            .or_default() += 1;

        let label = if record.commune_label.is_empty() {
            record.commune_slug.clone()
        } else {
            record.commune_label.clone()
        };
        *by_commune.entry(label).or_default() += 1;

        if !record.category_slug.is_empty() {
            *by_category.entry(record.category_slug.clone()).or_default() += 1;
        }
    }

    LogStats {
        total: records.len() as u64,
        daily: daily
            .into_iter()
            .map(|(label, total)| CountEntry { label, total })
            .collect(),
        by_commune: ranked(by_commune),
        by_category: ranked(by_category),
        by_status: [SubmissionStatus::Sent, SubmissionStatus::Error, SubmissionStatus::Blocked]
            .into_iter()
            .map(|status| CountEntry {
                label: status.to_string(),
                total: by_status.get(&status).copied().unwrap_or(0),
            })
            .collect(),
    }
}

/// Highest totals first, ties by label.
fn ranked(counts: HashMap<String, u64>) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(label, total)| CountEntry { label, total })
        .collect();
    entries.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.label.cmp(&b.label)));
    entries
}
