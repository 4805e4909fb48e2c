//! # Domain Models
//!
//! These structs represent the core entities of the contact service:
//! the commune registry, the message templates, the forbidden-word list
//! and the audit trail of submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A municipality that can receive messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commune {
    /// URL-safe identifier (e.g., "saint-emilion")
    pub slug: String,
    pub label: String,
    /// Destination address of the town hall
    pub email: String,
}

impl Commune {
    /// Display name, falling back to the capitalised slug when no label is stored.
    pub fn display_label(&self) -> String {
        if self.label.trim().is_empty() {
            capitalize(&self.slug)
        } else {
            self.label.clone()
        }
    }
}

/// Entry of the front-end commune selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommuneOption {
    pub slug: String,
    pub label: String,
}

/// An admin-curated, pre-written message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: String,
    pub label: String,
    /// May be empty; uncategorised templates are hidden from the cascade.
    #[serde(default)]
    pub category: String,
    /// Rich text body used to prefill the message field
    pub content: String,
}

/// A forbidden word, keyed by its normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenTerm {
    pub original: String,
    pub normalized: String,
}

/// Derived grouping of templates, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub label: String,
}

/// Terminal status stored on every audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Sent,
    Error,
    Blocked,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Sent => "sent",
            SubmissionStatus::Error => "error",
            SubmissionStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(SubmissionStatus::Sent),
            "error" => Ok(SubmissionStatus::Error),
            "blocked" => Ok(SubmissionStatus::Blocked),
            other => Err(format!("unknown submission status '{other}'")),
        }
    }
}

/// An audit record before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubmissionRecord {
    pub created_at: DateTime<Utc>,
    pub commune_slug: String,
    pub commune_label: String,
    pub sender_email: String,
    pub sender_ip: String,
    pub message: String,
    pub status: SubmissionStatus,
    /// Slug of the chosen category, empty when none
    #[serde(default)]
    pub category_slug: String,
}

/// One immutable audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Auto-incremented by the audit store
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub commune_slug: String,
    pub commune_label: String,
    pub sender_email: String,
    pub sender_ip: String,
    pub message: String,
    pub status: SubmissionStatus,
    /// Slug of the chosen category, empty when none
    #[serde(default)]
    pub category_slug: String,
}

/// Raw fields of a public submission, as received at the server boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub commune: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Informational only, never used for routing or moderation
    #[serde(default)]
    pub category_label: Option<String>,
}

/// A submission that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub commune_slug: String,
    pub email: String,
    pub message: String,
    /// Slugified `category`, empty when none was chosen
    pub category_slug: String,
    pub category_label: Option<String>,
}

/// A successfully dispatched outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub content_type: String,
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
