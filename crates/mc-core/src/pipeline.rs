//! # Submission Pipeline
//!
//! Sequences validation, commune resolution, moderation and delivery for a
//! single public submission. Every terminal branch writes exactly one audit
//! record before control returns to the caller:
//!
//! ```text
//! Received -> Validated -> CommuneResolved -> Cleared -> Dispatched -> Logged
//!    |            |              |               |            |
//!    +- RejectedValidation       |               |            +- DeliveryFailed
//!                 +- RejectedUnknownCommune      +- Blocked
//!                                +- RejectedInvalidDestination
//! ```

use crate::audit::AuditLogger;
use crate::error::{AppError, SubmissionError};
use crate::models::{
    Commune, NewSubmissionRecord, OutgoingMail, RawSubmission, SubmissionStatus,
    ValidatedSubmission,
};
use crate::moderation::find_match;
use crate::registry::{has_valid_destination, CommuneRegistry};
use crate::text::slugify;
use crate::traits::{ForbiddenWordRepo, MailTransport};
use crate::validation::validate;
use log::{debug, error, info, warn};
use std::sync::Arc;

pub const MAIL_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

/// Returned on a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// `None` when the audit write itself failed
    pub record_id: Option<i64>,
}

/// The audit fields known so far, filled in as the pipeline advances.
struct Trail {
    commune_slug: String,
    commune_label: String,
    sender_email: String,
    sender_ip: String,
    message: String,
    category_slug: String,
}

pub struct SubmissionPipeline {
    registry: CommuneRegistry,
    forbidden: Arc<dyn ForbiddenWordRepo>,
    transport: Arc<dyn MailTransport>,
    audit: AuditLogger,
}

impl SubmissionPipeline {
    pub fn new(
        registry: CommuneRegistry,
        forbidden: Arc<dyn ForbiddenWordRepo>,
        transport: Arc<dyn MailTransport>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            registry,
            forbidden,
            transport,
            audit,
        }
    }

    /// Processes one submission. No deduplication and no retry: each call
    /// is validated, dispatched at most once and logged independently.
    pub async fn submit(
        &self,
        raw: &RawSubmission,
        sender_ip: &str,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let clean = raw.sanitized();
        let mut trail = Trail {
            commune_slug: clean.commune.clone(),
            commune_label: String::new(),
            sender_email: clean.email.clone(),
            sender_ip: sender_ip.to_string(),
            message: clean.message.clone(),
            category_slug: clean.category.as_deref().map(slugify).unwrap_or_default(),
        };

        let submission = match validate(&clean) {
            Ok(submission) => submission,
            Err(errors) => {
                return self.reject(trail, SubmissionError::Validation(errors)).await;
            }
        };

        let commune = match self.registry.resolve(&submission.commune_slug).await {
            Ok(commune) => commune,
            Err(AppError::NotFound(..)) => {
                let err = SubmissionError::UnknownCommune(submission.commune_slug.clone());
                return self.reject(trail, err).await;
            }
            Err(e) => {
                error!("Commune registry read failed for '{}': {e}", submission.commune_slug);
                let err = SubmissionError::UnknownCommune(submission.commune_slug.clone());
                return self.reject(trail, err).await;
            }
        };
        trail.commune_label = commune.display_label();

        if !has_valid_destination(&commune) {
            let err = SubmissionError::InvalidDestination {
                slug: commune.slug.clone(),
                address: commune.email.clone(),
            };
            return self.reject(trail, err).await;
        }

        let terms = match self.forbidden.list_forbidden_terms().await {
            Ok(terms) => terms,
            Err(e) => {
                // Fail closed: an unreadable filter must not let messages through.
                error!("Forbidden-word list unavailable: {e:#}");
                let err = SubmissionError::Delivery("forbidden-word list unavailable".into());
                return self.reject(trail, err).await;
            }
        };
        // Everything the sender wrote that ends up in the mail body is screened.
        let screened = [Some(submission.message.as_str()), submission.category_label.as_deref()];
        for text in screened.into_iter().flatten() {
            if let Some(term) = find_match(text, terms.iter().map(|t| t.normalized.as_str())) {
                debug!("Submission for '{}' matched forbidden term '{term}'", commune.slug);
                return self.reject(trail, SubmissionError::Blocked).await;
            }
        }

        let mail = compose_mail(&commune, &submission, sender_ip);
        if let Err(e) = self.transport.send(&mail).await {
            return self.reject(trail, SubmissionError::Delivery(format!("{e:#}"))).await;
        }

        info!("Message delivered to commune '{}'", commune.slug);
        let record_id = self.log(trail, SubmissionStatus::Sent).await;
        Ok(SubmissionReceipt { record_id })
    }

    async fn reject(
        &self,
        trail: Trail,
        err: SubmissionError,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        match &err {
            SubmissionError::InvalidDestination { .. } | SubmissionError::Delivery(_) => {
                error!("Submission failed: {err}")
            }
            _ => warn!("Submission rejected: {err}"),
        }
        self.log(trail, err.status()).await;
        Err(err)
    }

    /// Best-effort audit write; a failure is logged and never replaces the
    /// outcome reported to the caller.
    async fn log(&self, trail: Trail, status: SubmissionStatus) -> Option<i64> {
        let record = NewSubmissionRecord {
            created_at: self.audit.now(),
            commune_slug: trail.commune_slug,
            commune_label: trail.commune_label,
            sender_email: trail.sender_email,
            sender_ip: trail.sender_ip,
            message: trail.message,
            status,
            category_slug: trail.category_slug,
        };

        match self.audit.record(record).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Audit record could not be written: {e:#}");
                None
            }
        }
    }
}

/// Builds the plain-text email sent to the town hall.
pub fn compose_mail(commune: &Commune, submission: &ValidatedSubmission, sender_ip: &str) -> OutgoingMail {
    let label = commune.display_label();

    let mut lines = vec![format!("To the attention of the mayor of {label}.")];
    if let Some(category) = &submission.category_label {
        lines.push(format!("Category: {category}"));
    }
    lines.push(submission.message.clone());
    lines.push(String::new());
    lines.push(String::new());
    lines.push(format!("Reply to: {}", submission.email));
    lines.push(format!("Sender IP: {sender_ip}"));

    OutgoingMail {
        to: commune.email.trim().to_string(),
        subject: format!("Message for the municipality of {label}"),
        body: lines.join("\n"),
        content_type: MAIL_CONTENT_TYPE.to_string(),
    }
}
