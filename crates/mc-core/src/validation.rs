//! Field-level validation of public submissions.

use crate::models::{RawSubmission, ValidatedSubmission};
use crate::text::{is_email, slugify, strip_tags};
use serde::Serialize;

/// A single field problem. Order of checks is commune, email, message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldError {
    MissingCommune,
    MissingEmail,
    MalformedEmail,
    MissingMessage,
}

impl FieldError {
    pub fn message(&self) -> &'static str {
        match self {
            FieldError::MissingCommune => "Please choose a commune.",
            FieldError::MissingEmail => "Please enter your email address.",
            FieldError::MalformedEmail => "The email address format is invalid.",
            FieldError::MissingMessage => "Please enter a message.",
        }
    }
}

impl RawSubmission {
    /// Trimmed, markup-free copy of every field.
    pub fn sanitized(&self) -> RawSubmission {
        let clean_optional = |value: &Option<String>| {
            value
                .as_deref()
                .map(strip_tags)
                .filter(|v| !v.is_empty())
        };

        RawSubmission {
            commune: strip_tags(&self.commune),
            email: strip_tags(&self.email),
            message: strip_tags(&self.message),
            category: clean_optional(&self.category),
            category_label: clean_optional(&self.category_label),
        }
    }
}

/// Checks every field and reports all problems at once.
///
/// Side-effect free: neither the registry nor the forbidden words are
/// consulted here.
pub fn validate(raw: &RawSubmission) -> Result<ValidatedSubmission, Vec<FieldError>> {
    let clean = raw.sanitized();
    let mut errors = Vec::new();

    if clean.commune.is_empty() {
        errors.push(FieldError::MissingCommune);
    }

    if clean.email.is_empty() {
        errors.push(FieldError::MissingEmail);
    } else if !is_email(&clean.email) {
        errors.push(FieldError::MalformedEmail);
    }

    if clean.message.is_empty() {
        errors.push(FieldError::MissingMessage);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedSubmission {
        commune_slug: clean.commune,
        email: clean.email,
        message: clean.message,
        category_slug: clean.category.as_deref().map(slugify).unwrap_or_default(),
        category_label: clean.category_label,
    })
}
