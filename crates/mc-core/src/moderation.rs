//! Forbidden-word filtering.
//!
//! Matching is a substring test on normalized text, so it cannot be
//! bypassed by changing case or accents. Operating on `str` keeps the
//! comparison on whole code points.

use crate::models::ForbiddenTerm;
use crate::text::normalize;
use std::collections::HashSet;

/// Returns true when any term, once normalized, is a non-empty substring of
/// the normalized message.
pub fn is_blocked<I, S>(message: &str, forbidden_terms: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    find_match(message, forbidden_terms).is_some()
}

/// Like [`is_blocked`] but yields the normalized term that matched. Only for
/// operator logs; never surface this to the sender.
pub fn find_match<I, S>(message: &str, forbidden_terms: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let normalized_message = normalize(message);
    if normalized_message.is_empty() {
        return None;
    }

    forbidden_terms
        .into_iter()
        .map(|term| normalize(term.as_ref()))
        .filter(|term| !term.is_empty())
        .find(|term| normalized_message.contains(term.as_str()))
}

/// Ordered set of forbidden words, unique on their normalized form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForbiddenWordSet {
    terms: Vec<ForbiddenTerm>,
    seen: HashSet<String>,
}

impl ForbiddenWordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw words, silently dropping blanks and duplicates.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        set.merge(words);
        set
    }

    /// Adds one word. Returns false when it is blank or already present.
    pub fn insert(&mut self, word: &str) -> bool {
        let original = word.trim();
        if original.is_empty() {
            return false;
        }

        let normalized = normalize(original);
        if normalized.is_empty() || self.seen.contains(&normalized) {
            return false;
        }

        self.seen.insert(normalized.clone());
        self.terms.push(ForbiddenTerm {
            original: original.to_string(),
            normalized,
        });
        true
    }

    /// Adds every word, returning how many were new.
    pub fn merge<I, S>(&mut self, words: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        words
            .into_iter()
            .filter(|word| self.insert(word.as_ref()))
            .count()
    }

    /// Replaces the whole content of the set.
    pub fn replace_all<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        *self = Self::from_words(words);
    }

    pub fn terms(&self) -> &[ForbiddenTerm] {
        &self.terms
    }

    pub fn originals(&self) -> Vec<String> {
        self.terms.iter().map(|t| t.original.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn blocks(&self, message: &str) -> bool {
        is_blocked(message, self.terms.iter().map(|t| t.normalized.as_str()))
    }
}
