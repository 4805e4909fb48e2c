//! Template/category indexing for the cascading selects of the contact form.

use crate::models::{Category, MessageTemplate};
use crate::text::{collapse_whitespace, slugify, strip_tags};
use serde::Serialize;
use std::collections::HashMap;

const PREVIEW_MAX_CHARS: usize = 90;
const ELLIPSIS: char = '…';

/// Templates grouped by category slug, plus a lookup by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateIndex {
    /// First-seen order across the template list
    pub categories: Vec<Category>,
    pub by_category: HashMap<String, Vec<MessageTemplate>>,
    pub by_id: HashMap<String, MessageTemplate>,
}

impl TemplateIndex {
    /// Full template for message prefill.
    pub fn resolve(&self, id: &str) -> Option<&MessageTemplate> {
        self.by_id.get(id)
    }

    /// Templates of one category, in input order.
    pub fn templates_in(&self, category_slug: &str) -> &[MessageTemplate] {
        self.by_category
            .get(category_slug)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Groups templates by the slug of their category label.
///
/// Templates whose category is empty (or slugifies to nothing) are left out
/// of the categories but stay reachable by id. Templates without an id are
/// ignored entirely.
pub fn index_by_category(templates: &[MessageTemplate]) -> TemplateIndex {
    let mut index = TemplateIndex::default();

    for template in templates.iter().filter(|t| !t.id.is_empty()) {
        index.by_id.insert(template.id.clone(), template.clone());

        let label = template.category.trim();
        let slug = slugify(label);
        if slug.is_empty() {
            continue;
        }

        if !index.by_category.contains_key(&slug) {
            index.categories.push(Category {
                slug: slug.clone(),
                label: label.to_string(),
            });
        }
        index
            .by_category
            .entry(slug)
            .or_default()
            .push(template.clone());
    }

    index
}

/// One-line excerpt of the body (or label, or id), at most 90 characters
/// plus an ellipsis.
pub fn preview(template: &MessageTemplate) -> String {
    let text = [strip_tags(&template.content), template.label.clone(), template.id.clone()]
        .into_iter()
        .map(|s| collapse_whitespace(&s))
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    if text.chars().count() <= PREVIEW_MAX_CHARS {
        return text;
    }

    let mut truncated: String = text.chars().take(PREVIEW_MAX_CHARS).collect();
    truncated.push(ELLIPSIS);
    truncated
}

/// Template as exposed in the page bootstrap data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateView {
    pub id: String,
    pub label: String,
    pub category: String,
    pub category_slug: String,
    pub content: String,
    pub preview: String,
}

impl From<&MessageTemplate> for TemplateView {
    fn from(template: &MessageTemplate) -> Self {
        Self {
            id: template.id.clone(),
            label: template.label.clone(),
            category: template.category.clone(),
            category_slug: slugify(&template.category),
            content: template.content.clone(),
            preview: preview(template),
        }
    }
}
