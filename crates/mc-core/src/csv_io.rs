//! CSV bulk import and export of the registries and the audit log.
//!
//! Imports auto-detect `;` or `,` from the first line and skip a recognised
//! header row. Exports always use `;`.

use crate::error::{AppError, Result};
use crate::models::{Commune, MessageTemplate, SubmissionRecord};
use crate::text::{is_email, slugify, strip_tags};
use csv::{ReaderBuilder, WriterBuilder};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

/// `;` wins ties, as spreadsheet exports in French locales use it.
pub fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    if semicolons >= commas {
        b';'
    } else {
        b','
    }
}

/// Parses a whole CSV document into raw rows.
pub fn read_rows(data: &str) -> Result<Vec<Vec<String>>> {
    let data = data.trim_start_matches('\u{FEFF}');
    let first_line = data.lines().next().unwrap_or_default();

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(detect_delimiter(first_line))
        .from_reader(data.as_bytes());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| AppError::Import(e.to_string()))
        })
        .collect()
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or_default()
}

fn lower_cell(row: &[String], idx: usize) -> String {
    cell(row, idx).to_lowercase()
}

/// Rows of `Nom;Email`. Invalid rows are skipped; the slug comes from the
/// label.
pub fn parse_communes(rows: &[Vec<String>]) -> Vec<Commune> {
    let mut communes = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        if index == 0
            && row.len() >= 2
            && matches!(lower_cell(row, 0).as_str(), "nom" | "name")
            && lower_cell(row, 1) == "email"
        {
            continue;
        }

        let label = strip_tags(cell(row, 0));
        let email = cell(row, 1).to_string();
        if label.is_empty() || email.is_empty() || !is_email(&email) {
            continue;
        }

        let slug = slugify(&label);
        if slug.is_empty() {
            continue;
        }

        communes.push(Commune { slug, label, email });
    }

    communes
}

/// Case-insensitive fingerprint of a template used to skip re-imports.
pub fn template_fingerprint(category: &str, label: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(category.trim().to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(label.trim().to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(content.trim().to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// Rows of `Titre;Catégorie;Contenu`, returning only the templates to add.
///
/// Ids are `{slug}-{n}` with a per-slug counter, advanced past any id
/// already in `existing`. Rows duplicating an existing template (or an
/// earlier row) are dropped.
pub fn parse_templates(rows: &[Vec<String>], existing: &[MessageTemplate]) -> Vec<MessageTemplate> {
    let mut fingerprints: HashSet<String> = existing
        .iter()
        .map(|t| template_fingerprint(&t.category, &t.label, &t.content))
        .collect();
    let mut taken_ids: HashSet<String> = existing.iter().map(|t| t.id.clone()).collect();
    let mut slug_counts: HashMap<String, usize> = HashMap::new();
    let mut added = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        if index == 0 && row.len() >= 3 {
            let headers: Vec<String> = (0..3).map(|i| lower_cell(row, i)).collect();
            let has = |name: &str| headers.iter().any(|h| h == name);
            if has("titre") && (has("catégorie") || has("categorie")) {
                continue;
            }
        }

        let title = strip_tags(cell(row, 0));
        let category = strip_tags(cell(row, 1));
        let content = cell(row, 2).to_string();
        if title.is_empty() || content.is_empty() {
            continue;
        }

        let base_slug = slugify(&title);
        if base_slug.is_empty() {
            continue;
        }

        let fingerprint = template_fingerprint(&category, &title, &content);
        if fingerprints.contains(&fingerprint) {
            continue;
        }

        let counter = slug_counts.entry(base_slug.clone()).or_insert(0);
        let id = loop {
            *counter += 1;
            let candidate = format!("{base_slug}-{counter}");
            if !taken_ids.contains(&candidate) {
                break candidate;
            }
        };

        taken_ids.insert(id.clone());
        fingerprints.insert(fingerprint);
        added.push(MessageTemplate {
            id,
            label: title,
            category,
            content,
        });
    }

    added
}

/// Every cell of every row, minus a single-cell `Mot`/`Mots` header.
pub fn parse_forbidden_words(rows: &[Vec<String>]) -> Vec<String> {
    rows.iter()
        .enumerate()
        .filter(|(index, row)| {
            !(*index == 0 && row.len() == 1 && matches!(lower_cell(row, 0).as_str(), "mot" | "mots"))
        })
        .flat_map(|(_, row)| row.iter().map(|v| v.trim().to_string()))
        .filter(|v| !v.is_empty())
        .collect()
}

fn write_csv<I>(header: &[&str], rows: I) -> Result<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
    let io_err = |e: csv::Error| AppError::Internal(e.to_string());

    writer.write_record(header).map_err(io_err)?;
    for row in rows {
        writer.write_record(&row).map_err(io_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
}

pub fn export_communes(communes: &[Commune]) -> Result<String> {
    write_csv(
        &["Nom", "Email"],
        communes.iter().map(|c| vec![c.label.clone(), c.email.clone()]),
    )
}

pub fn export_templates(templates: &[MessageTemplate]) -> Result<String> {
    write_csv(
        &["Titre", "Catégorie", "Contenu"],
        templates.iter().map(|t| {
            vec![
                t.label.clone(),
                t.category.clone(),
                t.content.replace(['\r', '\n'], " "),
            ]
        }),
    )
}

pub fn export_forbidden_words(words: &[String]) -> Result<String> {
    write_csv(&["Mot"], words.iter().map(|w| vec![w.clone()]))
}

/// Records are written in the order given (the store returns newest first).
pub fn export_logs(records: &[SubmissionRecord]) -> Result<String> {
    write_csv(
        &["ID", "Date", "Commune slug", "Commune", "Email expéditeur", "IP", "Statut", "Message"],
        records.iter().map(|r| {
            vec![
                r.id.to_string(),
                r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                r.commune_slug.clone(),
                r.commune_label.clone(),
                r.sender_email.clone(),
                r.sender_ip.clone(),
                r.status.to_string(),
                r.message.clone(),
            ]
        }),
    )
}
