//! # Admin Commands
//!
//! Registry maintenance expressed as a tagged command, dispatched by
//! [`AdminService::execute`]. Each command yields a [`Notice`] for the
//! operator; only infrastructure failures surface as `Err`.

use crate::csv_io::{self, parse_communes, parse_forbidden_words, parse_templates, read_rows};
use crate::error::{AppError, Result};
use crate::models::{Commune, MessageTemplate};
use crate::moderation::ForbiddenWordSet;
use crate::stats::{compute_stats, LogStats};
use crate::text::{is_email, sanitize_key, slugify, strip_tags};
use crate::traits::{AuditStore, CommuneRepo, ForbiddenWordRepo, TemplateRepo};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AdminCommand {
    AddCommune { slug: String, label: String, email: String },
    DeleteCommune { slug: String },
    ImportCommunes { csv: String },
    SaveTemplate {
        id: String,
        label: String,
        #[serde(default)]
        category: String,
        content: String,
    },
    DeleteTemplate { id: String },
    ImportTemplates { csv: String },
    /// One word per line; replaces the whole list
    SaveForbiddenWords { text: String },
    /// Merges into the existing list
    ImportForbiddenWords { csv: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Updated,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn updated(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Updated, message: message.into() }
    }

    fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, message: message.into() }
    }
}

/// Which table an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Communes,
    Templates,
    Forbidden,
    Logs,
}

impl ExportKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportKind::Communes => "mairie-contact-communes.csv",
            ExportKind::Templates => "mairie-contact-templates.csv",
            ExportKind::Forbidden => "mairie-contact-forbidden-words.csv",
            ExportKind::Logs => "mairie-contact-logs.csv",
        }
    }
}

impl std::str::FromStr for ExportKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "communes" => Ok(ExportKind::Communes),
            "templates" => Ok(ExportKind::Templates),
            "forbidden" => Ok(ExportKind::Forbidden),
            "logs" => Ok(ExportKind::Logs),
            other => Err(AppError::NotFound("Export".into(), other.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct AdminService {
    communes: Arc<dyn CommuneRepo>,
    templates: Arc<dyn TemplateRepo>,
    forbidden: Arc<dyn ForbiddenWordRepo>,
    audit: Arc<dyn AuditStore>,
}

impl AdminService {
    pub fn new(
        communes: Arc<dyn CommuneRepo>,
        templates: Arc<dyn TemplateRepo>,
        forbidden: Arc<dyn ForbiddenWordRepo>,
        audit: Arc<dyn AuditStore>,
    ) -> Self {
        Self { communes, templates, forbidden, audit }
    }

    pub async fn execute(&self, command: AdminCommand) -> Result<Notice> {
        match command {
            AdminCommand::AddCommune { slug, label, email } => self.add_commune(&slug, &label, &email).await,
            AdminCommand::DeleteCommune { slug } => {
                if self.communes.delete_commune(&slugify(&slug)).await? {
                    Ok(Notice::updated("Commune deleted."))
                } else {
                    Ok(Notice::error("Commune not found."))
                }
            }
            AdminCommand::ImportCommunes { csv } => {
                let communes = parse_communes(&read_rows(&csv)?);
                let count = communes.len();
                for commune in communes {
                    self.communes.upsert_commune(commune).await?;
                }
                info!("Imported {count} communes");
                Ok(Notice::updated(format!("{count} communes imported.")))
            }
            AdminCommand::SaveTemplate { id, label, category, content } => {
                self.save_template(&id, &label, &category, &content).await
            }
            AdminCommand::DeleteTemplate { id } => {
                if self.templates.delete_template(&sanitize_key(&id)).await? {
                    Ok(Notice::updated("Template deleted."))
                } else {
                    Ok(Notice::error("Template not found."))
                }
            }
            AdminCommand::ImportTemplates { csv } => {
                let existing = self.templates.list_templates().await?;
                let added = parse_templates(&read_rows(&csv)?, &existing);
                let count = added.len();
                for template in added {
                    self.templates.upsert_template(template).await?;
                }
                info!("Imported {count} templates");
                Ok(Notice::updated(format!("{count} templates imported.")))
            }
            AdminCommand::SaveForbiddenWords { text } => {
                let set = ForbiddenWordSet::from_words(text.lines());
                self.forbidden.replace_forbidden_terms(set.terms().to_vec()).await?;
                Ok(Notice::updated("Forbidden words saved."))
            }
            AdminCommand::ImportForbiddenWords { csv } => {
                let words = parse_forbidden_words(&read_rows(&csv)?);
                let mut set = self.forbidden_set().await?;
                let count = set.merge(words);
                self.forbidden.replace_forbidden_terms(set.terms().to_vec()).await?;
                Ok(Notice::updated(format!("{count} forbidden words imported.")))
            }
        }
    }

    async fn add_commune(&self, slug: &str, label: &str, email: &str) -> Result<Notice> {
        let slug = slugify(slug);
        let label = strip_tags(label);
        let email = email.trim();

        if slug.is_empty() || label.is_empty() || email.is_empty() {
            return Ok(Notice::error("Please fill in every field."));
        }
        if !is_email(email) {
            return Ok(Notice::error("The email address is not valid."));
        }

        self.communes
            .upsert_commune(Commune { slug, label, email: email.to_string() })
            .await?;
        Ok(Notice::updated("Commune saved."))
    }

    async fn save_template(&self, id: &str, label: &str, category: &str, content: &str) -> Result<Notice> {
        let id = sanitize_key(id);
        let label = strip_tags(label);
        let category = strip_tags(category);
        let content = content.trim();

        if id.is_empty() || label.is_empty() || content.is_empty() {
            return Ok(Notice::error("Please provide the id, title and content of the template."));
        }

        self.templates
            .upsert_template(MessageTemplate {
                id,
                label,
                category,
                content: content.to_string(),
            })
            .await?;
        Ok(Notice::updated("Template saved."))
    }

    async fn forbidden_set(&self) -> Result<ForbiddenWordSet> {
        let stored = self.forbidden.list_forbidden_terms().await?;
        Ok(ForbiddenWordSet::from_words(stored.iter().map(|t| t.original.as_str())))
    }

    pub async fn export(&self, kind: ExportKind) -> Result<String> {
        match kind {
            ExportKind::Communes => csv_io::export_communes(&self.communes.list_communes().await?),
            ExportKind::Templates => csv_io::export_templates(&self.templates.list_templates().await?),
            ExportKind::Forbidden => csv_io::export_forbidden_words(&self.forbidden_set().await?.originals()),
            ExportKind::Logs => csv_io::export_logs(&self.audit.list_records().await?),
        }
    }

    pub async fn stats(&self) -> Result<LogStats> {
        Ok(compute_stats(&self.audit.list_records().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    fn service() -> (AdminService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::default());
        let service = AdminService::new(store.clone(), store.clone(), store.clone(), store.clone());
        (service, store)
    }

    #[tokio::test]
    async fn add_and_delete_commune() {
        let (admin, store) = service();

        let notice = admin
            .execute(AdminCommand::AddCommune {
                slug: "Saint Émilion".into(),
                label: "Saint-Émilion".into(),
                email: "mairie@saint-emilion.fr".into(),
            })
            .await
            .unwrap();
        assert_eq!(notice.kind, NoticeKind::Updated);
        assert!(store.get_commune("saint-emilion").await.unwrap().is_some());

        let notice = admin
            .execute(AdminCommand::DeleteCommune { slug: "saint-emilion".into() })
            .await
            .unwrap();
        assert_eq!(notice.kind, NoticeKind::Updated);

        let notice = admin
            .execute(AdminCommand::DeleteCommune { slug: "saint-emilion".into() })
            .await
            .unwrap();
        assert_eq!(notice, Notice::error("Commune not found."));
    }

    #[tokio::test]
    async fn add_commune_rejects_bad_input() {
        let (admin, store) = service();

        let missing = admin
            .execute(AdminCommand::AddCommune { slug: "x".into(), label: "".into(), email: "a@b.fr".into() })
            .await
            .unwrap();
        assert_eq!(missing.kind, NoticeKind::Error);

        let invalid = admin
            .execute(AdminCommand::AddCommune { slug: "x".into(), label: "X".into(), email: "nope".into() })
            .await
            .unwrap();
        assert_eq!(invalid, Notice::error("The email address is not valid."));
        assert!(store.list_communes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn template_round_trip_through_commands() {
        let (admin, store) = service();

        admin
            .execute(AdminCommand::SaveTemplate {
                id: "Voirie_1".into(),
                label: "Nids de poule".into(),
                category: "Voirie".into(),
                content: "Bonjour, la rue est abîmée.".into(),
            })
            .await
            .unwrap();
        let notice = admin
            .execute(AdminCommand::ImportTemplates {
                csv: "Titre;Catégorie;Contenu\nÉclairage;Voirie;Lampadaire en panne\n".into(),
            })
            .await
            .unwrap();
        assert_eq!(notice.message, "1 templates imported.");

        let ids: Vec<_> = store.list_templates().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["voirie_1", "eclairage-1"]);

        let notice = admin.execute(AdminCommand::DeleteTemplate { id: "voirie_1".into() }).await.unwrap();
        assert_eq!(notice.kind, NoticeKind::Updated);
    }

    #[tokio::test]
    async fn forbidden_words_save_replaces_and_import_merges() {
        let (admin, store) = service();

        admin
            .execute(AdminCommand::SaveForbiddenWords { text: "spam\r\nArnaque\n\nSPAM\n".into() })
            .await
            .unwrap();
        let notice = admin
            .execute(AdminCommand::ImportForbiddenWords { csv: "Mot\narnaque\nescroc\n".into() })
            .await
            .unwrap();
        assert_eq!(notice.message, "1 forbidden words imported.");

        let originals: Vec<_> = store
            .list_forbidden_terms()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.original)
            .collect();
        assert_eq!(originals, vec!["spam", "Arnaque", "escroc"]);

        admin
            .execute(AdminCommand::SaveForbiddenWords { text: "nouveau".into() })
            .await
            .unwrap();
        assert_eq!(admin.export(ExportKind::Forbidden).await.unwrap(), "Mot\nnouveau\n");
    }

    #[tokio::test]
    async fn imports_communes_as_upserts() {
        let (admin, store) = service();
        store.put_commune(Commune { slug: "lyon".into(), label: "Lyon".into(), email: "old@lyon.fr".into() });

        admin
            .execute(AdminCommand::ImportCommunes { csv: "Nom;Email\nLyon;new@lyon.fr\nBron;mairie@bron.fr\n".into() })
            .await
            .unwrap();

        let communes = store.list_communes().await.unwrap();
        assert_eq!(communes.len(), 2);
        assert_eq!(communes[0].email, "new@lyon.fr");
        assert_eq!(communes[1].slug, "bron");
    }

    #[test]
    fn commands_deserialize_from_tagged_json() {
        let command: AdminCommand =
            serde_json::from_str(r#"{"command":"delete_commune","slug":"lyon"}"#).unwrap();
        assert_eq!(command, AdminCommand::DeleteCommune { slug: "lyon".into() });
        assert!("nope".parse::<ExportKind>().is_err());
    }
}
