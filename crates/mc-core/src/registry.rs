//! Commune registry lookup.

use crate::error::{AppError, Result};
use crate::models::{Commune, CommuneOption};
use crate::text::is_email;
use crate::traits::CommuneRepo;
use std::sync::Arc;

/// Read-side view over the commune store.
#[derive(Clone)]
pub struct CommuneRegistry {
    repo: Arc<dyn CommuneRepo>,
}

impl CommuneRegistry {
    pub fn new(repo: Arc<dyn CommuneRepo>) -> Self {
        Self { repo }
    }

    /// Resolves a slug to its commune. An empty slug is never looked up.
    pub async fn resolve(&self, slug: &str) -> Result<Commune> {
        if slug.is_empty() {
            return Err(AppError::NotFound("Commune".into(), String::new()));
        }

        let commune = self.repo.get_commune(slug).await?;
        commune.ok_or_else(|| AppError::NotFound("Commune".into(), slug.to_string()))
    }

    /// Selector entries in registry order; the label defaults to the
    /// capitalised slug.
    pub async fn list_for_client(&self) -> Result<Vec<CommuneOption>> {
        let communes = self.repo.list_communes().await?;
        Ok(communes
            .into_iter()
            .map(|c| CommuneOption {
                label: c.display_label(),
                slug: c.slug,
            })
            .collect())
    }
}

/// True when the commune has a usable destination address.
pub fn has_valid_destination(commune: &Commune) -> bool {
    let address = commune.email.trim();
    !address.is_empty() && is_email(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    fn store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::default();
        store.put_commune(Commune {
            slug: "lyon".into(),
            label: "Lyon".into(),
            email: "mairie-lyon@example.com".into(),
        });
        store.put_commune(Commune {
            slug: "cenon".into(),
            label: String::new(),
            email: "not-an-address".into(),
        });
        Arc::new(store)
    }

    #[tokio::test]
    async fn resolves_known_and_rejects_unknown() {
        let registry = CommuneRegistry::new(store());

        let lyon = registry.resolve("lyon").await.unwrap();
        assert_eq!(lyon.label, "Lyon");

        assert!(matches!(registry.resolve("paris").await, Err(AppError::NotFound(..))));
        assert!(matches!(registry.resolve("").await, Err(AppError::NotFound(..))));
    }

    #[tokio::test]
    async fn client_listing_keeps_order_and_defaults_labels() {
        let registry = CommuneRegistry::new(store());
        let options = registry.list_for_client().await.unwrap();
        assert_eq!(
            options,
            vec![
                CommuneOption { slug: "lyon".into(), label: "Lyon".into() },
                CommuneOption { slug: "cenon".into(), label: "Cenon".into() },
            ]
        );
    }

    #[tokio::test]
    async fn destination_check() {
        let registry = CommuneRegistry::new(store());
        assert!(has_valid_destination(&registry.resolve("lyon").await.unwrap()));
        assert!(!has_valid_destination(&registry.resolve("cenon").await.unwrap()));
    }
}
