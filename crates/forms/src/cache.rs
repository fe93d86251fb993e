//! Process-wide discovery cache

use crate::i18n::Lang;
use crate::repository::{FormCatalog, FormRepository};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Discovered catalogs keyed by language
///
/// Discovery runs outside the lock; when two callers race on the same
/// language the first stored catalog is kept and returned to both.
#[derive(Debug)]
pub struct CatalogCache {
    repository: FormRepository,
    catalogs: RwLock<HashMap<Lang, Arc<FormCatalog>>>,
}

impl CatalogCache {
    pub fn new(repository: FormRepository) -> Self {
        Self {
            repository,
            catalogs: RwLock::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &FormRepository {
        &self.repository
    }

    /// Catalog for `lang`, discovering it on first use
    pub fn get(&self, lang: Lang) -> Arc<FormCatalog> {
        if let Some(catalog) = self.catalogs.read().get(&lang) {
            return Arc::clone(catalog);
        }

        tracing::debug!(lang = %lang, "catalog cache miss");
        let loaded = Arc::new(self.repository.discover(lang));

        let mut catalogs = self.catalogs.write();
        Arc::clone(catalogs.entry(lang).or_insert(loaded))
    }

    /// Drop all cached catalogs
    pub fn invalidate(&self) {
        self.catalogs.write().clear();
        tracing::debug!("catalog cache invalidated");
    }

    pub fn len(&self) -> usize {
        self.catalogs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.read().is_empty()
    }
}
