//! Form discovery
//!
//! A forms root holds one directory per form:
//!
//! ```text
//! forms/
//!   vollmacht/
//!     schema.json
//!     i18n/de.json
//!     i18n/ar.json
//! ```

use crate::builder::{PdfBuilder, SummaryPdfBuilder};
use crate::i18n::{I18n, Lang, DEFAULT_LANG};
use crate::schema::FormSchema;
use crate::{FormError, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const SCHEMA_FILE: &str = "schema.json";
pub const I18N_DIR: &str = "i18n";

/// A discovered form with everything needed to fill it
#[derive(Clone)]
pub struct FormBundle {
    /// Directory name under the forms root
    pub key: String,
    /// Display name, `schema.name` or the key
    pub name: String,
    pub schema: Arc<FormSchema>,
    pub i18n: I18n,
    pub builder: Arc<dyn PdfBuilder>,
}

impl fmt::Debug for FormBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormBundle")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("sections", &self.schema.sections.len())
            .field("i18n_entries", &self.i18n.len())
            .finish_non_exhaustive()
    }
}

impl FormBundle {
    /// Download name of generated documents
    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.key)
    }
}

/// Forms found under a root, in directory name order
#[derive(Debug, Clone, Default)]
pub struct FormCatalog {
    root: PathBuf,
    forms: Vec<FormBundle>,
}

impl FormCatalog {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&FormBundle> {
        self.forms.iter().find(|form| form.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.forms.iter().map(|form| form.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormBundle> {
        self.forms.iter()
    }

    pub fn first(&self) -> Option<&FormBundle> {
        self.forms.first()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// The catalog itself, or [`FormError::NoForms`] when it is empty
    pub fn require_any(&self) -> Result<&Self> {
        if self.forms.is_empty() {
            return Err(FormError::NoForms(self.root.display().to_string()));
        }
        Ok(self)
    }
}

/// Scans a forms root
#[derive(Clone)]
pub struct FormRepository {
    root: PathBuf,
    builders: HashMap<String, Arc<dyn PdfBuilder>>,
}

impl fmt::Debug for FormRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builders: Vec<&String> = self.builders.keys().collect();
        builders.sort();
        f.debug_struct("FormRepository")
            .field("root", &self.root)
            .field("builders", &builders)
            .finish()
    }
}

impl FormRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            builders: HashMap::new(),
        }
    }

    /// Use `builder` for the form `key` instead of the summary builder
    pub fn with_builder(mut self, key: impl Into<String>, builder: Arc<dyn PdfBuilder>) -> Self {
        self.builders.insert(key.into(), builder);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load every valid form under the root
    ///
    /// Never fails: unreadable roots give an empty catalog and invalid forms
    /// are skipped with a warning.
    pub fn discover(&self, lang: Lang) -> FormCatalog {
        let mut catalog = FormCatalog {
            root: self.root.clone(),
            forms: Vec::new(),
        };

        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(root = %self.root.display(), error = %err, "cannot read forms root");
                return catalog;
            }
        };

        let mut dirs: Vec<(String, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(|path| {
                let key = path.file_name()?.to_str()?.to_string();
                Some((key, path))
            })
            .collect();
        dirs.sort();

        for (key, dir) in dirs {
            match self.load_form(&key, &dir, lang) {
                Ok(Some(bundle)) => catalog.forms.push(bundle),
                Ok(None) => {
                    tracing::debug!(form = %key, "no {SCHEMA_FILE}, skipping");
                }
                Err(err) => {
                    tracing::warn!(form = %key, error = %err, "skipping invalid form");
                }
            }
        }

        tracing::debug!(
            root = %self.root.display(),
            lang = %lang,
            forms = catalog.forms.len(),
            "discovered forms"
        );
        catalog
    }

    /// Load one form directory; `None` when it has no schema file
    pub fn load_form(&self, key: &str, dir: &Path, lang: Lang) -> Result<Option<FormBundle>> {
        let schema_path = dir.join(SCHEMA_FILE);
        if !schema_path.is_file() {
            return Ok(None);
        }

        let schema = Arc::new(FormSchema::from_json(&std::fs::read_to_string(&schema_path)?)?);
        let (i18n, table_lang) = load_i18n(dir, lang);
        let name = schema.name.clone().unwrap_or_else(|| key.to_string());

        let builder = match self.builders.get(key) {
            Some(builder) => Arc::clone(builder),
            None => Arc::new(
                SummaryPdfBuilder::new(Arc::clone(&schema), name.clone())
                    .with_rtl(table_lang.is_some_and(Lang::is_rtl)),
            ),
        };

        Ok(Some(FormBundle {
            key: key.to_string(),
            name,
            schema,
            i18n,
            builder,
        }))
    }
}

/// Table for `lang`, else the default language, else empty
///
/// Also returns the language of the table actually loaded.
fn load_i18n(dir: &Path, lang: Lang) -> (I18n, Option<Lang>) {
    let mut candidates = vec![lang];
    if lang != DEFAULT_LANG {
        candidates.push(DEFAULT_LANG);
    }

    for candidate in candidates {
        let path = dir.join(I18N_DIR).join(format!("{candidate}.json"));
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(_) => continue,
        };
        match I18n::from_json(&json) {
            Ok(i18n) => return (i18n, Some(candidate)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable i18n table");
            }
        }
    }

    (I18n::new(), None)
}
