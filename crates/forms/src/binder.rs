//! Field binding
//!
//! Walks the schema in display order, resolves localized labels and joins
//! raw input values to fields through their composite keys.

use crate::i18n::I18n;
use crate::schema::{composite_key, FieldKind, FormSchema};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A schema field with its localized presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundField {
    /// Composite key `{section}_{field}`
    pub key: String,
    pub section_key: String,
    pub section_title: String,
    pub label: String,
    pub placeholder: String,
    pub kind: FieldKind,
    pub required: bool,
}

/// Trimmed input values keyed by composite key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BoundValues(BTreeMap<String, String>);

impl BoundValues {
    /// Value for `key`, empty when absent
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BoundValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Binds a schema and its translation table
pub struct FormBinder<'a> {
    schema: &'a FormSchema,
    i18n: &'a I18n,
}

impl<'a> FormBinder<'a> {
    pub fn new(schema: &'a FormSchema, i18n: &'a I18n) -> Self {
        Self { schema, i18n }
    }

    /// Fields in schema order with resolved labels
    pub fn fields(&self) -> Vec<BoundField> {
        self.schema
            .fields()
            .map(|(section, field)| BoundField {
                key: composite_key(&section.key, &field.key),
                section_key: section.key.clone(),
                section_title: self.i18n.section_title(section).to_string(),
                label: self.i18n.label_for(field).to_string(),
                placeholder: field.placeholder.clone().unwrap_or_default(),
                kind: field.kind,
                required: field.required,
            })
            .collect()
    }

    /// Collect one trimmed value per schema field
    ///
    /// Missing inputs bind to `""`; inputs that match no field are dropped.
    pub fn bind(&self, raw: &HashMap<String, String>) -> BoundValues {
        self.schema
            .composite_keys()
            .into_iter()
            .map(|key| {
                let value = raw.get(&key).map(|v| v.trim()).unwrap_or_default().to_string();
                (key, value)
            })
            .collect()
    }
}
