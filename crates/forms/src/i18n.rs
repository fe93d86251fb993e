//! Localization tables
//!
//! One flat `key -> string` table per language. Lookups never fail: a
//! missing key falls back to the key itself or to a literal default.

use crate::schema::{Field, Section};
use crate::{FormError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const APP_TITLE: &str = "app.title";
pub const FIELD_ORT: &str = "field.ort";
pub const FIELD_DATUM: &str = "field.datum";
pub const BTN_CREATE: &str = "btn.create";
pub const VALIDATION_REQUIRED: &str = "validation.required";
pub const MSG_CREATED: &str = "msg.created";

pub const DEFAULT_ORT: &str = "Ort";
pub const DEFAULT_DATUM: &str = "Datum";
pub const DEFAULT_BTN_CREATE: &str = "PDF erstellen";
pub const DEFAULT_VALIDATION_REQUIRED: &str = "Bitte Pflichtfelder ausfüllen.";
pub const DEFAULT_MSG_CREATED: &str = "PDF created.";

/// Supported UI languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    De,
    Ar,
    En,
}

/// Language whose table is tried when the preferred one is missing
pub const DEFAULT_LANG: Lang = Lang::De;

/// All supported languages in display order
pub const SUPPORTED_LANGS: &[Lang] = &[Lang::De, Lang::Ar, Lang::En];

impl Lang {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::De => "de",
            Self::Ar => "ar",
            Self::En => "en",
        }
    }

    /// Parse a language code, case-insensitive and tolerant of region tags
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.split(['-', '_']).next().unwrap_or_default() {
            "de" => Some(Self::De),
            "ar" => Some(Self::Ar),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    /// Right-to-left script
    pub const fn is_rtl(self) -> bool {
        matches!(self, Self::Ar)
    }
}

impl FromStr for Lang {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        Lang::parse(s).ok_or_else(|| FormError::ParseError(format!("unknown language '{s}'")))
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translation table for one language
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct I18n {
    entries: HashMap<String, String>,
}

impl I18n {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Translation for `key`, or the key itself
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Translation for `key`, or `default`
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field label; an untranslated field shows its key
    pub fn label_for<'a>(&'a self, field: &'a Field) -> &'a str {
        let key = field.label_i18n.as_deref().unwrap_or(&field.key);
        self.get_or(key, &field.key)
    }

    /// Section heading; an untranslated section shows its key
    pub fn section_title<'a>(&'a self, section: &'a Section) -> &'a str {
        let key = section.title_i18n.as_deref().unwrap_or(&section.key);
        self.get_or(key, &section.key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for I18n {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
