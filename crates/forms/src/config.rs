//! Setup configuration and PDF options

use crate::{FormError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::Path;

/// Configuration file looked up next to the forms root
pub const DEFAULT_CONFIG_FILE: &str = "setup-config.json";

/// Open key/value bag handed to the PDF builder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PdfOptions(Map<String, Value>);

impl PdfOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Typed value for `key`; absent or mistyped values give `None`
    pub fn parse<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Shallow merge; keys of `other` win
    pub fn merged(&self, other: &PdfOptions) -> PdfOptions {
        let mut merged = self.0.clone();
        for (key, value) in &other.0 {
            merged.insert(key.clone(), value.clone());
        }
        PdfOptions(merged)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for PdfOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Contents of `setup-config.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupConfig {
    #[serde(default)]
    pub pdf_options: PdfOptions,
}

impl SetupConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FormError::ConfigError(e.to_string()))
    }

    /// Load the configuration file
    ///
    /// A missing file yields the empty configuration; any other read or
    /// parse failure is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json).map_err(|e| match e {
                FormError::ConfigError(msg) => {
                    FormError::ConfigError(format!("{}: {msg}", path.display()))
                }
                other => other,
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no setup config, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_merge_right_wins() {
        let mut base = PdfOptions::new();
        base.insert("font_size", 11);
        base.insert("signature_align", "LEFT");

        let mut overrides = PdfOptions::new();
        overrides.insert("signature_align", "RIGHT");
        overrides.insert("signature_trim", true);

        let merged = base.merged(&overrides);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("font_size"), Some(&json!(11)));
        assert_eq!(merged.str("signature_align"), Some("RIGHT"));
        assert_eq!(merged.bool("signature_trim"), Some(true));
    }

    #[test]
    fn test_empty_base_merge_equals_overrides() {
        let mut overrides = PdfOptions::new();
        overrides.insert("signature_box_w_pt", 56.693);
        assert_eq!(PdfOptions::new().merged(&overrides), overrides);
    }

    #[test]
    fn test_typed_access() {
        let options: PdfOptions =
            serde_json::from_str(r#"{ "font_size": 12.5, "title": "X", "flag": "yes" }"#).unwrap();
        assert_eq!(options.f64("font_size"), Some(12.5));
        assert_eq!(options.parse::<String>("title"), Some("X".to_string()));
        assert_eq!(options.bool("flag"), None);
        assert_eq!(options.parse::<f64>("missing"), None);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = SetupConfig::load(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert!(config.pdf_options.is_empty());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, r#"{ "pdf_options": { "font_size": 10 } }"#).unwrap();

        let config = SetupConfig::load(&path).unwrap();
        assert_eq!(config.pdf_options.f64("font_size"), Some(10.0));
    }

    #[test]
    fn test_load_without_options_key() {
        let config = SetupConfig::from_json("{}").unwrap();
        assert!(config.pdf_options.is_empty());
    }

    #[test]
    fn test_load_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let err = SetupConfig::load(&path).unwrap_err();
        assert!(matches!(err, FormError::ConfigError(_)));
    }
}
