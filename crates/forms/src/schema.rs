//! Form JSON schema types

use crate::{FormError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// City used when the schema does not set `misc.stadt_default`
pub const DEFAULT_STADT: &str = "Berlin";

/// Root form definition, loaded from `forms/<key>/schema.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FormSchema {
    /// Display name (falls back to the form key)
    #[serde(default)]
    pub name: Option<String>,

    /// Sections in display order
    #[serde(default)]
    pub sections: Vec<Section>,

    /// Auxiliary configuration
    #[serde(default)]
    pub misc: Misc,
}

/// Group of fields rendered under one heading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    /// Section identifier, first half of every composite key in the section
    pub key: String,

    /// i18n key of the heading
    #[serde(default)]
    pub title_i18n: Option<String>,

    /// Fields in display order
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// Single input field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    /// Field identifier, unique within its section
    pub key: String,

    /// Input widget kind
    #[serde(rename = "type", default)]
    pub kind: FieldKind,

    /// i18n key of the label (falls back to `key`)
    #[serde(default)]
    pub label_i18n: Option<String>,

    /// Display hint shown in empty inputs
    #[serde(default)]
    pub placeholder: Option<String>,

    /// Whether an empty value blocks document generation
    #[serde(default)]
    pub required: bool,
}

/// Input widget kind
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Textarea,
}

/// Auxiliary form configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Misc {
    /// Pre-filled city
    #[serde(default)]
    pub stadt_default: Option<String>,

    /// Hint for the date input
    #[serde(default)]
    pub date_placeholder: Option<String>,

    /// Whether the signature step is shown at all
    #[serde(default = "default_signature_required")]
    pub signature_required: bool,
}

fn default_signature_required() -> bool {
    true
}

impl Default for Misc {
    fn default() -> Self {
        Self {
            stadt_default: None,
            date_placeholder: None,
            signature_required: default_signature_required(),
        }
    }
}

impl Misc {
    /// Effective pre-filled city
    pub fn stadt_default(&self) -> &str {
        self.stadt_default.as_deref().unwrap_or(DEFAULT_STADT)
    }

    /// Effective date hint
    pub fn date_placeholder(&self) -> &str {
        self.date_placeholder.as_deref().unwrap_or_default()
    }
}

/// Build the join key between a schema field and a submitted value
pub fn composite_key(section_key: &str, field_key: &str) -> String {
    format!("{section_key}_{field_key}")
}

impl FormSchema {
    /// Parse a schema and check its composite keys
    pub fn from_json(json: &str) -> Result<Self> {
        let schema: FormSchema =
            serde_json::from_str(json).map_err(|e| FormError::ParseError(e.to_string()))?;
        schema.check_composite_keys()?;
        Ok(schema)
    }

    /// Iterate `(section, field)` pairs in traversal order
    pub fn fields(&self) -> impl Iterator<Item = (&Section, &Field)> {
        self.sections
            .iter()
            .flat_map(|section| section.fields.iter().map(move |field| (section, field)))
    }

    /// All composite keys in traversal order
    pub fn composite_keys(&self) -> Vec<String> {
        self.fields()
            .map(|(section, field)| composite_key(&section.key, &field.key))
            .collect()
    }

    /// Fail on the first composite key produced by two different fields
    ///
    /// `{section}_{field}` can collide across sections too (`a_b` + `c`
    /// against `a` + `b_c`), so the check is global.
    pub fn check_composite_keys(&self) -> Result<()> {
        let mut owners: HashMap<String, String> = HashMap::new();

        for (section, field) in self.fields() {
            let key = composite_key(&section.key, &field.key);
            let owner = format!("{}.{}", section.key, field.key);
            if let Some(first) = owners.get(&key) {
                return Err(FormError::DuplicateKey {
                    key,
                    first: first.clone(),
                    second: owner,
                });
            }
            owners.insert(key, owner);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_schema() {
        let json = r#"{
            "name": "Vollmacht",
            "sections": [
                {
                    "key": "vg",
                    "title_i18n": "section.vg",
                    "fields": [
                        { "key": "name", "type": "text", "label_i18n": "field.name", "required": true },
                        { "key": "addr", "type": "textarea", "placeholder": "Straße, PLZ Ort" }
                    ]
                }
            ],
            "misc": { "stadt_default": "Hamburg", "signature_required": false }
        }"#;

        let schema = FormSchema::from_json(json).unwrap();
        assert_eq!(schema.name.as_deref(), Some("Vollmacht"));
        assert_eq!(schema.sections.len(), 1);

        let fields = &schema.sections[0].fields;
        assert_eq!(fields[0].kind, FieldKind::Text);
        assert!(fields[0].required);
        assert_eq!(fields[1].kind, FieldKind::Textarea);
        assert!(!fields[1].required);
        assert_eq!(fields[1].placeholder.as_deref(), Some("Straße, PLZ Ort"));

        assert_eq!(schema.misc.stadt_default(), "Hamburg");
        assert!(!schema.misc.signature_required);
    }

    #[test]
    fn test_defaults() {
        let schema =
            FormSchema::from_json(r#"{ "sections": [ { "key": "p", "fields": [ { "key": "x" } ] } ] }"#)
                .unwrap();
        let field = &schema.sections[0].fields[0];

        assert_eq!(field.kind, FieldKind::Text);
        assert_eq!(field.label_i18n, None);
        assert!(!field.required);
        assert_eq!(schema.misc.stadt_default(), DEFAULT_STADT);
        assert_eq!(schema.misc.date_placeholder(), "");
        assert!(schema.misc.signature_required);
    }

    #[test]
    fn test_unknown_field_type_rejected() {
        let json = r#"{ "sections": [ { "key": "p", "fields": [ { "key": "x", "type": "date" } ] } ] }"#;
        let err = FormSchema::from_json(json).unwrap_err();
        assert!(matches!(err, FormError::ParseError(ref msg) if msg.contains("date")));
    }

    #[test]
    fn test_composite_keys_in_traversal_order() {
        let json = r#"{ "sections": [
            { "key": "a", "fields": [ { "key": "1" }, { "key": "2" } ] },
            { "key": "b", "fields": [ { "key": "1" } ] }
        ] }"#;
        let schema = FormSchema::from_json(json).unwrap();
        assert_eq!(schema.composite_keys(), vec!["a_1", "a_2", "b_1"]);
    }

    #[test]
    fn test_duplicate_field_in_section_flagged() {
        let json = r#"{ "sections": [
            { "key": "person", "fields": [ { "key": "name" }, { "key": "name" } ] }
        ] }"#;
        let err = FormSchema::from_json(json).unwrap_err();
        match err {
            FormError::DuplicateKey { key, first, second } => {
                assert_eq!(key, "person_name");
                assert_eq!(first, "person.name");
                assert_eq!(second, "person.name");
            }
            other => panic!("Expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn test_cross_section_collision_flagged() {
        let json = r#"{ "sections": [
            { "key": "a_b", "fields": [ { "key": "c" } ] },
            { "key": "a", "fields": [ { "key": "b_c" } ] }
        ] }"#;
        let err = FormSchema::from_json(json).unwrap_err();
        match err {
            FormError::DuplicateKey { key, first, second } => {
                assert_eq!(key, "a_b_c");
                assert_eq!(first, "a_b.c");
                assert_eq!(second, "a.b_c");
            }
            other => panic!("Expected DuplicateKey, got {other:?}"),
        }
    }
}
