//! Document assembly
//!
//! Turns validated values into the request handed to a [`PdfBuilder`].

use crate::binder::BoundValues;
use crate::builder::PdfBuilder;
use crate::config::PdfOptions;
use crate::i18n::I18n;
use crate::schema::composite_key;
use crate::Result;
use std::collections::BTreeMap;

/// Flat values the builder renders, keyed by composite key or alias
pub type FormData = BTreeMap<String, String>;

/// Values entered outside the schema sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraFields {
    pub stadt: String,
    pub datum: String,
}

/// Flat key older builders read instead of the composite key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyAlias {
    pub name: &'static str,
    pub section: &'static str,
    pub field: &'static str,
}

const fn alias(name: &'static str, section: &'static str, field: &'static str) -> LegacyAlias {
    LegacyAlias {
        name,
        section,
        field,
    }
}

pub const LEGACY_ALIASES: &[LegacyAlias] = &[
    alias("vg_name", "vg", "name"),
    alias("vg_vorname", "vg", "vorname"),
    alias("vg_geb", "vg", "geb"),
    alias("vg_addr", "vg", "addr"),
    alias("b_name", "b", "name"),
    alias("b_vorname", "b", "vorname"),
    alias("b_geb", "b", "geb"),
    alias("b_addr", "b", "addr"),
    alias("person_name", "person", "name"),
    alias("person_email", "person", "email"),
];

/// Everything one builder call needs
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
    pub form_data: FormData,
    pub i18n: I18n,
    pub pdf_options: PdfOptions,
    pub signature_bytes: Option<Vec<u8>>,
}

impl DocumentRequest {
    /// Hand the request to `builder`; its bytes and errors pass through as-is
    pub fn build(self, builder: &dyn PdfBuilder) -> Result<Vec<u8>> {
        builder.build_pdf(
            &self.form_data,
            &self.i18n,
            &self.pdf_options,
            self.signature_bytes.as_deref(),
        )
    }
}

/// Assemble the builder request
///
/// `form_data` holds every bound value, `stadt` and `datum`, then the
/// aliases. Signature options override base options key by key.
pub fn assemble(
    values: &BoundValues,
    extras: &ExtraFields,
    aliases: &[LegacyAlias],
    base_options: &PdfOptions,
    signature_options: &PdfOptions,
    i18n: &I18n,
    signature_bytes: Option<&[u8]>,
) -> DocumentRequest {
    let mut form_data: FormData = values
        .iter()
        .map(|(key, value)| (key.clone(), value.trim().to_string()))
        .collect();

    form_data.insert("stadt".to_string(), extras.stadt.trim().to_string());
    form_data.insert("datum".to_string(), extras.datum.trim().to_string());

    for alias in aliases {
        let value = values
            .get(&composite_key(alias.section, alias.field))
            .trim()
            .to_string();
        form_data.insert(alias.name.to_string(), value);
    }

    DocumentRequest {
        form_data,
        i18n: i18n.clone(),
        pdf_options: base_options.merged(signature_options),
        signature_bytes: signature_bytes.map(<[u8]>::to_vec),
    }
}
