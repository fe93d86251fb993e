//! Forms - schema-driven form to PDF pipeline
//!
//! This crate provides:
//! - Form schema types and discovery from a forms root
//! - Localization tables with key fallback
//! - Field binding and required-field validation
//! - Signature box geometry
//! - Document assembly and the PDF builder contract
//!
//! # Example
//!
//! ```ignore
//! use forms::{submit, FormRepository, Lang, SetupConfig, SubmitOutcome, Submission};
//!
//! let catalog = FormRepository::new("forms").discover(Lang::De);
//! let bundle = catalog.require_any()?.first().unwrap();
//! let config = SetupConfig::load("setup-config.json")?;
//!
//! let mut submission = Submission::defaults_for(&bundle.schema);
//! submission.values.insert("person_name".into(), "Alice".into());
//!
//! match submit(bundle, &submission, &config.pdf_options)? {
//!     SubmitOutcome::Document { file_name, bytes } => std::fs::write(file_name, bytes)?,
//!     SubmitOutcome::Invalid { message, .. } => eprintln!("{message}"),
//! }
//! ```

pub mod assembly;
pub mod binder;
pub mod builder;
pub mod cache;
pub mod config;
pub mod i18n;
pub mod repository;
pub mod schema;
pub mod signature;
pub mod submit;
pub mod validate;

pub use assembly::{assemble, DocumentRequest, ExtraFields, FormData, LEGACY_ALIASES};
pub use binder::{BoundField, BoundValues, FormBinder};
pub use builder::{PdfBuilder, SummaryPdfBuilder};
pub use cache::CatalogCache;
pub use config::{PdfOptions, SetupConfig, DEFAULT_CONFIG_FILE};
pub use i18n::{I18n, Lang};
pub use repository::{FormBundle, FormCatalog, FormRepository};
pub use schema::{composite_key, Field, FieldKind, FormSchema, Misc, Section};
pub use signature::{
    resolve_layout, signature_options, ScaleMode, Signature, SignatureAlign, SignatureLayoutSpec,
    SignatureMeta, SignaturePrefs, SignatureSource,
};
pub use submit::{submit, SubmitOutcome, Submission};
pub use validate::{missing_fields_message, validate_required};

use thiserror::Error;

/// Errors that can occur in the form pipeline
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Failed to parse form schema: {0}")]
    ParseError(String),

    #[error("Duplicate field key '{key}' ({first} and {second})")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("No forms available in {0}")]
    NoForms(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("PDF builder failed: {0}")]
    BuildError(String),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_messages() {
        let err = FormError::DuplicateKey {
            key: "a_b".to_string(),
            first: "a.b".to_string(),
            second: "a.b".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate field key 'a_b' (a.b and a.b)");
        assert_eq!(
            FormError::NoForms("forms".to_string()).to_string(),
            "No forms available in forms"
        );
    }
}
