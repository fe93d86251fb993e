//! Submission flow
//!
//! bind -> validate -> signature options -> assemble -> build

use crate::assembly::{assemble, ExtraFields, LEGACY_ALIASES};
use crate::binder::FormBinder;
use crate::config::PdfOptions;
use crate::repository::FormBundle;
use crate::schema::FormSchema;
use crate::signature::{signature_options, Signature, SignaturePrefs};
use crate::validate::{missing_fields_message, validate_required};
use crate::Result;
use std::collections::HashMap;

/// Raw user input for one form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    /// Field inputs keyed by composite key
    pub values: HashMap<String, String>,
    pub stadt: String,
    pub datum: String,
    pub signature: Option<Signature>,
    pub prefs: SignaturePrefs,
}

impl Submission {
    /// Empty submission with the form's pre-filled city
    pub fn defaults_for(schema: &FormSchema) -> Self {
        Self {
            stadt: schema.misc.stadt_default().to_string(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

/// Result of a submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Required fields are empty; nothing was built
    Invalid { labels: Vec<String>, message: String },
    /// Generated document and its download name
    Document { file_name: String, bytes: Vec<u8> },
}

/// Validate a submission and build its document
///
/// Builder errors are returned unchanged.
pub fn submit(
    bundle: &FormBundle,
    submission: &Submission,
    base_options: &PdfOptions,
) -> Result<SubmitOutcome> {
    let binder = FormBinder::new(&bundle.schema, &bundle.i18n);
    let values = binder.bind(&submission.values);

    let labels = validate_required(&values, &bundle.schema, &bundle.i18n);
    if !labels.is_empty() {
        tracing::debug!(form = %bundle.key, missing = labels.len(), "submission incomplete");
        let message = missing_fields_message(&bundle.i18n, &labels);
        return Ok(SubmitOutcome::Invalid { labels, message });
    }

    let signature = submission
        .signature
        .as_ref()
        .filter(|sig| bundle.schema.misc.signature_required && !sig.bytes.is_empty());
    let sig_options = signature_options(&bundle.schema, signature, &submission.prefs);

    let extras = ExtraFields {
        stadt: submission.stadt.clone(),
        datum: submission.datum.clone(),
    };
    let request = assemble(
        &values,
        &extras,
        LEGACY_ALIASES,
        base_options,
        &sig_options,
        &bundle.i18n,
        signature.map(|sig| sig.bytes.as_slice()),
    );

    let bytes = request.build(bundle.builder.as_ref())?;
    tracing::info!(form = %bundle.key, bytes = bytes.len(), "document created");

    Ok(SubmitOutcome::Document {
        file_name: bundle.file_name(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::FormData;
    use crate::builder::PdfBuilder;
    use crate::i18n::I18n;
    use crate::signature::{SignatureMeta, SignatureSource, OPT_BOX_W_PT};
    use crate::FormError;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(FormData, PdfOptions, Option<Vec<u8>>)>>,
    }

    impl PdfBuilder for Recorder {
        fn build_pdf(
            &self,
            form_data: &FormData,
            _i18n: &I18n,
            pdf_options: &PdfOptions,
            signature_bytes: Option<&[u8]>,
        ) -> Result<Vec<u8>> {
            self.calls.lock().push((
                form_data.clone(),
                pdf_options.clone(),
                signature_bytes.map(<[u8]>::to_vec),
            ));
            Ok(b"%PDF-stub".to_vec())
        }
    }

    fn bundle(schema_json: &str, builder: Arc<dyn PdfBuilder>) -> FormBundle {
        FormBundle {
            key: "vollmacht".to_string(),
            name: "Vollmacht".to_string(),
            schema: Arc::new(FormSchema::from_json(schema_json).unwrap()),
            i18n: [("field.name", "Name")].into_iter().collect(),
            builder,
        }
    }

    const SCHEMA: &str = r#"{ "sections": [ { "key": "person", "fields": [
        { "key": "name", "label_i18n": "field.name", "required": true }
    ] } ] }"#;

    fn upload() -> Signature {
        Signature {
            bytes: vec![0xFF, 0xD8],
            meta: SignatureMeta {
                source: SignatureSource::Upload,
                size_px: Some((200, 100)),
            },
        }
    }

    #[test]
    fn test_invalid_skips_builder() {
        let recorder = Arc::new(Recorder::default());
        let bundle = bundle(SCHEMA, recorder.clone());

        let outcome = submit(&bundle, &Submission::default(), &PdfOptions::new()).unwrap();
        match outcome {
            SubmitOutcome::Invalid { labels, message } => {
                assert_eq!(labels, vec!["Name"]);
                assert_eq!(message, "Bitte Pflichtfelder ausfüllen.\n- Name");
            }
            other => panic!("Expected Invalid, got {other:?}"),
        }
        assert!(recorder.calls.lock().is_empty());
    }

    #[test]
    fn test_document_created() {
        let recorder = Arc::new(Recorder::default());
        let bundle = bundle(SCHEMA, recorder.clone());
        let submission = Submission::defaults_for(&bundle.schema).with_value("person_name", "  Alice  ");

        let outcome = submit(&bundle, &submission, &PdfOptions::new()).unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Document {
                file_name: "vollmacht.pdf".to_string(),
                bytes: b"%PDF-stub".to_vec(),
            }
        );

        let calls = recorder.calls.lock();
        assert_eq!(calls.len(), 1);
        let (form_data, options, signature) = &calls[0];
        assert_eq!(form_data["person_name"], "Alice");
        assert_eq!(form_data["stadt"], "Berlin");
        assert!(options.is_empty());
        assert_eq!(signature, &None);
    }

    #[test]
    fn test_uploaded_signature_sets_options() {
        let recorder = Arc::new(Recorder::default());
        let bundle = bundle(SCHEMA, recorder.clone());
        let mut submission = Submission::default().with_value("person_name", "Alice");
        submission.signature = Some(upload());

        submit(&bundle, &submission, &PdfOptions::new()).unwrap();

        let calls = recorder.calls.lock();
        let (_, options, signature) = &calls[0];
        assert!(options.f64(OPT_BOX_W_PT).is_some());
        assert_eq!(signature.as_deref(), Some([0xFF, 0xD8].as_slice()));
    }

    #[test]
    fn test_signature_dropped_when_not_required() {
        let recorder = Arc::new(Recorder::default());
        let schema = r#"{ "sections": [ { "key": "person", "fields": [ { "key": "name" } ] } ],
            "misc": { "signature_required": false } }"#;
        let bundle = bundle(schema, recorder.clone());
        let mut submission = Submission::default();
        submission.signature = Some(upload());

        submit(&bundle, &submission, &PdfOptions::new()).unwrap();

        let calls = recorder.calls.lock();
        let (_, options, signature) = &calls[0];
        assert!(options.is_empty());
        assert_eq!(signature, &None);
    }

    #[test]
    fn test_builder_error_propagates() {
        struct Failing;
        impl PdfBuilder for Failing {
            fn build_pdf(
                &self,
                _form_data: &FormData,
                _i18n: &I18n,
                _pdf_options: &PdfOptions,
                _signature_bytes: Option<&[u8]>,
            ) -> Result<Vec<u8>> {
                Err(FormError::BuildError("boom".to_string()))
            }
        }

        let bundle = bundle(SCHEMA, Arc::new(Failing));
        let submission = Submission::default().with_value("person_name", "Alice");
        let err = submit(&bundle, &submission, &PdfOptions::new()).unwrap_err();
        assert!(matches!(err, FormError::BuildError(ref msg) if msg == "boom"));
    }
}
