//! WASM bindings for formpdf
//!
//! This crate provides JavaScript-friendly API for:
//! - Loading a form schema and its translation table
//! - Listing localized fields and validating required ones
//! - Computing the signature box for uploaded signatures
//! - Rendering the filled form to PDF
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { FormSession, SignatureImage } from 'formpdf-wasm';
//!
//! await init();
//!
//! const session = FormSession.fromJson('vollmacht', schemaJson, deJson);
//! for (const field of session.fields()) {
//!   console.log(field.key, field.label, field.required);
//! }
//!
//! const missing = session.validate({ vg_name: 'Muster' });
//!
//! const meta = { source: 'upload', size_px: SignatureImage.size(sigBytes) };
//! const pdf = session.render(values, 'Berlin', '01.02.2024', configJson, sigBytes, meta, { width_cm: 4 });
//! ```

use forms::{
    FormBinder, FormBundle, FormSchema, I18n, Lang, SetupConfig, Signature,
    SignatureMeta, SignaturePrefs, SubmitOutcome, Submission, SummaryPdfBuilder,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Deserialize an optional JS value, `undefined` and `null` giving the default
fn from_js_or_default<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_wasm_bindgen::from_value(value)?)
}

/// One form with its translation table
#[wasm_bindgen]
pub struct FormSession {
    bundle: FormBundle,
}

#[wasm_bindgen]
impl FormSession {
    /// Create a session from schema and i18n JSON
    ///
    /// @param key - Form key, used for the download name
    /// @param schemaJson - Contents of schema.json
    /// @param i18nJson - Translation table (may be empty)
    /// @param lang - Language code of the table ("de", "ar", "en")
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(
        key: &str,
        schema_json: &str,
        i18n_json: Option<String>,
        lang: Option<String>,
    ) -> Result<FormSession, JsValue> {
        let schema = Arc::new(FormSchema::from_json(schema_json).map_err(to_js_error)?);
        let i18n = match i18n_json.as_deref().map(str::trim) {
            Some(json) if !json.is_empty() => I18n::from_json(json).map_err(to_js_error)?,
            _ => I18n::new(),
        };
        let lang = lang.as_deref().and_then(Lang::parse).unwrap_or_default();

        let name = schema.name.clone().unwrap_or_else(|| key.to_string());
        let builder =
            SummaryPdfBuilder::new(Arc::clone(&schema), name.clone()).with_rtl(lang.is_rtl());

        Ok(FormSession {
            bundle: FormBundle {
                key: key.to_string(),
                name,
                schema,
                i18n,
                builder: Arc::new(builder),
            },
        })
    }

    /// Form display name
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.bundle.name.clone()
    }

    /// Pre-filled city
    #[wasm_bindgen(getter, js_name = stadtDefault)]
    pub fn stadt_default(&self) -> String {
        self.bundle.schema.misc.stadt_default().to_string()
    }

    /// Whether the signature step is shown
    #[wasm_bindgen(getter, js_name = signatureRequired)]
    pub fn signature_required(&self) -> bool {
        self.bundle.schema.misc.signature_required
    }

    /// Localized UI string
    ///
    /// @param key - i18n key
    /// @param fallback - Returned when the key is missing
    pub fn t(&self, key: &str, fallback: &str) -> String {
        self.bundle.i18n.get_or(key, fallback).to_string()
    }

    /// Fields in display order
    ///
    /// @returns Array of { key, section_key, section_title, label, placeholder, kind, required }
    pub fn fields(&self) -> Result<JsValue, JsValue> {
        let fields = FormBinder::new(&self.bundle.schema, &self.bundle.i18n).fields();
        Ok(serde_wasm_bindgen::to_value(&fields)?)
    }

    /// Labels of required fields left empty
    ///
    /// @param values - Object of composite key -> string
    /// @returns Array of labels (empty when complete)
    pub fn validate(&self, values: JsValue) -> Result<js_sys::Array, JsValue> {
        let raw: HashMap<String, String> = from_js_or_default(values)?;
        let bound = FormBinder::new(&self.bundle.schema, &self.bundle.i18n).bind(&raw);
        let labels = forms::validate_required(&bound, &self.bundle.schema, &self.bundle.i18n);
        Ok(labels.into_iter().map(JsValue::from).collect())
    }

    /// Signature box for an uploaded signature
    ///
    /// @param meta - { source: "draw" | "upload", size_px: [w, h] | null }
    /// @param prefs - Size preferences; missing keys use defaults
    /// @returns Layout in points, or null for drawn signatures
    #[wasm_bindgen(js_name = signatureLayout)]
    pub fn signature_layout(&self, meta: JsValue, prefs: JsValue) -> Result<JsValue, JsValue> {
        let meta: SignatureMeta = from_js_or_default(meta)?;
        let prefs: SignaturePrefs = from_js_or_default(prefs)?;
        match forms::resolve_layout(&meta, &prefs) {
            Some(layout) => Ok(serde_wasm_bindgen::to_value(&layout)?),
            None => Ok(JsValue::NULL),
        }
    }

    /// Render the filled form
    ///
    /// Throws with the localized missing-field message when required fields
    /// are empty.
    ///
    /// @param values - Object of composite key -> string
    /// @param stadt - Place
    /// @param datum - Date
    /// @param configJson - Contents of setup-config.json (optional)
    /// @param signature - Signature image bytes (optional)
    /// @param meta - Signature metadata (optional, defaults to drawn)
    /// @param prefs - Signature size preferences (optional)
    /// @returns PDF bytes (Uint8Array)
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        values: JsValue,
        stadt: &str,
        datum: &str,
        config_json: Option<String>,
        signature: Option<Vec<u8>>,
        meta: JsValue,
        prefs: JsValue,
    ) -> Result<Vec<u8>, JsValue> {
        let config = match config_json.as_deref().map(str::trim) {
            Some(json) if !json.is_empty() => SetupConfig::from_json(json).map_err(to_js_error)?,
            _ => SetupConfig::default(),
        };

        let meta: SignatureMeta = from_js_or_default(meta)?;
        let submission = Submission {
            values: from_js_or_default(values)?,
            stadt: stadt.to_string(),
            datum: datum.to_string(),
            signature: signature.map(|bytes| Signature { bytes, meta }),
            prefs: from_js_or_default(prefs)?,
        };

        match forms::submit(&self.bundle, &submission, &config.pdf_options).map_err(to_js_error)? {
            SubmitOutcome::Document { bytes, .. } => Ok(bytes),
            SubmitOutcome::Invalid { message, .. } => Err(JsValue::from_str(&message)),
        }
    }

    /// Download name for rendered documents
    #[wasm_bindgen(js_name = fileName)]
    pub fn file_name(&self) -> String {
        self.bundle.file_name()
    }
}

/// Signature image helpers for previews
#[wasm_bindgen]
pub struct SignatureImage;

#[wasm_bindgen]
impl SignatureImage {
    /// Pixel size of a JPEG or PNG
    ///
    /// @param data - Image bytes (Uint8Array)
    /// @returns [width, height], or null when the header is unreadable
    pub fn size(data: &[u8]) -> JsValue {
        match pdf_core::get_dimensions(data) {
            Ok(dims) => {
                js_sys::Array::of2(&JsValue::from(dims.width), &JsValue::from(dims.height)).into()
            }
            Err(_) => JsValue::NULL,
        }
    }

    /// Crop near-white borders
    ///
    /// @param data - Image bytes (Uint8Array)
    /// @returns PNG bytes
    pub fn trim(data: &[u8]) -> Result<Vec<u8>, JsValue> {
        pdf_core::trim_whitespace(data).map_err(to_js_error)
    }
}

/// Builder options for a signature layout, as a plain object
///
/// @param layout - Result of `FormSession.signatureLayout`, or null
#[wasm_bindgen(js_name = signatureOptions)]
pub fn signature_options(layout: JsValue) -> Result<JsValue, JsValue> {
    if layout.is_null() || layout.is_undefined() {
        return Ok(js_sys::Object::new().into());
    }
    let layout: forms::SignatureLayoutSpec = serde_wasm_bindgen::from_value(layout)?;
    // serde-wasm-bindgen turns maps into `Map`; go through JSON for a plain object
    let json = serde_json::to_string(&layout.to_options()).map_err(to_js_error)?;
    js_sys::JSON::parse(&json)
}
