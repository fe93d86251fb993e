//! PDF builder contract and the summary builder
//!
//! The pipeline only talks to [`PdfBuilder`]. [`SummaryPdfBuilder`] is the
//! builder used when a form registers none: it lists every section with
//! `label: value` lines, the place/date line and the signature.

use crate::assembly::FormData;
use crate::config::PdfOptions;
use crate::i18n::{I18n, APP_TITLE, DEFAULT_DATUM, DEFAULT_ORT, FIELD_DATUM, FIELD_ORT};
use crate::schema::{composite_key, FormSchema};
use crate::signature::{ScaleMode, SignatureAlign, SignatureLayoutSpec};
use crate::Result;
use pdf_core::{Align, PdfDocument, A4_HEIGHT, A4_WIDTH};
use std::sync::Arc;

/// Produces document bytes for one submission
pub trait PdfBuilder: Send + Sync {
    /// Build the document
    ///
    /// # Arguments
    /// * `form_data` - Flat values keyed by composite key, `stadt`, `datum` and aliases
    /// * `i18n` - Translation table of the active language
    /// * `pdf_options` - Configuration options merged with signature options
    /// * `signature_bytes` - Captured signature image, if any
    fn build_pdf(
        &self,
        form_data: &FormData,
        i18n: &I18n,
        pdf_options: &PdfOptions,
        signature_bytes: Option<&[u8]>,
    ) -> Result<Vec<u8>>;
}

pub const OPT_TITLE: &str = "title";
pub const OPT_FONT_SIZE: &str = "font_size";
pub const OPT_MARGIN_PT: &str = "margin_pt";

pub const DEFAULT_FONT_SIZE: f64 = 11.0;

/// 2 cm
pub const DEFAULT_MARGIN_PT: f64 = 56.69;

/// Box used for drawn signatures
pub const DEFAULT_SIGNATURE_BOX: (f64, f64) = (150.0, 50.0);

const LINE_SPACING: f64 = 1.4;

/// Average Helvetica glyph width in em, used to estimate wrap width
const AVG_CHAR_EM: f64 = 0.5;

/// Layout settings read from the builder options
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOptions {
    pub title: Option<String>,
    pub font_size: f64,
    pub margin_pt: f64,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            title: None,
            font_size: DEFAULT_FONT_SIZE,
            margin_pt: DEFAULT_MARGIN_PT,
        }
    }
}

impl SummaryOptions {
    pub fn from_options(options: &PdfOptions) -> Self {
        let defaults = Self::default();
        Self {
            title: options.str(OPT_TITLE).map(str::to_string),
            font_size: options
                .f64(OPT_FONT_SIZE)
                .filter(|size| *size > 0.0)
                .unwrap_or(defaults.font_size),
            margin_pt: options
                .f64(OPT_MARGIN_PT)
                .filter(|margin| *margin >= 0.0 && *margin < A4_WIDTH / 2.0)
                .unwrap_or(defaults.margin_pt),
        }
    }
}

/// Builder listing all schema fields on A4 pages
#[derive(Debug, Clone)]
pub struct SummaryPdfBuilder {
    schema: Arc<FormSchema>,
    name: String,
    rtl: bool,
}

impl SummaryPdfBuilder {
    pub fn new(schema: Arc<FormSchema>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
            rtl: false,
        }
    }

    /// Right-align text, for right-to-left tables
    pub fn with_rtl(mut self, rtl: bool) -> Self {
        self.rtl = rtl;
        self
    }
}

/// Top-down writer that starts new pages on overflow
struct PageCursor {
    doc: PdfDocument,
    page: usize,
    y: f64,
    margin: f64,
    line_height: f64,
    rtl: bool,
}

impl PageCursor {
    fn new(margin: f64, font_size: f64, rtl: bool) -> Result<Self> {
        let mut doc = PdfDocument::new();
        doc.set_font_size(font_size as f32);
        let page = doc.add_blank_page()?;
        Ok(Self {
            doc,
            page,
            y: margin,
            margin,
            line_height: font_size * LINE_SPACING,
            rtl,
        })
    }

    fn content_width(&self) -> f64 {
        A4_WIDTH - 2.0 * self.margin
    }

    /// Reserve `height` points, breaking the page when they do not fit
    fn reserve(&mut self, height: f64) -> Result<()> {
        if self.y + height > A4_HEIGHT - self.margin && self.y > self.margin {
            self.page = self.doc.add_blank_page()?;
            self.y = self.margin;
        }
        Ok(())
    }

    fn line(&mut self, text: &str, font_size: f64) -> Result<()> {
        let height = font_size * LINE_SPACING;
        self.reserve(height)?;
        self.y += font_size;

        let (x, align) = if self.rtl {
            (A4_WIDTH - self.margin, Align::Right)
        } else {
            (self.margin, Align::Left)
        };
        self.doc.set_font_size(font_size as f32);
        self.doc.insert_text(text, self.page, x, self.y, align)?;

        self.y += height - font_size;
        Ok(())
    }

    fn wrapped(&mut self, text: &str, font_size: f64) -> Result<()> {
        let max_chars = (self.content_width() / (font_size * AVG_CHAR_EM)).floor() as usize;
        for line in pdf_core::simple_word_wrap(text, max_chars.max(1)) {
            self.line(&line, font_size)?;
        }
        Ok(())
    }

    fn gap(&mut self) {
        self.y += self.line_height / 2.0;
    }

    fn content_height(&self) -> f64 {
        A4_HEIGHT - 2.0 * self.margin
    }

    /// Shrink a box proportionally until it fits the printable area
    fn fit_box(&self, width: f64, height: f64) -> (f64, f64) {
        let scale = (self.content_width() / width)
            .min(self.content_height() / height)
            .min(1.0);
        (width * scale, height * scale)
    }

    fn image(&mut self, data: &[u8], layout: &SignatureLayoutSpec) -> Result<()> {
        let (width, height) = self.fit_box(layout.box_width_pt, layout.box_height_pt);
        self.reserve(height)?;

        let x = if self.rtl {
            A4_WIDTH - self.margin - width
        } else {
            self.margin
        };
        self.doc.insert_image_in_box(
            data,
            self.page,
            x,
            self.y,
            width,
            height,
            layout.scale_mode.into(),
            layout.align.into(),
        )?;

        self.y += height;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        Ok(self.doc.to_bytes()?)
    }
}

fn default_signature_layout() -> SignatureLayoutSpec {
    let (box_width_pt, box_height_pt) = DEFAULT_SIGNATURE_BOX;
    SignatureLayoutSpec {
        box_width_pt,
        box_height_pt,
        scale_mode: ScaleMode::Fit,
        align: SignatureAlign::Left,
        trim_whitespace: true,
    }
}

impl PdfBuilder for SummaryPdfBuilder {
    fn build_pdf(
        &self,
        form_data: &FormData,
        i18n: &I18n,
        pdf_options: &PdfOptions,
        signature_bytes: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let options = SummaryOptions::from_options(pdf_options);
        let font_size = options.font_size;
        let mut cursor = PageCursor::new(options.margin_pt, font_size, self.rtl)?;

        let title = options
            .title
            .as_deref()
            .unwrap_or_else(|| i18n.get_or(APP_TITLE, &self.name));
        cursor.wrapped(title, font_size * 1.5)?;
        cursor.gap();

        for section in &self.schema.sections {
            cursor.gap();
            cursor.wrapped(i18n.section_title(section), font_size * 1.2)?;

            for field in &section.fields {
                let key = composite_key(&section.key, &field.key);
                let value = form_data.get(&key).map(String::as_str).unwrap_or_default();
                cursor.wrapped(&format!("{}: {}", i18n.label_for(field), value), font_size)?;
            }
        }

        let value = |key: &str| form_data.get(key).map(String::as_str).unwrap_or_default();
        cursor.gap();
        cursor.gap();
        cursor.wrapped(
            &format!(
                "{}: {}, {}: {}",
                i18n.get_or(FIELD_ORT, DEFAULT_ORT),
                value("stadt"),
                i18n.get_or(FIELD_DATUM, DEFAULT_DATUM),
                value("datum"),
            ),
            font_size,
        )?;

        if let Some(bytes) = signature_bytes.filter(|bytes| !bytes.is_empty()) {
            let layout =
                SignatureLayoutSpec::from_options(pdf_options).unwrap_or_else(default_signature_layout);
            let image = if layout.trim_whitespace {
                pdf_core::trim_whitespace(bytes)?
            } else {
                bytes.to_vec()
            };
            cursor.gap();
            cursor.image(&image, &layout)?;
        }

        cursor.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> Arc<FormSchema> {
        Arc::new(
            FormSchema::from_json(
                r#"{ "sections": [ { "key": "person", "title_i18n": "section.person", "fields": [
                    { "key": "name", "label_i18n": "field.name", "required": true },
                    { "key": "email" }
                ] } ] }"#,
            )
            .unwrap(),
        )
    }

    fn content(bytes: &[u8]) -> String {
        let doc = lopdf::Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|id| String::from_utf8_lossy(&doc.get_page_content(*id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn test_summary_options() {
        let options: PdfOptions =
            serde_json::from_value(json!({ "font_size": 9, "margin_pt": -1, "title": "T" })).unwrap();
        let summary = SummaryOptions::from_options(&options);
        assert_eq!(summary.font_size, 9.0);
        assert_eq!(summary.margin_pt, DEFAULT_MARGIN_PT);
        assert_eq!(summary.title.as_deref(), Some("T"));
        assert_eq!(SummaryOptions::from_options(&PdfOptions::new()), SummaryOptions::default());
    }

    #[test]
    fn test_renders_labels_and_values() {
        let builder = SummaryPdfBuilder::new(schema(), "Testformular");
        let i18n: I18n = [("field.name", "Name"), ("section.person", "Person")]
            .into_iter()
            .collect();
        let form_data: FormData = [
            ("person_name".to_string(), "Alice".to_string()),
            ("stadt".to_string(), "Berlin".to_string()),
            ("datum".to_string(), "01.02.2024".to_string()),
        ]
        .into_iter()
        .collect();

        let bytes = builder
            .build_pdf(&form_data, &i18n, &PdfOptions::new(), None)
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let text = content(&bytes);
        assert!(text.contains("(Testformular) Tj"));
        assert!(text.contains("(Person) Tj"));
        assert!(text.contains("(Name: Alice) Tj"));
        // word wrapping drops the trailing space of an empty value
        assert!(text.contains("(email:) Tj"));
        assert!(text.contains("(Ort: Berlin, Datum: 01.02.2024) Tj"));
        assert!(!text.contains(" Do"));
    }

    #[test]
    fn test_title_option_wins() {
        let builder = SummaryPdfBuilder::new(schema(), "Testformular");
        let i18n: I18n = [(APP_TITLE, "Vollmacht")].into_iter().collect();
        let mut options = PdfOptions::new();
        options.insert(OPT_TITLE, "Override");

        let text = content(
            &builder
                .build_pdf(&FormData::new(), &i18n, &options, None)
                .unwrap(),
        );
        assert!(text.contains("(Override) Tj"));
        assert!(!text.contains("(Vollmacht) Tj"));
    }

    #[test]
    fn test_long_forms_break_pages() {
        let fields: Vec<String> = (0..80)
            .map(|i| format!(r#"{{ "key": "f{i}" }}"#))
            .collect();
        let json = format!(
            r#"{{ "sections": [ {{ "key": "s", "fields": [ {} ] }} ] }}"#,
            fields.join(",")
        );
        let builder = SummaryPdfBuilder::new(Arc::new(FormSchema::from_json(&json).unwrap()), "x");

        let bytes = builder
            .build_pdf(&FormData::new(), &I18n::new(), &PdfOptions::new(), None)
            .unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    fn signature_png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// `(x, y, width, height)` of every image placement, in PDF coordinates
    fn image_placements(bytes: &[u8]) -> Vec<(f64, f64, f64, f64)> {
        content(bytes)
            .lines()
            .filter(|line| line.ends_with(" cm"))
            .map(|line| {
                let n: Vec<f64> = line
                    .split_whitespace()
                    .take(6)
                    .map(|part| part.parse().unwrap())
                    .collect();
                (n[4], n[5], n[0], n[3])
            })
            .collect()
    }

    #[test]
    fn test_tall_signature_stays_on_page() {
        let builder = SummaryPdfBuilder::new(schema(), "x");
        // 10 cm wide, ratio 1:4
        let layout = SignatureLayoutSpec {
            box_width_pt: 283.465,
            box_height_pt: 1133.86,
            scale_mode: ScaleMode::Stretch,
            align: SignatureAlign::Left,
            trim_whitespace: false,
        };

        let bytes = builder
            .build_pdf(
                &FormData::new(),
                &I18n::new(),
                &layout.to_options(),
                Some(signature_png(100, 400).as_slice()),
            )
            .unwrap();

        let placements = image_placements(&bytes);
        assert_eq!(placements.len(), 1);
        let (x, y, width, height) = placements[0];
        assert!(x >= DEFAULT_MARGIN_PT - 0.01, "x = {x}");
        assert!(y >= DEFAULT_MARGIN_PT - 0.01, "y = {y}");
        assert!(x + width <= A4_WIDTH - DEFAULT_MARGIN_PT + 0.01);
        assert!(y + height <= A4_HEIGHT - DEFAULT_MARGIN_PT + 0.01);
        // proportions survive the shrink
        assert!((height / width - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_wide_signature_is_scaled_proportionally() {
        let cursor = PageCursor::new(DEFAULT_MARGIN_PT, DEFAULT_FONT_SIZE, false).unwrap();
        let (width, height) = cursor.fit_box(cursor.content_width() * 2.0, 100.0);
        assert!((width - cursor.content_width()).abs() < 1e-9);
        assert!((height - 50.0).abs() < 1e-9);
        assert_eq!(cursor.fit_box(150.0, 50.0), (150.0, 50.0));
    }

    #[test]
    fn test_invalid_signature_is_error() {
        let builder = SummaryPdfBuilder::new(schema(), "x");
        let result = builder.build_pdf(
            &FormData::new(),
            &I18n::new(),
            &PdfOptions::new(),
            Some(b"garbage".as_slice()),
        );
        assert!(result.is_err());
    }
}
