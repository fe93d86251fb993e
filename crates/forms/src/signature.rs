//! Signature box geometry
//!
//! Converts the user's size preferences for an uploaded signature into the
//! point-based box the PDF builder reads from its options. Drawn signatures
//! have no size controls and use the builder's default box.

use crate::config::PdfOptions;
use crate::schema::FormSchema;
use pdf_core::{Align, ImageScaleMode};
use serde::{Deserialize, Serialize};

/// Points per centimeter
pub const CM_TO_PT: f64 = 28.3465;

/// Smallest accepted box edge in centimeters
pub const MIN_CM: f64 = 0.5;

/// Largest accepted box edge in centimeters
pub const MAX_CM: f64 = 20.0;

pub const DEFAULT_WIDTH_CM: f64 = 2.0;
pub const DEFAULT_HEIGHT_CM: f64 = 3.0;

pub const OPT_BOX_W_PT: &str = "signature_box_w_pt";
pub const OPT_BOX_H_PT: &str = "signature_box_h_pt";
pub const OPT_SCALE_MODE: &str = "signature_scale_mode";
pub const OPT_ALIGN: &str = "signature_align";
pub const OPT_TRIM: &str = "signature_trim";

/// How the signature was captured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureSource {
    #[default]
    Draw,
    Upload,
}

/// Capture metadata accompanying signature bytes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureMeta {
    pub source: SignatureSource,
    /// Pixel size `(width, height)` of an uploaded image, when known
    #[serde(default)]
    pub size_px: Option<(u32, u32)>,
}

impl SignatureMeta {
    pub fn drawn() -> Self {
        Self {
            source: SignatureSource::Draw,
            size_px: None,
        }
    }

    /// Metadata for an uploaded image, sized from its header
    pub fn sniff_upload(bytes: &[u8]) -> Self {
        let size_px = pdf_core::get_dimensions(bytes)
            .ok()
            .map(|dims| (dims.width, dims.height));
        Self {
            source: SignatureSource::Upload,
            size_px,
        }
    }
}

/// Captured signature image
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub bytes: Vec<u8>,
    pub meta: SignatureMeta,
}

impl Signature {
    pub fn drawn(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            meta: SignatureMeta::drawn(),
        }
    }

    pub fn uploaded(bytes: Vec<u8>) -> Self {
        let meta = SignatureMeta::sniff_upload(&bytes);
        Self { bytes, meta }
    }
}

/// Image scaling inside the signature box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    #[default]
    Fit,
    Stretch,
}

impl ScaleMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::Stretch => "stretch",
        }
    }
}

impl From<ScaleMode> for ImageScaleMode {
    fn from(mode: ScaleMode) -> Self {
        match mode {
            ScaleMode::Fit => ImageScaleMode::Fit,
            ScaleMode::Stretch => ImageScaleMode::Stretch,
        }
    }
}

/// Horizontal placement inside the signature box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignatureAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl SignatureAlign {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Center => "CENTER",
            Self::Right => "RIGHT",
        }
    }
}

impl From<SignatureAlign> for Align {
    fn from(align: SignatureAlign) -> Self {
        match align {
            SignatureAlign::Left => Align::Left,
            SignatureAlign::Center => Align::Center,
            SignatureAlign::Right => Align::Right,
        }
    }
}

/// Size preferences entered next to an uploaded signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignaturePrefs {
    pub keep_aspect_ratio: bool,
    pub width_cm: f64,
    pub height_cm: f64,
    pub scale_mode: ScaleMode,
    pub align: SignatureAlign,
    pub trim_whitespace: bool,
}

impl Default for SignaturePrefs {
    fn default() -> Self {
        Self {
            keep_aspect_ratio: true,
            width_cm: DEFAULT_WIDTH_CM,
            height_cm: DEFAULT_HEIGHT_CM,
            scale_mode: ScaleMode::Fit,
            align: SignatureAlign::Left,
            trim_whitespace: true,
        }
    }
}

/// Resolved signature box, in points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureLayoutSpec {
    pub box_width_pt: f64,
    pub box_height_pt: f64,
    pub scale_mode: ScaleMode,
    pub align: SignatureAlign,
    pub trim_whitespace: bool,
}

impl SignatureLayoutSpec {
    /// Builder options carrying this layout
    pub fn to_options(&self) -> PdfOptions {
        let mut options = PdfOptions::new();
        options.insert(OPT_BOX_W_PT, self.box_width_pt);
        options.insert(OPT_BOX_H_PT, self.box_height_pt);
        options.insert(OPT_SCALE_MODE, self.scale_mode.as_str());
        options.insert(OPT_ALIGN, self.align.as_str());
        options.insert(OPT_TRIM, self.trim_whitespace);
        options
    }

    /// Layout stored in builder options
    ///
    /// `None` unless both box dimensions are present and positive; the other
    /// keys fall back to their defaults.
    pub fn from_options(options: &PdfOptions) -> Option<Self> {
        let box_width_pt = options.f64(OPT_BOX_W_PT).filter(|w| *w > 0.0)?;
        let box_height_pt = options.f64(OPT_BOX_H_PT).filter(|h| *h > 0.0)?;
        Some(Self {
            box_width_pt,
            box_height_pt,
            scale_mode: options.parse(OPT_SCALE_MODE).unwrap_or_default(),
            align: options.parse(OPT_ALIGN).unwrap_or_default(),
            trim_whitespace: options.bool(OPT_TRIM).unwrap_or(true),
        })
    }
}

fn clamp_cm(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_CM;
    }
    value.clamp(MIN_CM, MAX_CM)
}

/// Whether the height follows the image ratio instead of the height input
pub fn height_is_derived(meta: &SignatureMeta, prefs: &SignaturePrefs) -> bool {
    prefs.keep_aspect_ratio && matches!(meta.size_px, Some((w, h)) if w > 0 && h > 0)
}

/// Signature box for the captured signature
///
/// `None` for drawn signatures. For uploads the width is clamped to
/// `[MIN_CM, MAX_CM]`; with the ratio lock and a known image size the height
/// is `width * h / w`, otherwise the clamped height input.
pub fn resolve_layout(meta: &SignatureMeta, prefs: &SignaturePrefs) -> Option<SignatureLayoutSpec> {
    if meta.source != SignatureSource::Upload {
        return None;
    }

    let width_cm = clamp_cm(prefs.width_cm);
    let height_cm = match meta.size_px {
        Some((w, h)) if height_is_derived(meta, prefs) => width_cm * (h as f64 / w as f64),
        _ => clamp_cm(prefs.height_cm),
    };

    Some(SignatureLayoutSpec {
        box_width_pt: width_cm * CM_TO_PT,
        box_height_pt: height_cm * CM_TO_PT,
        scale_mode: prefs.scale_mode,
        align: prefs.align,
        trim_whitespace: prefs.trim_whitespace,
    })
}

/// Signature options for one submission
///
/// Empty when the form takes no signature, nothing was captured, or the
/// signature was drawn.
pub fn signature_options(
    schema: &FormSchema,
    signature: Option<&Signature>,
    prefs: &SignaturePrefs,
) -> PdfOptions {
    if !schema.misc.signature_required {
        return PdfOptions::new();
    }

    signature
        .filter(|sig| !sig.bytes.is_empty())
        .and_then(|sig| resolve_layout(&sig.meta, prefs))
        .map(|layout| layout.to_options())
        .unwrap_or_default()
}
