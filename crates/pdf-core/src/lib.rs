//! PDF Core - Low-level PDF assembly
//!
//! This crate provides functionality for:
//! - Creating documents with blank A4 pages
//! - Placing Helvetica text at specific coordinates
//! - Embedding images (JPEG, PNG) scaled and aligned inside a box
//! - Sniffing image dimensions and trimming whitespace around signatures
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, ImageScaleMode, PdfDocument};
//!
//! let mut doc = PdfDocument::new();
//! let page = doc.add_blank_page()?;
//! doc.set_font_size(12.0);
//! doc.insert_text("Hello, World!", page, 56.0, 72.0, Align::Left)?;
//! doc.insert_image_in_box(&png, page, 56.0, 700.0, 150.0, 50.0, ImageScaleMode::Fit, Align::Left)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod image;
mod text;

pub use document::{PdfDocument, A4_HEIGHT, A4_WIDTH};
pub use image::{
    aligned_offset, calculate_scaled_dimensions, detect_format, get_dimensions, trim_whitespace,
    ImageDimensions, ImageFormat, ImageScaleMode, ImageXObject,
};
pub use text::{encode_win_ansi, simple_word_wrap, text_width_points, unencodable_chars};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Horizontal alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_default() {
        assert_eq!(Align::default(), Align::Left);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PdfError::InvalidPage(3, 1).to_string(),
            "Invalid page number: 3 (document has 1 pages)"
        );
    }
}
