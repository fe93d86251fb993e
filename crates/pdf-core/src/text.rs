//! Text rendering utilities
//!
//! Text is drawn with the base-14 Helvetica font in WinAnsi encoding, so no
//! font program has to be embedded. Characters outside Latin-1 cannot be
//! shown and are replaced by `?`.

use crate::Align;

/// Resource name under which Helvetica is registered on every page
pub const FONT_RESOURCE: &str = "F1";

/// Helvetica advance widths (1/1000 em) for the printable ASCII range 0x20..=0x7E
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Width used for Latin-1 supplement characters
const DEFAULT_WIDTH: u16 = 556;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text width in points (for alignment)
    pub text_width: f64,
}

/// Encode text as WinAnsi bytes
///
/// WinAnsi agrees with Latin-1 for 0x20..=0x7E and 0xA0..=0xFF, which is
/// enough for German text. Anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}

/// Number of characters [`encode_win_ansi`] replaces by `?`
pub fn unencodable_chars(text: &str) -> usize {
    text.chars()
        .filter(|ch| !matches!(*ch as u32, 0x20..=0x7E | 0xA0..=0xFF))
        .count()
}

/// Width of text in points when set in Helvetica at `font_size`
pub fn text_width_points(text: &str, font_size: f32) -> f64 {
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|byte| match byte {
            0x20..=0x7E => HELVETICA_ASCII_WIDTHS[(byte - 0x20) as usize] as u32,
            _ => DEFAULT_WIDTH as u32,
        })
        .sum();
    units as f64 * font_size as f64 / 1000.0
}

/// Escape a byte string for use inside a PDF literal string `( ... )`
fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'(');
    for &byte in bytes {
        if matches!(byte, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out.push(b')');
    out
}

/// Generate PDF operators for text insertion
///
/// # Arguments
/// * `text` - Text to show (encoded to WinAnsi here)
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Y coordinate in points (PDF coordinates, from bottom)
/// * `align` - Text alignment relative to `x`
/// * `ctx` - Text rendering context
pub fn generate_text_operators(
    text: &str,
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let x_offset = match align {
        Align::Left => 0.0,
        Align::Center => -ctx.text_width / 2.0,
        Align::Right => -ctx.text_width,
    };
    let final_x = x + x_offset;

    let mut ops = Vec::new();
    ops.extend_from_slice(b"BT\n");
    ops.extend_from_slice(format!("/{} {} Tf\n", ctx.font_name, ctx.font_size).as_bytes());
    ops.extend_from_slice(format!("{final_x} {y} Td\n").as_bytes());
    ops.extend_from_slice(&escape_literal(&encode_win_ansi(text)));
    ops.extend_from_slice(b" Tj\nET\n");
    ops
}

/// Split text into lines based on maximum width
///
/// Splits on whitespace and keeps explicit line breaks; words longer than
/// `max_chars` stay on their own line.
pub fn simple_word_wrap(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current_line = String::new();

        for word in paragraph.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.chars().count() + 1 + word.chars().count() <= max_chars {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line = word.to_string();
            }
        }

        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}
