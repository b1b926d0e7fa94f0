//! Signature image attached to inventory submissions.
//!
//! The rep's name is drawn in black on a white 650x114 canvas using an 8x8
//! bitmap font, then encoded as PNG.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{ImageFormat, Rgb, RgbImage};

use crate::error::Result;

pub const SIGNATURE_WIDTH: u32 = 650;
pub const SIGNATURE_HEIGHT: u32 = 114;

/// Top-left corner of the first glyph.
const TEXT_ORIGIN: (u32, u32) = (10, 40);

/// Each font pixel becomes a square of this many image pixels.
const GLYPH_SCALE: u32 = 2;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

fn glyph(c: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
}

/// Draws `"{first} {last}"` on a blank canvas. Text past the right edge is cut.
pub fn render_signature(first: &str, last: &str) -> RgbImage {
    let mut img = RgbImage::from_pixel(SIGNATURE_WIDTH, SIGNATURE_HEIGHT, WHITE);
    let text = format!("{} {}", first.trim(), last.trim());
    let advance = 8 * GLYPH_SCALE;

    let (mut x, y) = TEXT_ORIGIN;
    for c in text.trim().chars() {
        if x + advance > SIGNATURE_WIDTH {
            break;
        }
        if let Some(rows) = glyph(c) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..8u32 {
                    if bits & (1 << col) != 0 {
                        let px = x + col * GLYPH_SCALE;
                        let py = y + row as u32 * GLYPH_SCALE;
                        for dy in 0..GLYPH_SCALE {
                            for dx in 0..GLYPH_SCALE {
                                img.put_pixel(px + dx, py + dy, BLACK);
                            }
                        }
                    }
                }
            }
        }
        x += advance;
    }
    img
}

/// The signature as PNG bytes.
pub fn signature_png(first: &str, last: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    render_signature(first, last).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// The signature as base64-encoded PNG, the form's upload format.
pub fn signature_base64(first: &str, last: &str) -> Result<String> {
    Ok(STANDARD.encode(signature_png(first, last)?))
}
