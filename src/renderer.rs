//! # Receipt Renderer Module
//!
//! Composites the formatted receipt fields onto a copy of the background
//! template at the layout's fixed coordinates. The renderer is stateless
//! and reentrant: it never mutates the stored template and owns no shared
//! raster, so concurrent renders are safe without locks.

use chrono::{DateTime, Local};
use image::{Rgba, RgbaImage};
use rusttype::{point, Scale};
use thiserror::Error;

use crate::fonts::{builtin_glyph, FontHandle, FontResolver, BUILTIN_ADVANCE, BUILTIN_SCALE};
use crate::formatter;
use crate::layout::{layout_spec, LayoutVariant, FONT_SIZE_PX, TEXT_COLOR};
use crate::templates::{TemplateError, TemplateStore};

/// A validated receipt request, constructed per inbound message.
///
/// The parser guarantees the required fields are non-empty and the amount
/// is numeric before this reaches the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptRequest {
    pub recipient_name: String,
    pub amount: String,
    pub phone_number: String,
    pub variant: LayoutVariant,
    /// Required iff `variant` is [`LayoutVariant::KeyedAlias`].
    pub alias_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template unavailable: {0}")]
    Template(#[from] TemplateError),
    #[error("formatting failed: {0}")]
    Format(#[from] formatter::FormatError),
}

/// Compose a receipt raster for `request`.
///
/// The clock is passed in so the timestamp and reference code are
/// deterministic for a given instant.
pub fn render(
    request: &ReceiptRequest,
    templates: &TemplateStore,
    fonts: &FontResolver,
    now: DateTime<Local>,
) -> Result<RgbaImage, RenderError> {
    // Work on a copy so the stored original stays untouched.
    let mut img = templates.template(request.variant)?.clone();

    // One font handle at the fixed display size for every field.
    let font = fonts.resolve(FONT_SIZE_PX);
    let spec = layout_spec(request.variant);
    let color = Rgba([TEXT_COLOR[0], TEXT_COLOR[1], TEXT_COLOR[2], 255]);

    let include_symbol = request.variant == LayoutVariant::Standard;
    let amount = formatter::format_currency(&request.amount, include_symbol)?;
    let phone = formatter::format_phone(&request.phone_number);
    let date = formatter::format_timestamp_es(&now)?;
    let reference = formatter::generate_reference(&now);

    draw_text(&mut img, &font, spec.name, color, &request.recipient_name);
    draw_text(&mut img, &font, spec.amount, color, &amount);
    draw_text(&mut img, &font, spec.phone, color, &phone);
    draw_text(&mut img, &font, spec.date, color, &date);
    draw_text(&mut img, &font, spec.reference, color, &reference);

    if let (Some(coord), Some(alias)) = (spec.alias_key, request.alias_key.as_deref()) {
        draw_text(&mut img, &font, coord, color, &clean_alias_key(alias));
    }

    Ok(img)
}

/// Strip surrounding quote/backtick characters and whitespace from an
/// alias key before rendering.
pub fn clean_alias_key(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
        .trim()
        .to_string()
}

/// Draw `text` with its top-left corner at `(x, y)`.
fn draw_text(img: &mut RgbaImage, font: &FontHandle, (x, y): (i32, i32), color: Rgba<u8>, text: &str) {
    match font {
        FontHandle::Truetype { font, size_px } => {
            draw_truetype(img, font, *size_px, x, y, color, text)
        }
        FontHandle::Builtin => draw_builtin(img, x, y, color, text),
    }
}

fn draw_truetype(
    img: &mut RgbaImage,
    font: &rusttype::Font<'static>,
    size_px: f32,
    x: i32,
    y: i32,
    color: Rgba<u8>,
    text: &str,
) {
    let scale = Scale::uniform(size_px);
    let v_metrics = font.v_metrics(scale);
    // Coordinates address the top-left corner; rusttype positions glyphs
    // on the baseline.
    let baseline_y = y as f32 + v_metrics.ascent;
    let mut caret_x = x as f32;

    for ch in text.chars() {
        let glyph = font.glyph(ch).scaled(scale).positioned(point(caret_x, baseline_y));
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 {
                    return;
                }
                blend_pixel(img, px as u32, py as u32, color, coverage);
            });
        }
        caret_x += glyph.unpositioned().h_metrics().advance_width;
    }
}

fn draw_builtin(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, text: &str) {
    let mut caret_x = x;
    for ch in text.chars() {
        let columns = builtin_glyph(ch);
        for (col, bits) in columns.iter().enumerate() {
            for row in 0..7u32 {
                if bits & (1u8 << row) == 0 {
                    continue;
                }
                let base_x = caret_x + (col as u32 * BUILTIN_SCALE) as i32;
                let base_y = y + (row * BUILTIN_SCALE) as i32;
                for dx in 0..BUILTIN_SCALE {
                    for dy in 0..BUILTIN_SCALE {
                        let px = base_x + dx as i32;
                        let py = base_y + dy as i32;
                        if px < 0 || py < 0 {
                            continue;
                        }
                        blend_pixel(img, px as u32, py as u32, color, 1.0);
                    }
                }
            }
        }
        caret_x += BUILTIN_ADVANCE as i32;
    }
}

fn blend_pixel(img: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>, coverage: f32) {
    if x >= img.width() || y >= img.height() {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let dst = img.get_pixel_mut(x, y);
    let inv = 1.0 - alpha;
    dst.0[0] = (color.0[0] as f32 * alpha + dst.0[0] as f32 * inv) as u8;
    dst.0[1] = (color.0[1] as f32 * alpha + dst.0[1] as f32 * inv) as u8;
    dst.0[2] = (color.0[2] as f32 * alpha + dst.0[2] as f32 * inv) as u8;
    dst.0[3] = 255;
}
