use std::collections::HashMap;

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use egui::Color32;
use image::{Rgba, RgbaImage};

use crate::element::{Element, TextAlign, TextElement, parse_hex_color};
use crate::element::text::LINE_HEIGHT;
use crate::error::{EditorError, EditorResult};

/// Horizontal shear applied to fake italics
const ITALIC_SHEAR: f32 = 0.2;

/// Fonts available to the rasterizer, looked up by family name.
///
/// The first registered font doubles as the fallback for unknown families.
#[derive(Default)]
pub struct FontBook {
    fonts: HashMap<String, FontArc>,
    fallback: Option<FontArc>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, family: &str, bytes: Vec<u8>) -> EditorResult<()> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|_| EditorError::InvalidState(format!("font data for {} is invalid", family)))?;
        if self.fallback.is_none() {
            self.fallback = Some(font.clone());
        }
        self.fonts.insert(family.to_lowercase(), font);
        log::debug!("registered font {}", family);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.fallback.is_none()
    }

    pub fn resolve(&self, family: &str) -> Option<&FontArc> {
        self.fonts.get(&family.to_lowercase()).or(self.fallback.as_ref())
    }
}

/// Lay out one line, returning glyph ids with their x offsets and the line width
fn layout_line(font: &FontArc, line: &str, font_size: f32) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(font_size);
    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last_glyph: Option<GlyphId> = None;
    for ch in line.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, cursor_x));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }
    (glyphs, cursor_x)
}

fn embolden(text: &TextElement) -> f32 {
    if text.bold { (text.font_size / 24.0).max(1.0) } else { 0.0 }
}

/// Width of the widest line once painted, glyph overhang and fake styles included
pub fn measure(text: &TextElement, font: &FontArc) -> f32 {
    let ascent = font.as_scaled(text.font_size).ascent();
    let mut widest = 0.0f32;
    for line in text.lines() {
        let (glyphs, advance) = layout_line(font, line, text.font_size);
        let ink = glyphs
            .into_iter()
            .filter_map(|(glyph_id, x)| font.outline_glyph(glyph_id.with_scale_and_position(text.font_size, point(x, ascent))))
            .map(|outlined| outlined.px_bounds().max.x)
            .fold(0.0f32, f32::max);
        widest = widest.max(advance).max(ink);
    }
    widest += embolden(text);
    if text.italic {
        widest += ascent * ITALIC_SHEAR;
    }
    widest.ceil().max(1.0)
}

fn put(buffer: &mut RgbaImage, x: i32, y: i32, color: Color32, coverage: f32) {
    if x < 0 || y < 0 || x >= buffer.width() as i32 || y >= buffer.height() as i32 {
        return;
    }
    let alpha = (coverage.clamp(0.0, 1.0) * color.a() as f32).round() as u8;
    let pixel = buffer.get_pixel_mut(x as u32, y as u32);
    if alpha > pixel[3] {
        *pixel = Rgba([color.r(), color.g(), color.b(), alpha]);
    }
}

/// Rasterize a text object into a buffer the size of its local box
pub fn rasterize(text: &TextElement, font: &FontArc) -> RgbaImage {
    let size = text.size();
    let width = size.x.ceil().max(1.0) as u32;
    let height = size.y.ceil().max(1.0) as u32;
    let mut buffer = RgbaImage::new(width, height);
    let color = parse_hex_color(&text.fill).unwrap_or(Color32::BLACK);

    let scaled = font.as_scaled(text.font_size);
    let ascent = scaled.ascent();
    let line_height = text.font_size * LINE_HEIGHT;
    let embolden = embolden(text);

    for (index, line) in text.lines().enumerate() {
        let (glyphs, line_width) = layout_line(font, line, text.font_size);
        let offset = match text.align {
            TextAlign::Left | TextAlign::Justify => 0.0,
            TextAlign::Center => (width as f32 - line_width) / 2.0,
            TextAlign::Right => width as f32 - line_width,
        };
        let baseline = index as f32 * line_height + ascent;

        for (glyph_id, x) in glyphs {
            let glyph = glyph_id.with_scale_and_position(text.font_size, point(offset + x, baseline));
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let py = bounds.min.y + gy as f32;
                let shear = if text.italic { (baseline - py) * ITALIC_SHEAR } else { 0.0 };
                let px = bounds.min.x + gx as f32 + shear;
                put(&mut buffer, px as i32, py as i32, color, coverage);
                if embolden > 0.0 {
                    put(&mut buffer, (px + embolden) as i32, py as i32, color, coverage);
                }
            });
        }

        if text.underline {
            let thickness = (text.font_size / 15.0).max(1.0) as i32;
            let y = (baseline + text.font_size * 0.1) as i32;
            for dy in 0..thickness {
                for x in offset.max(0.0) as i32..(offset + line_width) as i32 {
                    put(&mut buffer, x, y + dy, color, 1.0);
                }
            }
        }
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Transform;
    use crate::id_generator::ObjectId;

    fn font() -> FontArc {
        FontArc::try_from_slice(epaint_default_fonts::UBUNTU_LIGHT).unwrap()
    }

    fn text(content: &str) -> TextElement {
        TextElement::new(ObjectId(1), content, "Ubuntu", 40.0, "#000000", Transform::default())
    }

    #[test]
    fn measure_covers_wide_glyphs() {
        let font = font();
        let wide = text("WWWWWWWW");
        let (_, advance) = layout_line(&font, "WWWWWWWW", 40.0);
        let width = measure(&wide, &font);
        assert!(width >= advance, "{} < {}", width, advance);
        // The character-count estimate undershoots this line
        assert!(width > wide.size().x);
    }

    #[test]
    fn measure_uses_the_widest_line() {
        let font = font();
        let short = measure(&text("ab"), &font);
        let both = measure(&text("ab\nabcdef"), &font);
        assert_eq!(both, measure(&text("abcdef"), &font));
        assert!(both > short);
    }

    #[test]
    fn styles_widen_the_box() {
        let font = font();
        let plain = text("Hello");
        let mut styled = plain.clone();
        styled.bold = true;
        styled.italic = true;
        assert!(measure(&styled, &font) > measure(&plain, &font));
    }

    #[test]
    fn rasterized_line_reaches_its_last_glyph() {
        let font = font();
        let mut wide = text("WWWWWWWW");
        wide.measured_width = Some(measure(&wide, &font));
        let raster = rasterize(&wide, &font);
        let (_, advance) = layout_line(&font, "WWWWWWWW", 40.0);
        let painted = (0..raster.height())
            .flat_map(|y| (0..raster.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| raster.get_pixel(x, y)[3] > 0)
            .map(|(x, _)| x)
            .max()
            .unwrap();
        // Last W ends within a few pixels of the advance
        assert!(painted as f32 > advance - 8.0, "{} vs {}", painted, advance);
    }
}
