use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;
use ttf_parser::name_id;
use ttf_parser::Face;
use usvg::fontdb;

/// Horizontal metrics of the face used to measure the name text. The
/// raw font bytes are kept so the rasterizer can load the same face.
#[derive(Clone)]
pub struct FontMetrics {
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    space_advance: u16,
    family: Option<String>,
    face_index: u32,
}

impl FontMetrics {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Advance width of `text` in pixels at `font_size`, summing glyph
    /// horizontal advances scaled by units-per-em. Characters without a
    /// glyph fall back to the space advance.
    pub fn measure(&self, text: &str, font_size: f32) -> f32 {
        let Ok(face) = Face::parse(&self.data, self.face_index) else {
            return estimate_text_width_units(text) * font_size;
        };
        let mut advance = 0u32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let glyph_advance = face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .unwrap_or(self.space_advance);
            advance = advance.saturating_add(glyph_advance as u32);
        }
        let units = self.units_per_em.max(1) as f32;
        advance as f32 * (font_size / units)
    }
}

/// Measure `text` with real metrics when a face is available, or with a
/// per-character width estimate otherwise.
pub(crate) fn measure_text_width_px(text: &str, font_size: f32, font: Option<&FontMetrics>) -> f32 {
    match font {
        Some(font) => font.measure(text, font_size),
        None => estimate_text_width_units(text) * font_size,
    }
}

pub struct ResolvedCardFont {
    pub metrics: FontMetrics,
    pub family: String,
}

#[cfg(test)]
pub(crate) fn stub_metrics(family: &str) -> FontMetrics {
    // empty font data makes measure() use the estimate path
    FontMetrics {
        data: Arc::new(Vec::new()),
        units_per_em: 1000,
        space_advance: 500,
        family: Some(family.to_string()),
        face_index: 0,
    }
}

/// Resolve the face used for the name text: an explicit font file wins,
/// otherwise the configured family is queried from the system font
/// database.
pub fn resolve_card_font(
    font_path: Option<&Path>,
    font_family: Option<&str>,
) -> Result<ResolvedCardFont> {
    if let Some(path) = font_path {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read font: {}", path.display()))?;
        let metrics = font_metrics_from_data(&data)
            .map_err(|err| anyhow!("failed to parse font: {} ({})", path.display(), err))?;
        let family = metrics
            .family()
            .map(|name| name.to_string())
            .or_else(|| font_family.map(|name| name.to_string()))
            .unwrap_or_else(|| "sans-serif".to_string());
        return Ok(ResolvedCardFont { metrics, family });
    }

    let Some(family) = font_family else {
        return Err(anyhow!("no font configured"));
    };
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    load_font_metrics_from_family(&db, family)
}

fn font_metrics_from_data(data: &[u8]) -> Result<FontMetrics> {
    let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
    for index in 0..count {
        if let Ok(face) = Face::parse(data, index) {
            let units_per_em = face.units_per_em().max(1);
            let space_advance = face
                .glyph_index(' ')
                .and_then(|id| face.glyph_hor_advance(id))
                .unwrap_or(units_per_em / 2);
            return Ok(FontMetrics {
                data: Arc::new(data.to_vec()),
                units_per_em,
                space_advance,
                family: extract_family_name(&face),
                face_index: index,
            });
        }
    }
    Err(anyhow!("failed to parse font data"))
}

fn load_font_metrics_from_family(db: &fontdb::Database, family: &str) -> Result<ResolvedCardFont> {
    let is_sans = family.eq_ignore_ascii_case("sans-serif");
    let families = if is_sans {
        vec![fontdb::Family::SansSerif]
    } else {
        vec![fontdb::Family::Name(family)]
    };
    let query = fontdb::Query {
        families: &families,
        ..Default::default()
    };
    let id = db
        .query(&query)
        .ok_or_else(|| anyhow!("font not found: {}", family))?;
    let data = db
        .with_face_data(id, |data, _index| data.to_vec())
        .ok_or_else(|| anyhow!("failed to load font data: {}", family))?;
    let metrics = font_metrics_from_data(&data)?;
    let resolved_family = metrics
        .family()
        .map(|name| name.to_string())
        .unwrap_or_else(|| family.to_string());
    Ok(ResolvedCardFont {
        metrics,
        family: resolved_family,
    })
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

fn estimate_char_units_for_width(ch: char) -> f32 {
    if ch.is_whitespace() {
        0.25
    } else if ch.is_ascii_alphanumeric() {
        0.55
    } else if ch.is_ascii() {
        0.35
    } else if matches!(ch as u32, 0x0600..=0x06FF | 0x0980..=0x09FF) {
        // Arabic and Bengali letters run wider than Latin on average
        0.7
    } else {
        0.9
    }
}

fn estimate_text_width_units(text: &str) -> f32 {
    text.chars().map(estimate_char_units_for_width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_linearly_with_font_size() {
        let narrow = measure_text_width_px("Sara", 85.0, None);
        let wide = measure_text_width_px("Sara", 170.0, None);
        assert!((wide - narrow * 2.0).abs() < 0.01);
    }

    #[test]
    fn estimate_counts_whitespace_narrower_than_letters() {
        let spaced = measure_text_width_px("a a", 100.0, None);
        let solid = measure_text_width_px("aaa", 100.0, None);
        assert!(spaced < solid);
    }
}
