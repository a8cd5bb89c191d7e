use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use resvg::render;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::Pixmap;
use usvg::{fontdb, Options, Tree};

use crate::font::{measure_text_width_px, FontMetrics};

// Canvas matches the pixel dimensions of the background images.
pub const CANVAS_WIDTH: u32 = 2016;
pub const CANVAS_HEIGHT: u32 = 3840;

pub(crate) struct SceneParams<'a> {
    pub background_png: Option<&'a [u8]>,
    pub text: &'a str,
    pub anchor_x: i32,
    pub anchor_y: i32,
    pub font_size: u32,
    pub color: &'a str,
    pub weight: &'a str,
    pub family: Option<&'a str>,
}

/// Shrink the font size until the text fits the width budget. The base
/// size is decremented by 2 and never drops below `min_size`; if even
/// the floor overflows, the floor is used as is.
pub(crate) fn fit_font_size(
    text: &str,
    base_size: u32,
    min_size: u32,
    max_width_fraction: f32,
    font: Option<&FontMetrics>,
) -> u32 {
    let max_width = CANVAS_WIDTH as f32 * max_width_fraction;
    let mut size = base_size;
    while measure_text_width_px(text, size as f32, font) > max_width && size > min_size {
        size = size.saturating_sub(2);
    }
    size
}

/// Build the SVG scene: the background stretched to fill the canvas
/// exactly, then the name text centered on the anchor on both axes.
pub(crate) fn render_scene(params: &SceneParams<'_>) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = CANVAS_WIDTH,
        h = CANVAS_HEIGHT
    ));

    if let Some(bytes) = params.background_png {
        let data_uri = format!("data:image/png;base64,{}", BASE64.encode(bytes));
        svg.push_str(&format!(
            r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
            uri = data_uri,
            w = CANVAS_WIDTH,
            h = CANVAS_HEIGHT
        ));
    }

    let text = params.text.trim();
    if !text.is_empty() {
        let escaped = escape_xml(text);
        if let Some(family) = params.family {
            svg.push_str(&format!(
                r#"<text x="{x}" y="{y}" font-size="{size}" font-weight="{weight}" fill="{color}" font-family="{family}" text-anchor="middle" dominant-baseline="central">{text}</text>"#,
                x = params.anchor_x,
                y = params.anchor_y,
                size = params.font_size,
                weight = params.weight,
                color = params.color,
                family = escape_xml(family),
                text = escaped
            ));
        } else {
            svg.push_str(&format!(
                r#"<text x="{x}" y="{y}" font-size="{size}" font-weight="{weight}" fill="{color}" text-anchor="middle" dominant-baseline="central">{text}</text>"#,
                x = params.anchor_x,
                y = params.anchor_y,
                size = params.font_size,
                weight = params.weight,
                color = params.color,
                text = escaped
            ));
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Rasterize the scene to PNG bytes at the canvas size.
pub(crate) fn rasterize_scene(svg: &str, font_data: Option<&[u8]>) -> Result<Vec<u8>> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    if let Some(data) = font_data {
        db.load_font_data(data.to_vec());
    }
    let options = Options {
        fontdb: Arc::new(db),
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse card scene")?;
    let mut pixmap = Pixmap::new(CANVAS_WIDTH, CANVAS_HEIGHT)
        .ok_or_else(|| anyhow!("empty canvas size"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);

    let image = image::RgbaImage::from_raw(CANVAS_WIDTH, CANVAS_HEIGHT, pixmap.data().to_vec())
        .ok_or_else(|| anyhow!("failed to build image buffer from scene"))?;
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .with_context(|| "failed to encode card PNG")?;
    Ok(bytes)
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_keep_the_base_size() {
        // 4 letters at 0.55 units each are far below 75% of the canvas
        assert_eq!(fit_font_size("Sara", 85, 55, 0.75, None), 85);
    }

    #[test]
    fn long_names_shrink_in_steps_of_two() {
        let name = "a".repeat(40);
        // estimated width is 22 units; the first size-2k step at or
        // below 1512px / 22 is 67
        assert_eq!(fit_font_size(&name, 85, 55, 0.75, None), 67);
    }

    #[test]
    fn shrinking_stops_at_the_floor() {
        let name = "a".repeat(200);
        assert_eq!(fit_font_size(&name, 85, 55, 0.75, None), 55);
    }

    #[test]
    fn scene_skips_text_for_blank_names() {
        let svg = render_scene(&SceneParams {
            background_png: None,
            text: "   ",
            anchor_x: 1008,
            anchor_y: 3150,
            font_size: 85,
            color: "#AD8252",
            weight: "700",
            family: None,
        });
        assert!(!svg.contains("<text"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn scene_centers_text_on_the_anchor() {
        let svg = render_scene(&SceneParams {
            background_png: None,
            text: "Sara",
            anchor_x: 1008,
            anchor_y: 3150,
            font_size: 85,
            color: "#AD8252",
            weight: "700",
            family: Some("Tajawal"),
        });
        assert!(svg.contains(r#"x="1008" y="3150""#));
        assert!(svg.contains(r#"text-anchor="middle""#));
        assert!(svg.contains(r#"dominant-baseline="central""#));
        assert!(svg.contains(r##"fill="#AD8252""##));
    }

    #[test]
    fn scene_embeds_background_as_data_uri() {
        let svg = render_scene(&SceneParams {
            background_png: Some(&[0x89, 0x50, 0x4e, 0x47]),
            text: "",
            anchor_x: 0,
            anchor_y: 0,
            font_size: 85,
            color: "#AD8252",
            weight: "700",
            family: None,
        });
        assert!(svg.contains("data:image/png;base64,"));
        assert!(svg.contains(r#"preserveAspectRatio="none""#));
    }

    #[test]
    fn xml_entities_are_escaped_in_names() {
        let svg = render_scene(&SceneParams {
            background_png: None,
            text: "A & B <C>",
            anchor_x: 1008,
            anchor_y: 3150,
            font_size: 85,
            color: "#AD8252",
            weight: "700",
            family: None,
        });
        assert!(svg.contains("A &amp; B &lt;C&gt;"));
    }
}
