use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::font::{resolve_card_font, ResolvedCardFont};
use crate::languages::Language;
use crate::render::{self, SceneParams};
use crate::settings::Settings;

const DEFAULT_ASSETS_DIR: &str = "assets";

/// Mutable card state driven by user input: the selected language, the
/// typed name, and the calibrated anchor the text is centered on.
#[derive(Debug, Clone)]
pub struct CardState {
    pub language: Language,
    pub name: String,
    pub anchor_x: i32,
    pub anchor_y: i32,
}

impl CardState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            language: Language::default(),
            name: String::new(),
            anchor_x: settings.anchor_x,
            anchor_y: settings.anchor_y,
        }
    }

    /// Move the anchor by the given offsets. Nudges accumulate, so
    /// applying (a, b) then (c, d) equals applying (a + c, b + d).
    pub fn nudge(&mut self, dx: i32, dy: i32) {
        self.anchor_x += dx;
        self.anchor_y += dy;
    }

    /// Restore the anchor to the configured default, regardless of any
    /// prior nudges. Language and name are untouched.
    pub fn reset_anchor(&mut self, settings: &Settings) {
        self.anchor_x = settings.anchor_x;
        self.anchor_y = settings.anchor_y;
    }

    /// Calibration readout in the shape pasted back into settings.
    pub fn coords_payload(&self) -> String {
        format!(
            "{}: {{ x: {}, y: {} }}",
            self.language, self.anchor_x, self.anchor_y
        )
    }
}

pub struct ExportedCard {
    pub filename: String,
    pub png: Vec<u8>,
}

/// Renders card states into composited images: background stretched to
/// the canvas, name text centered on the anchor at an auto-fit size.
pub struct CardComposer {
    settings: Settings,
    assets_dir: PathBuf,
    font: Option<ResolvedCardFont>,
}

impl CardComposer {
    pub fn new(
        settings: Settings,
        assets_dir: Option<&Path>,
        font_path: Option<&Path>,
    ) -> Result<Self> {
        let assets_dir = assets_dir
            .map(Path::to_path_buf)
            .or_else(|| settings.assets_dir.as_deref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR));

        let font_path = font_path
            .map(Path::to_path_buf)
            .or_else(|| settings.font_path.as_deref().map(PathBuf::from));
        let font = match resolve_card_font(font_path.as_deref(), settings.font_family.as_deref()) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                // An explicit font file that fails to load is an error;
                // a missing family falls back to estimated widths.
                if font_path.is_some() {
                    return Err(err);
                }
                warn!("font not resolved, using width estimates: {}", err);
                None
            }
        };

        Ok(Self {
            settings,
            assets_dir,
            font,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build the SVG scene for the current state. A missing background
    /// is a valid degenerate state and renders a backgroundless card.
    pub fn scene(&self, state: &CardState) -> Result<String> {
        let background = self.load_background(state.language)?;
        let base_size = state.language.base_font_size();
        let name = state.name.trim();
        let font_size = render::fit_font_size(
            name,
            base_size,
            self.settings.min_font_size,
            self.settings.max_width_fraction,
            self.font.as_ref().map(|font| &font.metrics),
        );

        Ok(render::render_scene(&SceneParams {
            background_png: background.as_deref(),
            text: name,
            anchor_x: state.anchor_x,
            anchor_y: state.anchor_y,
            font_size,
            color: &self.settings.text_color,
            weight: &self.settings.font_weight,
            // the resolved face wins so the rasterizer queries the same
            // family the fit search measured with
            family: self
                .font
                .as_ref()
                .map(|font| font.family.as_str())
                .or(self.settings.font_family.as_deref()),
        }))
    }

    /// Rasterize the current state to PNG bytes at the canvas size.
    pub fn render_png(&self, state: &CardState) -> Result<Vec<u8>> {
        let svg = self.scene(state)?;
        render::rasterize_scene(&svg, self.font.as_ref().map(|font| font.metrics.data()))
    }

    /// Render and name the downloadable card.
    pub fn export(&self, state: &CardState) -> Result<ExportedCard> {
        let filename = format!(
            "Bushra_{}_{}.png",
            state.language,
            sanitize_name_token(&state.name)
        );
        let png = self.render_png(state)?;
        info!("composed card {} ({} bytes)", filename, png.len());
        Ok(ExportedCard { filename, png })
    }

    fn load_background(&self, language: Language) -> Result<Option<Vec<u8>>> {
        let path = self.assets_dir.join(language.background_file());
        if !path.exists() {
            warn!("background missing, rendering without it: {}", path.display());
            return Ok(None);
        }
        let bytes = fs::read(&path)
            .with_context(|| format!("failed to read background: {}", path.display()))?;
        Ok(Some(bytes))
    }
}

/// Reduce the typed name to a filename-safe token: keep word
/// characters, Arabic, Bengali and Latin-extended letters, whitespace
/// and hyphens, then collapse whitespace runs to single underscores.
pub fn sanitize_name_token(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return "name".to_string();
    }

    let mut out = String::new();
    let mut in_whitespace = false;
    for ch in trimmed.chars() {
        if !is_allowed_name_char(ch) {
            continue;
        }
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
                in_whitespace = true;
            }
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }

    if out.is_empty() {
        "name".to_string()
    } else {
        out
    }
}

fn is_allowed_name_char(ch: char) -> bool {
    ch == '_'
        || ch == '-'
        || ch.is_ascii_alphanumeric()
        || ch.is_whitespace()
        || matches!(ch as u32, 0x0600..=0x06FF | 0x0980..=0x09FF | 0x00C0..=0x017F)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> CardState {
        CardState::new(&Settings::default())
    }

    #[test]
    fn nudges_are_additive() {
        let mut a = state();
        a.nudge(10, -20);
        a.nudge(-30, 5);

        let mut b = state();
        b.nudge(-20, -15);

        assert_eq!((a.anchor_x, a.anchor_y), (b.anchor_x, b.anchor_y));
    }

    #[test]
    fn reset_restores_the_default_anchor() {
        let settings = Settings::default();
        let mut state = CardState::new(&settings);
        state.nudge(120, -340);
        state.reset_anchor(&settings);
        assert_eq!(state.anchor_x, settings.anchor_x);
        assert_eq!(state.anchor_y, settings.anchor_y);
    }

    #[test]
    fn language_change_keeps_the_anchor() {
        let mut state = state();
        state.nudge(40, 40);
        let before = (state.anchor_x, state.anchor_y);
        state.language = Language::from_code("fr");
        assert_eq!((state.anchor_x, state.anchor_y), before);
    }

    #[test]
    fn coords_payload_shows_language_and_anchor() {
        let mut state = state();
        state.language = Language::from_code("en");
        state.nudge(2, -10);
        assert_eq!(state.coords_payload(), "en: { x: 1010, y: 3140 }");
    }

    #[test]
    fn sanitize_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(sanitize_name_token("Alî  Ahmed!!"), "Alî_Ahmed");
        assert_eq!(sanitize_name_token("Sara"), "Sara");
        assert_eq!(sanitize_name_token("Jean-Luc"), "Jean-Luc");
    }

    #[test]
    fn sanitize_keeps_arabic_and_bengali_letters() {
        assert_eq!(sanitize_name_token("بشرى"), "بشرى");
        assert_eq!(sanitize_name_token("সারা খান"), "সারা_খান");
    }

    #[test]
    fn sanitize_falls_back_to_name_token() {
        assert_eq!(sanitize_name_token(""), "name");
        assert_eq!(sanitize_name_token("   "), "name");
        assert_eq!(sanitize_name_token("!!!"), "name");
    }

    #[test]
    fn resolved_font_family_is_preferred_in_the_scene() {
        let composer = CardComposer {
            settings: Settings::default(),
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            font: Some(ResolvedCardFont {
                metrics: crate::font::stub_metrics("DejaVu Serif"),
                family: "DejaVu Serif".to_string(),
            }),
        };
        let mut state = CardState::new(composer.settings());
        state.name = "Sara".to_string();

        let svg = composer.scene(&state).expect("scene");
        assert!(svg.contains(r#"font-family="DejaVu Serif""#));
        assert!(!svg.contains("Tajawal"));
    }

    #[test]
    fn export_filename_follows_the_download_pattern() {
        let composer = CardComposer::new(Settings::default(), None, None).expect("composer");
        let mut state = CardState::new(composer.settings());
        state.language = Language::from_code("en");
        state.name = "Sara".to_string();
        let card = composer.export(&state).expect("export");
        assert_eq!(card.filename, "Bushra_en_Sara.png");
        assert!(!card.png.is_empty());
    }
}
