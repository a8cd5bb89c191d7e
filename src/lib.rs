use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod card;
pub mod clipboard;
mod font;
pub mod languages;
pub mod logging;
mod paths;
mod render;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use card::{sanitize_name_token, CardComposer, CardState, ExportedCard};
pub use languages::{Language, LanguageCode};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub lang: String,
    pub name: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub dx: Option<i32>,
    pub dy: Option<i32>,
    pub output: Option<String>,
    pub assets: Option<String>,
    pub font: Option<String>,
    pub settings_path: Option<String>,
    pub print_coords: bool,
    pub show_enabled_languages: bool,
}

pub fn run(config: Config) -> Result<String> {
    if config.show_enabled_languages {
        return Ok(format_enabled_languages());
    }

    let settings = settings::load_settings(config.settings_path.as_deref().map(Path::new))?;
    let composer = CardComposer::new(
        settings,
        config.assets.as_deref().map(Path::new),
        config.font.as_deref().map(Path::new),
    )?;

    let mut state = CardState::new(composer.settings());
    state.language = Language::from_code(&config.lang);
    state.name = config.name.unwrap_or_default();
    if let Some(x) = config.x {
        state.anchor_x = x;
    }
    if let Some(y) = config.y {
        state.anchor_y = y;
    }
    state.nudge(config.dx.unwrap_or(0), config.dy.unwrap_or(0));

    let card = composer.export(&state)?;
    let path = write_card(&card, config.output.as_deref())?;

    let mut output = format!("wrote {}", path.display());
    if config.print_coords {
        output.push('\n');
        output.push_str(&state.coords_payload());
    }
    Ok(output)
}

/// Write the exported card, treating `output` as a target file when it
/// carries an extension and as a directory otherwise.
pub fn write_card(card: &ExportedCard, output: Option<&str>) -> Result<PathBuf> {
    let path = resolve_output_path(output, &card.filename);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output dir: {}", parent.display()))?;
        }
    }
    fs::write(&path, &card.png)
        .with_context(|| format!("failed to write card: {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(path)
}

fn resolve_output_path(output: Option<&str>, filename: &str) -> PathBuf {
    match output {
        None => PathBuf::from(filename),
        Some(value) => {
            let path = PathBuf::from(value);
            if path.extension().is_some() && !path.is_dir() {
                path
            } else {
                path.join(filename)
            }
        }
    }
}

fn format_enabled_languages() -> String {
    LanguageCode::ALL
        .iter()
        .map(|code| format!("{}\t{}\t{}px", code, code.background_file(), code.base_font_size()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_languages_cover_all_codes() {
        let listing = format_enabled_languages();
        for code in ["ar", "en", "fr", "bn", "in", "ur"] {
            assert!(listing.contains(code));
        }
        assert_eq!(listing.lines().count(), 6);
    }

    #[test]
    fn output_path_defaults_to_the_generated_filename() {
        let path = resolve_output_path(None, "Bushra_en_Sara.png");
        assert_eq!(path, PathBuf::from("Bushra_en_Sara.png"));
    }

    #[test]
    fn output_path_treats_extensionless_values_as_directories() {
        let path = resolve_output_path(Some("out"), "Bushra_en_Sara.png");
        assert_eq!(path, PathBuf::from("out/Bushra_en_Sara.png"));

        let path = resolve_output_path(Some("cards/custom.png"), "Bushra_en_Sara.png");
        assert_eq!(path, PathBuf::from("cards/custom.png"));
    }
}
