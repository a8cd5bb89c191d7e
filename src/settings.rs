use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

/// Render configuration layered from the embedded defaults, the
/// working-directory and home settings files, and an optional extra
/// file. Later layers win.
#[derive(Debug, Clone)]
pub struct Settings {
    pub text_color: String,
    pub font_weight: String,
    pub font_family: Option<String>,
    pub font_path: Option<String>,
    pub assets_dir: Option<String>,
    pub anchor_x: i32,
    pub anchor_y: i32,
    pub nudge_step: i32,
    pub min_font_size: u32,
    pub max_width_fraction: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            text_color: "#AD8252".to_string(),
            font_weight: "700".to_string(),
            font_family: Some("Tajawal".to_string()),
            font_path: None,
            assets_dir: None,
            anchor_x: 1008,
            anchor_y: 3150,
            nudge_step: 10,
            min_font_size: 55,
            max_width_fraction: 0.75,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    card: Option<CardSection>,
    anchor: Option<AnchorSection>,
    fit: Option<FitSection>,
}

#[derive(Debug, Default, Deserialize)]
struct CardSection {
    text_color: Option<String>,
    font_weight: Option<String>,
    font_family: Option<String>,
    font_path: Option<String>,
    assets_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnchorSection {
    x: Option<i32>,
    y: Option<i32>,
    step: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct FitSection {
    min_font_size: Option<u32>,
    max_width_fraction: Option<f32>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = paths::settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(card) = incoming.card {
            if let Some(color) = card.text_color {
                if !color.trim().is_empty() {
                    self.text_color = color;
                }
            }
            if let Some(weight) = card.font_weight {
                if !weight.trim().is_empty() {
                    self.font_weight = weight;
                }
            }
            if let Some(family) = card.font_family {
                if !family.trim().is_empty() {
                    self.font_family = Some(family);
                }
            }
            if let Some(path) = card.font_path {
                if !path.trim().is_empty() {
                    self.font_path = Some(path);
                }
            }
            if let Some(dir) = card.assets_dir {
                if !dir.trim().is_empty() {
                    self.assets_dir = Some(dir);
                }
            }
        }
        if let Some(anchor) = incoming.anchor {
            if let Some(x) = anchor.x {
                self.anchor_x = x;
            }
            if let Some(y) = anchor.y {
                self.anchor_y = y;
            }
            if let Some(step) = anchor.step {
                if step > 0 {
                    self.nudge_step = step;
                }
            }
        }
        if let Some(fit) = incoming.fit {
            if let Some(floor) = fit.min_font_size {
                if floor > 0 {
                    self.min_font_size = floor;
                }
            }
            if let Some(fraction) = fit.max_width_fraction {
                if fraction > 0.0 && fraction <= 1.0 {
                    self.max_width_fraction = fraction;
                }
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = paths::settings_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}
