use anyhow::{Context, Result};

use crate::generation::versioning::{
    DEFAULT_MAX_TRACKED_ASSIGNMENTS, DEFAULT_MAX_VERSIONS_PER_ASSIGNMENT,
};
use crate::layout::{FontFamily, PageFormat, PageLayoutConfig};
use crate::upload::DEFAULT_MAX_UPLOAD_BYTES;

/// Application configuration loaded from environment variables.
/// Every variable has a default; a present but unparsable value fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub page_format: PageFormat,
    pub base_font_size_pt: f32,
    pub page_margin_mm: f32,
    pub line_spacing: f32,
    pub max_upload_bytes: usize,
    pub max_tracked_assignments: usize,
    pub max_versions_per_assignment: usize,
}

impl Default for Config {
    fn default() -> Self {
        let page = PageLayoutConfig::default();
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            page_format: page.page_format,
            base_font_size_pt: page.font_size_pt,
            page_margin_mm: page.margins_mm,
            line_spacing: page.line_spacing,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_tracked_assignments: DEFAULT_MAX_TRACKED_ASSIGNMENTS,
            max_versions_per_assignment: DEFAULT_MAX_VERSIONS_PER_ASSIGNMENT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        let config = Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            page_format: match std::env::var("PAGE_FORMAT") {
                Ok(value) => value
                    .parse()
                    .map_err(anyhow::Error::msg)
                    .context("PAGE_FORMAT must be a4 or letter")?,
                Err(_) => defaults.page_format,
            },
            base_font_size_pt: parse_env("BASE_FONT_SIZE_PT", defaults.base_font_size_pt)?,
            page_margin_mm: parse_env("PAGE_MARGIN_MM", defaults.page_margin_mm)?,
            line_spacing: parse_env("LINE_SPACING", defaults.line_spacing)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_tracked_assignments: parse_env(
                "MAX_TRACKED_ASSIGNMENTS",
                defaults.max_tracked_assignments,
            )?,
            max_versions_per_assignment: parse_env(
                "MAX_VERSIONS_PER_ASSIGNMENT",
                defaults.max_versions_per_assignment,
            )?,
        };

        config
            .page_config()
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Page layout settings are invalid")?;
        Ok(config)
    }

    /// Server-wide default layout; requests may override it.
    pub fn page_config(&self) -> PageLayoutConfig {
        PageLayoutConfig {
            page_format: self.page_format,
            margins_mm: self.page_margin_mm,
            font: FontFamily::default(),
            font_size_pt: self.base_font_size_pt,
            line_spacing: self.line_spacing,
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{value}'")),
        Err(_) => Ok(default),
    }
}
