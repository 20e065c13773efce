use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::export::PaginationMode;

/// Highest accepted render scale. Keeps an A4 capture well inside the bitmap limits.
pub const MAX_RENDER_SCALE: f32 = 8.0;

/// Application configuration loaded from environment variables.
/// Every variable has a default; invalid values fail startup with the variable named.
#[derive(Debug, Clone)]
pub struct Config {
    pub download_dir: PathBuf,
    pub render_scale: f32,
    pub page_margin_mm: f32,
    pub jpeg_quality: u8,
    pub pagination: PaginationMode,
    /// Optional JSON resume to export instead of the built-in sample.
    pub input: Option<PathBuf>,
    pub filename: String,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            download_dir: PathBuf::from("./downloads"),
            render_scale: 3.0,
            page_margin_mm: 10.0,
            jpeg_quality: 100,
            pagination: PaginationMode::Slice,
            input: None,
            filename: "professional-resume".to_string(),
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let render_scale: f32 = parse_or("RESUME_RENDER_SCALE", &lookup, defaults.render_scale)?;
        if !(1.0..=MAX_RENDER_SCALE).contains(&render_scale) {
            anyhow::bail!(
                "RESUME_RENDER_SCALE must be a number between 1 and {MAX_RENDER_SCALE}, got {render_scale}"
            );
        }

        let page_margin_mm: f32 = parse_or("RESUME_PAGE_MARGIN_MM", &lookup, defaults.page_margin_mm)?;
        if !(0.0..100.0).contains(&page_margin_mm) {
            anyhow::bail!("RESUME_PAGE_MARGIN_MM must be in 0..100, got {page_margin_mm}");
        }

        let jpeg_quality: u8 = parse_or("RESUME_JPEG_QUALITY", &lookup, defaults.jpeg_quality)?;
        if !(1..=100).contains(&jpeg_quality) {
            anyhow::bail!("RESUME_JPEG_QUALITY must be in 1..=100, got {jpeg_quality}");
        }

        let pagination = match lookup("RESUME_PAGINATION") {
            Some(raw) => PaginationMode::from_str(&raw)
                .map_err(anyhow::Error::msg)
                .context("RESUME_PAGINATION must be slice, clamp or strict")?,
            None => defaults.pagination,
        };

        Ok(Config {
            download_dir: lookup("RESUME_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            render_scale,
            page_margin_mm,
            jpeg_quality,
            pagination,
            input: lookup("RESUME_INPUT").filter(|s| !s.trim().is_empty()).map(PathBuf::from),
            filename: lookup("RESUME_FILENAME").unwrap_or(defaults.filename),
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}
