//! Compositor configuration module.
//!
//! Handles loading, validating, and merging the TOML config file. Stock
//! defaults are overridden by whatever the user file sets; everything else
//! keeps its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! width = 1024              # Output width in pixels (height follows aspect)
//! quality = 90              # JPEG quality (1-100)
//!
//! [style]
//! font_family = "Impact, 'Arial Black', sans-serif"
//! font_weight = 900
//! min_font_size = 24        # Pixels
//! font_size_ratio = 0.06    # Font size as a fraction of the width
//! char_width_factor = 0.6   # Average glyph width / font size, drives wrapping
//! min_chars_per_line = 10
//! top_line_factor = 1.3     # First top baseline, in font sizes
//! line_height_factor = 1.1  # Baseline step, in font sizes
//! bottom_margin_factor = 0.5 # Last bottom baseline above the edge, in font sizes
//! min_stroke_width = 2
//! stroke_divisor = 10       # Stroke = font size / divisor
//! letter_spacing = 1.0
//! fill = "#ffffff"
//! stroke = "#000000"
//!
//! [fonts]
//! dirs = []                 # Extra directories with .ttf/.otf/.ttc files
//!
//! [fetch]
//! timeout_secs = 15
//! max_bytes = 20971520      # Largest accepted source image (20 MiB)
//! user_agent = "meme-caption"
//! templates_url = "https://api.imgflip.com/get_memes"
//!
//! [processing]
//! max_processes = 4         # Max parallel batch workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{CaptionStyle, DEFAULT_TARGET_WIDTH};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Widest canvas a request may ask for.
pub const MAX_TARGET_WIDTH: u32 = 8192;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Compositor configuration.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    /// Default output size and quality.
    pub output: OutputConfig,
    /// Caption look: ratios, rhythm, paint.
    pub style: CaptionStyle,
    /// Extra font directories.
    pub fonts: FontsConfig,
    /// Source and template fetching.
    pub fetch: FetchConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl CaptionConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.width == 0 || self.output.width > MAX_TARGET_WIDTH {
            return Err(ConfigError::Validation(format!(
                "output.width must be 1-{MAX_TARGET_WIDTH}"
            )));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        let ratios = [
            ("style.font_size_ratio", self.style.font_size_ratio),
            ("style.char_width_factor", self.style.char_width_factor),
            ("style.line_height_factor", self.style.line_height_factor),
        ];
        for (key, value) in ratios {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Validation(format!("{key} must be positive")));
            }
        }
        if self.style.top_line_factor < 0.0 || self.style.bottom_margin_factor < 0.0 {
            return Err(ConfigError::Validation(
                "style.top_line_factor and style.bottom_margin_factor must not be negative".into(),
            ));
        }
        if self.style.stroke_divisor == 0 {
            return Err(ConfigError::Validation(
                "style.stroke_divisor must be non-zero".into(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be non-zero".into(),
            ));
        }
        if self.fetch.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "fetch.max_bytes must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Default output settings, used when a request leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Output width in pixels.
    pub width: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_TARGET_WIDTH,
            quality: 90,
        }
    }
}

/// Font discovery settings. System fonts are always loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    pub dirs: Vec<PathBuf>,
}

/// HTTP fetch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Bodies larger than this are rejected.
    pub max_bytes: u64,
    pub user_agent: String,
    /// Template directory endpoint (Imgflip `get_memes` shape).
    pub templates_url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_bytes: 20 * 1024 * 1024,
            user_agent: concat!("meme-caption/", env!("CARGO_PKG_VERSION")).to_string(),
            templates_url: "https://api.imgflip.com/get_memes".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(CaptionConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<CaptionConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CaptionConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, or stock defaults when `path` is `None`.
///
/// An explicitly named file that does not exist is an error; stock defaults
/// only apply when no file was asked for.
pub fn load_config(path: Option<&Path>) -> Result<CaptionConfig, ConfigError> {
    let overlay = match path {
        Some(p) => Some(load_raw_config(p)?.ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", p.display()),
            ))
        })?),
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# meme-caption configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Output width in pixels. Height follows the source aspect ratio.
width = 1024

# JPEG quality (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Caption style
# ---------------------------------------------------------------------------
[style]
font_family = "Impact, 'Arial Black', sans-serif"
font_weight = 900

# Font size = max(min_font_size, round(width * font_size_ratio)).
min_font_size = 24
font_size_ratio = 0.06

# Line budget = max(min_chars_per_line, floor(width / (font_size * char_width_factor))).
char_width_factor = 0.6
min_chars_per_line = 10

# Vertical rhythm, in multiples of the font size.
top_line_factor = 1.3
line_height_factor = 1.1
bottom_margin_factor = 0.5

# Outline = max(min_stroke_width, round(font_size / stroke_divisor)).
min_stroke_width = 2
stroke_divisor = 10

letter_spacing = 1.0
fill = "#ffffff"
stroke = "#000000"

# ---------------------------------------------------------------------------
# Fonts
# ---------------------------------------------------------------------------
[fonts]
# Extra directories scanned for .ttf/.otf/.ttc files (system fonts are always loaded).
dirs = []

# ---------------------------------------------------------------------------
# Fetching
# ---------------------------------------------------------------------------
[fetch]
timeout_secs = 15
max_bytes = 20971520
templates_url = "https://api.imgflip.com/get_memes"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel batch workers. Omit to use all CPU cores.
# Values above the core count are clamped down.
# max_processes = 4
"##
}
