//! Lightbox configuration.
//!
//! Handles loading, validating, and merging `lightbox.toml`. User values are
//! merged over stock defaults, so a config file only needs the keys it wants
//! to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [viewport]
//! reserve_horizontal = 248.0  # Width kept free for the gallery rail
//! reserve_vertical = 188.0    # Height kept free for header and footer
//! width = 1440.0              # Viewport used by the CLI preview
//! height = 900.0
//!
//! [watcher]
//! photo_selector = ".PhotoView__Photo"  # Frames whose scale is reset on insert
//! image_tag = "img"                     # Raster image nodes to fit
//!
//! [dismiss]
//! inside_class = "PhotoView__PhotoBox"  # Clicks on this class keep the overlay open
//!
//! [gallery]
//! thumbnail_class = "previewImg"
//! preload_neighbours = true   # Mount resolved slides next to the active one
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::dom::Selector;
use crate::fit::{Insets, Size};
use crate::watch::AppearanceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `lightbox.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightboxConfig {
    /// Viewport insets and the default preview viewport.
    pub viewport: ViewportConfig,
    /// Appearance watcher selectors.
    pub watcher: WatcherConfig,
    /// Outside-click dismissal.
    pub dismiss: DismissConfig,
    /// Thumbnail strip and slider behaviour.
    pub gallery: GalleryConfig,
}

impl LightboxConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.viewport;
        for (name, value) in [
            ("viewport.reserve_horizontal", v.reserve_horizontal),
            ("viewport.reserve_vertical", v.reserve_vertical),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        if !(v.width > 0.0 && v.height > 0.0) || !v.width.is_finite() || !v.height.is_finite() {
            return Err(ConfigError::Validation(
                "viewport.width and viewport.height must be positive".into(),
            ));
        }
        Selector::parse(&self.watcher.photo_selector).map_err(|e| {
            ConfigError::Validation(format!("watcher.photo_selector: {e}"))
        })?;
        Selector::parse(&self.watcher.image_tag)
            .map_err(|e| ConfigError::Validation(format!("watcher.image_tag: {e}")))?;
        if self.dismiss.inside_class.trim().is_empty() {
            return Err(ConfigError::Validation(
                "dismiss.inside_class must not be empty".into(),
            ));
        }
        if self.gallery.thumbnail_class.trim().is_empty() {
            return Err(ConfigError::Validation(
                "gallery.thumbnail_class must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn insets(&self) -> Insets {
        Insets {
            horizontal: self.viewport.reserve_horizontal,
            vertical: self.viewport.reserve_vertical,
        }
    }

    pub fn viewport_size(&self) -> Size {
        Size::new(self.viewport.width, self.viewport.height)
    }

    /// Build the appearance watcher config from the selector strings.
    pub fn appearance(&self) -> Result<AppearanceConfig, ConfigError> {
        let parse = |field: &str, value: &str| {
            Selector::parse(value)
                .map_err(|e| ConfigError::Validation(format!("watcher.{field}: {e}")))
        };
        Ok(AppearanceConfig {
            photo_selector: parse("photo_selector", &self.watcher.photo_selector)?,
            image_selector: parse("image_tag", &self.watcher.image_tag)?,
            insets: self.insets(),
        })
    }
}

/// Viewport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportConfig {
    /// Horizontal space reserved for fixed chrome (CSS pixels).
    pub reserve_horizontal: f64,
    /// Vertical space reserved for fixed chrome (CSS pixels).
    pub reserve_vertical: f64,
    /// Viewport width used when none is given on the command line.
    pub width: f64,
    /// Viewport height used when none is given on the command line.
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let insets = Insets::default();
        Self {
            reserve_horizontal: insets.horizontal,
            reserve_vertical: insets.vertical,
            width: 1440.0,
            height: 900.0,
        }
    }
}

/// Appearance watcher selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatcherConfig {
    /// Selector for inserted preview frames whose scale is reset to 1.
    pub photo_selector: String,
    /// Tag (or compound selector) identifying raster image nodes.
    pub image_tag: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            photo_selector: ".PhotoView__Photo".to_string(),
            image_tag: "img".to_string(),
        }
    }
}

/// Outside-click dismissal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DismissConfig {
    /// Marker class on the exact click target that keeps the overlay open.
    pub inside_class: String,
}

impl Default for DismissConfig {
    fn default() -> Self {
        Self {
            inside_class: "PhotoView__PhotoBox".to_string(),
        }
    }
}

/// Thumbnail strip and slider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Class on each thumbnail `img`.
    pub thumbnail_class: String,
    /// Mount already-resolved neighbours of the active slide.
    pub preload_neighbours: bool,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            thumbnail_class: "previewImg".to_string(),
            preload_neighbours: true,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(LightboxConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
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

/// Load a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize, validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<LightboxConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LightboxConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to defaults when the file is missing.
pub fn load_config(path: &Path) -> Result<LightboxConfig, ConfigError> {
    let config = resolve_config(load_raw_config(path)?)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Returns a fully-commented stock `lightbox.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Lightbox Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Viewport
# ---------------------------------------------------------------------------
[viewport]
# Space kept free around the preview for fixed chrome, in CSS pixels.
# The image is fitted into (viewport - reserve) on each axis.
reserve_horizontal = 248.0
reserve_vertical = 188.0

# Viewport used by `lightbox preview` when --viewport is not given.
width = 1440.0
height = 900.0

# ---------------------------------------------------------------------------
# Appearance watcher
# ---------------------------------------------------------------------------
[watcher]
# Preview frames whose residual scale() is reset to 1 when inserted.
photo_selector = ".PhotoView__Photo"

# Raster image nodes that are fitted once their pixels are available.
image_tag = "img"

# ---------------------------------------------------------------------------
# Dismissal
# ---------------------------------------------------------------------------
[dismiss]
# A click whose exact target carries this class keeps the overlay open.
# Any other classed target closes it.
inside_class = "PhotoView__PhotoBox"

# ---------------------------------------------------------------------------
# Gallery
# ---------------------------------------------------------------------------
[gallery]
# Class on each thumbnail image.
thumbnail_class = "previewImg"

# Mount already-resolved slides next to the active one for swiping.
preload_neighbours = true
"##
}
