//! Viewport fit calculation.
//!
//! Pure functions that decide how a loaded image is sized inside the preview
//! overlay. Nothing here touches the document; the appearance watcher reads the
//! natural size and viewport, calls [`compute_fit`], and applies the result.
//!
//! ## Policy
//!
//! | Image | Decision | Applied as |
//! |---|---|---|
//! | **Oversized** (natural ≥ available on either axis) | [`FitDecision::Resize`] | `width`/`height` attributes (reflow) |
//! | **Undersized** (smaller on both axes) | [`FitDecision::Scale`] | `scale()` term of the inline transform |
//!
//! Large images shrink by reflow so their layout box is accurate; small images
//! are enlarged with a transform so their box never changes.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum FitError {
    #[error("invalid natural dimensions {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
}

/// A width/height pair in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Space reserved around the overlay for fixed chrome (gallery rail, header,
/// footer). Subtracted from the viewport before fitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insets {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for Insets {
    fn default() -> Self {
        Self {
            horizontal: 248.0,
            vertical: 188.0,
        }
    }
}

/// Sizing outcome for one displayed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitDecision {
    /// Set explicit box dimensions.
    Resize { width: f64, height: f64 },
    /// Keep natural box dimensions, enlarge visually.
    Scale { factor: f64 },
}

/// The box an image may occupy: viewport minus insets, never negative.
pub fn available_box(viewport: Size, insets: Insets) -> Size {
    Size {
        width: (viewport.width - insets.horizontal).max(0.0),
        height: (viewport.height - insets.vertical).max(0.0),
    }
}

/// Compute the fit decision for an image of `natural` size in `available`.
///
/// # Examples
/// ```
/// # use lightbox::fit::{compute_fit, FitDecision, Size};
/// // Undersized: 200x150 in 1200x800 → uniform scale by min(6.0, 5.333)
/// let decision = compute_fit(Size::new(200.0, 150.0), Size::new(1200.0, 800.0)).unwrap();
/// assert!(matches!(decision, FitDecision::Scale { .. }));
/// ```
pub fn compute_fit(natural: Size, available: Size) -> Result<FitDecision, FitError> {
    if !(natural.width > 0.0 && natural.height > 0.0)
        || !natural.width.is_finite()
        || !natural.height.is_finite()
    {
        return Err(FitError::InvalidDimensions {
            width: natural.width,
            height: natural.height,
        });
    }

    let width_ratio = available.width / natural.width;
    let height_ratio = available.height / natural.height;
    let scale = width_ratio.min(height_ratio);

    let oversized = natural.width >= available.width || natural.height >= available.height;
    if oversized {
        Ok(FitDecision::Resize {
            width: natural.width * scale,
            height: natural.height * scale,
        })
    } else {
        Ok(FitDecision::Scale { factor: scale })
    }
}

/// Round a resize dimension to the integer pixel value written to the node.
pub fn to_pixels(value: f64) -> u32 {
    value.round().max(0.0) as u32
}
