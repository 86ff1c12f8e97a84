//! Narrow text patching of CSS `transform` strings.
//!
//! The slider writes its own inline transforms (`translate3d(...) scale(...)`).
//! We only ever touch the `scale()` term and leave every other term as written.
//!
//! Contract:
//! - only `scale(` terms are matched; `scaleX(`, `scale3d(` and friends are not
//! - one- and two-argument forms (`scale(2)`, `scale(1.5, 1.5)`) are replaced whole
//! - the factor is written with the shortest round-trip `f64` formatting

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static SCALE_TERM: LazyLock<Regex> = LazyLock::new(|| {
    let number = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";
    Regex::new(&format!(r"\bscale\(\s*{number}(?:\s*,\s*{number})?\s*\)"))
        .expect("scale term pattern is valid")
});

fn scale_term(factor: f64) -> String {
    format!("scale({factor})")
}

/// Replace every existing `scale()` term with `scale(factor)`.
///
/// Returns the input unchanged (borrowed) when there is no scale term.
pub fn replace_scale(transform: &str, factor: f64) -> Cow<'_, str> {
    let term = scale_term(factor);
    SCALE_TERM.replace_all(transform, regex::NoExpand(&term))
}

/// Like [`replace_scale`], but appends a scale term when none exists so the
/// factor always takes effect.
pub fn set_scale(transform: &str, factor: f64) -> String {
    if SCALE_TERM.is_match(transform) {
        return replace_scale(transform, factor).into_owned();
    }
    let trimmed = transform.trim();
    if trimmed.is_empty() || trimmed == "none" {
        scale_term(factor)
    } else {
        format!("{trimmed} {}", scale_term(factor))
    }
}

/// Read the factor of the first `scale()` term, if any.
pub fn scale_of(transform: &str) -> Option<f64> {
    let found = SCALE_TERM.find(transform)?;
    let inner = &found.as_str()["scale(".len()..found.as_str().len() - 1];
    inner.split(',').next()?.trim().parse().ok()
}
