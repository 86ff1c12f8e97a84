//! CLI output formatting.
//!
//! Every command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Gallery
//!
//! ```text
//! Gallery (2 photos)
//! 001 https://img.example.com/1001.jpg
//!     Id: 1001
//!     Size: 4000x3000
//! 002 https://img.example.com/1002.jpg
//!     Id: 1002
//!     Size: unknown
//! ```
//!
//! ## Fit
//!
//! ```text
//! 4000x3000 in 1200x800
//!     Resize: 1067x800
//! ```
//!
//! ## Preview session
//!
//! ```text
//! Preview: visible at 002 of 3
//!     Resolved: 001, 002
//!     Fitted: 2 (1 resize, 1 scale)
//!     Dismissed: no
//! ```

use crate::controller::{EventOutcome, PreviewSnapshot};
use crate::fit::{FitDecision, Size, to_pixels};
use crate::source::GallerySource;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_size(size: Size) -> String {
    format!("{}x{}", to_pixels(size.width), to_pixels(size.height))
}

/// One line describing a fit decision, as it is applied to the node.
pub fn format_decision(decision: &FitDecision) -> String {
    match decision {
        FitDecision::Resize { width, height } => {
            format!("Resize: {}x{}", to_pixels(*width), to_pixels(*height))
        }
        FitDecision::Scale { factor } => format!("Scale: {factor:.3}"),
    }
}

// ============================================================================
// Gallery
// ============================================================================

pub fn format_gallery(source: &GallerySource) -> Vec<String> {
    let mut lines = vec![format!("Gallery ({} photos)", source.items.len())];
    for item in &source.items {
        lines.push(format!(
            "{} {}",
            format_index(item.ordinal + 1),
            item.source_url
        ));
        lines.push(format!("{}Id: {}", indent(1), item.identity));
        let size = match source.natural_sizes.get(item.ordinal).copied().flatten() {
            Some((w, h)) => format!("{w}x{h}"),
            None => "unknown".to_string(),
        };
        lines.push(format!("{}Size: {}", indent(1), size));
    }
    lines
}

pub fn print_gallery(source: &GallerySource) {
    for line in format_gallery(source) {
        println!("{}", line);
    }
}

// ============================================================================
// Fit
// ============================================================================

pub fn format_fit(natural: Size, available: Size, decision: &FitDecision) -> Vec<String> {
    vec![
        format!("{} in {}", format_size(natural), format_size(available)),
        format!("{}{}", indent(1), format_decision(decision)),
    ]
}

pub fn print_fit(natural: Size, available: Size, decision: &FitDecision) {
    for line in format_fit(natural, available, decision) {
        println!("{}", line);
    }
}

// ============================================================================
// Preview session
// ============================================================================

pub fn format_session(snapshot: &PreviewSnapshot, outcomes: &[EventOutcome]) -> Vec<String> {
    let len = snapshot.slots.len();
    let state = &snapshot.state;
    let header = if state.overlay_visible {
        format!(
            "Preview: visible at {} of {}",
            format_index(state.active_index + 1),
            len
        )
    } else {
        format!(
            "Preview: hidden (last {} of {})",
            format_index(state.active_index + 1),
            len
        )
    };

    let resolved: Vec<String> = snapshot
        .slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_some())
        .map(|(i, _)| format_index(i + 1))
        .collect();
    let resolved = if resolved.is_empty() {
        "none".to_string()
    } else {
        resolved.join(", ")
    };

    let (mut resizes, mut scales, mut dismissed) = (0, 0, false);
    for outcome in outcomes {
        match outcome {
            EventOutcome::Fitted(applied) => match applied.decision {
                FitDecision::Resize { .. } => resizes += 1,
                FitDecision::Scale { .. } => scales += 1,
            },
            EventOutcome::Dismissed => dismissed = true,
            EventOutcome::Ignored => {}
        }
    }

    vec![
        header,
        format!("{}Resolved: {}", indent(1), resolved),
        format!(
            "{}Fitted: {} ({} resize, {} scale)",
            indent(1),
            resizes + scales,
            resizes,
            scales
        ),
        format!(
            "{}Dismissed: {}",
            indent(1),
            if dismissed { "yes" } else { "no" }
        ),
    ]
}

pub fn print_session(snapshot: &PreviewSnapshot, outcomes: &[EventOutcome]) {
    for line in format_session(snapshot, outcomes) {
        println!("{}", line);
    }
}

// ============================================================================
// Render
// ============================================================================

pub fn format_render_output(path: &Path, count: usize) -> Vec<String> {
    vec![format!("Rendered {} photos → {}", count, path.display())]
}

pub fn print_render_output(path: &Path, count: usize) {
    for line in format_render_output(path, count) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::PreviewState;
    use crate::dom::NodeId;
    use crate::test_helpers::*;
    use crate::watch::Applied;
    use std::sync::Arc;

    fn snapshot(slots: Vec<Option<String>>, active: usize, visible: bool) -> PreviewSnapshot {
        PreviewSnapshot {
            state: PreviewState {
                active_index: active,
                overlay_visible: visible,
            },
            slots: Arc::from(slots),
        }
    }

    fn fitted(decision: FitDecision) -> EventOutcome {
        EventOutcome::Fitted(Applied {
            node: test_node(),
            decision,
        })
    }

    fn test_node() -> NodeId {
        let mut doc = test_document();
        doc.create_element("img")
    }

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn resize_is_shown_in_whole_pixels() {
        let d = FitDecision::Resize {
            width: 1066.6666,
            height: 800.0,
        };
        assert_eq!(format_decision(&d), "Resize: 1067x800");
    }

    #[test]
    fn scale_is_shown_with_three_decimals() {
        let d = FitDecision::Scale { factor: 16.0 / 3.0 };
        assert_eq!(format_decision(&d), "Scale: 5.333");
    }

    #[test]
    fn fit_lines() {
        let lines = format_fit(
            Size::new(4000.0, 3000.0),
            Size::new(1200.0, 800.0),
            &FitDecision::Resize {
                width: 1066.67,
                height: 800.0,
            },
        );
        assert_eq!(lines, vec!["4000x3000 in 1200x800", "    Resize: 1067x800"]);
    }

    #[test]
    fn gallery_lists_items_with_sizes() {
        let source = GallerySource {
            items: sample_items(2),
            natural_sizes: vec![Some((4000, 3000)), None],
        };
        let lines = format_gallery(&source);
        assert_eq!(lines[0], "Gallery (2 photos)");
        assert_eq!(lines[1], format!("001 {}", sample_url(0)));
        assert_eq!(lines[2], "    Id: 1001");
        assert_eq!(lines[3], "    Size: 4000x3000");
        assert_eq!(lines[6], "    Size: unknown");
    }

    #[test]
    fn session_summary_counts_outcomes() {
        let s = snapshot(vec![Some("a".into()), Some("b".into()), None], 1, true);
        let outcomes = vec![
            fitted(FitDecision::Resize {
                width: 10.0,
                height: 10.0,
            }),
            fitted(FitDecision::Scale { factor: 2.0 }),
            EventOutcome::Ignored,
        ];
        let lines = format_session(&s, &outcomes);
        assert_eq!(lines[0], "Preview: visible at 002 of 3");
        assert_eq!(lines[1], "    Resolved: 001, 002");
        assert_eq!(lines[2], "    Fitted: 2 (1 resize, 1 scale)");
        assert_eq!(lines[3], "    Dismissed: no");
    }

    #[test]
    fn session_summary_after_dismiss() {
        let s = snapshot(vec![None, Some("b".into())], 1, false);
        let lines = format_session(&s, &[EventOutcome::Dismissed]);
        assert_eq!(lines[0], "Preview: hidden (last 002 of 2)");
        assert_eq!(lines[3], "    Dismissed: yes");
    }

    #[test]
    fn empty_session_has_nothing_resolved() {
        let s = snapshot(vec![None], 0, false);
        assert_eq!(format_session(&s, &[])[1], "    Resolved: none");
    }

    #[test]
    fn render_output_line() {
        let lines = format_render_output(Path::new("dist/index.html"), 3);
        assert_eq!(lines, vec!["Rendered 3 photos → dist/index.html"]);
    }
}
