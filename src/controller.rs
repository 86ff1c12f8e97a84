//! Gallery controller: preview state machine and lazy slide resolution.
//!
//! ## State
//!
//! - [`PreviewState`]: active slide and overlay visibility. The active index is
//!   kept across close/reopen.
//! - Resolved slots: one `Option<String>` per gallery item holding the
//!   full-resolution URL once the slide has been reached. A slot is set at most
//!   once and never changes afterwards.
//!
//! Every transition returns a [`PreviewSnapshot`]. Slots are shared as an
//! immutable `Arc<[_]>` and replaced wholesale when a new slot resolves, so a
//! snapshot handed to the view never changes under it.
//!
//! ## Transitions
//!
//! | Call | Slots | `active_index` | `overlay_visible` | Watchers |
//! |---|---|---|---|---|
//! | [`open_at`](GalleryController::open_at) | resolve `n` | `n` | `true` | activated on false→true |
//! | [`change_index`](GalleryController::change_index) | resolve `n` | `n` | unchanged | unchanged |
//! | [`close`](GalleryController::close) | unchanged | kept | `false` | deactivated on true→false |
//!
//! Out-of-range ordinals are rejected with [`GalleryError::IndexOutOfRange`]
//! and leave all state untouched.

use crate::dom::{Document, DomError, DomEvent};
use crate::watch::{AppearanceConfig, AppearanceWatcher, Applied, DismissWatcher};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GalleryError {
    #[error("index {index} out of range for gallery of {len} items")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("document error: {0}")]
    Dom(#[from] DomError),
}

/// One gallery entry. Immutable once the gallery is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    pub source_url: String,
    pub identity: i64,
    pub ordinal: usize,
}

impl GalleryItem {
    /// Build items from `(url, id)` pairs, numbering ordinals in order.
    pub fn from_pairs<I, S>(pairs: I) -> Vec<GalleryItem>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        pairs
            .into_iter()
            .enumerate()
            .map(|(ordinal, (url, identity))| GalleryItem {
                source_url: url.into(),
                identity,
                ordinal,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreviewState {
    pub active_index: usize,
    pub overlay_visible: bool,
}

/// Read-only view of controller state after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSnapshot {
    pub state: PreviewState,
    pub slots: Arc<[Option<String>]>,
}

impl PreviewSnapshot {
    pub fn slot(&self, ordinal: usize) -> Option<&str> {
        self.slots.get(ordinal)?.as_deref()
    }

    pub fn resolved_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// What a delivered document notification did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventOutcome {
    Fitted(Applied),
    Dismissed,
    Ignored,
}

#[derive(Debug)]
pub struct GalleryController {
    items: Vec<GalleryItem>,
    slots: Arc<[Option<String>]>,
    state: PreviewState,
    appearance: AppearanceWatcher,
    dismiss: DismissWatcher,
}

impl GalleryController {
    pub fn new(items: Vec<GalleryItem>, appearance: AppearanceConfig, inside_class: &str) -> Self {
        let slots: Arc<[Option<String>]> = vec![None; items.len()].into();
        Self {
            items,
            slots,
            state: PreviewState::default(),
            appearance: AppearanceWatcher::new(appearance),
            dismiss: DismissWatcher::new(inside_class),
        }
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        PreviewSnapshot {
            state: self.state,
            slots: Arc::clone(&self.slots),
        }
    }

    /// Both watchers are live. Always equal to `overlay_visible`.
    pub fn watchers_active(&self) -> bool {
        self.appearance.is_active() && self.dismiss.is_active()
    }

    pub fn appearance(&self) -> &AppearanceWatcher {
        &self.appearance
    }

    fn check_index(&self, index: usize) -> Result<(), GalleryError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(GalleryError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }

    /// Set slot `ordinal` from its item's source URL unless already set.
    fn resolve(&mut self, ordinal: usize) {
        if self.slots[ordinal].is_some() {
            return;
        }
        let mut next = self.slots.to_vec();
        next[ordinal] = Some(self.items[ordinal].source_url.clone());
        self.slots = next.into();
        tracing::debug!(ordinal, "resolved full-resolution slide");
    }

    /// Thumbnail click: show slide `ordinal`.
    pub fn open_at(
        &mut self,
        doc: &mut Document,
        ordinal: usize,
    ) -> Result<PreviewSnapshot, GalleryError> {
        self.check_index(ordinal)?;
        if !self.state.overlay_visible {
            let body = doc.body();
            self.appearance.activate(doc, body)?;
            self.dismiss.activate(doc);
        }
        self.resolve(ordinal);
        self.state = PreviewState {
            active_index: ordinal,
            overlay_visible: true,
        };
        tracing::info!(ordinal, "preview opened");
        Ok(self.snapshot())
    }

    /// Show the overlay again at the last viewed slide.
    pub fn reopen(&mut self, doc: &mut Document) -> Result<PreviewSnapshot, GalleryError> {
        self.open_at(doc, self.state.active_index)
    }

    /// Slider index change: resolve and move to `ordinal`.
    pub fn change_index(&mut self, ordinal: usize) -> Result<PreviewSnapshot, GalleryError> {
        self.check_index(ordinal)?;
        self.resolve(ordinal);
        self.state.active_index = ordinal;
        tracing::debug!(ordinal, "active slide changed");
        Ok(self.snapshot())
    }

    /// Hide the overlay, keeping the active index.
    pub fn close(&mut self, doc: &mut Document) -> PreviewSnapshot {
        if self.state.overlay_visible {
            self.dismiss.deactivate(doc);
            self.appearance.deactivate(doc);
            self.state.overlay_visible = false;
            tracing::info!(ordinal = self.state.active_index, "preview closed");
        }
        self.snapshot()
    }

    /// Deliver the pending mutation batch to the appearance watcher.
    pub fn handle_mutations(&mut self, doc: &mut Document) -> Vec<Applied> {
        self.appearance.process_mutations(doc)
    }

    /// Deliver one queued document notification.
    pub fn handle_event(&mut self, doc: &mut Document, event: DomEvent) -> EventOutcome {
        match event {
            DomEvent::Load { listener, node } => self
                .appearance
                .handle_load(doc, listener, node)
                .map_or(EventOutcome::Ignored, EventOutcome::Fitted),
            DomEvent::Error { listener, node } => {
                self.appearance.handle_error(listener, node);
                EventOutcome::Ignored
            }
            DomEvent::Click { listener, target } => {
                if !self.dismiss.owns(listener) || !self.dismiss.should_dismiss(doc, target) {
                    return EventOutcome::Ignored;
                }
                self.close(doc);
                EventOutcome::Dismissed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn controller(n: usize) -> GalleryController {
        GalleryController::new(
            sample_items(n),
            AppearanceConfig::default(),
            "PhotoView__PhotoBox",
        )
    }

    #[test]
    fn two_item_walkthrough() {
        let mut doc = test_document();
        let mut c = controller(2);

        let s = c.open_at(&mut doc, 0).unwrap();
        assert!(s.state.overlay_visible);
        assert_eq!(s.state.active_index, 0);
        assert_eq!(s.slot(0), Some(sample_url(0).as_str()));
        assert_eq!(s.slot(1), None);

        let s = c.change_index(1).unwrap();
        assert_eq!(s.slot(1), Some(sample_url(1).as_str()));
        assert_eq!(s.slot(0), Some(sample_url(0).as_str()));
        assert_eq!(s.state.active_index, 1);
        assert!(s.state.overlay_visible);

        let s = c.close(&mut doc);
        assert!(!s.state.overlay_visible);
        assert_eq!(s.state.active_index, 1);
    }

    #[test]
    fn resolution_is_monotonic() {
        let mut doc = test_document();
        let mut c = controller(3);
        c.open_at(&mut doc, 2).unwrap();
        let first = c.snapshot();
        for _ in 0..3 {
            c.change_index(2).unwrap();
        }
        c.close(&mut doc);
        c.open_at(&mut doc, 2).unwrap();
        assert_eq!(c.snapshot().slots, first.slots);
    }

    #[test]
    fn snapshots_are_not_aliased() {
        let mut doc = test_document();
        let mut c = controller(2);
        let before = c.open_at(&mut doc, 0).unwrap();
        c.change_index(1).unwrap();
        // Earlier snapshot still sees the state it was handed
        assert_eq!(before.slot(1), None);
        assert_eq!(before.resolved_count(), 1);
    }

    #[test]
    fn unchanged_slots_share_storage() {
        let mut doc = test_document();
        let mut c = controller(2);
        let a = c.open_at(&mut doc, 0).unwrap();
        let b = c.change_index(0).unwrap();
        assert!(Arc::ptr_eq(&a.slots, &b.slots));
    }

    #[test]
    fn out_of_range_is_rejected_without_state_change() {
        let mut doc = test_document();
        let mut c = controller(2);
        assert_eq!(
            c.open_at(&mut doc, 2),
            Err(GalleryError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert!(!c.state().overlay_visible);
        assert!(!c.watchers_active());
        assert_eq!(doc.listener_count(), 0);

        c.open_at(&mut doc, 1).unwrap();
        let before = c.snapshot();
        assert!(c.change_index(5).is_err());
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn empty_gallery_rejects_open() {
        let mut doc = test_document();
        let mut c = controller(0);
        assert!(matches!(
            c.open_at(&mut doc, 0),
            Err(GalleryError::IndexOutOfRange { len: 0, .. })
        ));
    }

    #[test]
    fn watchers_track_visibility() {
        let mut doc = test_document();
        let mut c = controller(3);
        let steps: [(&str, usize); 7] = [
            ("close", 0),
            ("open", 1),
            ("open", 2),
            ("change", 0),
            ("close", 0),
            ("close", 0),
            ("open", 0),
        ];
        for (op, n) in steps {
            match op {
                "open" => {
                    c.open_at(&mut doc, n).unwrap();
                }
                "change" => {
                    c.change_index(n).unwrap();
                }
                _ => {
                    c.close(&mut doc);
                }
            }
            assert_eq!(c.watchers_active(), c.state().overlay_visible, "after {op}");
            assert_eq!(c.appearance().is_active(), c.state().overlay_visible);
        }
    }

    #[test]
    fn reopen_returns_to_last_slide() {
        let mut doc = test_document();
        let mut c = controller(3);
        c.open_at(&mut doc, 0).unwrap();
        c.change_index(2).unwrap();
        c.close(&mut doc);
        let s = c.reopen(&mut doc).unwrap();
        assert!(s.state.overlay_visible);
        assert_eq!(s.state.active_index, 2);
    }

    #[test]
    fn change_index_while_closed_keeps_overlay_hidden() {
        let mut c = controller(2);
        let s = c.change_index(1).unwrap();
        assert!(!s.state.overlay_visible);
        assert!(!c.watchers_active());
    }

    #[test]
    fn dismiss_click_closes() {
        let mut doc = test_document();
        let mut c = controller(1);
        c.open_at(&mut doc, 0).unwrap();
        let backdrop = doc.create_element_with_classes("div", &["backdrop"]);
        doc.click(Some(backdrop));
        let event = doc.take_event().unwrap();
        assert_eq!(c.handle_event(&mut doc, event), EventOutcome::Dismissed);
        assert!(!c.state().overlay_visible);
        assert!(!c.watchers_active());
    }

    #[test]
    fn inside_click_keeps_overlay_open() {
        let mut doc = test_document();
        let mut c = controller(1);
        c.open_at(&mut doc, 0).unwrap();
        let inside = doc.create_element_with_classes("div", &["PhotoView__PhotoBox"]);
        doc.click(Some(inside));
        let event = doc.take_event().unwrap();
        assert_eq!(c.handle_event(&mut doc, event), EventOutcome::Ignored);
        assert!(c.state().overlay_visible);
    }
}
