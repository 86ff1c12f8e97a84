//! Outside-click dismissal.
//!
//! The displayed image sits inside a wrapper whose own background must not
//! dismiss, so the decision looks at the exact click target's class list
//! rather than the bubbling path: a target that lacks the inside marker class
//! dismisses the overlay.

use crate::dom::{Document, ListenerId, NodeId};

#[derive(Debug)]
pub struct DismissWatcher {
    inside_class: String,
    listener: Option<ListenerId>,
}

impl DismissWatcher {
    pub fn new(inside_class: impl Into<String>) -> Self {
        Self {
            inside_class: inside_class.into(),
            listener: None,
        }
    }

    pub fn inside_class(&self) -> &str {
        &self.inside_class
    }

    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    /// Attach the document click listener. No-op when already active.
    pub fn activate(&mut self, doc: &mut Document) {
        if self.listener.is_none() {
            self.listener = Some(doc.add_click_listener());
        }
    }

    /// Remove the document click listener. No-op when inactive.
    pub fn deactivate(&mut self, doc: &mut Document) {
        if let Some(listener) = self.listener.take() {
            doc.remove_listener(listener);
        }
    }

    /// Whether a click notification was delivered for this watcher's current
    /// listener.
    pub fn owns(&self, listener: ListenerId) -> bool {
        self.listener == Some(listener)
    }

    /// Decide whether a click on `target` dismisses the overlay.
    ///
    /// No target, a non-element target, or an element without any class never
    /// dismisses.
    pub fn should_dismiss(&self, doc: &Document, target: Option<NodeId>) -> bool {
        let Some(element) = target.and_then(|t| doc.element(t)) else {
            return false;
        };
        if element.classes().is_empty() {
            return false;
        }
        !element.has_class(&self.inside_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_document;

    fn watcher() -> DismissWatcher {
        DismissWatcher::new("PhotoView__PhotoBox")
    }

    #[test]
    fn inside_box_click_does_not_dismiss() {
        let mut doc = test_document();
        let boxed = doc.create_element_with_classes("div", &["PhotoView__PhotoBox"]);
        assert!(!watcher().should_dismiss(&doc, Some(boxed)));
    }

    #[test]
    fn backdrop_click_dismisses() {
        let mut doc = test_document();
        let backdrop = doc.create_element_with_classes("div", &["backdrop"]);
        assert!(watcher().should_dismiss(&doc, Some(backdrop)));
    }

    #[test]
    fn marker_among_other_classes_still_counts() {
        let mut doc = test_document();
        let node = doc.create_element_with_classes("div", &["wrapper", "PhotoView__PhotoBox"]);
        assert!(!watcher().should_dismiss(&doc, Some(node)));
    }

    #[test]
    fn missing_target_or_class_list_never_dismisses() {
        let mut doc = test_document();
        let text = doc.create_text("caption");
        let bare = doc.create_element("div");
        let w = watcher();
        assert!(!w.should_dismiss(&doc, None));
        assert!(!w.should_dismiss(&doc, Some(text)));
        assert!(!w.should_dismiss(&doc, Some(bare)));
    }

    #[test]
    fn lifecycle_attaches_exactly_one_listener() {
        let mut doc = test_document();
        let mut w = watcher();
        w.deactivate(&mut doc);
        w.activate(&mut doc);
        w.activate(&mut doc);
        assert_eq!(doc.listener_count(), 1);
        assert!(w.is_active());

        w.deactivate(&mut doc);
        w.deactivate(&mut doc);
        assert_eq!(doc.listener_count(), 0);
        assert!(!w.is_active());
    }

    #[test]
    fn stale_listener_is_not_owned() {
        let mut doc = test_document();
        let mut w = watcher();
        w.activate(&mut doc);
        doc.click(None);
        w.deactivate(&mut doc);
        w.activate(&mut doc);
        match doc.take_event() {
            Some(crate::dom::DomEvent::Click { listener, .. }) => assert!(!w.owns(listener)),
            other => panic!("expected click, got {other:?}"),
        }
    }
}
