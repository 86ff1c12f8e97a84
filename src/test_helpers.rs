//! Shared test utilities for the lightbox test suite.
//!
//! Documents are created with a 1448x988 viewport so that, with the default
//! insets, the available box is exactly 1200x800.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut doc = test_document();
//! let img = loaded_image(&mut doc, "big.jpg", 4000, 3000);
//! fit_and_apply(&mut doc, img, Insets::default()).unwrap();
//! assert_eq!(attr(&doc, img, "height"), Some("800"));
//! ```

use crate::controller::GalleryItem;
use crate::dom::{Document, DomEvent, ListenerId, NodeId};
use crate::fit::Size;

pub fn test_viewport() -> Size {
    Size::new(1448.0, 988.0)
}

pub fn test_document() -> Document {
    Document::new(test_viewport())
}

/// Full-resolution URL of sample item `ordinal`.
pub fn sample_url(ordinal: usize) -> String {
    format!("https://img.example.com/{}.jpg", 1001 + ordinal)
}

/// `n` items with identities starting at 1001.
pub fn sample_items(n: usize) -> Vec<GalleryItem> {
    GalleryItem::from_pairs((0..n).map(|i| (sample_url(i), 1001 + i as i64)))
}

/// Detached image whose pixel data has already arrived.
pub fn loaded_image(doc: &mut Document, src: &str, width: u32, height: u32) -> NodeId {
    let img = doc.create_image(src, &[]);
    doc.complete_image_load(img, width, height).unwrap();
    img
}

pub fn attr<'a>(doc: &'a Document, node: NodeId, name: &str) -> Option<&'a str> {
    doc.element(node).and_then(|el| el.attribute(name))
}

pub fn transform_of(doc: &Document, node: NodeId) -> String {
    doc.element(node)
        .map(|el| el.transform().to_string())
        .unwrap_or_default()
}

/// Pop the next queued notification, which must be a load.
pub fn next_load(doc: &mut Document) -> (ListenerId, NodeId) {
    match doc.take_event() {
        Some(DomEvent::Load { listener, node }) => (listener, node),
        other => panic!("expected a load notification, got {other:?}"),
    }
}
