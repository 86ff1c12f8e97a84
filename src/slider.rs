//! Slider capability driven by the gallery.
//!
//! The gallery owns *what* is shown ([`SliderProps`]); the slider owns *how*
//! it is drawn. Slider callbacks come back as [`SliderEvent`]s that the page
//! routes to the controller.
//!
//! [`PhotoSlider`] draws the class-name conventions the appearance and dismiss
//! watchers key on:
//!
//! ```text
//! div.PhotoView-Portal
//! ├── div.PhotoView-Slider__Backdrop
//! ├── div.PhotoView-Slider__Close
//! └── div.PhotoView__PhotoWrap            (one per mounted slide)
//!     └── div.PhotoView__PhotoBox
//!         └── img.PhotoView__Photo        transform: translate3d(0px, 0px, 0) scale(1)
//! ```
//!
//! Slides are keyed. A slide whose key is unchanged keeps its nodes, so an
//! image that was already fitted is not re-inserted and not re-fitted.

use crate::controller::PreviewSnapshot;
use crate::dom::{Document, DomError, NodeId};

pub const PORTAL_CLASS: &str = "PhotoView-Portal";
pub const BACKDROP_CLASS: &str = "PhotoView-Slider__Backdrop";
pub const CLOSE_CLASS: &str = "PhotoView-Slider__Close";
pub const WRAP_CLASS: &str = "PhotoView__PhotoWrap";
pub const BOX_CLASS: &str = "PhotoView__PhotoBox";
pub const PHOTO_CLASS: &str = "PhotoView__Photo";
const INITIAL_TRANSFORM: &str = "translate3d(0px, 0px, 0) scale(1)";

/// One slide handed to the slider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideImage {
    /// Full-resolution source, `None` until the slide is resolved.
    pub src: Option<String>,
    pub key: String,
}

impl SlideImage {
    pub fn new(src: Option<&str>, ordinal: usize) -> Self {
        let key = match src {
            Some(src) => format!("{src}{ordinal}"),
            None => format!("pending-{ordinal}"),
        };
        Self {
            src: src.map(str::to_string),
            key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliderProps {
    pub images: Vec<SlideImage>,
    pub visible: bool,
    pub active_index: usize,
}

impl SliderProps {
    pub fn from_snapshot(snapshot: &PreviewSnapshot) -> Self {
        Self {
            images: snapshot
                .slots
                .iter()
                .enumerate()
                .map(|(ordinal, slot)| SlideImage::new(slot.as_deref(), ordinal))
                .collect(),
            visible: snapshot.state.overlay_visible,
            active_index: snapshot.state.active_index,
        }
    }
}

/// Callbacks raised by the slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderEvent {
    Close,
    IndexChange(usize),
}

/// External slider capability.
pub trait Slider {
    /// Bring the subtree under `mount` in line with `props`.
    fn render(
        &mut self,
        doc: &mut Document,
        mount: NodeId,
        props: &SliderProps,
    ) -> Result<(), DomError>;

    /// Map a click inside the slider to a callback, if it is one of the
    /// slider's own controls.
    fn on_click(&self, _doc: &Document, _target: NodeId) -> Option<SliderEvent> {
        None
    }
}

#[derive(Debug)]
struct MountedSlide {
    ordinal: usize,
    key: String,
    wrap: NodeId,
}

#[derive(Debug, Default)]
pub struct PhotoSlider {
    preload_neighbours: bool,
    portal: Option<NodeId>,
    close_button: Option<NodeId>,
    slides: Vec<MountedSlide>,
}

impl PhotoSlider {
    pub fn new(preload_neighbours: bool) -> Self {
        Self {
            preload_neighbours,
            ..Self::default()
        }
    }

    pub fn portal(&self) -> Option<NodeId> {
        self.portal
    }

    /// Ordinals currently mounted, in mount order.
    pub fn mounted(&self) -> Vec<usize> {
        self.slides.iter().map(|s| s.ordinal).collect()
    }

    fn wanted(&self, props: &SliderProps) -> Vec<usize> {
        let active = props.active_index;
        let mut wanted = vec![active];
        if self.preload_neighbours {
            if let Some(prev) = active.checked_sub(1) {
                wanted.push(prev);
            }
            wanted.push(active + 1);
        }
        wanted
            .into_iter()
            .filter(|&i| props.images.get(i).is_some_and(|img| img.src.is_some()))
            .collect()
    }

    fn build_slide(doc: &mut Document, src: &str, ordinal: usize) -> Result<NodeId, DomError> {
        let wrap = doc.create_element_with_classes("div", &[WRAP_CLASS]);
        doc.set_attribute(wrap, "data-index", &ordinal.to_string())?;
        let photo_box = doc.create_element_with_classes("div", &[BOX_CLASS]);
        let img = doc.create_image(src, &[PHOTO_CLASS]);
        doc.set_transform(img, INITIAL_TRANSFORM)?;
        doc.append_child(photo_box, img)?;
        doc.append_child(wrap, photo_box)?;
        Ok(wrap)
    }

    fn unmount(&mut self, doc: &mut Document) -> Result<(), DomError> {
        if let Some(portal) = self.portal.take() {
            doc.detach(portal)?;
        }
        self.close_button = None;
        self.slides.clear();
        Ok(())
    }
}

impl Slider for PhotoSlider {
    fn render(
        &mut self,
        doc: &mut Document,
        mount: NodeId,
        props: &SliderProps,
    ) -> Result<(), DomError> {
        if !props.visible {
            return self.unmount(doc);
        }

        let wanted = self.wanted(props);
        let mut fresh_portal = false;
        let portal = match self.portal {
            Some(portal) => portal,
            None => {
                let portal = doc.create_element_with_classes("div", &[PORTAL_CLASS]);
                let backdrop = doc.create_element_with_classes("div", &[BACKDROP_CLASS]);
                let close = doc.create_element_with_classes("div", &[CLOSE_CLASS]);
                doc.append_child(portal, backdrop)?;
                doc.append_child(portal, close)?;
                self.portal = Some(portal);
                self.close_button = Some(close);
                fresh_portal = true;
                portal
            }
        };

        // Drop slides that are no longer wanted or whose key changed
        let mut kept = Vec::with_capacity(self.slides.len());
        for slide in self.slides.drain(..) {
            let still_wanted = wanted.contains(&slide.ordinal)
                && props.images[slide.ordinal].key == slide.key;
            if still_wanted {
                kept.push(slide);
            } else {
                doc.detach(slide.wrap)?;
            }
        }
        self.slides = kept;

        for ordinal in wanted {
            if self.slides.iter().any(|s| s.ordinal == ordinal) {
                continue;
            }
            let image = &props.images[ordinal];
            let Some(src) = image.src.as_deref() else {
                continue;
            };
            let wrap = Self::build_slide(doc, src, ordinal)?;
            doc.append_child(portal, wrap)?;
            self.slides.push(MountedSlide {
                ordinal,
                key: image.key.clone(),
                wrap,
            });
        }

        for slide in &self.slides {
            let active = if slide.ordinal == props.active_index {
                "true"
            } else {
                "false"
            };
            if doc.element(slide.wrap).and_then(|e| e.attribute("data-active")) != Some(active) {
                doc.set_attribute(slide.wrap, "data-active", active)?;
            }
        }

        // Insert the whole overlay in one mutation
        if fresh_portal {
            doc.append_child(mount, portal)?;
        }
        Ok(())
    }

    fn on_click(&self, _doc: &Document, target: NodeId) -> Option<SliderEvent> {
        (self.close_button == Some(target)).then_some(SliderEvent::Close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MutationRecord, Selector};
    use crate::test_helpers::test_document;

    fn props(slots: &[Option<&str>], visible: bool, active: usize) -> SliderProps {
        SliderProps {
            images: slots
                .iter()
                .enumerate()
                .map(|(i, s)| SlideImage::new(*s, i))
                .collect(),
            visible,
            active_index: active,
        }
    }

    fn photos(doc: &Document) -> Vec<NodeId> {
        doc.query_selector_all(doc.body(), &Selector::parse("img.PhotoView__Photo").unwrap())
    }

    #[test]
    fn slide_keys_follow_source_and_ordinal() {
        assert_eq!(SlideImage::new(Some("a.jpg"), 3).key, "a.jpg3");
        assert_eq!(SlideImage::new(None, 3).key, "pending-3");
    }

    #[test]
    fn visible_render_inserts_portal_in_one_mutation() {
        let mut doc = test_document();
        let mount = doc.body();
        let observer = doc.observe(mount).unwrap();
        let mut slider = PhotoSlider::new(false);

        slider
            .render(&mut doc, mount, &props(&[Some("a.jpg")], true, 0))
            .unwrap();
        let records = doc.take_records(observer);
        assert_eq!(records.len(), 1);
        assert!(matches!(&records[0], MutationRecord::ChildList { added, .. } if added.len() == 1));
        assert_eq!(photos(&doc).len(), 1);
    }

    #[test]
    fn hidden_render_unmounts() {
        let mut doc = test_document();
        let mount = doc.body();
        let mut slider = PhotoSlider::new(false);
        slider
            .render(&mut doc, mount, &props(&[Some("a.jpg")], true, 0))
            .unwrap();
        slider
            .render(&mut doc, mount, &props(&[Some("a.jpg")], false, 0))
            .unwrap();
        assert!(photos(&doc).is_empty());
        assert!(slider.portal().is_none());
    }

    #[test]
    fn unchanged_slide_keeps_its_node() {
        let mut doc = test_document();
        let mount = doc.body();
        let mut slider = PhotoSlider::new(false);
        let p = props(&[Some("a.jpg"), None], true, 0);
        slider.render(&mut doc, mount, &p).unwrap();
        let before = photos(&doc);
        slider.render(&mut doc, mount, &p).unwrap();
        assert_eq!(photos(&doc), before);
    }

    #[test]
    fn switching_slide_swaps_nodes() {
        let mut doc = test_document();
        let mount = doc.body();
        let mut slider = PhotoSlider::new(false);
        slider
            .render(&mut doc, mount, &props(&[Some("a.jpg"), None], true, 0))
            .unwrap();
        let first = photos(&doc);
        slider
            .render(&mut doc, mount, &props(&[Some("a.jpg"), Some("b.jpg")], true, 1))
            .unwrap();
        let second = photos(&doc);
        assert_eq!(second.len(), 1);
        assert_ne!(first, second);
        assert!(!doc.is_connected(first[0]));
        assert_eq!(slider.mounted(), vec![1]);
    }

    #[test]
    fn neighbours_mount_only_when_resolved() {
        let mut doc = test_document();
        let mount = doc.body();
        let mut slider = PhotoSlider::new(true);
        slider
            .render(
                &mut doc,
                mount,
                &props(&[Some("a.jpg"), Some("b.jpg"), None], true, 1),
            )
            .unwrap();
        assert_eq!(slider.mounted(), vec![1, 0]);
    }

    #[test]
    fn new_photo_starts_from_identity_scale() {
        let mut doc = test_document();
        let mount = doc.body();
        let mut slider = PhotoSlider::new(false);
        slider
            .render(&mut doc, mount, &props(&[Some("a.jpg")], true, 0))
            .unwrap();
        let img = photos(&doc)[0];
        assert_eq!(doc.element(img).unwrap().transform(), INITIAL_TRANSFORM);
    }

    #[test]
    fn close_button_raises_close() {
        let mut doc = test_document();
        let mount = doc.body();
        let mut slider = PhotoSlider::new(false);
        slider
            .render(&mut doc, mount, &props(&[Some("a.jpg")], true, 0))
            .unwrap();
        let close = doc.query_selector_all(mount, &Selector::parse(".PhotoView-Slider__Close").unwrap())[0];
        assert_eq!(slider.on_click(&doc, close), Some(SliderEvent::Close));
        assert_eq!(slider.on_click(&doc, photos(&doc)[0]), None);
    }
}
