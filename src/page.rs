//! Page driver: one gallery, one document, one slider.
//!
//! Plays the role of the browser event loop for the preview core. Every entry
//! point follows the same order:
//!
//! 1. apply the state change (controller transition)
//! 2. commit: re-render the slider from the new snapshot
//! 3. deliver the mutation batch produced by the commit
//! 4. deliver queued load and click notifications, FIFO, until idle
//!
//! Mutation processing therefore always sees the committed tree, and a
//! notification queued before a close is delivered after it (and ignored).

use crate::config::{ConfigError, LightboxConfig};
use crate::controller::{
    EventOutcome, GalleryController, GalleryError, GalleryItem, PreviewSnapshot,
};
use crate::dom::{Document, DomError, NodeId, Selector};
use crate::fit::Size;
use crate::slider::{PHOTO_CLASS, PhotoSlider, Slider, SliderEvent};
use crate::view::GalleryView;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What a click on the page did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClickOutcome {
    /// Thumbnail ordinal that opened the overlay.
    pub opened: Option<usize>,
    /// Slider callback raised by the click.
    pub slider: Option<SliderEvent>,
    /// The outside-click watcher closed the overlay.
    pub dismissed: bool,
}

pub struct Page<S: Slider = PhotoSlider> {
    doc: Document,
    controller: GalleryController,
    view: GalleryView,
    slider: S,
    photo_selector: Selector,
    outcomes: Vec<EventOutcome>,
}

impl Page<PhotoSlider> {
    pub fn new(
        items: Vec<GalleryItem>,
        config: &LightboxConfig,
        viewport: Size,
    ) -> Result<Self, PageError> {
        let slider = PhotoSlider::new(config.gallery.preload_neighbours);
        Self::with_slider(items, config, viewport, slider)
    }
}

impl<S: Slider> Page<S> {
    pub fn with_slider(
        items: Vec<GalleryItem>,
        config: &LightboxConfig,
        viewport: Size,
        slider: S,
    ) -> Result<Self, PageError> {
        let mut doc = Document::new(viewport);
        let view = GalleryView::mount(&mut doc, &items, &config.gallery.thumbnail_class)?;
        let controller =
            GalleryController::new(items, config.appearance()?, &config.dismiss.inside_class);
        let photo_selector = Selector::parse(&format!("img.{PHOTO_CLASS}"))?;
        Ok(Self {
            doc,
            controller,
            view,
            slider,
            photo_selector,
            outcomes: Vec::new(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Direct document access, for seeding the image cache and the like.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn controller(&self) -> &GalleryController {
        &self.controller
    }

    pub fn view(&self) -> &GalleryView {
        &self.view
    }

    pub fn slider(&self) -> &S {
        &self.slider
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        self.controller.snapshot()
    }

    /// Outcomes delivered since the last call.
    pub fn take_outcomes(&mut self) -> Vec<EventOutcome> {
        std::mem::take(&mut self.outcomes)
    }

    /// Overlay image nodes currently in the document.
    pub fn overlay_images(&self) -> Vec<NodeId> {
        self.doc
            .query_selector_all(self.doc.body(), &self.photo_selector)
    }

    /// Overlay image for slide `ordinal`, if mounted.
    pub fn overlay_image(&self, ordinal: usize) -> Option<NodeId> {
        let src = self.snapshot().slot(ordinal)?.to_string();
        self.overlay_images().into_iter().find(|&node| {
            self.doc
                .element(node)
                .and_then(|el| el.image())
                .is_some_and(|img| img.src == src)
        })
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.doc.set_viewport(viewport);
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    pub fn click_thumbnail(&mut self, ordinal: usize) -> Result<ClickOutcome, PageError> {
        let target = self
            .view
            .thumbnail(ordinal)
            .ok_or(GalleryError::IndexOutOfRange {
                index: ordinal,
                len: self.controller.items().len(),
            })?;
        self.click(Some(target))
    }

    /// A click anywhere on the page.
    pub fn click(&mut self, target: Option<NodeId>) -> Result<ClickOutcome, PageError> {
        // Listeners attached by this click's own handlers do not see it
        self.doc.click(target);

        let mut outcome = ClickOutcome::default();
        if let Some(node) = target {
            if let Some(ordinal) = self.view.thumbnail_ordinal(node) {
                self.controller.open_at(&mut self.doc, ordinal)?;
                outcome.opened = Some(ordinal);
                self.commit()?;
            } else if let Some(event) = self.slider.on_click(&self.doc, node) {
                self.apply_slider_event(event)?;
                outcome.slider = Some(event);
            }
        }

        let before = self.outcomes.len();
        self.run_until_idle()?;
        outcome.dismissed = self.outcomes[before..].contains(&EventOutcome::Dismissed);
        Ok(outcome)
    }

    /// A callback raised by the slider (swipe, keyboard, close control).
    pub fn slider_event(&mut self, event: SliderEvent) -> Result<PreviewSnapshot, PageError> {
        self.apply_slider_event(event)?;
        self.run_until_idle()?;
        Ok(self.snapshot())
    }

    /// Reopen the overlay at the last viewed slide.
    pub fn reopen(&mut self) -> Result<PreviewSnapshot, PageError> {
        self.controller.reopen(&mut self.doc)?;
        self.commit()?;
        self.run_until_idle()?;
        Ok(self.snapshot())
    }

    /// The network finished fetching `node`'s source.
    pub fn complete_image_load(
        &mut self,
        node: NodeId,
        width: u32,
        height: u32,
    ) -> Result<(), PageError> {
        self.doc.complete_image_load(node, width, height)?;
        self.run_until_idle()
    }

    /// The network gave up on `node`'s source.
    pub fn fail_image_load(&mut self, node: NodeId) -> Result<(), PageError> {
        self.doc.fail_image_load(node)?;
        self.run_until_idle()
    }

    /// Deliver pending mutations and notifications until none are left.
    pub fn run_until_idle(&mut self) -> Result<(), PageError> {
        loop {
            if self.doc.has_pending_records() {
                let applied = self.controller.handle_mutations(&mut self.doc);
                self.outcomes
                    .extend(applied.into_iter().map(EventOutcome::Fitted));
                continue;
            }
            let Some(event) = self.doc.take_event() else {
                return Ok(());
            };
            let outcome = self.controller.handle_event(&mut self.doc, event);
            self.outcomes.push(outcome);
            if outcome == EventOutcome::Dismissed {
                self.commit()?;
            }
        }
    }

    fn apply_slider_event(&mut self, event: SliderEvent) -> Result<(), PageError> {
        match event {
            SliderEvent::Close => {
                self.controller.close(&mut self.doc);
            }
            SliderEvent::IndexChange(ordinal) => {
                self.controller.change_index(ordinal)?;
            }
        }
        self.commit()
    }

    fn commit(&mut self) -> Result<(), PageError> {
        let props = self.view.slider_props(&self.controller.snapshot());
        let mount = self.view.slider_mount();
        self.slider.render(&mut self.doc, mount, &props)?;
        let applied = self.controller.handle_mutations(&mut self.doc);
        self.outcomes
            .extend(applied.into_iter().map(EventOutcome::Fitted));
        Ok(())
    }
}
