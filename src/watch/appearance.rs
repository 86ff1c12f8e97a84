//! Appearance watcher: fit images as the slider inserts them.
//!
//! For every mutation batch under the observed root:
//!
//! 1. Removed subtrees drop their pending load listeners (unmount cleanup).
//!    Every removal in the batch is handled before any addition, so a node
//!    moved within one commit ends up watched at its new position.
//! 2. Added subtrees are walked. Photo frames matching
//!    [`AppearanceConfig::photo_selector`] get their residual `scale()` reset to
//!    `scale(1)`. Image nodes are fitted right away when their pixels are
//!    already decoded, or get a one-shot load listener otherwise.
//!
//! A load notification is honoured only if its listener is still pending here
//! and the node is still connected, so late loads after [`deactivate`] or after
//! an unmount do nothing.
//!
//! [`deactivate`]: AppearanceWatcher::deactivate

use crate::dom::{Document, DomError, ListenerId, MutationRecord, NodeId, ObserverId, Selector};
use crate::fit::{FitDecision, FitError, Insets, Size, available_box, compute_fit, to_pixels};
use crate::transform;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct AppearanceConfig {
    /// Freshly inserted preview frames whose scale is reset.
    pub photo_selector: Selector,
    /// Raster image nodes to fit. A match must also carry image state.
    pub image_selector: Selector,
    /// Chrome reserved around the overlay.
    pub insets: Insets,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            photo_selector: Selector::parse(".PhotoView__Photo")
                .expect("default photo selector is valid"),
            image_selector: Selector::parse("img").expect("default image selector is valid"),
            insets: Insets::default(),
        }
    }
}

/// A fit decision that was written to a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Applied {
    pub node: NodeId,
    pub decision: FitDecision,
}

#[derive(Debug)]
struct Active {
    observer: ObserverId,
    /// listener → node, one entry per image awaiting its load.
    pending: HashMap<ListenerId, NodeId>,
}

impl Active {
    fn is_pending(&self, node: NodeId) -> bool {
        self.pending.values().any(|&n| n == node)
    }
}

#[derive(Debug)]
pub struct AppearanceWatcher {
    config: AppearanceConfig,
    active: Option<Active>,
}

impl AppearanceWatcher {
    pub fn new(config: AppearanceConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    pub fn config(&self) -> &AppearanceConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Number of images waiting for a load notification.
    pub fn pending_loads(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.pending.len())
    }

    /// Start observing `root`. No-op when already active.
    pub fn activate(&mut self, doc: &mut Document, root: NodeId) -> Result<(), DomError> {
        if self.active.is_some() {
            return Ok(());
        }
        let observer = doc.observe(root)?;
        tracing::debug!(%root, "appearance watcher activated");
        self.active = Some(Active {
            observer,
            pending: HashMap::new(),
        });
        Ok(())
    }

    /// Stop observing and release every pending load listener. No-op when
    /// inactive.
    pub fn deactivate(&mut self, doc: &mut Document) {
        let Some(active) = self.active.take() else {
            return;
        };
        doc.disconnect(active.observer);
        for listener in active.pending.keys() {
            doc.remove_listener(*listener);
        }
        tracing::debug!(
            released = active.pending.len(),
            "appearance watcher deactivated"
        );
    }

    /// Process the queued mutation batch. Returns the fits applied
    /// synchronously (cache hits).
    pub fn process_mutations(&mut self, doc: &mut Document) -> Vec<Applied> {
        let Some(observer) = self.active.as_ref().map(|a| a.observer) else {
            return Vec::new();
        };
        let mut added = Vec::new();
        let mut removed = Vec::new();
        for record in doc.take_records(observer) {
            if let MutationRecord::ChildList {
                added: a,
                removed: r,
                ..
            } = record
            {
                added.extend(a);
                removed.extend(r);
            }
        }

        for node in removed {
            self.release_subtree(doc, node);
        }

        let mut applied = Vec::new();
        let mut seen = HashSet::new();
        for node in added {
            if !doc.is_connected(node) {
                continue;
            }
            for inserted in doc.inclusive_descendants(node) {
                if seen.insert(inserted) {
                    applied.extend(self.on_inserted(doc, inserted));
                }
            }
        }
        applied
    }

    /// Handle a load notification. Stale listeners and unmounted nodes are
    /// ignored.
    pub fn handle_load(
        &mut self,
        doc: &mut Document,
        listener: ListenerId,
        node: NodeId,
    ) -> Option<Applied> {
        let active = self.active.as_mut()?;
        if active.pending.remove(&listener) != Some(node) {
            tracing::debug!(%node, "ignoring stale load notification");
            return None;
        }
        if !doc.is_connected(node) {
            tracing::debug!(%node, "ignoring load for unmounted image");
            return None;
        }
        self.fit(doc, node)
    }

    /// Handle an error notification: the image will never load, so its
    /// pending entry is released without a fit.
    pub fn handle_error(&mut self, listener: ListenerId, node: NodeId) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.pending.remove(&listener).is_some() {
            tracing::warn!(%node, "image failed to load, not fitted");
        }
    }

    fn on_inserted(&mut self, doc: &mut Document, node: NodeId) -> Option<Applied> {
        let element = doc.element(node)?;
        let is_photo = self.config.photo_selector.matches(element);
        let image_complete = if self.config.image_selector.matches(element) {
            element.image().map(|img| img.complete)
        } else {
            None
        };

        if is_photo {
            let current = element.transform().to_string();
            let reset = transform::replace_scale(&current, 1.0);
            if reset != current.as_str() {
                let reset = reset.into_owned();
                if let Err(err) = doc.set_transform(node, &reset) {
                    tracing::warn!(%node, error = %err, "cannot reset photo scale");
                }
            }
        }

        match image_complete {
            Some(true) => self.fit(doc, node),
            Some(false) => {
                self.await_load(doc, node);
                None
            }
            None => None,
        }
    }

    fn await_load(&mut self, doc: &mut Document, node: NodeId) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.is_pending(node) {
            return;
        }
        match doc.add_load_listener(node) {
            Ok(listener) => {
                active.pending.insert(listener, node);
            }
            Err(err) => tracing::warn!(%node, error = %err, "cannot watch image load"),
        }
    }

    fn release_subtree(&mut self, doc: &mut Document, root: NodeId) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let gone: HashSet<NodeId> = doc.inclusive_descendants(root).into_iter().collect();
        active.pending.retain(|&listener, node| {
            let keep = !gone.contains(node);
            if !keep {
                doc.remove_listener(listener);
            }
            keep
        });
    }

    fn fit(&self, doc: &mut Document, node: NodeId) -> Option<Applied> {
        match fit_and_apply(doc, node, self.config.insets) {
            Ok(decision) => {
                tracing::debug!(%node, ?decision, "fitted image");
                Some(Applied { node, decision })
            }
            Err(err) => {
                tracing::warn!(%node, error = %err, "skipping image fit");
                None
            }
        }
    }
}

/// Errors from a single fit-and-apply step.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("image {0} has no pixel data yet")]
    NotLoaded(NodeId),
}

/// Read the viewport, compute the fit for `node`'s natural size, and write it.
///
/// `Resize` sets integer `width`/`height` attributes; `Scale` rewrites (or
/// appends) the `scale()` term of the inline transform. Applying the same
/// decision twice leaves the node unchanged.
pub fn fit_and_apply(
    doc: &mut Document,
    node: NodeId,
    insets: Insets,
) -> Result<FitDecision, ApplyError> {
    let element = doc.element(node).ok_or(DomError::NotAnElement(node))?;
    let image = element.image().ok_or(DomError::NotAnImage(node))?;
    let (natural_w, natural_h) = image.natural.ok_or(ApplyError::NotLoaded(node))?;

    let available = available_box(doc.viewport(), insets);
    let decision = compute_fit(Size::new(natural_w as f64, natural_h as f64), available)?;

    match decision {
        FitDecision::Resize { width, height } => {
            doc.set_attribute(node, "width", &to_pixels(width).to_string())?;
            doc.set_attribute(node, "height", &to_pixels(height).to_string())?;
        }
        FitDecision::Scale { factor } => {
            let next = transform::set_scale(element.transform(), factor);
            doc.set_transform(node, &next)?;
        }
    }
    Ok(decision)
}
