//! # Lightbox
//!
//! A headless model of a photo gallery preview: click a thumbnail, a
//! full-screen slider opens, each displayed photo is fitted to the viewport,
//! and a click outside the photo closes it.
//!
//! The browser pieces the preview depends on (node tree, mutation observers,
//! image load notifications, document click listeners) are modelled by
//! [`dom::Document`], so the whole flow runs and tests without a browser.
//!
//! # Flow
//!
//! ```text
//! thumbnail click ─▶ GalleryController::open_at ─▶ Slider::render ─▶ mutation batch
//!                                                                        │
//!                         AppearanceWatcher ◀────────────────────────────┘
//!                           ├─ cached image  ─▶ fit now
//!                           └─ still loading ─▶ one-shot load listener ─▶ fit on load
//!
//! document click ─▶ DismissWatcher ─▶ GalleryController::close ─▶ watchers off
//! ```
//!
//! [`page::Page`] drives the loop: apply a transition, commit the slider,
//! deliver mutations, then deliver queued notifications until idle.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`fit`] | Viewport fit calculation: resize oversized images, scale undersized ones |
//! | [`transform`] | `scale()` term rewriting inside inline CSS transforms |
//! | [`dom`] | Arena document with observers, load and click listeners, HTML serialization |
//! | [`watch`] | Appearance and dismiss watchers, live only while the overlay is open |
//! | [`controller`] | Preview state machine and lazy full-resolution slide resolution |
//! | [`slider`] | Slider capability trait and the keyed `PhotoSlider` |
//! | [`view`] | Thumbnail strip, in a live document or as a standalone Maud page |
//! | [`page`] | Event-loop driver tying document, controller, view, and slider together |
//! | [`source`] | Gallery input: `[{ imageUrl, id }]` JSON or an image directory |
//! | [`config`] | `lightbox.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Fit by Reflow or by Transform
//!
//! Images larger than the available box get explicit `width`/`height`
//! attributes, so layout sees their real size. Smaller images keep their box
//! and are enlarged through the `scale()` term of their transform, leaving any
//! translate or rotate terms set by the slider untouched.
//!
//! ## Watchers Follow Visibility
//!
//! The appearance and dismiss watchers are attached when the overlay becomes
//! visible and detached when it hides, together with every pending load
//! listener. A load that arrives after close finds no listener and does
//! nothing.
//!
//! ## Immutable Snapshots
//!
//! Each controller transition returns a [`controller::PreviewSnapshot`]. The
//! resolved slots are an `Arc<[Option<String>]>` replaced on change, so the
//! view can hold a snapshot across renders without copying or locking.

pub mod config;
pub mod controller;
pub mod dom;
pub mod fit;
pub mod output;
pub mod page;
pub mod slider;
pub mod source;
pub mod transform;
pub mod view;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
