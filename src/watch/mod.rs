//! Watchers that are live only while the preview overlay is open.
//!
//! - **Appearance**: [`AppearanceWatcher`] observes the document for image
//!   nodes inserted by the slider and fits each one once its pixels are known.
//! - **Dismiss**: [`DismissWatcher`] listens for document clicks and decides
//!   whether a click target closes the overlay.
//!
//! Both have an explicit `activate`/`deactivate` lifecycle. Activating an
//! active watcher or deactivating an inactive one is a no-op. The controller
//! ties both lifecycles to overlay visibility.

pub mod appearance;
pub mod dismiss;

pub use appearance::{AppearanceConfig, AppearanceWatcher, Applied, fit_and_apply};
pub use dismiss::DismissWatcher;
