//! Gallery presentation.
//!
//! Two renderings of the same thumbnail strip:
//!
//! - [`GalleryView::mount`] builds it inside a live [`Document`] and remembers
//!   which node belongs to which ordinal, so clicks can be routed to the
//!   controller. The slider mount point sits next to the thumbnails.
//! - [`render_page`] produces a standalone HTML page with
//!   [maud](https://maud.lambda.xyz/), for the `render` command.

use crate::config::LightboxConfig;
use crate::controller::{GalleryItem, PreviewSnapshot};
use crate::dom::{Document, DomError, NodeId};
use crate::slider::SliderProps;
use maud::{DOCTYPE, Markup, html};

pub const SECTION_CLASSES: &[&str] = &["section", "previewSection"];
pub const SLIDER_CLASS: &str = "photoSliderStyle";

/// Thumbnail `id` attribute: 1-based like the page anchors.
pub fn thumbnail_id(ordinal: usize) -> String {
    format!("preview-{}", ordinal + 1)
}

#[derive(Debug)]
pub struct GalleryView {
    section: NodeId,
    slider_mount: NodeId,
    thumbnails: Vec<NodeId>,
}

impl GalleryView {
    /// Build the thumbnail strip under the document body.
    pub fn mount(
        doc: &mut Document,
        items: &[GalleryItem],
        thumbnail_class: &str,
    ) -> Result<Self, DomError> {
        let section = doc.create_element_with_classes("section", SECTION_CLASSES);
        let mut thumbnails = Vec::with_capacity(items.len());
        for item in items {
            let img = doc.create_image(&item.source_url, &[thumbnail_class]);
            doc.set_id(img, &thumbnail_id(item.ordinal))?;
            doc.set_attribute(img, "alt", "")?;
            doc.set_attribute(img, "data-key", &format!("{}img", item.identity))?;
            doc.append_child(section, img)?;
            thumbnails.push(img);
        }
        let slider_mount = doc.create_element_with_classes("div", &[SLIDER_CLASS]);
        doc.append_child(section, slider_mount)?;
        let body = doc.body();
        doc.append_child(body, section)?;
        Ok(Self {
            section,
            slider_mount,
            thumbnails,
        })
    }

    pub fn section(&self) -> NodeId {
        self.section
    }

    pub fn slider_mount(&self) -> NodeId {
        self.slider_mount
    }

    pub fn thumbnail(&self, ordinal: usize) -> Option<NodeId> {
        self.thumbnails.get(ordinal).copied()
    }

    /// Ordinal of the thumbnail at `node`, if it is one.
    pub fn thumbnail_ordinal(&self, node: NodeId) -> Option<usize> {
        self.thumbnails.iter().position(|&t| t == node)
    }

    pub fn slider_props(&self, snapshot: &PreviewSnapshot) -> SliderProps {
        SliderProps::from_snapshot(snapshot)
    }
}

/// Standalone HTML page with the thumbnail strip.
pub fn render_page(title: &str, items: &[GalleryItem], config: &LightboxConfig) -> Markup {
    let thumbnail_class = config.gallery.thumbnail_class.as_str();
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
            }
            body {
                section class=(SECTION_CLASSES.join(" ")) {
                    @for item in items {
                        img class=(thumbnail_class)
                            id=(thumbnail_id(item.ordinal))
                            src=(item.source_url)
                            alt=""
                            loading="lazy"
                            data-key={ (item.identity) "img" };
                    }
                    div class=(SLIDER_CLASS) {}
                }
            }
        }
    }
}
