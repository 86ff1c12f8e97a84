//! In-memory document tree.
//!
//! Models just enough of a browser document for the preview core to run
//! headless and deterministically:
//!
//! - **Element tree**: arena-backed nodes with tag, id, class list, attributes,
//!   and an inline `transform`. Removed nodes stay in the arena, detached, so a
//!   [`NodeId`] held by a watcher or slider never aliases a newer node. The
//!   arena grows with every node created over a session; queries that scan for
//!   live state ([`Document::pending_images`], selectors) walk only the tree
//!   under the root they are given.
//! - **Mutation observers**: [`Document::observe`] registers a subtree root;
//!   child-list, attribute, and text changes under it are queued as
//!   [`MutationRecord`]s until the observer takes them.
//! - **Image loading**: `img` elements carry an [`ImageState`]. A source that is
//!   already in the document's decoded-image cache is complete on assignment
//!   (the cache-hit path); otherwise it completes later through
//!   [`Document::complete_image_load`], which fires one-shot load listeners, or
//!   [`Document::fail_image_load`], which fires them as error notifications.
//! - **Document click listeners**: [`Document::click`] queues one
//!   [`DomEvent::Click`] per attached listener.
//!
//! Notifications are queued, never delivered re-entrantly; the page driver
//! drains them with [`Document::take_event`] in FIFO order.

use crate::fit::Size;
use maud::{Markup, PreEscaped, html};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0} is not a text node")]
    NotText(NodeId),
    #[error("node {0} is not an image")]
    NotAnImage(NodeId),
    #[error("cannot insert {child} under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("invalid selector '{0}'")]
    InvalidSelector(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Pixel data state of an `img` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageState {
    pub src: String,
    /// Decoding finished (successfully or not).
    pub complete: bool,
    /// Natural size; `(0, 0)` for a broken image.
    pub natural: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    transform: String,
    image: Option<ImageState>,
}

impl Element {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn transform(&self) -> &str {
        &self.transform
    }

    pub fn image(&self) -> Option<&ImageState> {
        self.image.as_ref()
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One observed change, in the shape a mutation observer reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attributes {
        target: NodeId,
        name: String,
    },
    CharacterData {
        target: NodeId,
    },
}

impl MutationRecord {
    fn target(&self) -> NodeId {
        match self {
            Self::ChildList { target, .. }
            | Self::Attributes { target, .. }
            | Self::CharacterData { target } => *target,
        }
    }
}

/// A queued notification for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Load { listener: ListenerId, node: NodeId },
    /// Decoding failed; delivered to the same one-shot listeners as `Load`.
    Error { listener: ListenerId, node: NodeId },
    Click { listener: ListenerId, target: Option<NodeId> },
}

#[derive(Debug)]
struct Observer {
    id: ObserverId,
    root: NodeId,
    records: Vec<MutationRecord>,
}

/// Compound selector: optional tag, optional id, any number of classes.
///
/// Supports `img`, `.PhotoView__Photo`, `#preview-1`, `img.previewImg.active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let invalid = || DomError::InvalidSelector(input.to_string());
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let mut selector = Selector {
            tag: None,
            id: None,
            classes: Vec::new(),
        };
        let head_end = trimmed.find(['.', '#']).unwrap_or(trimmed.len());
        let head = &trimmed[..head_end];
        if !head.is_empty() {
            if !is_ident(head) {
                return Err(invalid());
            }
            selector.tag = Some(head.to_ascii_lowercase());
        }

        let mut rest = &trimmed[head_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..end];
            if !is_ident(name) {
                return Err(invalid());
            }
            match marker {
                '.' => selector.classes.push(name.to_string()),
                '#' if selector.id.is_none() => selector.id = Some(name.to_string()),
                _ => return Err(invalid()),
            }
            rest = &body[end..];
        }
        Ok(selector)
    }

    pub fn matches(&self, element: &Element) -> bool {
        self.tag.as_deref().is_none_or(|t| element.tag == t)
            && self.id.as_deref().is_none_or(|id| element.id() == Some(id))
            && self.classes.iter().all(|c| element.has_class(c))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub struct Document {
    nodes: Vec<NodeData>,
    body: NodeId,
    viewport: Size,
    image_cache: HashMap<String, (u32, u32)>,
    observers: Vec<Observer>,
    load_listeners: Vec<(ListenerId, NodeId)>,
    click_listeners: Vec<ListenerId>,
    events: VecDeque<DomEvent>,
    next_handle: u64,
}

impl Document {
    pub fn new(viewport: Size) -> Self {
        let body = NodeData {
            kind: NodeKind::Element(Element {
                tag: "body".to_string(),
                ..Element::default()
            }),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
            viewport,
            image_cache: HashMap::new(),
            observers: Vec::new(),
            load_listeners: Vec::new(),
            click_listeners: Vec::new(),
            events: VecDeque::new(),
            next_handle: 1,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    fn handle(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn data(&self, node: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(node.0).ok_or(DomError::UnknownNode(node))
    }

    fn element_data_mut(&mut self, node: NodeId) -> Result<&mut Element, DomError> {
        match self.nodes.get_mut(node.0) {
            Some(NodeData {
                kind: NodeKind::Element(el),
                ..
            }) => Ok(el),
            Some(_) => Err(DomError::NotAnElement(node)),
            None => Err(DomError::UnknownNode(node)),
        }
    }

    // =========================================================================
    // Tree construction
    // =========================================================================

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(NodeData {
            kind: NodeKind::Element(Element {
                tag: tag.to_ascii_lowercase(),
                ..Element::default()
            }),
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Create a detached element with the given classes.
    pub fn create_element_with_classes(&mut self, tag: &str, classes: &[&str]) -> NodeId {
        let node = self.create_element(tag);
        if let NodeKind::Element(el) = &mut self.nodes[node.0].kind {
            el.classes = classes.iter().map(|c| c.to_string()).collect();
        }
        node
    }

    /// Create a detached `img` element pointing at `src`.
    pub fn create_image(&mut self, src: &str, classes: &[&str]) -> NodeId {
        let node = self.create_element_with_classes("img", classes);
        let state = self.image_state_for(src);
        if let NodeKind::Element(el) = &mut self.nodes[node.0].kind {
            el.attributes.insert("src".to_string(), src.to_string());
            el.image = Some(state);
        }
        node
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.nodes.push(NodeData {
            kind: NodeKind::Text(text.to_string()),
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn image_state_for(&self, src: &str) -> ImageState {
        match self.image_cache.get(src) {
            Some(&dims) => ImageState {
                src: src.to_string(),
                complete: true,
                natural: Some(dims),
            },
            None => ImageState {
                src: src.to_string(),
                complete: false,
                natural: None,
            },
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_is_element = matches!(self.data(parent)?.kind, NodeKind::Element(_));
        self.data(child)?;
        if !parent_is_element || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(old_parent) = self.nodes[child.0].parent {
            self.remove_child(old_parent, child)?;
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.record(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.data(child)?;
        let children = &mut self
            .nodes
            .get_mut(parent.0)
            .ok_or(DomError::UnknownNode(parent))?
            .children;
        let Some(pos) = children.iter().position(|&c| c == child) else {
            return Err(DomError::HierarchyRequest { parent, child });
        };
        children.remove(pos);
        self.nodes[child.0].parent = None;
        self.record(MutationRecord::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![child],
        });
        Ok(())
    }

    /// Detach `node` from its parent, if it has one.
    pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        match self.data(node)?.parent {
            Some(parent) => self.remove_child(parent, node),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Element mutation (recorded as attribute changes)
    // =========================================================================

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_data_mut(node)?
            .attributes
            .insert(name.to_string(), value.to_string());
        self.record_attribute(node, name);
        Ok(())
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) -> Result<(), DomError> {
        self.element_data_mut(node)?.id = Some(id.to_string());
        self.record_attribute(node, "id");
        Ok(())
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        let el = self.element_data_mut(node)?;
        if el.has_class(class) {
            return Ok(());
        }
        el.classes.push(class.to_string());
        self.record_attribute(node, "class");
        Ok(())
    }

    /// Replace the inline `transform` style.
    pub fn set_transform(&mut self, node: NodeId, transform: &str) -> Result<(), DomError> {
        let el = self.element_data_mut(node)?;
        if el.transform == transform {
            return Ok(());
        }
        el.transform = transform.to_string();
        self.record_attribute(node, "style");
        Ok(())
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match self.nodes.get_mut(node.0) {
            Some(NodeData {
                kind: NodeKind::Text(t),
                ..
            }) => {
                *t = text.to_string();
            }
            Some(_) => return Err(DomError::NotText(node)),
            None => return Err(DomError::UnknownNode(node)),
        }
        self.record(MutationRecord::CharacterData { target: node });
        Ok(())
    }

    fn record_attribute(&mut self, node: NodeId, name: &str) {
        self.record(MutationRecord::Attributes {
            target: node,
            name: name.to_string(),
        });
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Text(t) => Some(t),
            NodeKind::Element(_) => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Whether `node` is attached to the document body.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).is_some() && self.is_inclusive_ancestor(self.body, node)
    }

    /// `node` and all its descendants, pre-order.
    pub fn inclusive_descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if self.nodes.get(n.0).is_none() {
                continue;
            }
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.element(node).is_some_and(|el| selector.matches(el))
    }

    /// All elements under `root` (inclusive) matching `selector`, in tree order.
    pub fn query_selector_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.inclusive_descendants(root)
            .into_iter()
            .filter(|&n| self.matches(n, selector))
            .collect()
    }

    // =========================================================================
    // Mutation observers
    // =========================================================================

    /// Start observing child-list, attribute, and text changes under `root`.
    pub fn observe(&mut self, root: NodeId) -> Result<ObserverId, DomError> {
        self.data(root)?;
        let id = ObserverId(self.handle());
        self.observers.push(Observer {
            id,
            root,
            records: Vec::new(),
        });
        Ok(id)
    }

    /// Stop observing; queued records are discarded.
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.retain(|o| o.id != observer);
    }

    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .iter_mut()
            .find(|o| o.id == observer)
            .map(|o| std::mem::take(&mut o.records))
            .unwrap_or_default()
    }

    pub fn has_pending_records(&self) -> bool {
        self.observers.iter().any(|o| !o.records.is_empty())
    }

    fn record(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let target = record.target();
        let roots: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter(|(_, o)| self.is_inclusive_ancestor(o.root, target))
            .map(|(i, _)| i)
            .collect();
        for i in roots {
            self.observers[i].records.push(record.clone());
        }
    }

    // =========================================================================
    // Image loading
    // =========================================================================

    /// Seed the decoded-image cache: later `img` elements with this source are
    /// complete as soon as they are created.
    pub fn preload(&mut self, src: &str, width: u32, height: u32) {
        self.image_cache.insert(src.to_string(), (width, height));
    }

    /// Register a one-shot load listener on an `img` element.
    pub fn add_load_listener(&mut self, node: NodeId) -> Result<ListenerId, DomError> {
        if self.element(node).ok_or(DomError::NotAnElement(node))?.image.is_none() {
            return Err(DomError::NotAnImage(node));
        }
        let id = ListenerId(self.handle());
        self.load_listeners.push((id, node));
        Ok(id)
    }

    /// Finish decoding: record the natural size, cache it, and queue a load
    /// notification for every listener on the node. Listeners are one-shot.
    pub fn complete_image_load(
        &mut self,
        node: NodeId,
        width: u32,
        height: u32,
    ) -> Result<(), DomError> {
        let el = self.element_data_mut(node)?;
        let image = el.image.as_mut().ok_or(DomError::NotAnImage(node))?;
        image.complete = true;
        image.natural = Some((width, height));
        let src = image.src.clone();
        self.image_cache.insert(src, (width, height));

        for listener in self.take_load_listeners(node) {
            self.events.push_back(DomEvent::Load { listener, node });
        }
        Ok(())
    }

    /// Decoding failed: the image is complete with a zero natural size and
    /// every listener on the node gets an error notification instead of a load.
    pub fn fail_image_load(&mut self, node: NodeId) -> Result<(), DomError> {
        let el = self.element_data_mut(node)?;
        let image = el.image.as_mut().ok_or(DomError::NotAnImage(node))?;
        image.complete = true;
        image.natural = Some((0, 0));
        for listener in self.take_load_listeners(node) {
            self.events.push_back(DomEvent::Error { listener, node });
        }
        Ok(())
    }

    fn take_load_listeners(&mut self, node: NodeId) -> Vec<ListenerId> {
        let (fired, kept): (Vec<_>, Vec<_>) = self
            .load_listeners
            .drain(..)
            .partition(|&(_, n)| n == node);
        self.load_listeners = kept;
        fired.into_iter().map(|(listener, _)| listener).collect()
    }

    /// Image elements under `root` (inclusive) still waiting for pixel data.
    pub fn pending_images(&self, root: NodeId) -> Vec<NodeId> {
        self.inclusive_descendants(root)
            .into_iter()
            .filter(|&n| {
                self.element(n)
                    .and_then(Element::image)
                    .is_some_and(|img| !img.complete)
            })
            .collect()
    }

    // =========================================================================
    // Click listeners
    // =========================================================================

    /// Attach a document-level click listener.
    pub fn add_click_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.handle());
        self.click_listeners.push(id);
        id
    }

    /// Remove a load or click listener. Unknown ids are ignored.
    pub fn remove_listener(&mut self, listener: ListenerId) {
        self.load_listeners.retain(|&(id, _)| id != listener);
        self.click_listeners.retain(|&id| id != listener);
    }

    pub fn has_listener(&self, listener: ListenerId) -> bool {
        self.click_listeners.contains(&listener)
            || self.load_listeners.iter().any(|&(id, _)| id == listener)
    }

    pub fn listener_count(&self) -> usize {
        self.click_listeners.len() + self.load_listeners.len()
    }

    /// Queue a click on `target` for every document-level listener attached now.
    pub fn click(&mut self, target: Option<NodeId>) {
        for &listener in &self.click_listeners {
            self.events.push_back(DomEvent::Click { listener, target });
        }
    }

    pub fn take_event(&mut self) -> Option<DomEvent> {
        self.events.pop_front()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize `node` and its subtree as HTML.
    pub fn to_html(&self, node: NodeId) -> Markup {
        let mut out = String::new();
        self.write_html(node, &mut out);
        PreEscaped(out)
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(node.0) else {
            return;
        };
        let el = match &data.kind {
            NodeKind::Text(t) => {
                out.push_str(&escape(t));
                return;
            }
            NodeKind::Element(el) => el,
        };

        out.push('<');
        out.push_str(&el.tag);
        if let Some(id) = &el.id {
            push_attr(out, "id", id);
        }
        if !el.classes.is_empty() {
            push_attr(out, "class", &el.classes.join(" "));
        }
        for (name, value) in &el.attributes {
            push_attr(out, name, value);
        }
        if !el.transform.is_empty() {
            push_attr(out, "style", &format!("transform: {}", el.transform));
        }
        out.push('>');

        if is_void(&el.tag) {
            return;
        }
        for &child in &data.children {
            self.write_html(child, out);
        }
        out.push_str("</");
        out.push_str(&el.tag);
        out.push('>');
    }
}

fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "img" | "br" | "hr" | "input" | "meta" | "link")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new(Size::new(1448.0, 988.0))
    }

    // =========================================================================
    // Selector
    // =========================================================================

    #[test]
    fn selector_parses_compound_forms() {
        let s = Selector::parse("img.previewImg.active").unwrap();
        assert_eq!(s.to_string(), "img.previewImg.active");
        assert_eq!(Selector::parse(".PhotoView__Photo").unwrap().to_string(), ".PhotoView__Photo");
        assert_eq!(Selector::parse("#preview-1").unwrap().to_string(), "#preview-1");
        assert_eq!(Selector::parse("IMG").unwrap().to_string(), "img");
    }

    #[test]
    fn selector_rejects_garbage() {
        for bad in ["", "div span", ".", "img..x", "#a#b", "a>b"] {
            assert!(
                matches!(Selector::parse(bad), Err(DomError::InvalidSelector(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn selector_matches_tag_and_classes() {
        let mut d = doc();
        let img = d.create_image("a.jpg", &["PhotoView__Photo", "previewPhoto"]);
        assert!(d.matches(img, &Selector::parse("img").unwrap()));
        assert!(d.matches(img, &Selector::parse(".PhotoView__Photo").unwrap()));
        assert!(d.matches(img, &Selector::parse("img.previewPhoto").unwrap()));
        assert!(!d.matches(img, &Selector::parse("div.PhotoView__Photo").unwrap()));
        assert!(!d.matches(img, &Selector::parse(".missing").unwrap()));
    }

    // =========================================================================
    // Tree
    // =========================================================================

    #[test]
    fn append_and_remove_track_connection() {
        let mut d = doc();
        let div = d.create_element("div");
        let img = d.create_image("a.jpg", &[]);
        d.append_child(div, img).unwrap();
        assert!(!d.is_connected(img));

        d.append_child(d.body(), div).unwrap();
        assert!(d.is_connected(img));

        d.remove_child(d.body(), div).unwrap();
        assert!(!d.is_connected(img));
        assert_eq!(d.parent(img), Some(div));
    }

    #[test]
    fn append_rejects_cycles() {
        let mut d = doc();
        let outer = d.create_element("div");
        let inner = d.create_element("div");
        d.append_child(outer, inner).unwrap();
        assert!(matches!(
            d.append_child(inner, outer),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn append_moves_node_between_parents() {
        let mut d = doc();
        let a = d.create_element("div");
        let b = d.create_element("div");
        let child = d.create_element("span");
        d.append_child(a, child).unwrap();
        d.append_child(b, child).unwrap();
        assert!(d.children(a).is_empty());
        assert_eq!(d.children(b), &[child]);
    }

    // =========================================================================
    // Mutation observers
    // =========================================================================

    #[test]
    fn observer_sees_only_its_subtree() {
        let mut d = doc();
        let outside = d.create_element("div");
        let observer = d.observe(d.body()).unwrap();

        let img = d.create_image("a.jpg", &[]);
        d.append_child(outside, img).unwrap();
        assert!(d.take_records(observer).is_empty());

        d.append_child(d.body(), outside).unwrap();
        let records = d.take_records(observer);
        assert_eq!(
            records,
            vec![MutationRecord::ChildList {
                target: d.body(),
                added: vec![outside],
                removed: vec![],
            }]
        );
    }

    #[test]
    fn disconnect_discards_pending_records() {
        let mut d = doc();
        let observer = d.observe(d.body()).unwrap();
        let div = d.create_element("div");
        d.append_child(d.body(), div).unwrap();
        assert!(d.has_pending_records());
        d.disconnect(observer);
        assert!(!d.has_pending_records());
        assert!(d.take_records(observer).is_empty());
    }

    #[test]
    fn attribute_and_text_changes_are_recorded() {
        let mut d = doc();
        let div = d.create_element("div");
        let text = d.create_text("hi");
        d.append_child(div, text).unwrap();
        d.append_child(d.body(), div).unwrap();
        let observer = d.observe(d.body()).unwrap();

        d.set_attribute(div, "data-x", "1").unwrap();
        d.set_text(text, "there").unwrap();
        let records = d.take_records(observer);
        assert!(matches!(records[0], MutationRecord::Attributes { .. }));
        assert!(matches!(records[1], MutationRecord::CharacterData { .. }));
    }

    // =========================================================================
    // Image loading
    // =========================================================================

    #[test]
    fn cached_source_is_complete_on_creation() {
        let mut d = doc();
        d.preload("a.jpg", 640, 480);
        let cached = d.create_image("a.jpg", &[]);
        let fresh = d.create_image("b.jpg", &[]);
        d.append_child(d.body(), cached).unwrap();
        d.append_child(d.body(), fresh).unwrap();

        let cached_state = d.element(cached).unwrap().image().unwrap();
        assert!(cached_state.complete);
        assert_eq!(cached_state.natural, Some((640, 480)));
        assert!(!d.element(fresh).unwrap().image().unwrap().complete);
        assert_eq!(d.pending_images(d.body()), vec![fresh]);
    }

    #[test]
    fn load_listeners_fire_once() {
        let mut d = doc();
        let img = d.create_image("a.jpg", &[]);
        let listener = d.add_load_listener(img).unwrap();

        d.complete_image_load(img, 100, 50).unwrap();
        assert_eq!(
            d.take_event(),
            Some(DomEvent::Load { listener, node: img })
        );
        assert!(!d.has_listener(listener));

        d.complete_image_load(img, 100, 50).unwrap();
        assert_eq!(d.take_event(), None);
    }

    #[test]
    fn completed_load_populates_cache() {
        let mut d = doc();
        let first = d.create_image("a.jpg", &[]);
        d.complete_image_load(first, 300, 200).unwrap();
        let second = d.create_image("a.jpg", &[]);
        assert_eq!(
            d.element(second).unwrap().image().unwrap().natural,
            Some((300, 200))
        );
    }

    #[test]
    fn failed_load_fires_error_once() {
        let mut d = doc();
        let img = d.create_image("a.jpg", &[]);
        let listener = d.add_load_listener(img).unwrap();
        d.fail_image_load(img).unwrap();
        assert_eq!(d.take_event(), Some(DomEvent::Error { listener, node: img }));
        assert_eq!(d.take_event(), None);
        assert!(!d.has_listener(listener));
        assert_eq!(d.element(img).unwrap().image().unwrap().natural, Some((0, 0)));
    }

    #[test]
    fn pending_images_skip_detached_nodes() {
        let mut d = doc();
        let live = d.create_image("a.jpg", &[]);
        d.append_child(d.body(), live).unwrap();
        for i in 0..5 {
            let swapped = d.create_image(&format!("old-{i}.jpg"), &[]);
            d.append_child(d.body(), swapped).unwrap();
            d.detach(swapped).unwrap();
        }
        assert_eq!(d.pending_images(d.body()), vec![live]);
    }

    #[test]
    fn load_listener_requires_image() {
        let mut d = doc();
        let div = d.create_element("div");
        assert_eq!(d.add_load_listener(div), Err(DomError::NotAnImage(div)));
    }

    // =========================================================================
    // Clicks
    // =========================================================================

    #[test]
    fn click_queues_one_event_per_listener() {
        let mut d = doc();
        let a = d.add_click_listener();
        let b = d.add_click_listener();
        d.remove_listener(b);
        d.click(None);
        assert_eq!(d.take_event(), Some(DomEvent::Click { listener: a, target: None }));
        assert_eq!(d.take_event(), None);
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn html_escapes_and_renders_style() {
        let mut d = doc();
        let img = d.create_image("a.jpg?x=1&y=\"2\"", &["PhotoView__Photo"]);
        d.set_transform(img, "scale(2)").unwrap();
        d.append_child(d.body(), img).unwrap();
        let html = d.to_html(d.body()).into_string();
        assert_eq!(
            html,
            "<body><img class=\"PhotoView__Photo\" src=\"a.jpg?x=1&amp;y=&quot;2&quot;\" style=\"transform: scale(2)\"></body>"
        );
    }
}
