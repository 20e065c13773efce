//! Host document: an arena-backed visual tree the layout renderer writes into
//! and the capture stage clones out of.
//!
//! Frames are laid out ahead of time by the renderer: every element carries its
//! offset relative to its parent and its size, in CSS pixels. Elements positioned
//! `fixed` or `sticky` are anchored to the viewport instead of their parent.
//!
//! Only changes to the attached tree count as mutations: building or cloning a
//! detached subtree does not.

pub mod geometry;

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::FontFamily;

pub use geometry::{Rect, Size};

/// Slot index plus the generation the slot had when the node was created.
/// An id outlives its node only as a stale handle that resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    /// True for positioning schemes anchored to the viewport.
    pub fn is_viewport_anchored(&self) -> bool {
        matches!(self, Position::Fixed | Position::Sticky)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: f32,
    pub color: Rgba<u8>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub position: Position,
    pub background: Option<Rgba<u8>>,
    pub border: Option<Border>,
    pub z_index: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub font: FontFamily,
    pub font_size: f32,
    pub line_height: f32,
    pub color: Rgba<u8>,
}

/// Where an image was loaded from, relative to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    SameOrigin,
    CrossOrigin,
}

impl Origin {
    /// Classifies an image ref. Absolute http(s) URLs are foreign; inline data,
    /// blobs and relative paths belong to the page.
    pub fn classify(src: &str) -> Origin {
        let lower = src.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
        {
            Origin::CrossOrigin
        } else {
            Origin::SameOrigin
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageContent {
    pub src: String,
    pub origin: Origin,
    pub pixels: Arc<RgbaImage>,
}

impl PartialEq for ImageContent {
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src && self.origin == other.origin && Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Content {
    #[default]
    Empty,
    Text(TextBlock),
    Image(ImageContent),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub id: Option<String>,
    /// Offset from the parent (or the viewport, when viewport-anchored) and size.
    pub frame: Rect,
    pub style: Style,
    pub content: Content,
}

impl Element {
    pub fn new(tag: &'static str, frame: Rect) -> Self {
        Element {
            tag,
            id: None,
            frame,
            style: Style::default(),
            content: Content::Empty,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_background(mut self, color: Rgba<u8>) -> Self {
        self.style.background = Some(color);
        self
    }

    pub fn with_border(mut self, width: f32, color: Rgba<u8>) -> Self {
        self.style.border = Some(Border { width, color });
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.style.position = position;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.style.z_index = z_index;
        self
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = content;
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    element: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    /// Indices of empty slots, reused before the arena grows.
    free: Vec<usize>,
    body: NodeId,
    viewport: Size,
    mutations: u64,
}

impl Document {
    pub fn new(viewport: Size) -> Self {
        let body = Node {
            element: Element::new("body", Rect::new(0.0, 0.0, viewport.width, viewport.height)),
            parent: None,
            children: Vec::new(),
        };
        Document {
            slots: vec![Slot {
                generation: 0,
                node: Some(body),
            }],
            free: Vec::new(),
            body: NodeId {
                index: 0,
                generation: 0,
            },
            viewport,
            mutations: 0,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Slots allocated so far, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of changes made to the attached tree so far.
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    pub fn body_child_count(&self) -> usize {
        self.children(self.body).len()
    }

    /// Number of nodes currently allocated, attached or not.
    pub fn live_node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).map(|n| &n.element)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// True when `id` is reachable from the body.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == self.body {
                return true;
            }
            current = self.parent(node_id);
        }
        false
    }

    /// Allocates a detached element.
    pub fn create_element(&mut self, element: Element) -> NodeId {
        let node = Node {
            element,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Appends `child` to `parent`, detaching it from any previous parent first.
    /// Returns false if either node does not exist.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return false;
        }
        // No cycles: the new parent must not live inside the child.
        if self.descendants(child).contains(&parent) {
            return false;
        }
        self.detach(child);
        let attached = self.is_attached(parent);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        if attached {
            self.mutations += 1;
        }
        true
    }

    pub fn append_to_body(&mut self, child: NodeId) -> bool {
        self.append_child(self.body, child)
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let attached = self.is_attached(parent);
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|c| *c != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
        if attached {
            self.mutations += 1;
        }
    }

    /// Detaches `id` from its parent and frees it together with all descendants.
    /// The body itself cannot be removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> bool {
        if id == self.body || self.node(id).is_none() {
            return false;
        }
        self.detach(id);
        for node_id in self.descendants(id) {
            let slot = &mut self.slots[node_id.index];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node_id.index);
        }
        true
    }

    /// Pre-order list of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.node(current).is_none() {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// First attached element with the given id attribute, in document order.
    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|n| self.element(*n).and_then(|e| e.id.as_deref()) == Some(element_id))
    }

    /// Copies `id` and its whole subtree into new, detached nodes.
    pub fn deep_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let element = self.element(id)?.clone();
        let children = self.children(id).to_vec();
        let copy = self.create_element(element);
        for child in children {
            if let Some(child_copy) = self.deep_clone(child) {
                if let Some(node) = self.node_mut(child_copy) {
                    node.parent = Some(copy);
                }
                if let Some(node) = self.node_mut(copy) {
                    node.children.push(child_copy);
                }
            }
        }
        Some(copy)
    }

    pub fn set_position(&mut self, id: NodeId, position: Position) -> bool {
        let attached = self.is_attached(id);
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if node.element.style.position == position {
            return true;
        }
        node.element.style.position = position;
        if attached {
            self.mutations += 1;
        }
        true
    }

    pub fn set_frame(&mut self, id: NodeId, frame: Rect) -> bool {
        let attached = self.is_attached(id);
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.element.frame = frame;
        if attached {
            self.mutations += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_doc() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new(Size::new(800.0, 600.0));
        let root = doc.create_element(
            Element::new("div", Rect::new(10.0, 20.0, 300.0, 400.0)).with_id("resume-template"),
        );
        let child = doc.create_element(Element::new("p", Rect::new(5.0, 5.0, 100.0, 20.0)));
        doc.append_child(root, child);
        doc.append_to_body(root);
        (doc, root, child)
    }

    #[test]
    fn test_lookup_by_id() {
        let (doc, root, _) = make_doc();
        assert_eq!(doc.get_element_by_id("resume-template"), Some(root));
        assert_eq!(doc.get_element_by_id("missing"), None);
    }

    #[test]
    fn test_detached_nodes_are_not_found_by_id() {
        let mut doc = Document::new(Size::new(800.0, 600.0));
        doc.create_element(Element::new("div", Rect::default()).with_id("floating"));
        assert_eq!(doc.get_element_by_id("floating"), None);
    }

    #[test]
    fn test_building_detached_tree_is_not_a_mutation() {
        let mut doc = Document::new(Size::new(800.0, 600.0));
        let a = doc.create_element(Element::new("div", Rect::default()));
        let b = doc.create_element(Element::new("div", Rect::default()));
        doc.append_child(a, b);
        assert_eq!(doc.mutation_count(), 0);
        doc.append_to_body(a);
        assert_eq!(doc.mutation_count(), 1);
    }

    #[test]
    fn test_deep_clone_copies_subtree_detached() {
        let (mut doc, root, _) = make_doc();
        let before = doc.mutation_count();
        let copy = doc.deep_clone(root).unwrap();
        assert_ne!(copy, root);
        assert!(!doc.is_attached(copy));
        assert_eq!(doc.descendants(copy).len(), 2);
        assert_eq!(doc.element(copy), doc.element(root));
        assert_eq!(doc.mutation_count(), before);
    }

    #[test]
    fn test_remove_subtree_frees_nodes() {
        let (mut doc, root, child) = make_doc();
        let live = doc.live_node_count();
        assert!(doc.remove_subtree(root));
        assert_eq!(doc.body_child_count(), 0);
        assert_eq!(doc.live_node_count(), live - 2);
        assert!(doc.element(child).is_none());
        assert!(!doc.remove_subtree(root));
    }

    #[test]
    fn test_body_cannot_be_removed() {
        let (mut doc, _, _) = make_doc();
        assert!(!doc.remove_subtree(doc.body()));
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let (mut doc, root, _) = make_doc();
        let copy = doc.deep_clone(root).unwrap();
        doc.remove_subtree(copy);
        let capacity = doc.capacity();

        for _ in 0..50 {
            let copy = doc.deep_clone(root).unwrap();
            doc.append_to_body(copy);
            assert!(doc.remove_subtree(copy));
        }
        assert_eq!(doc.capacity(), capacity);
        assert_eq!(doc.live_node_count(), 3);
    }

    #[test]
    fn test_stale_id_does_not_resolve_to_reused_slot() {
        let (mut doc, _, child) = make_doc();
        assert!(doc.remove_subtree(child));
        let fresh = doc.create_element(Element::new("span", Rect::default()));
        assert_ne!(fresh, child);
        assert!(doc.element(child).is_none());
        assert_eq!(doc.element(fresh).map(|e| e.tag), Some("span"));
        assert!(!doc.remove_subtree(child));
    }

    #[test]
    fn test_set_position_counts_only_changes() {
        let (mut doc, _, child) = make_doc();
        let before = doc.mutation_count();
        doc.set_position(child, Position::Static);
        assert_eq!(doc.mutation_count(), before);
        doc.set_position(child, Position::Absolute);
        assert_eq!(doc.mutation_count(), before + 1);
    }

    #[test]
    fn test_origin_classification() {
        assert_eq!(Origin::classify("data:image/png;base64,AAAA"), Origin::SameOrigin);
        assert_eq!(Origin::classify("/avatars/jane.png"), Origin::SameOrigin);
        assert_eq!(
            Origin::classify("https://cdn.example.com/jane.jpg"),
            Origin::CrossOrigin
        );
    }
}
