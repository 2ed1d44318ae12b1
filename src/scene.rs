//! In-memory design surface.
//!
//! `Scene` keeps a node arena, the page's top-level children, the current
//! selection and the framed viewport. It backs the CLI (the result is exported
//! as JSON) and every mapper test.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::canvas::{Canvas, CanvasError, Color, FontName, NodeId};

/// Rough glyph advance as a fraction of the font size, used to size text boxes.
const GLYPH_WIDTH_RATIO: f32 = 0.6;
const LINE_HEIGHT_RATIO: f32 = 1.2;
const DEFAULT_FONT_SIZE: f32 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Text,
    Rectangle,
    Frame,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Color,
    pub weight: f32,
}

/// Axis-aligned box in page coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    fn union(self, other: Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Bounds {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

#[derive(Clone, Debug)]
struct SceneNode {
    kind: NodeKind,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    fill: Option<Color>,
    stroke: Option<Stroke>,
    font: Option<FontName>,
    font_size: f32,
    characters: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    fn new(kind: NodeKind) -> Self {
        // Text defaults to black; new frames start white like a blank artboard.
        let fill = match kind {
            NodeKind::Text => Some(Color::BLACK),
            NodeKind::Rectangle => Some(Color::rgb(0.85, 0.85, 0.85)),
            NodeKind::Frame => Some(Color::WHITE),
        };
        let (width, height) = match kind {
            NodeKind::Text => (0.0, 0.0),
            NodeKind::Rectangle | NodeKind::Frame => (100.0, 100.0),
        };
        Self {
            kind,
            x: 0.0,
            y: 0.0,
            width,
            height,
            fill,
            stroke: None,
            font: None,
            font_size: DEFAULT_FONT_SIZE,
            characters: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Text boxes auto-size to their content.
    fn autosize_text(&mut self) {
        let len = self
            .characters
            .as_deref()
            .map(|s| s.chars().count())
            .unwrap_or(0) as f32;
        self.width = len * self.font_size * GLYPH_WIDTH_RATIO;
        self.height = self.font_size * LINE_HEIGHT_RATIO;
    }
}

/// Serializable view of one node and its subtree.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

/// Serializable view of the whole page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub selection: Vec<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Bounds>,
}

/// In-memory canvas with one page.
pub struct Scene {
    nodes: HashMap<NodeId, SceneNode>,
    page: Vec<NodeId>,
    selection: Vec<NodeId>,
    viewport: Option<Bounds>,
    available_fonts: HashSet<FontName>,
    loaded_fonts: HashSet<FontName>,
    /// Monotonic across `clear()` so stale handles never alias new nodes
    next_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::with_fonts([FontName::default()])
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scene that can only load the given fonts.
    pub fn with_fonts(fonts: impl IntoIterator<Item = FontName>) -> Self {
        Self {
            nodes: HashMap::new(),
            page: Vec::new(),
            selection: Vec::new(),
            viewport: None,
            available_fonts: fonts.into_iter().collect(),
            loaded_fonts: HashSet::new(),
            next_id: 1,
        }
    }

    /// Make another font loadable.
    pub fn install_font(&mut self, font: FontName) {
        self.available_fonts.insert(font);
    }

    /// Remove every node and reset selection and viewport. Loaded fonts stay loaded.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.page.clear();
        self.selection.clear();
        self.viewport = None;
    }

    /// Top-level nodes on the page, in insertion order.
    pub fn page(&self) -> &[NodeId] {
        &self.page
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn viewport(&self) -> Option<Bounds> {
        self.viewport
    }

    /// Number of nodes created and still alive, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            nodes: self.page.iter().filter_map(|id| self.snapshot_node(*id)).collect(),
            selection: self.selection.clone(),
            viewport: self.viewport,
        }
    }

    /// Snapshot of a single node and its subtree.
    pub fn snapshot_node(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.nodes.get(&id)?;
        Some(NodeSnapshot {
            id,
            kind: node.kind,
            x: node.x,
            y: node.y,
            width: node.width,
            height: node.height,
            fill: node.fill,
            stroke: node.stroke,
            characters: node.characters.clone(),
            font_size: (node.kind == NodeKind::Text).then_some(node.font_size),
            children: node
                .children
                .iter()
                .filter_map(|child| self.snapshot_node(*child))
                .collect(),
        })
    }

    fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, SceneNode::new(kind));
        id
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, CanvasError> {
        self.nodes.get_mut(&id).ok_or(CanvasError::UnknownNode(id))
    }

    fn text_node_mut(
        &mut self,
        id: NodeId,
        operation: &'static str,
    ) -> Result<&mut SceneNode, CanvasError> {
        let node = self.node_mut(id)?;
        if node.kind != NodeKind::Text {
            return Err(CanvasError::Unsupported { node: id, operation });
        }
        Ok(node)
    }

    fn detach(&mut self, id: NodeId) {
        let parent = self.nodes.get_mut(&id).and_then(|n| n.parent.take());
        match parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.page.retain(|c| *c != id),
        }
    }

    fn absolute_bounds(&self, id: NodeId) -> Option<Bounds> {
        let node = self.nodes.get(&id)?;
        let (mut x, mut y) = (node.x, node.y);
        let mut parent = node.parent;
        while let Some(pid) = parent {
            let p = self.nodes.get(&pid)?;
            x += p.x;
            y += p.y;
            parent = p.parent;
        }
        Some(Bounds {
            x,
            y,
            width: node.width,
            height: node.height,
        })
    }
}

impl Canvas for Scene {
    fn create_text(&mut self) -> NodeId {
        self.create(NodeKind::Text)
    }

    fn create_rectangle(&mut self) -> NodeId {
        self.create(NodeKind::Rectangle)
    }

    fn create_frame(&mut self) -> NodeId {
        self.create(NodeKind::Frame)
    }

    async fn ensure_font_ready(&mut self, font: &FontName) -> Result<(), CanvasError> {
        if self.loaded_fonts.contains(font) {
            return Ok(());
        }
        if !self.available_fonts.contains(font) {
            return Err(CanvasError::FontUnavailable {
                font: font.clone(),
                reason: "font is not installed".to_string(),
            });
        }
        tracing::debug!(%font, "font loaded");
        self.loaded_fonts.insert(font.clone());
        Ok(())
    }

    fn set_font(&mut self, node: NodeId, font: &FontName) -> Result<(), CanvasError> {
        let n = self.text_node_mut(node, "set_font")?;
        n.font = Some(font.clone());
        Ok(())
    }

    fn set_characters(&mut self, node: NodeId, characters: &str) -> Result<(), CanvasError> {
        let font = self
            .text_node_mut(node, "set_characters")?
            .font
            .clone()
            .unwrap_or_default();
        if !self.loaded_fonts.contains(&font) {
            return Err(CanvasError::FontNotLoaded { node, font });
        }
        let n = self.node_mut(node)?;
        n.characters = Some(characters.to_string());
        n.autosize_text();
        Ok(())
    }

    fn set_font_size(&mut self, node: NodeId, size: f32) -> Result<(), CanvasError> {
        let n = self.text_node_mut(node, "set_font_size")?;
        n.font_size = size;
        n.autosize_text();
        Ok(())
    }

    fn set_fill(&mut self, node: NodeId, color: Color) -> Result<(), CanvasError> {
        self.node_mut(node)?.fill = Some(color);
        Ok(())
    }

    fn set_stroke(&mut self, node: NodeId, color: Color, weight: f32) -> Result<(), CanvasError> {
        self.node_mut(node)?.stroke = Some(Stroke { color, weight });
        Ok(())
    }

    fn resize(&mut self, node: NodeId, width: f32, height: f32) -> Result<(), CanvasError> {
        let n = self.node_mut(node)?;
        if n.kind == NodeKind::Text {
            return Err(CanvasError::Unsupported { node, operation: "resize" });
        }
        n.width = width;
        n.height = height;
        Ok(())
    }

    fn set_position(&mut self, node: NodeId, x: f32, y: f32) -> Result<(), CanvasError> {
        let n = self.node_mut(node)?;
        n.x = x;
        n.y = y;
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), CanvasError> {
        if self.node_mut(parent)?.kind != NodeKind::Frame {
            return Err(CanvasError::Unsupported { node: parent, operation: "append_child" });
        }
        self.node_mut(child)?;
        self.detach(child);
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn append_to_page(&mut self, node: NodeId) -> Result<(), CanvasError> {
        self.node_mut(node)?;
        self.detach(node);
        self.page.push(node);
        Ok(())
    }

    fn select(&mut self, nodes: &[NodeId]) {
        self.selection = nodes
            .iter()
            .copied()
            .filter(|id| self.nodes.contains_key(id))
            .collect();
    }

    fn frame_viewport(&mut self, nodes: &[NodeId]) {
        let framed = nodes
            .iter()
            .filter_map(|id| self.absolute_bounds(*id))
            .reduce(Bounds::union);
        if let Some(bounds) = framed {
            self.viewport = Some(bounds);
        }
    }
}
