//! Canvas capability consumed by the mapper.
//!
//! The design surface is never reached through global state: whoever owns the
//! drawing surface implements [`Canvas`] and lends it to the mapper for one
//! call. [`crate::scene::Scene`] is the in-memory implementation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a node created on a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Solid RGB color, each channel in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    /// Default button fill.
    pub const BLUE: Color = Color::rgb(0.0, 0.48, 1.0);
    /// Input outline.
    pub const LIGHT_GRAY: Color = Color::rgb(0.7, 0.7, 0.7);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// A font the canvas must have ready before text can be set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl Default for FontName {
    fn default() -> Self {
        Self::new("Inter", "Regular")
    }
}

impl fmt::Display for FontName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

/// Errors raised by a canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasError {
    /// The text-rendering resource could not be made ready.
    FontUnavailable { font: FontName, reason: String },
    /// Text was set on a node whose font was never made ready.
    FontNotLoaded { node: NodeId, font: FontName },
    /// The handle does not refer to a node on this canvas.
    UnknownNode(NodeId),
    /// The operation does not apply to this kind of node.
    Unsupported { node: NodeId, operation: &'static str },
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanvasError::FontUnavailable { font, reason } => {
                write!(f, "Font \"{font}\" could not be loaded: {reason}")
            }
            CanvasError::FontNotLoaded { node, font } => {
                write!(f, "Font \"{font}\" must be loaded before setting text on node {node}")
            }
            CanvasError::UnknownNode(node) => write!(f, "Unknown node {node}"),
            CanvasError::Unsupported { node, operation } => {
                write!(f, "Node {node} does not support {operation}")
            }
        }
    }
}

impl std::error::Error for CanvasError {}

/// Operations the mapper needs from a design surface.
///
/// Created nodes are detached until they are appended to the page or to a
/// frame. Text content may only be set once the node's font is ready.
#[allow(async_fn_in_trait)]
pub trait Canvas {
    fn create_text(&mut self) -> NodeId;
    fn create_rectangle(&mut self) -> NodeId;
    fn create_frame(&mut self) -> NodeId;

    /// Make `font` ready for text rendering. The only suspension point.
    async fn ensure_font_ready(&mut self, font: &FontName) -> Result<(), CanvasError>;

    fn set_font(&mut self, node: NodeId, font: &FontName) -> Result<(), CanvasError>;
    fn set_characters(&mut self, node: NodeId, characters: &str) -> Result<(), CanvasError>;
    fn set_font_size(&mut self, node: NodeId, size: f32) -> Result<(), CanvasError>;

    fn set_fill(&mut self, node: NodeId, color: Color) -> Result<(), CanvasError>;
    fn set_stroke(&mut self, node: NodeId, color: Color, weight: f32) -> Result<(), CanvasError>;
    fn resize(&mut self, node: NodeId, width: f32, height: f32) -> Result<(), CanvasError>;
    /// Position relative to the parent (page or frame).
    fn set_position(&mut self, node: NodeId, x: f32, y: f32) -> Result<(), CanvasError>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), CanvasError>;
    fn append_to_page(&mut self, node: NodeId) -> Result<(), CanvasError>;

    fn select(&mut self, nodes: &[NodeId]);
    /// Scroll and zoom so that `nodes` are in view.
    fn frame_viewport(&mut self, nodes: &[NodeId]);
}
