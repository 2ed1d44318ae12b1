//! HTML to canvas shapes.
//!
//! Every recognized fragment becomes one top-level node stacked in a single
//! column: headings and labels become text, inputs become outlined
//! rectangles, buttons become a filled frame holding a white label.

use serde::Serialize;

use crate::canvas::{Canvas, CanvasError, Color, FontName, NodeId};
use crate::fragment::{Fragment, FragmentKind, scan_fragments};

/// Horizontal offset of every top-level node.
pub const LAYOUT_X: f32 = 100.0;
/// Vertical advance after each top-level node, whatever its height.
pub const LAYOUT_STEP: f32 = 60.0;

pub const TEXT_FONT_SIZE: f32 = 16.0;
pub const BUTTON_FONT_SIZE: f32 = 14.0;
pub const CONTROL_WIDTH: f32 = 200.0;
pub const CONTROL_HEIGHT: f32 = 40.0;
pub const BUTTON_LABEL_OFFSET: f32 = 10.0;
pub const INPUT_STROKE_WEIGHT: f32 = 1.0;

const TEXT_FALLBACK: &str = "Label";
const BUTTON_FALLBACK: &str = "Button";

/// A top-level node the mapper placed on the canvas.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CanvasNode {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub shape: Shape,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Shape {
    Text {
        characters: String,
        font_size: f32,
    },
    Rectangle {
        width: f32,
        height: f32,
        fill: Color,
        stroke: Color,
    },
    ButtonFrame {
        width: f32,
        height: f32,
        fill: Color,
        label: ButtonLabel,
    },
}

/// Text node nested inside a button frame, positioned relative to the frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ButtonLabel {
    pub characters: String,
    pub font_size: f32,
    pub fill: Color,
    pub x: f32,
    pub y: f32,
}

impl CanvasNode {
    /// The node without its canvas handle, for comparing two mapping runs.
    pub fn layout(&self) -> (f32, f32, &Shape) {
        (self.x, self.y, &self.shape)
    }
}

/// Map `html` onto `canvas`.
///
/// Nodes are appended to the page as they are created, so if the font cannot
/// be made ready the nodes placed before the failure stay on the canvas.
/// On success every placed node is selected and the viewport framed to them.
pub async fn map_html_to_nodes<C: Canvas>(
    canvas: &mut C,
    html: &str,
    font: &FontName,
) -> Result<Vec<CanvasNode>, CanvasError> {
    let fragments = scan_fragments(html);
    tracing::debug!(fragments = fragments.len(), "scanned html");

    let mut nodes = Vec::with_capacity(fragments.len());
    let mut cursor = 0.0_f32;

    for fragment in &fragments {
        let (id, shape) = match fragment.kind {
            FragmentKind::Text => create_text(canvas, fragment, font).await?,
            FragmentKind::Input => create_input(canvas)?,
            FragmentKind::Button => create_button(canvas, fragment, font).await?,
        };

        canvas.set_position(id, LAYOUT_X, cursor)?;
        canvas.append_to_page(id)?;
        nodes.push(CanvasNode {
            id,
            x: LAYOUT_X,
            y: cursor,
            shape,
        });
        cursor += LAYOUT_STEP;
    }

    let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
    canvas.select(&ids);
    canvas.frame_viewport(&ids);

    Ok(nodes)
}

fn content_or<'a>(inner: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        tracing::trace!(fallback, "empty element content");
        fallback
    } else {
        trimmed
    }
}

async fn new_text<C: Canvas>(
    canvas: &mut C,
    font: &FontName,
    characters: &str,
    font_size: f32,
) -> Result<NodeId, CanvasError> {
    // Font first: a failed load must not leave a half-built node behind.
    canvas.ensure_font_ready(font).await?;
    let text = canvas.create_text();
    canvas.set_font(text, font)?;
    canvas.set_characters(text, characters)?;
    canvas.set_font_size(text, font_size)?;
    Ok(text)
}

async fn create_text<C: Canvas>(
    canvas: &mut C,
    fragment: &Fragment<'_>,
    font: &FontName,
) -> Result<(NodeId, Shape), CanvasError> {
    let characters = content_or(fragment.inner_text, TEXT_FALLBACK);
    let id = new_text(canvas, font, characters, TEXT_FONT_SIZE).await?;
    Ok((
        id,
        Shape::Text {
            characters: characters.to_string(),
            font_size: TEXT_FONT_SIZE,
        },
    ))
}

fn create_input<C: Canvas>(canvas: &mut C) -> Result<(NodeId, Shape), CanvasError> {
    let rect = canvas.create_rectangle();
    canvas.resize(rect, CONTROL_WIDTH, CONTROL_HEIGHT)?;
    canvas.set_fill(rect, Color::WHITE)?;
    canvas.set_stroke(rect, Color::LIGHT_GRAY, INPUT_STROKE_WEIGHT)?;
    Ok((
        rect,
        Shape::Rectangle {
            width: CONTROL_WIDTH,
            height: CONTROL_HEIGHT,
            fill: Color::WHITE,
            stroke: Color::LIGHT_GRAY,
        },
    ))
}

async fn create_button<C: Canvas>(
    canvas: &mut C,
    fragment: &Fragment<'_>,
    font: &FontName,
) -> Result<(NodeId, Shape), CanvasError> {
    let fill = if fragment.is_red_variant() {
        Color::RED
    } else {
        Color::BLUE
    };
    let characters = content_or(fragment.inner_text, BUTTON_FALLBACK);

    let label = new_text(canvas, font, characters, BUTTON_FONT_SIZE).await?;
    canvas.set_fill(label, Color::WHITE)?;

    let frame = canvas.create_frame();
    canvas.resize(frame, CONTROL_WIDTH, CONTROL_HEIGHT)?;
    canvas.set_fill(frame, fill)?;
    canvas.append_child(frame, label)?;
    canvas.set_position(label, BUTTON_LABEL_OFFSET, BUTTON_LABEL_OFFSET)?;

    Ok((
        frame,
        Shape::ButtonFrame {
            width: CONTROL_WIDTH,
            height: CONTROL_HEIGHT,
            fill,
            label: ButtonLabel {
                characters: characters.to_string(),
                font_size: BUTTON_FONT_SIZE,
                fill: Color::WHITE,
                x: BUTTON_LABEL_OFFSET,
                y: BUTTON_LABEL_OFFSET,
            },
        },
    ))
}
