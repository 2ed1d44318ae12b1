//! GUIDE: describe a UI in plain words, get generated HTML back, and draw it
//! as native shapes.
//!
//! - [`generation`] talks to the remote generation service.
//! - [`fragment`] finds the elements the canvas understands in the returned HTML.
//! - [`mapper`] turns those fragments into text, rectangles and button frames.
//! - [`canvas`] is the surface capability the mapper draws on; [`scene`] is the
//!   in-memory implementation.
//! - [`host`] wires the three together behind the panel's message protocol.

pub mod canvas;
pub mod config;
pub mod fragment;
pub mod generation;
pub mod host;
pub mod logging;
pub mod mapper;
pub mod preview;
pub mod scene;

pub use canvas::{Canvas, CanvasError, Color, FontName, NodeId};
pub use config::AppConfig;
pub use fragment::{Fragment, FragmentKind, scan_fragments};
pub use generation::{GenerateError, GenerationClient};
pub use host::{HostMessage, PanelMessage, PluginHost};
pub use mapper::{CanvasNode, Shape, map_html_to_nodes};
pub use scene::{Scene, SceneSnapshot};
