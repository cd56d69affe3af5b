//! Control-flow-graph rendering: dot-source splitting and the background
//! converter service.

mod graph;
mod service;

pub use graph::{graph_hash, split_graphs, GraphTheme};
pub use service::{is_dot_available, CfgRenderService, GraphView, RenderError, RenderedGraph};
