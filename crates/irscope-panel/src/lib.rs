//! Host-facing integration for the irscope inspector panel.
//!
//! The core model lives in `irscope-core`; this crate adds what an IDE
//! embedding needs around it: the host trait seams ([`host`]), per-document
//! sessions with explicit eviction ([`session`]), refresh orchestration
//! ([`orchestrator`]), control-flow-graph rendering through an external
//! converter ([`render`]), and configuration ([`config`]).

#![warn(rust_2018_idioms)]

pub mod config;
pub mod host;
pub mod orchestrator;
pub mod render;
pub mod session;

pub use config::PanelConfig;
pub use host::{
    read_scope, write_scope, CompilerHost, DocumentId, EditorSink, HostLocks, PanelView,
};
pub use orchestrator::{CfgPanel, InspectorPanel};
pub use render::{
    graph_hash, is_dot_available, split_graphs, CfgRenderService, GraphTheme, GraphView,
    RenderError, RenderedGraph,
};
pub use session::{DocumentSession, SessionRegistry};
