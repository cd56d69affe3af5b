//! Integration tests for the CFG render pipeline, using a shell stand-in for
//! the dot converter so the tests do not depend on graphviz being installed.

#![cfg(unix)]

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use irscope_panel::{
    CfgPanel, CfgRenderService, CompilerHost, DocumentId, EditorSink, GraphView, HostLocks,
    PanelConfig, RenderedGraph,
};

fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, body).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// Converter stand-in: answers the -V probe and otherwise copies the dot
/// source to the output path.
fn fake_dot(dir: &Path) -> PathBuf {
    let path = dir.join("fake-dot");
    write_script(
        &path,
        "#!/bin/sh\nif [ \"$1\" = \"-V\" ]; then exit 0; fi\ncp \"$1\" \"$4\"\n",
    );
    path
}

/// Converter stand-in that passes the probe but fails every conversion.
fn broken_dot(dir: &Path) -> PathBuf {
    let path = dir.join("broken-dot");
    write_script(
        &path,
        "#!/bin/sh\nif [ \"$1\" = \"-V\" ]; then exit 0; fi\nexit 3\n",
    );
    path
}

fn sample_graph() -> String {
    [
        "digraph whole_file {",
        "    subgraph cluster_0 {",
        "        n0 [label=\"main\" color=green stroke=\"transparent\"]",
        "        n0 -> n1 [color=gray]",
        "    }",
        "    subgraph cluster_1 {",
        "        n2 [label=\"helper\"]",
        "    }",
        "}",
    ]
    .join("\n")
}

struct CollectingView {
    visible: Cell<bool>,
    shown: RefCell<Vec<RenderedGraph>>,
}

impl CollectingView {
    fn new() -> Self {
        Self {
            visible: Cell::new(true),
            shown: RefCell::new(Vec::new()),
        }
    }
}

impl GraphView for CollectingView {
    fn is_visible(&self) -> bool {
        self.visible.get()
    }

    fn show_graph(&self, graph: RenderedGraph) {
        self.shown.borrow_mut().push(graph);
    }
}

fn poll_until(
    service: &CfgRenderService,
    active: &DocumentId,
    view: &CollectingView,
    timeout: Duration,
) {
    let deadline = Instant::now() + timeout;
    while view.shown.borrow().is_empty() && Instant::now() < deadline {
        service.poll_results(Some(active), view);
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_render_pipeline_delivers_svg() {
    let tmp = tempfile::tempdir().unwrap();
    let config = PanelConfig::new()
        .with_dot_binary(fake_dot(tmp.path()))
        .with_scratch_dir(tmp.path().join("scratch"));
    let service = CfgRenderService::new(&config);
    assert!(service.dot_available());

    let doc = DocumentId::new("src/main.ir");
    service.request(doc.clone(), "main", sample_graph());

    let view = CollectingView::new();
    poll_until(&service, &doc, &view, Duration::from_secs(5));

    let shown = view.shown.borrow();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].doc, doc);
    assert_eq!(shown[0].name, "main");
    // the stand-in copies the themed dot source through
    assert!(shown[0].svg.starts_with("digraph cfg {"));
    // transparent strokes are stripped from converter output
    assert!(!shown[0].svg.contains("stroke=\"transparent\""));
}

#[test]
fn test_stale_results_are_discarded_until_doc_is_active_again() {
    let tmp = tempfile::tempdir().unwrap();
    let config = PanelConfig::new()
        .with_dot_binary(fake_dot(tmp.path()))
        .with_scratch_dir(tmp.path().join("scratch"));
    let service = CfgRenderService::new(&config);

    let requested = DocumentId::new("src/main.ir");
    let other = DocumentId::new("src/other.ir");
    service.request(requested.clone(), "", sample_graph());

    // another document took focus before the render finished
    let view = CollectingView::new();
    let deadline = Instant::now() + Duration::from_secs(1);
    while Instant::now() < deadline {
        service.poll_results(Some(&other), &view);
        thread::sleep(Duration::from_millis(10));
    }
    assert!(view.shown.borrow().is_empty());

    // back on the requested document; the cached render is served again
    service.request(requested.clone(), "", sample_graph());
    poll_until(&service, &requested, &view, Duration::from_secs(5));
    assert_eq!(view.shown.borrow().len(), 1);
    assert_eq!(view.shown.borrow()[0].name, "");
}

#[test]
fn test_failing_converter_omits_output() {
    let tmp = tempfile::tempdir().unwrap();
    let config = PanelConfig::new()
        .with_dot_binary(broken_dot(tmp.path()))
        .with_scratch_dir(tmp.path().join("scratch"));
    let service = CfgRenderService::new(&config);
    assert!(service.dot_available());

    let doc = DocumentId::new("src/main.ir");
    service.request(doc.clone(), "main", sample_graph());

    let view = CollectingView::new();
    let deadline = Instant::now() + Duration::from_secs(1);
    while Instant::now() < deadline {
        service.poll_results(Some(&doc), &view);
        thread::sleep(Duration::from_millis(10));
    }
    assert!(view.shown.borrow().is_empty());
}

// ---------------------------------------------------------------------------
// CfgPanel wiring
// ---------------------------------------------------------------------------

struct OneFileCompiler {
    graph: String,
}

impl CompilerHost for OneFileCompiler {
    fn tree_root(&self, _doc: &DocumentId) -> Option<irscope_core::Value> {
        None
    }

    fn cfg_graph(&self, _doc: &DocumentId) -> Option<String> {
        Some(self.graph.clone())
    }

    fn cfg_declaration_at(&self, _doc: &DocumentId, offset: usize) -> Option<String> {
        (offset < 100).then(|| "main".to_string())
    }
}

struct PlainLocks;

impl HostLocks for PlainLocks {
    fn with_read(&self, f: &mut dyn FnMut()) {
        f();
    }

    fn with_write(&self, f: &mut dyn FnMut()) {
        f();
    }
}

struct FixedEditor {
    doc: DocumentId,
}

impl EditorSink for FixedEditor {
    fn active_document(&self) -> Option<DocumentId> {
        Some(self.doc.clone())
    }

    fn highlight(&self, _doc: &DocumentId, _span: irscope_core::Span) {}

    fn clear_highlights(&self, _doc: &DocumentId) {}
}

#[test]
fn test_cfg_panel_renders_whole_file_then_declaration() {
    let tmp = tempfile::tempdir().unwrap();
    let config = PanelConfig::new()
        .with_dot_binary(fake_dot(tmp.path()))
        .with_scratch_dir(tmp.path().join("scratch"));

    let doc = DocumentId::new("src/main.ir");
    let view = Rc::new(CollectingView::new());
    let panel = CfgPanel::new(
        &config,
        Rc::new(OneFileCompiler {
            graph: sample_graph(),
        }),
        Rc::new(PlainLocks),
        Rc::new(FixedEditor { doc: doc.clone() }),
        view.clone(),
    );

    panel.on_trigger();
    let deadline = Instant::now() + Duration::from_secs(5);
    while view.shown.borrow().is_empty() && Instant::now() < deadline {
        panel.poll();
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(view.shown.borrow().last().unwrap().name, "");

    panel.on_caret_moved(5);
    let deadline = Instant::now() + Duration::from_secs(5);
    while view.shown.borrow().len() < 2 && Instant::now() < deadline {
        panel.poll();
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(view.shown.borrow().last().unwrap().name, "main");

    // an unchanged caret position does not re-request
    panel.on_caret_moved(5);
    panel.document_closed(&doc);
}
