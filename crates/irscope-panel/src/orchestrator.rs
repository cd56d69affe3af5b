//! Refresh orchestration.
//!
//! `InspectorPanel::on_trigger` is the single entry point for every change
//! notification (file open, switch, edit, focus, explicit refresh). It
//! resolves the active document's session, refreshes the tree model, and
//! replays the remembered navigation state against the rebuilt tree. All of
//! it runs on the host's UI thread; the host marshals triggers onto that
//! thread and the panel never blocks it.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use irscope_core::{
    path_names, resolve_path, NavigationState, ObjectTreeModel, TypeRegistry, Value, ViewerChain,
};

use crate::config::PanelConfig;
use crate::host::{
    read_scope, write_scope, CompilerHost, DocumentId, EditorSink, HostLocks, PanelView,
};
use crate::render::{CfgRenderService, GraphView};
use crate::session::{DocumentSession, SessionRegistry};

/// The tree-and-table inspector panel.
pub struct InspectorPanel {
    registry: Rc<TypeRegistry>,
    compiler: Rc<dyn CompilerHost>,
    locks: Rc<dyn HostLocks>,
    editor: Rc<dyn EditorSink>,
    view: Rc<dyn PanelView>,
    sessions: SessionRegistry,
}

impl InspectorPanel {
    /// Wire the panel to its host seams.
    pub fn new(
        registry: Rc<TypeRegistry>,
        compiler: Rc<dyn CompilerHost>,
        locks: Rc<dyn HostLocks>,
        editor: Rc<dyn EditorSink>,
        view: Rc<dyn PanelView>,
    ) -> Self {
        Self {
            registry,
            compiler,
            locks,
            editor,
            view,
            sessions: SessionRegistry::new(),
        }
    }

    /// Live sessions, for host-side introspection.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Handle a change notification.
    ///
    /// Dropped while the panel is hidden; background tabs do no work.
    pub fn on_trigger(&self) {
        if !self.view.is_visible() {
            return;
        }
        let Some(doc) = self.editor.active_document() else {
            return;
        };
        let session = self
            .sessions
            .get_or_create(&doc, || self.new_session(&doc));
        self.refresh_session(&doc, &session);
    }

    /// The host reports a document closed; its session is reclaimed.
    pub fn document_closed(&self, doc: &DocumentId) {
        self.sessions.document_closed(doc);
    }

    /// The host tree widget expanded a path.
    pub fn on_tree_expanded(&self, path: Vec<String>) {
        self.with_active_session(|_, s| s.nav.note_expanded(path));
    }

    /// The host tree widget collapsed a path.
    pub fn on_tree_collapsed(&self, path: Vec<String>) {
        self.with_active_session(|_, s| s.nav.note_collapsed(&path));
    }

    /// The host tree widget moved its selection. Rebuilds the drill-down
    /// chain for the node and re-applies the first remembered table
    /// selection.
    pub fn on_tree_selected(&self, path: Vec<String>) {
        let locks = self.locks.clone();
        let editor = self.editor.clone();
        self.with_active_session(|doc, s| {
            s.nav.note_tree_selection(Some(path.clone()));
            let resolved = resolve_path(&s.model, &path);
            if resolved.len() != path.len() {
                debug!("selected tree path no longer resolves");
                return;
            }
            let Some(node) = resolved.last().cloned() else {
                return;
            };
            let first = s.nav.selected_table_path.first().cloned();
            s.chain.open_root(node.value().clone());
            if let Some(first) = first {
                s.chain.select(0, &first);
            }
            s.nav.selected_table_path = s.chain.selected_path().to_vec();
            highlight_value(&*locks, &*editor, doc, node.value());
        });
    }

    /// A row was selected in the drill-down table at `level`.
    pub fn on_table_row_selected(&self, level: usize, name: &str) -> bool {
        self.with_active_session(|_, s| {
            let selected = s.chain.select(level, name);
            if selected {
                s.nav.selected_table_path = s.chain.selected_path().to_vec();
            }
            selected
        })
        .unwrap_or(false)
    }

    /// An already-selected row was clicked again: re-trigger its recompute
    /// closure, if it has one.
    pub fn on_table_row_recompute(&self, level: usize, name: &str) -> bool {
        self.with_active_session(|_, s| s.chain.recompute_row(level, name))
            .unwrap_or(false)
    }

    fn with_active_session<R>(
        &self,
        f: impl FnOnce(&DocumentId, &mut DocumentSession) -> R,
    ) -> Option<R> {
        let doc = self.editor.active_document()?;
        let session = self.sessions.get(&doc)?;
        let mut session = session.borrow_mut();
        Some(f(&doc, &mut session))
    }

    fn new_session(&self, doc: &DocumentId) -> DocumentSession {
        // root fetches are compiler queries; each one runs in its own read
        // scope
        let root_of = {
            let compiler = self.compiler.clone();
            let locks = self.locks.clone();
            let doc = doc.clone();
            Box::new(move || read_scope(&*locks, || compiler.tree_root(&doc)))
        };
        let model = ObjectTreeModel::new(self.registry.clone(), root_of);
        {
            let view = self.view.clone();
            model.on_structure_changed(move || view.tree_structure_changed());
        }

        let mut chain = ViewerChain::new(self.registry.clone());
        {
            let locks = self.locks.clone();
            let editor = self.editor.clone();
            let doc = doc.clone();
            chain.set_selection_observer(move |value| {
                highlight_value(&*locks, &*editor, &doc, value)
            });
        }

        DocumentSession {
            model,
            chain,
            nav: NavigationState::new(),
        }
    }

    fn refresh_session(&self, doc: &DocumentId, session: &Rc<RefCell<DocumentSession>>) {
        let mut session = session.borrow_mut();
        let session = &mut *session;
        session.model.refresh();

        // best effort: each remembered path restores its longest prefix
        for path in session.nav.expanded_tree_paths.iter() {
            let resolved = resolve_path(&session.model, path);
            if resolved.len() > 1 {
                self.view.expand_tree_path(&path_names(&resolved));
            }
        }

        let resolved = session
            .nav
            .selected_tree_path
            .as_ref()
            .map(|path| resolve_path(&session.model, path))
            .unwrap_or_default();
        let Some(node) = resolved.last().cloned() else {
            return;
        };
        self.view.select_tree_path(&path_names(&resolved));

        let table_path = session.nav.selected_table_path.clone();
        session.chain.open_root(node.value().clone());
        session.chain.replay(&table_path);
        session.nav.selected_table_path = session.chain.selected_path().to_vec();

        highlight_value(&*self.locks, &*self.editor, doc, node.value());
    }
}

/// Highlight the source range of a selected object in the editor, when the
/// object carries one and its document is still focused. The editor mutation
/// runs in the host's write scope.
fn highlight_value(
    locks: &dyn HostLocks,
    editor: &dyn EditorSink,
    doc: &DocumentId,
    value: &Value,
) {
    let Some(span) = value.as_object().and_then(|obj| obj.span()) else {
        return;
    };
    if editor.active_document().as_ref() != Some(doc) {
        return;
    }
    write_scope(locks, || {
        editor.clear_highlights(doc);
        editor.highlight(doc, span);
    });
}

/// The control-flow-graph panel: renders the whole-file graph and the graph
/// of the declaration enclosing the caret.
pub struct CfgPanel {
    compiler: Rc<dyn CompilerHost>,
    locks: Rc<dyn HostLocks>,
    editor: Rc<dyn EditorSink>,
    view: Rc<dyn GraphView>,
    service: CfgRenderService,
    current: RefCell<Option<(DocumentId, String)>>,
}

impl CfgPanel {
    /// Wire the graph panel and start its render worker.
    pub fn new(
        config: &PanelConfig,
        compiler: Rc<dyn CompilerHost>,
        locks: Rc<dyn HostLocks>,
        editor: Rc<dyn EditorSink>,
        view: Rc<dyn GraphView>,
    ) -> Self {
        Self {
            compiler,
            locks,
            editor,
            view,
            service: CfgRenderService::new(config),
            current: RefCell::new(None),
        }
    }

    /// The render service, for host-side wiring.
    pub fn service(&self) -> &CfgRenderService {
        &self.service
    }

    /// Handle a change notification: re-render the whole-file graph and,
    /// when the caret sits inside a known declaration, that declaration's
    /// graph.
    pub fn on_trigger(&self) {
        if !self.view.is_visible() {
            return;
        }
        let Some(doc) = self.editor.active_document() else {
            return;
        };
        let Some(text) = read_scope(&*self.locks, || self.compiler.cfg_graph(&doc)) else {
            return;
        };
        self.service.request(doc.clone(), "", text.clone());
        if let Some((current_doc, name)) = self.current.borrow().clone() {
            if current_doc == doc {
                self.service.request(doc, name, text);
            }
        }
    }

    /// The caret moved: switch the declaration view when the enclosing
    /// graph changed.
    pub fn on_caret_moved(&self, offset: usize) {
        let Some(doc) = self.editor.active_document() else {
            return;
        };
        let Some(name) =
            read_scope(&*self.locks, || self.compiler.cfg_declaration_at(&doc, offset))
        else {
            return;
        };
        let key = (doc.clone(), name.clone());
        if self.current.borrow().as_ref() == Some(&key) {
            return;
        }
        *self.current.borrow_mut() = Some(key);
        let Some(text) = read_scope(&*self.locks, || self.compiler.cfg_graph(&doc)) else {
            return;
        };
        self.service.request(doc, name, text);
    }

    /// UI pump: apply finished renders that are still relevant.
    pub fn poll(&self) {
        self.service
            .poll_results(self.editor.active_document().as_ref(), &*self.view);
    }

    /// The host reports a document closed; its cached graph hash is dropped.
    pub fn document_closed(&self, doc: &DocumentId) {
        self.service.evict(doc);
    }
}
