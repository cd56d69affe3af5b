//! Per-document UI sessions.
//!
//! A session bundles everything the panel keeps alive for one document: the
//! tree model, the drill-down viewer chain, and the navigation state that
//! survives refreshes. The registry's lifecycle is explicit: sessions are
//! created on first refresh of a document and evicted when the host reports
//! the document closed.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::debug;

use irscope_core::{NavigationState, ObjectTreeModel, ViewerChain};

use crate::host::DocumentId;

/// Everything the panel holds for one open document.
pub struct DocumentSession {
    /// Tree model bound to the document's root accessor
    pub model: ObjectTreeModel,
    /// Drill-down viewer stack
    pub chain: ViewerChain,
    /// Durable navigation state
    pub nav: NavigationState,
}

/// Registry of sessions keyed by document identity.
///
/// Eviction is tied to the host's document-closed event rather than any
/// implicit collector-driven policy.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RefCell<FxHashMap<DocumentId, Rc<RefCell<DocumentSession>>>>,
}

impl SessionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for a document, if one exists.
    pub fn get(&self, doc: &DocumentId) -> Option<Rc<RefCell<DocumentSession>>> {
        self.sessions.borrow().get(doc).cloned()
    }

    /// Session for a document, constructing it on first use.
    pub fn get_or_create(
        &self,
        doc: &DocumentId,
        make: impl FnOnce() -> DocumentSession,
    ) -> Rc<RefCell<DocumentSession>> {
        if let Some(session) = self.get(doc) {
            return session;
        }
        debug!(%doc, "creating panel session");
        let session = Rc::new(RefCell::new(make()));
        self.sessions
            .borrow_mut()
            .insert(doc.clone(), session.clone());
        session
    }

    /// Eviction hook for the host's document-closed event. Returns whether a
    /// session existed.
    pub fn document_closed(&self, doc: &DocumentId) -> bool {
        let existed = self.sessions.borrow_mut().remove(doc).is_some();
        if existed {
            debug!(%doc, "evicted panel session");
        }
        existed
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.borrow().len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.borrow().is_empty()
    }
}
