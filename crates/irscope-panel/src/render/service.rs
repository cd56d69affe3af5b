//! Background rendering of control-flow graphs through the external `dot`
//! converter.
//!
//! One dedicated worker serializes all rendering so the UI thread never
//! blocks on subprocess I/O. Results come back over a channel; the UI thread
//! drains them and applies only those whose document is still showing, which
//! is the entire staleness protocol. There is no cancellation of in-flight
//! jobs and no timeout beyond the OS default.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, error, warn};

use super::graph::{graph_hash, split_graphs, GraphTheme};
use crate::config::PanelConfig;
use crate::host::DocumentId;

/// A rasterized graph delivered back to the UI thread.
#[derive(Debug, Clone)]
pub struct RenderedGraph {
    /// Document the graph belongs to
    pub doc: DocumentId,
    /// Declaration name; empty for the whole-file graph
    pub name: String,
    /// SVG text produced by the converter
    pub svg: String,
}

/// Display sink for rendered graphs.
pub trait GraphView {
    /// Whether the graph panel is currently visible.
    fn is_visible(&self) -> bool;

    /// Show a freshly rendered graph.
    fn show_graph(&self, graph: RenderedGraph);
}

/// Failures on the rendering path. All of them are logged and swallowed;
/// the affected graph is simply not shown.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Scratch file I/O failed
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The converter exited with a failure status
    #[error("dot exited with {0}")]
    ConverterFailed(std::process::ExitStatus),
}

struct RenderJob {
    doc: DocumentId,
    name: String,
    graph_text: String,
}

/// Serialized background renderer with a per-document content-hash cache.
pub struct CfgRenderService {
    jobs: Option<Sender<RenderJob>>,
    results: Receiver<RenderedGraph>,
    hashes: Arc<Mutex<FxHashMap<DocumentId, u64>>>,
    dot_available: bool,
    worker: Option<thread::JoinHandle<()>>,
}

impl CfgRenderService {
    /// Start the render worker. Probes the configured converter once; when
    /// it is missing, requests become no-ops.
    pub fn new(config: &PanelConfig) -> Self {
        let theme = if config.dark_theme {
            GraphTheme::dark()
        } else {
            GraphTheme::light()
        };
        let dot_available = is_dot_available(&config.dot_binary);
        if !dot_available {
            warn!(
                dot = %config.dot_binary.display(),
                "graph converter not available; CFG views will stay empty"
            );
        }

        let (job_tx, job_rx) = unbounded::<RenderJob>();
        let (result_tx, result_rx) = unbounded::<RenderedGraph>();
        let hashes: Arc<Mutex<FxHashMap<DocumentId, u64>>> =
            Arc::new(Mutex::new(FxHashMap::default()));

        let worker_hashes = hashes.clone();
        let dot = config.dot_binary.clone();
        let scratch = config.scratch_dir.clone();
        let worker = thread::Builder::new()
            .name("irscope-render".to_string())
            .spawn(move || {
                for job in job_rx.iter() {
                    if let Some(graph) = run_job(&dot, &scratch, &theme, &worker_hashes, &job) {
                        if result_tx.send(graph).is_err() {
                            break;
                        }
                    }
                }
            })
            .expect("failed to spawn render worker");

        Self {
            jobs: Some(job_tx),
            results: result_rx,
            hashes,
            dot_available,
            worker: Some(worker),
        }
    }

    /// Whether the converter probe succeeded.
    pub fn dot_available(&self) -> bool {
        self.dot_available
    }

    /// Queue a render of one named graph (empty name for the whole file)
    /// from the whole-file graph text.
    pub fn request(&self, doc: DocumentId, name: impl Into<String>, graph_text: String) {
        if !self.dot_available {
            return;
        }
        if let Some(jobs) = &self.jobs {
            let _ = jobs.send(RenderJob {
                doc,
                name: name.into(),
                graph_text,
            });
        }
    }

    /// Drain finished renders onto the view. Only results for the active
    /// document of a visible view are applied; the rest are stale and
    /// dropped.
    pub fn poll_results(&self, active: Option<&DocumentId>, view: &dyn GraphView) {
        while let Ok(graph) = self.results.try_recv() {
            match active {
                Some(doc) if *doc == graph.doc && view.is_visible() => view.show_graph(graph),
                _ => debug!(doc = %graph.doc, "discarding stale render result"),
            }
        }
    }

    /// Drop the cached graph hash for a closed document.
    pub fn evict(&self, doc: &DocumentId) {
        self.hashes.lock().remove(doc);
    }
}

impl Drop for CfgRenderService {
    fn drop(&mut self) {
        // closing the job channel ends the worker loop
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Probe the converter binary with `-V`.
pub fn is_dot_available(dot: &Path) -> bool {
    Command::new(dot)
        .arg("-V")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn run_job(
    dot: &Path,
    scratch_root: &Path,
    theme: &GraphTheme,
    hashes: &Mutex<FxHashMap<DocumentId, u64>>,
    job: &RenderJob,
) -> Option<RenderedGraph> {
    let dir = doc_scratch_dir(scratch_root, &job.doc);
    let hash = graph_hash(&job.graph_text);
    let changed = hashes.lock().insert(job.doc.clone(), hash) != Some(hash);
    if changed {
        if let Err(err) = render_all(dot, &dir, theme, &job.graph_text) {
            error!(doc = %job.doc, error = %err, "failed to render graphs");
        }
    }

    let svg_path = dir.join(file_name(&job.name, "svg"));
    match fs::read_to_string(&svg_path) {
        Ok(svg) => Some(RenderedGraph {
            doc: job.doc.clone(),
            name: job.name.clone(),
            svg,
        }),
        Err(_) => {
            debug!(doc = %job.doc, name = %job.name, "no rendered graph available");
            None
        }
    }
}

fn render_all(
    dot: &Path,
    dir: &Path,
    theme: &GraphTheme,
    graph_text: &str,
) -> Result<(), RenderError> {
    // the graph changed; previous renders for this document are all invalid
    let _ = fs::remove_dir_all(dir);
    fs::create_dir_all(dir)?;
    for (name, source) in split_graphs(graph_text, theme) {
        let dot_path = dir.join(file_name(&name, "dot"));
        let svg_path = dir.join(file_name(&name, "svg"));
        fs::write(&dot_path, source)?;
        if let Err(err) = render_one(dot, &dot_path, &svg_path) {
            error!(file = %dot_path.display(), error = %err, "failed to convert graph");
            let _ = fs::remove_file(&svg_path);
        }
    }
    Ok(())
}

fn render_one(dot: &Path, dot_path: &Path, svg_path: &Path) -> Result<(), RenderError> {
    let status = Command::new(dot)
        .arg(dot_path)
        .arg("-Tsvg")
        .arg("-o")
        .arg(svg_path)
        .status()?;
    if !status.success() {
        return Err(RenderError::ConverterFailed(status));
    }
    // dot emits transparent strokes that some SVG renderers draw as black
    let svg = fs::read_to_string(svg_path)?;
    fs::write(svg_path, svg.replace("stroke=\"transparent\"", ""))?;
    Ok(())
}

fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn file_name(name: &str, ext: &str) -> String {
    let stem = sanitize(name);
    if stem.is_empty() {
        format!("file.{}", ext)
    } else {
        format!("{}.{}", stem, ext)
    }
}

fn doc_scratch_dir(root: &Path, doc: &DocumentId) -> PathBuf {
    root.join(format!(
        "{}-{:x}",
        sanitize(doc.as_str()),
        graph_hash(doc.as_str())
    ))
}
