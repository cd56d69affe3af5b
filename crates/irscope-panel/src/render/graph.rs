//! Dot-source processing for control-flow graphs.
//!
//! The compiler emits one dot document per file, with one `subgraph cluster`
//! per declaration. The renderer works per declaration, so the document is
//! split into standalone graphs, each re-wrapped in a themed header; the
//! empty name maps to the combined whole-file graph.

use std::hash::Hasher;

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHasher;

static LABEL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[label="([^"]*)""#).expect("label regex"));

const SUBGRAPH_PREFIX: &str = "    subgraph cluster";

/// Colors applied to the emitted dot source.
#[derive(Debug, Clone)]
pub struct GraphTheme {
    /// Dark palette: white strokes, bright accent colors.
    pub dark: bool,
    /// Panel background, as a `#rrggbb` hex string.
    pub background: String,
}

impl GraphTheme {
    /// Light palette over the given background.
    pub fn light() -> Self {
        Self {
            dark: false,
            background: "#ffffff".to_string(),
        }
    }

    /// Dark palette over the given background.
    pub fn dark() -> Self {
        Self {
            dark: true,
            background: "#2b2b2b".to_string(),
        }
    }
}

impl Default for GraphTheme {
    fn default() -> Self {
        Self::light()
    }
}

fn header(theme: &GraphTheme) -> Vec<String> {
    if theme.dark {
        vec![
            "digraph cfg {".to_string(),
            format!(
                "    graph [nodesep=3 fontname=\"Arial\" fontsize=24 bgcolor=\"{}\" color=white]",
                theme.background
            ),
            "    node [shape=box margin=\"0.15,0.05\" width=0 height=0 fontname=\"Arial\" fontsize=24 color=white fontcolor=white]"
                .to_string(),
            "    edge [penwidth=2 fontname=\"Arial\" fontsize=24 len=0.5 color=white]".to_string(),
        ]
    } else {
        vec![
            "digraph cfg {".to_string(),
            format!(
                "    graph [nodesep=3 fontname=\"Arial\" fontsize=24 bgcolor=\"{}\"]",
                theme.background
            ),
            "    node [shape=box margin=\"0.15,0.05\" width=0 height=0 fontname=\"Arial\" fontsize=24]"
                .to_string(),
            "    edge [penwidth=2 fontname=\"Arial\" fontsize=24 len=0.5]".to_string(),
        ]
    }
}

fn retheme(line: &str, dark: bool) -> String {
    if dark {
        line.replace("=blue", "=\"#2abbd1\"")
            .replace("=gray", "=\"#7a7a7a\"")
            .replace("=green", "=\"#44ff3d\"")
    } else {
        line.replace("=green", "=\"#3acf61\"")
            .replace("=gray", "=\"#bdbdbd\"")
    }
}

fn wrap(chunk: &[&str], theme: &GraphTheme) -> String {
    let mut lines = header(theme);
    lines.extend(chunk.iter().map(|l| retheme(l, theme.dark)));
    lines.push("}".to_string());
    lines.join("\n")
}

fn chunk_label(chunk: &[&str]) -> Option<String> {
    chunk
        .iter()
        .find_map(|line| LABEL_NAME_RE.captures(line))
        .map(|captures| captures[1].to_string())
}

/// Split a whole-file dot document into named per-declaration graphs plus
/// the combined graph under the empty name.
///
/// Returns nothing when the document has no `subgraph cluster` yet (the
/// compiler has not produced the graph for this file). A repeated
/// declaration name keeps the last occurrence.
pub fn split_graphs(graph: &str, theme: &GraphTheme) -> Vec<(String, String)> {
    let lines: Vec<&str> = graph.lines().collect();
    let Some(first) = lines.iter().position(|l| l.starts_with(SUBGRAPH_PREFIX)) else {
        return Vec::new();
    };
    let Some(closing) = lines.iter().rposition(|l| l.starts_with('}')) else {
        return Vec::new();
    };

    let mut chunks: Vec<&[&str]> = Vec::new();
    let mut start = first;
    for i in (first + 1)..lines.len() {
        if lines[i].starts_with(SUBGRAPH_PREFIX) {
            chunks.push(&lines[start..i]);
            start = i;
        }
    }
    if start < closing {
        chunks.push(&lines[start..closing]);
    }

    let mut out: Vec<(String, String)> = Vec::new();
    let mut push = |name: String, source: String| {
        if let Some(slot) = out.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = source;
        } else {
            out.push((name, source));
        }
    };
    for chunk in &chunks {
        let Some(name) = chunk_label(chunk) else {
            continue;
        };
        push(name, wrap(chunk, theme));
    }
    let combined: Vec<&str> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
    push(String::new(), wrap(&combined, theme));
    out
}

/// Content hash used to skip re-rendering an unchanged graph. A collision
/// only costs a redundant render.
pub fn graph_hash(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(text.as_bytes());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> String {
        [
            "digraph whole_file {",
            "    graph [splines=ortho]",
            "    subgraph cluster_0 {",
            "        n0 [label=\"main\" color=green]",
            "        n0 -> n1 [color=gray]",
            "    }",
            "    subgraph cluster_1 {",
            "        n2 [label=\"helper\" color=blue]",
            "    }",
            "}",
        ]
        .join("\n")
    }

    #[test]
    fn test_split_yields_named_graphs_plus_combined() {
        let graphs = split_graphs(&sample(), &GraphTheme::light());
        let names: Vec<&str> = graphs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["main", "helper", ""]);
        for (_, source) in &graphs {
            assert!(source.starts_with("digraph cfg {"));
            assert!(source.ends_with('}'));
        }
    }

    #[test]
    fn test_uninitialized_graph_splits_to_nothing() {
        assert!(split_graphs("digraph whole_file {\n}", &GraphTheme::light()).is_empty());
        assert!(split_graphs("", &GraphTheme::dark()).is_empty());
    }

    #[test]
    fn test_light_theme_rewrites_colors() {
        let graphs = split_graphs(&sample(), &GraphTheme::light());
        let (_, main) = &graphs[0];
        assert!(main.contains("color=\"#3acf61\""));
        assert!(main.contains("color=\"#bdbdbd\""));
        // blue is kept in the light theme
        let (_, helper) = &graphs[1];
        assert!(helper.contains("color=blue"));
    }

    #[test]
    fn test_dark_theme_rewrites_colors() {
        let graphs = split_graphs(&sample(), &GraphTheme::dark());
        let (_, main) = &graphs[0];
        assert!(main.contains("color=\"#44ff3d\""));
        assert!(main.contains("color=\"#7a7a7a\""));
        let (_, helper) = &graphs[1];
        assert!(helper.contains("color=\"#2abbd1\""));
    }

    #[test]
    fn test_combined_graph_contains_every_subgraph() {
        let graphs = split_graphs(&sample(), &GraphTheme::light());
        let combined = &graphs.last().unwrap().1;
        assert!(combined.contains("main"));
        assert!(combined.contains("helper"));
    }

    #[test]
    fn test_graph_hash_tracks_content() {
        let a = graph_hash("digraph { a -> b }");
        assert_eq!(a, graph_hash("digraph { a -> b }"));
        assert_ne!(a, graph_hash("digraph { a -> c }"));
    }
}
