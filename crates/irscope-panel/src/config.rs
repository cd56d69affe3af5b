//! Panel configuration.

use std::env;
use std::path::PathBuf;

/// Options controlling the panel's external-facing behavior. Defaults match
/// a stock installation; hosts override what they need.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Path to the dot binary used for graph rasterization.
    pub dot_binary: PathBuf,

    /// Root directory for rendered graph scratch files.
    pub scratch_dir: PathBuf,

    /// Whether the host UI is in a dark theme. Affects graph colors only.
    pub dark_theme: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            dot_binary: PathBuf::from("dot"),
            scratch_dir: env::temp_dir().join("irscope"),
            dark_theme: false,
        }
    }
}

impl PanelConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific dot binary.
    pub fn with_dot_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.dot_binary = path.into();
        self
    }

    /// Use a specific scratch directory.
    pub fn with_scratch_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.scratch_dir = path.into();
        self
    }

    /// Render graphs with the dark palette.
    pub fn with_dark_theme(mut self, dark: bool) -> Self {
        self.dark_theme = dark;
        self
    }
}
