use crate::persist::IndexPaths;
use std::path::{Path, PathBuf};

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_SNIPPET_WINDOW: usize = 32;

/// Query-time settings. The layout itself is derived from `root`.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub root: PathBuf,
    pub top_k: usize,
    pub snippet_window: usize,
}

impl SearchConfig {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            top_k: DEFAULT_TOP_K,
            snippet_window: DEFAULT_SNIPPET_WINDOW,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_snippet_window(mut self, window: usize) -> Self {
        self.snippet_window = window;
        self
    }

    pub fn paths(&self) -> IndexPaths {
        IndexPaths::new(&self.root)
    }
}
