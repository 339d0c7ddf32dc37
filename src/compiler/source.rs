//! Text storage for a single compilation pass.
//!
//! Editor buffers are installed as overlays before compilation; anything else
//! is read from disk on first use and cached for the lifetime of the pass.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

#[derive(Default)]
pub struct SourceManager {
    overlays: HashMap<PathBuf, Arc<str>>,
    disk: HashMap<PathBuf, Arc<str>>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install in-memory text for `path`, shadowing the on-disk contents.
    pub fn assign_text(&mut self, path: &Path, text: &str) {
        self.overlays.insert(path.to_path_buf(), Arc::from(text));
    }

    /// Whether an overlay is already installed for `path`.
    pub fn is_cached(&self, path: &Path) -> bool {
        self.overlays.contains_key(path)
    }

    /// Fetch the text for `path`, preferring overlays over disk.
    pub fn get_text(&mut self, path: &Path) -> Option<Arc<str>> {
        if let Some(text) = self.overlays.get(path) {
            return Some(text.clone());
        }
        if let Some(text) = self.disk.get(path) {
            return Some(text.clone());
        }
        match fs::read_to_string(path) {
            Ok(contents) => {
                let text: Arc<str> = Arc::from(contents.as_str());
                self.disk.insert(path.to_path_buf(), text.clone());
                Some(text)
            }
            Err(err) => {
                debug!(path = %path.display(), %err, "failed to read source file");
                None
            }
        }
    }

    /// Whether `path` would yield text: either an overlay exists or the file
    /// is present on disk.
    pub fn exists(&self, path: &Path) -> bool {
        self.overlays.contains_key(path) || path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn overlays_shadow_disk_contents() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("top.sv");
        fs::write(&file, "module disk; endmodule").expect("write");

        let mut sources = SourceManager::new();
        assert_eq!(
            sources.get_text(&file).as_deref(),
            Some("module disk; endmodule")
        );

        sources.assign_text(&file, "module buffer; endmodule");
        assert!(sources.is_cached(&file));
        assert_eq!(
            sources.get_text(&file).as_deref(),
            Some("module buffer; endmodule")
        );
    }

    #[test]
    fn missing_files_yield_nothing() {
        let mut sources = SourceManager::new();
        assert!(sources.get_text(Path::new("/nonexistent/x.sv")).is_none());
        assert!(!sources.exists(Path::new("/nonexistent/x.sv")));
    }
}
