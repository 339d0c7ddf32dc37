//! A root unit is one directory subtree fed to the compiler. It owns file
//! discovery, the source/header classification, the editor's in-memory
//! buffers for the subtree, and the include-name resolution index.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::paths::is_path_excluded;

const SOURCE_EXTS: &[&str] = &["sv", "v", "SV", "V", "verilog"];
const HEADER_EXTS: &[&str] = &["svh", "vh", "SVH", "VH", "verilogh", "h"];

const SCAN_MAX_FILES: usize = 1_000_000;
const HDL_MAX_FILES: usize = 10_000;

/// Matches a well-formed single-line include of any supported suffix.
static ALL_INCLUDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*`include\s+"([^"]+\.(?:sv|v|SV|V|verilog|svh|vh|SVH|VH|verilogh|h))"\s*$"#)
        .expect("all-include regex")
});

/// Matches only includes of source suffixes; header inclusions never reshape
/// the top-level classification.
static SOURCE_INCLUDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*`include\s+"([^"]+\.(?:sv|v|SV|V|verilog))"\s*$"#)
        .expect("source-include regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Complete,
    ExceedsMaxFiles,
}

#[derive(Debug, Default)]
struct SourceFileCache {
    source_files: BTreeSet<PathBuf>,
    header_files: BTreeSet<PathBuf>,
}

#[derive(Debug)]
pub struct RootUnit {
    path: PathBuf,
    principal: bool,
    stale: bool,
    cache: SourceFileCache,
    file_buffers: HashMap<PathBuf, String>,
    non_inlined_files: Vec<PathBuf>,
    inlined_files: Vec<PathBuf>,
    include_name_to_paths: BTreeMap<String, BTreeSet<PathBuf>>,
}

impl RootUnit {
    pub fn new(path: PathBuf, principal: bool) -> Self {
        Self {
            path,
            principal,
            stale: true,
            cache: SourceFileCache::default(),
            file_buffers: HashMap::new(),
            non_inlined_files: Vec::new(),
            inlined_files: Vec::new(),
            include_name_to_paths: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn principal(&self) -> bool {
        self.principal
    }

    pub fn stale(&self) -> bool {
        self.stale
    }

    pub fn set_stale(&mut self, stale: bool) {
        self.stale = stale;
    }

    pub fn file_buffers(&self) -> &HashMap<PathBuf, String> {
        &self.file_buffers
    }

    pub fn non_inlined_files(&self) -> &[PathBuf] {
        &self.non_inlined_files
    }

    pub fn inlined_files(&self) -> &[PathBuf] {
        &self.inlined_files
    }

    pub fn include_name_to_paths(&self) -> &BTreeMap<String, BTreeSet<PathBuf>> {
        &self.include_name_to_paths
    }

    pub fn header_files(&self) -> &BTreeSet<PathBuf> {
        &self.cache.header_files
    }

    pub fn store_file_contents(&mut self, path: &Path, contents: &str) {
        self.file_buffers
            .insert(path.to_path_buf(), contents.to_string());
    }

    pub fn clear_file_contents(&mut self, path: &Path) {
        self.file_buffers.remove(path);
    }

    pub fn get_file_contents(&self, path: &Path) -> Option<&str> {
        self.file_buffers.get(path).map(String::as_str)
    }

    /// Insert `path` into the classified cache if its extension is supported
    /// and it is not already known; reports whether the cache changed.
    pub fn add_file_to_cache(&mut self, path: &Path) -> bool {
        if self.cache.source_files.contains(path) || self.cache.header_files.contains(path) {
            info!(path = %path.display(), "file already in cache");
            return false;
        }
        if has_ext(path, SOURCE_EXTS) {
            self.cache.source_files.insert(path.to_path_buf());
            true
        } else if has_ext(path, HEADER_EXTS) {
            self.cache.header_files.insert(path.to_path_buf());
            true
        } else {
            false
        }
    }

    pub fn remove_file_from_cache(&mut self, path: &Path) -> bool {
        self.cache.source_files.remove(path) || self.cache.header_files.remove(path)
    }

    /// Drop the discovery cache so the next scan re-walks the tree.
    pub fn clear_paths_cache(&mut self) {
        self.cache.source_files.clear();
        self.cache.header_files.clear();
    }

    /// Discover and classify files, then rebuild the include-name index and
    /// the top-level/inlined split. Discovery itself is skipped when a
    /// previous scan's cache is still present.
    pub fn scan_files(&mut self, excluded_paths: &[PathBuf]) -> ScanOutcome {
        self.non_inlined_files.clear();
        self.inlined_files.clear();
        self.include_name_to_paths.clear();

        let outcome = if self.cache.source_files.is_empty() && self.cache.header_files.is_empty() {
            discover_files(&self.path, excluded_paths, &mut self.cache)
        } else {
            ScanOutcome::Complete
        };

        for source_file in &self.cache.source_files {
            add_include_name_keys(source_file, &mut self.include_name_to_paths);
        }

        // All header files are a priori inlined.
        let mut inlined: BTreeSet<PathBuf> = self.cache.header_files.iter().cloned().collect();
        find_inlined_files(
            &self.cache.source_files,
            &self.include_name_to_paths,
            &mut inlined,
        );

        for path in &self.cache.source_files {
            if !inlined.contains(path) && !is_path_excluded(path, excluded_paths) {
                self.non_inlined_files.push(path.clone());
            }
        }
        for path in inlined {
            if !is_path_excluded(&path, excluded_paths) {
                self.inlined_files.push(path);
            }
        }

        info!(
            path = %self.path.display(),
            non_inlined = self.non_inlined_files.len(),
            inlined = self.inlined_files.len(),
            "scanned root unit"
        );
        outcome
    }

    /// Incremental fast path for edits that add include directives: resolve
    /// every include in `text` through the index and move the targets from
    /// the top-level list to the inlined one. Reports whether any resolved
    /// non-excluded target was seen.
    pub fn add_inlined_file(&mut self, text: &str, excluded_paths: &[PathBuf]) -> bool {
        let mut resolved: BTreeSet<PathBuf> = BTreeSet::new();
        for line in text.lines() {
            if let Some(cap) = ALL_INCLUDE_RE.captures(line) {
                if let Some(paths) = self.include_name_to_paths.get(&cap[1]) {
                    resolved.extend(paths.iter().cloned());
                }
            }
        }
        let mut changed = false;
        for path in resolved {
            if is_path_excluded(&path, excluded_paths) {
                continue;
            }
            if !self.inlined_files.contains(&path) {
                self.inlined_files.push(path.clone());
            }
            self.non_inlined_files.retain(|p| p != &path);
            changed = true;
        }
        changed
    }

    /// True iff any line of `text` is an include of a source-suffix file.
    pub fn contains_non_header_include(&self, text: &str) -> bool {
        text.lines().any(|line| SOURCE_INCLUDE_RE.is_match(line))
    }

    /// Collect the source-only include directives on `line` (whole directive
    /// text, trimmed) into `out`.
    pub fn get_inlined_files(&self, line: &str, out: &mut BTreeSet<String>) {
        for m in SOURCE_INCLUDE_RE.find_iter(line) {
            out.insert(m.as_str().trim().to_string());
        }
    }
}

fn has_ext(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| exts.contains(&e))
        .unwrap_or(false)
}

fn discover_files(
    root: &Path,
    excluded_paths: &[PathBuf],
    cache: &mut SourceFileCache,
) -> ScanOutcome {
    if !root.exists() {
        warn!(path = %root.display(), "root unit path does not exist");
        return ScanOutcome::Complete;
    }
    if root.is_file() {
        classify(root, cache);
        return ScanOutcome::Complete;
    }

    let mut total_files = 0usize;
    let mut hdl_files = 0usize;
    let mut skipped = 0usize;

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_path_excluded(entry.path(), excluded_paths));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%err, "error while traversing directory");
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        total_files += 1;
        if total_files > SCAN_MAX_FILES {
            warn!(limit = SCAN_MAX_FILES, "exceeded total file count limit");
            return ScanOutcome::ExceedsMaxFiles;
        }
        if hdl_files > HDL_MAX_FILES {
            warn!(limit = HDL_MAX_FILES, "exceeded HDL file count limit");
            return ScanOutcome::ExceedsMaxFiles;
        }
        if classify(entry.path(), cache) {
            hdl_files += 1;
        } else {
            skipped += 1;
        }
    }

    info!(hdl_files, total_files, skipped, "file discovery finished");
    ScanOutcome::Complete
}

fn classify(path: &Path, cache: &mut SourceFileCache) -> bool {
    if has_ext(path, SOURCE_EXTS) {
        cache.source_files.insert(path.to_path_buf());
        true
    } else if has_ext(path, HEADER_EXTS) {
        cache.header_files.insert(path.to_path_buf());
        true
    } else {
        false
    }
}

/// Index every suffix-chain spelling of `file`: `/a/b/c/f.sv` yields keys
/// `f.sv`, `c/f.sv`, `b/c/f.sv`, and `a/b/c/f.sv`.
fn add_include_name_keys(file: &Path, index: &mut BTreeMap<String, BTreeSet<PathBuf>>) {
    let mut suffix = String::new();
    let mut current = file.to_path_buf();
    loop {
        let Some(file_name) = current.file_name().and_then(|n| n.to_str()) else {
            break;
        };
        let key = format!("{file_name}{suffix}");
        let entry = index.entry(key).or_default();
        entry.insert(file.to_path_buf());
        if entry.len() > 1 {
            debug!(name = file_name, "duplicate include name found");
        }
        suffix = format!("/{file_name}{suffix}");
        if !current.pop() || current.file_name().is_none() {
            break;
        }
    }
}

fn find_inlined_files(
    source_files: &BTreeSet<PathBuf>,
    index: &BTreeMap<String, BTreeSet<PathBuf>>,
    inlined: &mut BTreeSet<PathBuf>,
) {
    let mut not_found = 0usize;
    for file in source_files {
        let Ok(handle) = fs::File::open(file) else {
            continue;
        };
        for line in BufReader::new(handle).lines() {
            let Ok(line) = line else {
                break;
            };
            if let Some(cap) = ALL_INCLUDE_RE.captures(&line) {
                match index.get(&cap[1]) {
                    Some(paths) => inlined.extend(paths.iter().cloned()),
                    None => not_found += 1,
                }
            }
        }
    }
    if not_found > 0 {
        warn!(count = not_found, "include names not present in the index");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn unit_with_files(files: &[(&str, &str)]) -> (tempfile::TempDir, RootUnit) {
        let dir = tempdir().expect("tempdir");
        for (name, contents) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create dirs");
            }
            fs::write(path, contents).expect("write fixture");
        }
        let unit = RootUnit::new(dir.path().to_path_buf(), true);
        (dir, unit)
    }

    #[test]
    fn included_source_files_are_not_top_level() {
        let (dir, mut unit) = unit_with_files(&[
            ("a.sv", "`include \"b.sv\"\n"),
            ("b.sv", "module m;\nendmodule\n"),
        ]);
        assert_eq!(unit.scan_files(&[]), ScanOutcome::Complete);
        assert_eq!(unit.non_inlined_files(), [dir.path().join("a.sv")]);
        assert!(unit.inlined_files().contains(&dir.path().join("b.sv")));
    }

    #[test]
    fn headers_are_always_inlined() {
        let (dir, mut unit) = unit_with_files(&[
            ("top.sv", "module top;\nendmodule\n"),
            ("defs.svh", "`define FOO 1\n"),
        ]);
        unit.scan_files(&[]);
        assert!(unit.inlined_files().contains(&dir.path().join("defs.svh")));
        assert_eq!(unit.non_inlined_files(), [dir.path().join("top.sv")]);
    }

    #[test]
    fn include_index_carries_suffix_chains() {
        let (dir, mut unit) = unit_with_files(&[("rtl/core/alu.sv", "module alu;\nendmodule\n")]);
        unit.scan_files(&[]);
        let index = unit.include_name_to_paths();
        let expected = dir.path().join("rtl/core/alu.sv");
        for key in ["alu.sv", "core/alu.sv", "rtl/core/alu.sv"] {
            assert!(
                index.get(key).map(|s| s.contains(&expected)).unwrap_or(false),
                "missing key {key}"
            );
        }
    }

    #[test]
    fn excluded_subtrees_are_pruned() {
        let (dir, mut unit) = unit_with_files(&[
            ("rtl/top.sv", "module top;\nendmodule\n"),
            ("vendor/ip.sv", "module ip;\nendmodule\n"),
        ]);
        let excluded = vec![dir.path().join("vendor")];
        unit.scan_files(&excluded);
        assert_eq!(unit.non_inlined_files(), [dir.path().join("rtl/top.sv")]);
    }

    #[test]
    fn add_inlined_file_moves_targets_without_rescan() {
        let (dir, mut unit) = unit_with_files(&[
            ("a.sv", "module a;\nendmodule\n"),
            ("b.sv", "module b;\nendmodule\n"),
        ]);
        unit.scan_files(&[]);
        assert_eq!(unit.non_inlined_files().len(), 2);

        assert!(unit.add_inlined_file("`include \"b.sv\"", &[]));
        assert_eq!(unit.non_inlined_files(), [dir.path().join("a.sv")]);
        assert!(unit.inlined_files().contains(&dir.path().join("b.sv")));

        // Idempotent on repeat.
        assert!(unit.add_inlined_file("`include \"b.sv\"", &[]));
        assert_eq!(unit.non_inlined_files(), [dir.path().join("a.sv")]);
    }

    #[test]
    fn source_and_header_includes_are_distinguished() {
        let (_dir, unit) = unit_with_files(&[]);
        assert!(unit.contains_non_header_include("`include \"b.sv\""));
        assert!(!unit.contains_non_header_include("`include \"defs.svh\""));

        let mut out = BTreeSet::new();
        unit.get_inlined_files("  `include \"b.sv\"  ", &mut out);
        assert_eq!(out.len(), 1);
        assert!(out.iter().next().expect("entry").contains("b.sv"));
    }

    #[test]
    fn only_well_formed_include_lines_count() {
        let (_dir, unit) = unit_with_files(&[]);
        assert!(!unit.contains_non_header_include("x = 1; `include \"b.sv\""));
        assert!(!unit.contains_non_header_include("$display(\"`include \\\"b.sv\\\"\");"));

        let mut out = BTreeSet::new();
        unit.get_inlined_files("x = 1; `include \"b.sv\"", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn cache_membership_tracks_supported_extensions() {
        let (dir, mut unit) = unit_with_files(&[]);
        let sv = dir.path().join("x.sv");
        let svh = dir.path().join("x.svh");
        let txt = dir.path().join("x.txt");
        assert!(unit.add_file_to_cache(&sv));
        assert!(!unit.add_file_to_cache(&sv));
        assert!(unit.add_file_to_cache(&svh));
        assert!(!unit.add_file_to_cache(&txt));
        assert!(unit.remove_file_from_cache(&sv));
        assert!(!unit.remove_file_from_cache(&sv));
    }

    #[test]
    fn file_buffers_round_trip() {
        let (dir, mut unit) = unit_with_files(&[]);
        let path = dir.path().join("top.sv");
        assert!(unit.get_file_contents(&path).is_none());
        unit.store_file_contents(&path, "module top; endmodule");
        assert_eq!(unit.get_file_contents(&path), Some("module top; endmodule"));
        unit.clear_file_contents(&path);
        assert!(unit.get_file_contents(&path).is_none());
    }
}
