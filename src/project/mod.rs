//! The project model: the coordinator between the editor's streaming
//! mutations and the compiler's batch view of the world.
//!
//! A project owns one principal root unit plus any number of imported root
//! units, the macro predefines, the exclusion and suppression lists, and the
//! cached compilation. Every mutation invalidates the cache; diagnostics are
//! recomputed from a fresh compile on demand.

pub mod dotfile;
pub mod lookup;
pub mod root_unit;
pub mod types;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::compiler::{walk, Compilation, CompileOptions, DiagSeverity, SourceManager};
use crate::paths::{is_path_excluded, is_path_part_of_path};

use dotfile::{DotFile, DotfileError, DOT_FILENAME};
use lookup::{ConstructKind, LookupIndex};
use root_unit::{RootUnit, ScanOutcome};
use types::{Diagnostic, Location, ModuleDeclaration, Position, Range, Severity};

pub const WARNING_EXCEEDS_MAX_FILE_COUNT: &str =
    "Exceeded max files (10000) for project. Consider excluding unneeded files from compilation.";

/// Warnings that are sticky are broadcast every time they occur.
const REPEATABLE_WARNINGS: &[&str] = &[WARNING_EXCEEDS_MAX_FILE_COUNT];

const MAX_COMPILER_WARNINGS: usize = 10;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Path does not exist")]
    PathDoesNotExist,
    #[error("Path is not within any compilation root")]
    OutsideProject,
    #[error("Path is already within a compilation root")]
    AlreadyWithinRoot,
    #[error("Path is parent of existing compilation root")]
    ParentOfRoot,
    #[error("Cannot remove principal root unit")]
    RemovePrincipal,
    #[error("Path is not a compilation root")]
    NotARoot,
    #[error("Failed to write project dotfile: {0}")]
    DotfileWrite(#[from] io::Error),
    #[error("Compilation failed: {0}")]
    Compile(String),
}

pub struct Project {
    root_units: BTreeMap<PathBuf, RootUnit>,
    principal_path: PathBuf,
    defines: Vec<String>,
    excluded_paths: Vec<PathBuf>,
    suppressed_diagnostics: Vec<String>,
    prev_files_with_diagnostics: BTreeMap<PathBuf, Vec<Diagnostic>>,
    compiler_warnings: BTreeMap<String, bool>,
    fp_ranks: HashMap<PathBuf, i32>,
    cached_compilation: Option<Arc<Compilation>>,
}

impl Project {
    /// Construct a project rooted at `path`, loading the dotfile if present
    /// and scanning the principal tree.
    pub fn create(path: &Path) -> Result<Self, ProjectError> {
        if !path.exists() {
            return Err(ProjectError::PathDoesNotExist);
        }
        info!(path = %path.display(), "creating project");
        let mut root_units = BTreeMap::new();
        root_units.insert(path.to_path_buf(), RootUnit::new(path.to_path_buf(), true));
        let mut project = Self {
            root_units,
            principal_path: path.to_path_buf(),
            defines: Vec::new(),
            excluded_paths: Vec::new(),
            suppressed_diagnostics: Vec::new(),
            prev_files_with_diagnostics: BTreeMap::new(),
            compiler_warnings: BTreeMap::new(),
            fp_ranks: HashMap::new(),
            cached_compilation: None,
        };
        project.load_dotfile(true);
        Ok(project)
    }

    pub fn principal_path(&self) -> &Path {
        &self.principal_path
    }

    pub fn root_units(&self) -> impl Iterator<Item = &RootUnit> {
        self.root_units.values()
    }

    pub fn defines(&self) -> &[String] {
        &self.defines
    }

    pub fn excluded_paths(&self) -> &[PathBuf] {
        &self.excluded_paths
    }

    pub fn unit_for_path(&self, path: &Path) -> Option<&RootUnit> {
        self.root_units
            .values()
            .find(|unit| is_path_part_of_path(path, unit.path()))
    }

    fn unit_path_for(&self, path: &Path) -> Option<PathBuf> {
        self.unit_for_path(path).map(|unit| unit.path().to_path_buf())
    }

    fn invalidate(&mut self) {
        self.cached_compilation = None;
    }

    pub fn is_resource_excluded(&self, path: &Path) -> bool {
        is_path_excluded(path, &self.excluded_paths)
    }

    // ---- compilation -----------------------------------------------------

    /// Compile the current file set, reusing the cached compilation when one
    /// is present. Assumes `scan_files` has run for every stale unit.
    pub fn compile(&mut self) -> Result<Arc<Compilation>, ProjectError> {
        if let Some(cached) = &self.cached_compilation {
            info!("compilation: using cached compilation");
            return Ok(cached.clone());
        }

        let mut sources = SourceManager::new();
        let mut include_dirs: Vec<PathBuf> = Vec::new();
        let mut targets: Vec<PathBuf> = Vec::new();

        // The principal unit compiles last so its definitions win when the
        // same identifier is defined in several roots.
        {
            let mut ordered: Vec<&RootUnit> = self
                .root_units
                .values()
                .filter(|unit| !unit.principal())
                .collect();
            if let Some(principal) = self.root_units.get(&self.principal_path) {
                ordered.push(principal);
            }
            for unit in ordered {
                info!(path = %unit.path().display(), "handling root unit");
                push_unique(&mut include_dirs, unit.path());
                for header in unit.header_files() {
                    if let Some(parent) = header.parent() {
                        push_unique(&mut include_dirs, parent);
                        if let Some(grandparent) = parent.parent() {
                            push_unique(&mut include_dirs, grandparent);
                        }
                    }
                }
                for (path, buffer) in unit.file_buffers() {
                    if sources.is_cached(path) {
                        warn!(path = %path.display(), "file already in source manager cache");
                        continue;
                    }
                    debug!(path = %path.display(), "caching buffered file to source manager");
                    sources.assign_text(path, buffer);
                }
                targets.extend_from_slice(unit.non_inlined_files());
            }
        }

        // Higher rank compiles first; unranked files share the default rank.
        targets.sort_by(|a, b| self.get_fp_rank(b).cmp(&self.get_fp_rank(a)));

        let options = CompileOptions {
            include_dirs,
            predefines: self.defines.clone(),
        };
        let compilation = Compilation::compile(options, &targets, &mut sources)
            .map_err(|err| ProjectError::Compile(err.to_string()))?;
        let compilation = Arc::new(compilation);
        self.cached_compilation = Some(compilation.clone());
        Ok(compilation)
    }

    /// Recompile and post-process diagnostics for the editor: suppressions,
    /// exclusions, non-principal filtering, and 1-based to 0-based
    /// coordinate conversion.
    pub fn find_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.invalidate();
        let compilation = match self.compile() {
            Ok(compilation) => compilation,
            Err(err) => {
                error!(%err, "compilation failed");
                return Vec::new();
            }
        };

        let line_suppressed: HashSet<(usize, &str, &Path)> = compilation
            .line_suppressions()
            .iter()
            .map(|s| (s.line, s.code.name(), s.path.as_path()))
            .collect();
        let file_suppressed: HashSet<(&str, &Path)> = compilation
            .file_suppressions()
            .iter()
            .map(|s| (s.code.name(), s.path.as_path()))
            .collect();

        let mut diagnostics = Vec::new();
        let mut empty_location_count = 0usize;
        for diag in compilation.all_diagnostics() {
            if diag.line == 0 {
                empty_location_count += 1;
                continue;
            }
            let name = diag.code.name();
            if self.is_resource_excluded(&diag.path) {
                continue;
            }
            if line_suppressed.contains(&(diag.line, name, diag.path.as_path())) {
                continue;
            }
            if file_suppressed.contains(&(name, diag.path.as_path())) {
                continue;
            }
            if self.suppressed_diagnostics.iter().any(|n| n == name) {
                continue;
            }
            // Non-principal units are dependency-only; we do not lint them.
            if let Some(unit) = self.unit_for_path(&diag.path) {
                if !unit.principal() {
                    continue;
                }
            }

            let column = if diag.column == 0 { 1 } else { diag.column };
            let position = Position::new((diag.line - 1) as u32, (column - 1) as u32);
            let severity = match diag.code.default_severity() {
                DiagSeverity::Error | DiagSeverity::Fatal => Severity::Error,
                DiagSeverity::Warning => Severity::Warning,
                DiagSeverity::Note => Severity::Information,
                DiagSeverity::Ignored => Severity::Hint,
            };
            diagnostics.push(Diagnostic {
                path: diag.path.clone(),
                message: diag.message.clone(),
                severity,
                range: Range::new(position, position),
                name: name.to_string(),
            });
        }
        if empty_location_count > 0 {
            warn!(
                count = empty_location_count,
                "diagnostics without a source location skipped"
            );
        }
        info!(count = diagnostics.len(), "lsp diagnostics");
        diagnostics
    }

    /// Group diagnostics by file and add an empty publish for every file
    /// that had diagnostics in the previous round and no longer does, so the
    /// editor clears stale state. Updates the previous-round record.
    pub fn plan_publishes(
        &mut self,
        diagnostics: Vec<Diagnostic>,
    ) -> BTreeMap<PathBuf, Vec<Diagnostic>> {
        let mut by_file: BTreeMap<PathBuf, Vec<Diagnostic>> = BTreeMap::new();
        for diag in diagnostics {
            by_file.entry(diag.path.clone()).or_default().push(diag);
        }
        let mut publishes = by_file.clone();
        for path in self.prev_files_with_diagnostics.keys() {
            if !by_file.contains_key(path) {
                publishes.insert(path.clone(), Vec::new());
            }
        }
        self.prev_files_with_diagnostics = by_file;
        publishes
    }

    /// Diagnostic code names published on `line` of `path` in the previous
    /// round, deduplicated.
    pub fn diagnostic_names_for_line(&self, path: &Path, line: u32) -> Vec<String> {
        let mut names = Vec::new();
        match self.prev_files_with_diagnostics.get(path) {
            Some(diags) => {
                for diag in diags {
                    if diag.range.start.line == line && !names.contains(&diag.name) {
                        names.push(diag.name.clone());
                    }
                }
            }
            None => warn!(path = %path.display(), line, "no diagnostics for file and line"),
        }
        names
    }

    // ---- scanning --------------------------------------------------------

    /// Re-run discovery and classification on every stale root unit.
    pub fn scan_files(&mut self) {
        let mut exceeded = false;
        let excluded = self.excluded_paths.clone();
        for (path, unit) in self.root_units.iter_mut() {
            if !unit.stale() {
                info!(path = %path.display(), "skipping non-stale root unit");
                continue;
            }
            unit.set_stale(false);
            if unit.scan_files(&excluded) == ScanOutcome::ExceedsMaxFiles {
                exceeded = true;
            }
        }
        if exceeded {
            self.register_warning(WARNING_EXCEEDS_MAX_FILE_COUNT);
        }
    }

    // ---- warnings --------------------------------------------------------

    pub fn register_warning(&mut self, message: &str) {
        if self.compiler_warnings.len() >= MAX_COMPILER_WARNINGS {
            warn!(message, "max warnings reached, skipping");
            return;
        }
        if !self.compiler_warnings.contains_key(message) {
            warn!(message, "registered warning");
            self.compiler_warnings.insert(message.to_string(), false);
        }
    }

    /// Unacknowledged warnings to broadcast. One-shot warnings are marked
    /// acknowledged; repeatable ones are removed so a recurrence registers
    /// and broadcasts again.
    pub fn take_unsent_warnings(&mut self) -> Vec<String> {
        let mut unsent = Vec::new();
        let mut to_remove = Vec::new();
        for (message, acknowledged) in self.compiler_warnings.iter_mut() {
            if *acknowledged {
                continue;
            }
            unsent.push(message.clone());
            if REPEATABLE_WARNINGS.contains(&message.as_str()) {
                to_remove.push(message.clone());
            } else {
                *acknowledged = true;
            }
        }
        for message in to_remove {
            self.compiler_warnings.remove(&message);
        }
        unsent
    }

    // ---- dotfile ---------------------------------------------------------

    /// Load the dotfile from the principal root. Missing or corrupt files
    /// warn and leave the project usable.
    pub fn load_dotfile(&mut self, scan: bool) {
        let dot_path = self.principal_path.join(DOT_FILENAME);
        debug!(path = %dot_path.display(), "loading dotfile");
        match dotfile::load(&dot_path) {
            Err(DotfileError::Missing) => {
                warn!(path = %dot_path.display(), "dotfile does not exist");
            }
            Err(err) => {
                warn!(%err, "failed to read dotfile");
            }
            Ok(loaded) => self.apply_dotfile(loaded),
        }
        if scan {
            self.scan_files();
        }
    }

    fn apply_dotfile(&mut self, loaded: DotFile) {
        if loaded.macros.is_some() {
            self.defines = loaded.defines();
        }

        if let Some(imports) = &loaded.imports {
            let mut units = BTreeMap::new();
            if let Some(principal) = self.root_units.remove(&self.principal_path) {
                units.insert(self.principal_path.clone(), principal);
            }
            for import in imports {
                let path = crate::paths::normalize_path(import);
                if !path.exists() {
                    warn!(path = %path.display(), "root unit path does not exist");
                    continue;
                }
                if is_path_part_of_path(&path, &self.principal_path)
                    || is_path_part_of_path(&self.principal_path, &path)
                {
                    warn!(
                        path = %path.display(),
                        "skipping root unit path nesting with the project dir"
                    );
                    continue;
                }
                debug!(path = %path.display(), "adding root unit path");
                units.insert(path.clone(), RootUnit::new(path, false));
            }
            self.root_units = units;
        }

        if let Some(suppressions) = loaded.project_suppressions {
            self.suppressed_diagnostics = suppressions;
        }

        if let Some(exclusions) = &loaded.exclude_paths {
            self.excluded_paths.clear();
            for exclusion in exclusions {
                // Entries are relative to the principal root; absolute
                // entries pass through the join untouched.
                let path = self.principal_path.join(exclusion);
                if !path.exists() {
                    warn!(path = %path.display(), "excluded path does not exist");
                    continue;
                }
                self.excluded_paths.push(path);
            }
        }

        self.invalidate();
    }

    pub fn write_dotfile(&self) -> Result<(), ProjectError> {
        let dot_path = self.principal_path.join(DOT_FILENAME);
        info!(path = %dot_path.display(), "writing dotfile");

        let imports = self
            .root_units
            .values()
            .filter(|unit| !unit.principal())
            .map(|unit| unit.path().display().to_string())
            .collect();
        let exclude_paths = self
            .excluded_paths
            .iter()
            .map(|path| match path.strip_prefix(&self.principal_path) {
                Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
                Ok(rel) => rel.display().to_string(),
                Err(_) => path.display().to_string(),
            })
            .collect();
        let mut out = DotFile {
            imports: Some(imports),
            project_suppressions: Some(self.suppressed_diagnostics.clone()),
            exclude_paths: Some(exclude_paths),
            macros: None,
        };
        out.set_defines(&self.defines);
        dotfile::save(&dot_path, &out)?;
        Ok(())
    }

    // ---- mutations -------------------------------------------------------

    /// Register a new buffered file. Reports whether the classification
    /// cache changed (an already-known file returns false).
    pub fn add_file(&mut self, path: &Path, text: &str) -> bool {
        let Some(unit_path) = self.unit_path_for(path) else {
            error!(path = %path.display(), "unit not found for path");
            return false;
        };
        self.invalidate();
        let Some(unit) = self.root_units.get_mut(&unit_path) else {
            return false;
        };
        unit.set_stale(true);
        if !text.is_empty() {
            unit.store_file_contents(path, text);
        }
        unit.add_file_to_cache(path)
    }

    /// Replace the buffer for `path`, promoting newly included files to the
    /// inlined list without a rescan where possible. Deleting an include can
    /// demote a file only via rescan, because the same file may still be
    /// included from elsewhere.
    pub fn update_file_buffer(&mut self, path: &Path, text: &str) {
        let Some(unit_path) = self.unit_path_for(path) else {
            error!(path = %path.display(), "unit not found for path");
            return;
        };
        self.invalidate();
        let excluded = self.excluded_paths.clone();
        let Some(unit) = self.root_units.get_mut(&unit_path) else {
            return;
        };
        unit.set_stale(true);

        let previous = unit.get_file_contents(path).unwrap_or("").to_string();
        let mut rescan = false;
        if previous != text {
            let mut added: BTreeSet<String> = BTreeSet::new();
            let mut deleted: BTreeSet<String> = BTreeSet::new();
            let mut prev_lines = previous.lines();
            let mut new_lines = text.lines();
            loop {
                match (prev_lines.next(), new_lines.next()) {
                    (None, None) => break,
                    (Some(prev_line), Some(new_line)) => {
                        if prev_line != new_line {
                            if has_include_statement(prev_line) {
                                unit.get_inlined_files(prev_line, &mut deleted);
                            }
                            if has_include_statement(new_line) {
                                unit.get_inlined_files(new_line, &mut added);
                            }
                        }
                    }
                    (None, Some(new_line)) => {
                        if has_include_statement(new_line) {
                            unit.get_inlined_files(new_line, &mut added);
                        }
                    }
                    (Some(prev_line), None) => {
                        if has_include_statement(prev_line) {
                            unit.get_inlined_files(prev_line, &mut deleted);
                        }
                    }
                }
            }

            for line in added.difference(&deleted) {
                if unit.add_inlined_file(line, &excluded) {
                    debug!(%line, "added inlined file");
                }
            }
            for line in deleted.difference(&added) {
                if unit.contains_non_header_include(line) {
                    info!(%line, "deleted include line forces a rescan");
                    rescan = true;
                    break;
                }
            }
        }

        unit.store_file_contents(path, text);
        if !unit.add_file_to_cache(path) {
            debug!(path = %path.display(), "file already present in cache");
        }
        if rescan {
            info!("rescanning project");
            self.scan_files();
        }
    }

    /// Forget a closed file: its buffer and its classification entry.
    pub fn remove_file_if_no_ent(&mut self, path: &Path) {
        let Some(unit_path) = self.unit_path_for(path) else {
            error!(path = %path.display(), "unit not found for path");
            return;
        };
        self.invalidate();
        let Some(unit) = self.root_units.get_mut(&unit_path) else {
            return;
        };
        unit.set_stale(true);
        unit.clear_file_contents(path);
        if !unit.remove_file_from_cache(path) {
            error!(path = %path.display(), "failed to remove file from cache");
        }
    }

    /// Exclude `path` from discovery and diagnostics. Any previously
    /// excluded descendants become redundant and are dropped.
    pub fn exclude_resource(&mut self, path: &Path) -> Result<(), ProjectError> {
        let Some(unit_path) = self.unit_path_for(path) else {
            warn!(path = %path.display(), "unit not found for path");
            return Err(ProjectError::OutsideProject);
        };
        if !path.exists() {
            warn!(path = %path.display(), "path does not exist");
            return Err(ProjectError::PathDoesNotExist);
        }
        self.invalidate();
        self.load_dotfile(false);
        if self.is_resource_excluded(path) {
            warn!(path = %path.display(), "path is already excluded");
            return Ok(());
        }

        self.excluded_paths.retain(|existing| {
            if is_path_part_of_path(existing, path) {
                debug!(path = %existing.display(), "removing redundant excluded path");
                false
            } else {
                true
            }
        });
        self.excluded_paths.push(path.to_path_buf());

        if let Some(unit) = self.root_units.get_mut(&unit_path) {
            unit.clear_paths_cache();
            unit.set_stale(true);
        }
        self.scan_files();
        self.write_dotfile()
    }

    /// Make `path` visible again. If it sits inside an excluded ancestor,
    /// the ancestor's exclusion is replaced by exclusions of every sibling
    /// subtree not containing `path`.
    pub fn include_resource(&mut self, path: &Path) -> Result<(), ProjectError> {
        let Some(unit_path) = self.unit_path_for(path) else {
            warn!(path = %path.display(), "unit not found for path");
            return Err(ProjectError::OutsideProject);
        };
        if !path.exists() {
            warn!(path = %path.display(), "path does not exist");
            return Err(ProjectError::PathDoesNotExist);
        }
        self.invalidate();
        self.load_dotfile(false);

        let mut new_excluded: Vec<PathBuf> = self
            .excluded_paths
            .iter()
            .filter(|existing| existing.as_path() != path && !is_path_part_of_path(existing, path))
            .cloned()
            .collect();

        let ancestor = self
            .excluded_paths
            .iter()
            .find(|existing| is_path_part_of_path(path, existing))
            .cloned();
        if let Some(ancestor) = ancestor {
            new_excluded.retain(|existing| existing != &ancestor);
            exclude_siblings(&ancestor, path, &mut new_excluded);
        }

        self.excluded_paths = new_excluded;
        if let Some(unit) = self.root_units.get_mut(&unit_path) {
            unit.clear_paths_cache();
            unit.set_stale(true);
        }
        self.scan_files();
        self.write_dotfile()
    }

    /// Replace the macro predefines and persist them.
    pub fn set_macros(&mut self, macros: &[(String, String)]) -> Result<(), ProjectError> {
        self.invalidate();
        self.load_dotfile(false);
        self.defines = macros
            .iter()
            .map(|(name, value)| {
                if value.is_empty() {
                    name.clone()
                } else {
                    format!("{name}={value}")
                }
            })
            .collect();
        self.write_dotfile()
    }

    /// Add a non-principal root unit and persist the project structure.
    pub fn add_root_unit(&mut self, path: &Path) -> Result<(), ProjectError> {
        if !path.exists() {
            warn!(path = %path.display(), "path does not exist");
            return Err(ProjectError::PathDoesNotExist);
        }
        if self.unit_for_path(path).is_some() {
            warn!(path = %path.display(), "path is already within a compilation root");
            return Err(ProjectError::AlreadyWithinRoot);
        }
        for unit_path in self.root_units.keys() {
            if is_path_part_of_path(unit_path, path) {
                warn!(path = %unit_path.display(), "path is parent of existing compilation root");
                return Err(ProjectError::ParentOfRoot);
            }
        }
        self.invalidate();
        self.root_units
            .insert(path.to_path_buf(), RootUnit::new(path.to_path_buf(), false));
        self.scan_files();
        self.write_dotfile()
    }

    pub fn remove_root_unit(&mut self, path: &Path) -> Result<(), ProjectError> {
        if !path.exists() {
            warn!(path = %path.display(), "path does not exist");
            return Err(ProjectError::PathDoesNotExist);
        }
        match self.root_units.get(path) {
            Some(unit) if unit.principal() => {
                warn!(path = %path.display(), "cannot remove principal root unit");
                Err(ProjectError::RemovePrincipal)
            }
            Some(_) => {
                self.invalidate();
                self.root_units.remove(path);
                self.write_dotfile()
            }
            None => {
                warn!(path = %path.display(), "path is not a compilation root");
                Err(ProjectError::NotARoot)
            }
        }
    }

    // ---- ranks -----------------------------------------------------------

    pub fn set_fp_rank(&mut self, path: &Path, rank: i32) {
        self.fp_ranks.insert(path.to_path_buf(), rank);
    }

    pub fn get_fp_rank(&self, path: &Path) -> i32 {
        self.fp_ranks.get(path).copied().unwrap_or(9999)
    }

    // ---- queries ---------------------------------------------------------

    /// The buffered text of line `line` (0-based) of `path`, for completion
    /// prefix extraction. Only open editor buffers are consulted.
    pub fn get_text_from_file_loc(&self, path: &Path, line: u32) -> Option<String> {
        let unit = self.unit_for_path(path)?;
        let buffer = unit.get_file_contents(path)?;
        buffer.lines().nth(line as usize).map(str::to_string)
    }

    /// Module definitions with flattened ports and non-local parameters,
    /// for completion synthesis.
    pub fn get_modules(&mut self) -> Vec<ModuleDeclaration> {
        let compilation = match self.compile() {
            Ok(compilation) => compilation,
            Err(err) => {
                error!(%err, "failed to compile project");
                return Vec::new();
            }
        };
        let mut modules = Vec::new();
        for definition in compilation.definitions() {
            let mut declaration = ModuleDeclaration {
                name: definition.name.clone(),
                ports: definition.ports.clone(),
                parameters: Vec::new(),
            };
            for parameter in &definition.parameters {
                if parameter.local {
                    debug!(name = %parameter.name, "skipping local parameter");
                    continue;
                }
                if declaration
                    .parameters
                    .iter()
                    .any(|(name, _)| name == &parameter.name)
                {
                    continue;
                }
                declaration.parameters.push((
                    parameter.name.clone(),
                    extract_assigned_value(&parameter.declarator),
                ));
            }
            modules.push(declaration);
        }
        modules
    }

    /// Definition lookup at an editor position (0-based row and column).
    pub fn lookup(&mut self, path: &Path, row: u32, column: u32) -> Vec<Location> {
        info!(path = %path.display(), row, column, "looking up construct");
        let compilation = match self.compile() {
            Ok(compilation) => compilation,
            Err(err) => {
                error!(%err, "failed to compile project");
                return Vec::new();
            }
        };
        let mut index = LookupIndex::default();
        for tree in compilation.syntax_trees() {
            walk(tree, &mut index);
        }

        let Some((kind, name)) = index.find_at(
            path,
            row,
            column,
            &[
                ConstructKind::HierarchyInstantiation,
                ConstructKind::IncludeDirective,
            ],
        ) else {
            info!("construct not found");
            return Vec::new();
        };

        match kind {
            ConstructKind::IncludeDirective => {
                let mut locations = Vec::new();
                for unit in self.root_units.values() {
                    match unit.include_name_to_paths().get(&name) {
                        Some(paths) => {
                            for target in paths {
                                locations.push(Location {
                                    path: target.clone(),
                                    range: Range::default(),
                                });
                            }
                        }
                        None => warn!(%name, "include directive not found"),
                    }
                }
                locations
            }
            _ => {
                info!(%name, "construct found");
                index.find_by_name(&name, &[ConstructKind::ModuleDeclaration])
            }
        }
    }
}

/// The textual right-hand side of a declarator assignment: everything after
/// the first `=`, trimmed. `None` when there is no assignment.
pub fn extract_assigned_value(declarator: &str) -> Option<String> {
    let trimmed = declarator.trim_start();
    let (_, rhs) = trimmed.split_once('=')?;
    let value = rhs.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Quick textual test for an include directive, cheaper than the regex when
/// diffing buffers line by line.
fn has_include_statement(text: &str) -> bool {
    let Some(idx) = text.find("`include") else {
        return false;
    };
    let rest = &text[idx + "`include".len()..];
    let Some(quote) = rest.find('"') else {
        return false;
    };
    let rest = &rest[quote + 1..];
    let Some(dot) = rest.find('.') else {
        return false;
    };
    rest[dot + 1..].contains('"')
}

fn push_unique(paths: &mut Vec<PathBuf>, candidate: &Path) {
    if !paths.iter().any(|existing| existing == candidate) {
        paths.push(candidate.to_path_buf());
    }
}

/// Exclude every entry under `ancestor` that neither contains nor lies
/// inside `keep`; directories on the way down to `keep` recurse instead of
/// being excluded wholesale.
fn exclude_siblings(ancestor: &Path, keep: &Path, out: &mut Vec<PathBuf>) {
    if ancestor.is_file() {
        return;
    }
    let entries = match fs::read_dir(ancestor) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %ancestor.display(), %err, "failed to list directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let entry_path = entry.path();
        if is_path_part_of_path(keep, &entry_path) {
            if keep != entry_path {
                exclude_siblings(&entry_path, keep, out);
            }
        } else if !is_path_part_of_path(&entry_path, keep) {
            out.push(entry_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn project_with_files(files: &[(&str, &str)]) -> (tempfile::TempDir, Project) {
        let dir = tempdir().expect("tempdir");
        for (name, contents) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create dirs");
            }
            fs::write(path, contents).expect("write fixture");
        }
        let project = Project::create(dir.path()).expect("create project");
        (dir, project)
    }

    #[test]
    fn create_requires_an_existing_path() {
        assert!(Project::create(Path::new("/definitely/not/here")).is_err());
    }

    #[test]
    fn buffer_updates_promote_includes_without_rescan() {
        let (dir, mut project) = project_with_files(&[
            ("a.sv", "module a;\nendmodule\n"),
            ("b.sv", "module b;\nendmodule\n"),
        ]);
        let a = dir.path().join("a.sv");
        let b = dir.path().join("b.sv");
        assert_eq!(
            project
                .unit_for_path(&a)
                .expect("unit")
                .non_inlined_files()
                .len(),
            2
        );

        project.add_file(&a, "module a;\nendmodule\n");
        project.update_file_buffer(&a, "`include \"b.sv\"\nmodule a;\nendmodule\n");

        let unit = project.unit_for_path(&a).expect("unit");
        assert!(!unit.non_inlined_files().contains(&b));
        assert!(unit.inlined_files().contains(&b));
    }

    #[test]
    fn deleting_an_include_forces_reclassification() {
        let (dir, mut project) = project_with_files(&[
            ("a.sv", "`include \"b.sv\"\nmodule a;\nendmodule\n"),
            ("b.sv", "module b;\nendmodule\n"),
        ]);
        let a = dir.path().join("a.sv");
        let b = dir.path().join("b.sv");
        assert!(!project
            .unit_for_path(&a)
            .expect("unit")
            .non_inlined_files()
            .contains(&b));

        // Dropping the include from disk and from the buffer re-promotes b.
        fs::write(&a, "module a;\nendmodule\n").expect("rewrite");
        project.add_file(&a, "`include \"b.sv\"\nmodule a;\nendmodule\n");
        project.update_file_buffer(&a, "module a;\nendmodule\n");

        let unit = project.unit_for_path(&a).expect("unit");
        assert!(unit.non_inlined_files().contains(&b));
    }

    #[test]
    fn exclude_resource_drops_redundant_descendants() {
        let (dir, mut project) = project_with_files(&[
            ("rtl/a.sv", "module a;\nendmodule\n"),
            ("rtl/sub/b.sv", "module b;\nendmodule\n"),
        ]);
        let sub = dir.path().join("rtl/sub");
        let rtl = dir.path().join("rtl");
        project.exclude_resource(&sub).expect("exclude sub");
        assert!(project.is_resource_excluded(&sub));

        project.exclude_resource(&rtl).expect("exclude rtl");
        assert!(project.is_resource_excluded(&rtl));
        assert!(!project.excluded_paths().contains(&sub));
        assert_eq!(project.excluded_paths().len(), 1);
    }

    #[test]
    fn excluding_outside_the_project_is_rejected() {
        let (_dir, mut project) = project_with_files(&[]);
        let outside = tempdir().expect("tempdir");
        assert!(matches!(
            project.exclude_resource(outside.path()),
            Err(ProjectError::OutsideProject)
        ));
    }

    #[test]
    fn root_unit_registration_is_validated() {
        let (dir, mut project) = project_with_files(&[("top.sv", "module top;\nendmodule\n")]);
        let inside = dir.path().join("top.sv");
        assert!(matches!(
            project.add_root_unit(&inside),
            Err(ProjectError::AlreadyWithinRoot)
        ));

        let other = tempdir().expect("tempdir");
        fs::write(other.path().join("dep.sv"), "module dep;\nendmodule\n").expect("write");
        project.add_root_unit(other.path()).expect("add root unit");
        assert_eq!(project.root_units().count(), 2);

        assert!(matches!(
            project.remove_root_unit(dir.path()),
            Err(ProjectError::RemovePrincipal)
        ));
        project.remove_root_unit(other.path()).expect("remove");
        assert_eq!(project.root_units().count(), 1);
    }

    #[test]
    fn fp_ranks_default_to_lowest_priority() {
        let (dir, mut project) = project_with_files(&[("a.sv", "module a;\nendmodule\n")]);
        let a = dir.path().join("a.sv");
        assert_eq!(project.get_fp_rank(&a), 9999);
        project.set_fp_rank(&a, 3);
        assert_eq!(project.get_fp_rank(&a), 3);
    }

    #[test]
    fn completion_line_text_comes_from_buffers_only() {
        let (dir, mut project) = project_with_files(&[("a.sv", "module a;\nendmodule\n")]);
        let a = dir.path().join("a.sv");
        assert!(project.get_text_from_file_loc(&a, 0).is_none());
        project.add_file(&a, "module a;\n  FIF\nendmodule\n");
        assert_eq!(
            project.get_text_from_file_loc(&a, 1).as_deref(),
            Some("  FIF")
        );
    }

    #[test]
    fn assigned_values_are_extracted_from_declarators() {
        assert_eq!(extract_assigned_value("WIDTH = 8").as_deref(), Some("8"));
        assert_eq!(
            extract_assigned_value("T = logic [7:0]").as_deref(),
            Some("logic [7:0]")
        );
        assert_eq!(extract_assigned_value("WIDTH"), None);
    }

    #[test]
    fn warning_registry_caps_and_repeats_sticky_entries() {
        let (_dir, mut project) = project_with_files(&[]);
        project.register_warning("plain warning");
        project.register_warning(WARNING_EXCEEDS_MAX_FILE_COUNT);
        let first = project.take_unsent_warnings();
        assert_eq!(first.len(), 2);

        // The plain warning is acknowledged; the sticky one re-registers.
        assert!(project.take_unsent_warnings().is_empty());
        project.register_warning(WARNING_EXCEEDS_MAX_FILE_COUNT);
        assert_eq!(project.take_unsent_warnings().len(), 1);
    }

    #[test]
    fn publish_plan_clears_previous_files() {
        let (dir, mut project) = project_with_files(&[]);
        let a = dir.path().join("a.sv");
        let b = dir.path().join("b.sv");
        let diag = |path: &Path| Diagnostic {
            path: path.to_path_buf(),
            message: "boom".to_string(),
            severity: Severity::Error,
            range: Range::default(),
            name: "DuplicateDefinition".to_string(),
        };

        let round_one = project.plan_publishes(vec![diag(&a), diag(&b)]);
        assert_eq!(round_one.len(), 2);

        let round_two = project.plan_publishes(vec![diag(&b)]);
        assert_eq!(round_two.get(&a).map(Vec::len), Some(0));
        assert_eq!(round_two.get(&b).map(Vec::len), Some(1));

        let round_three = project.plan_publishes(Vec::new());
        assert_eq!(round_three.get(&b).map(Vec::len), Some(0));
        assert!(!round_three.contains_key(&a));
    }

    #[test]
    fn diagnostic_names_for_line_deduplicates() {
        let (dir, mut project) = project_with_files(&[]);
        let a = dir.path().join("a.sv");
        let mut diag = Diagnostic {
            path: a.clone(),
            message: "boom".to_string(),
            severity: Severity::Error,
            range: Range::new(Position::new(4, 0), Position::new(4, 0)),
            name: "UnknownDirective".to_string(),
        };
        let duplicate = diag.clone();
        diag.message = "boom again".to_string();
        project.plan_publishes(vec![diag, duplicate]);
        assert_eq!(
            project.diagnostic_names_for_line(&a, 4),
            vec!["UnknownDirective"]
        );
        assert!(project.diagnostic_names_for_line(&a, 5).is_empty());
    }
}
