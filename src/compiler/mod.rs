//! The bundled HDL frontend.
//!
//! The project model hands this module a consistent batch of target files
//! plus preprocessor options and gets back syntax trees, diagnostics, and
//! the suppression directives found in source comments. All coordinates are
//! 1-based on this side of the boundary.

mod diag;
mod source;
mod syntax;

pub use diag::{Diag, DiagCode, DiagSeverity, SuppressionDirective};
pub use source::SourceManager;
pub use syntax::{
    walk, IncludeSyntax, InstantiationSyntax, ModuleSyntax, ParameterSyntax, SourcePos,
    SourceRange, SyntaxNode, SyntaxTree, SyntaxVisitor,
};

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use syntax::Scanner;

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub include_dirs: Vec<PathBuf>,
    /// `NAME` or `NAME=VALUE` macro predefines; bare names default to `1`.
    pub predefines: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("No target files found for compilation")]
    NoTargetFiles,
}

pub struct Compilation {
    trees: Vec<SyntaxTree>,
    diagnostics: Vec<Diag>,
    line_suppressions: Vec<SuppressionDirective>,
    file_suppressions: Vec<SuppressionDirective>,
}

impl Compilation {
    /// Compile `targets` as one batch. Macro definitions propagate across
    /// files in submission order, and a file textually included from several
    /// places is expanded only once per batch.
    pub fn compile(
        options: CompileOptions,
        targets: &[PathBuf],
        sources: &mut SourceManager,
    ) -> Result<Self, CompileError> {
        if targets.is_empty() {
            return Err(CompileError::NoTargetFiles);
        }

        let mut macros: BTreeMap<String, String> = BTreeMap::new();
        for predefine in &options.predefines {
            match predefine.split_once('=') {
                Some((name, value)) => macros.insert(name.to_string(), value.to_string()),
                None => macros.insert(predefine.clone(), "1".to_string()),
            };
        }

        let mut diagnostics = Vec::new();
        let mut line_suppressions = Vec::new();
        let mut file_suppressions = Vec::new();
        let mut visited = HashSet::new();
        let mut trees = Vec::with_capacity(targets.len());

        for target in targets {
            if !sources.exists(target) {
                warn!(path = %target.display(), "target file has no source text");
            }
            let mut scanner = Scanner {
                sources,
                include_dirs: &options.include_dirs,
                macros: &mut macros,
                diags: &mut diagnostics,
                line_suppressions: &mut line_suppressions,
                file_suppressions: &mut file_suppressions,
                visited: &mut visited,
            };
            trees.push(scanner.scan_tree(target));
        }

        let mut compilation = Self {
            trees,
            diagnostics,
            line_suppressions,
            file_suppressions,
        };
        compilation.check_definitions();
        debug!(
            trees = compilation.trees.len(),
            diagnostics = compilation.diagnostics.len(),
            "compilation finished"
        );
        Ok(compilation)
    }

    /// Post-scan semantic checks: duplicate module definitions and
    /// instantiations of unknown modules.
    fn check_definitions(&mut self) {
        let mut defined: HashSet<String> = HashSet::new();
        for tree in &self.trees {
            for node in &tree.nodes {
                if let SyntaxNode::Module(module) = node {
                    if !defined.insert(module.name.clone()) {
                        self.diagnostics.push(Diag::new(
                            module.path.clone(),
                            module.range.start.line,
                            module.range.start.column,
                            DiagCode::DuplicateDefinition,
                            format!("duplicate definition of '{}'", module.name),
                        ));
                    }
                }
            }
        }
        for tree in &self.trees {
            for node in &tree.nodes {
                if let SyntaxNode::Instantiation(inst) = node {
                    if !defined.contains(&inst.type_name) {
                        self.diagnostics.push(Diag::new(
                            inst.path.clone(),
                            inst.range.start.line,
                            inst.range.start.column,
                            DiagCode::UnknownModule,
                            format!("unknown module '{}'", inst.type_name),
                        ));
                    }
                }
            }
        }
    }

    pub fn syntax_trees(&self) -> &[SyntaxTree] {
        &self.trees
    }

    pub fn all_diagnostics(&self) -> &[Diag] {
        &self.diagnostics
    }

    pub fn line_suppressions(&self) -> &[SuppressionDirective] {
        &self.line_suppressions
    }

    pub fn file_suppressions(&self) -> &[SuppressionDirective] {
        &self.file_suppressions
    }

    /// Every module definition across the batch, in scan order.
    pub fn definitions(&self) -> impl Iterator<Item = &ModuleSyntax> {
        self.trees.iter().flat_map(|tree| {
            tree.nodes.iter().filter_map(|node| match node {
                SyntaxNode::Module(module) => Some(module),
                _ => None,
            })
        })
    }
}
