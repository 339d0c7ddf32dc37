//! Construct index for definition lookup.
//!
//! A post-compilation pass over the frontend's syntax trees that records
//! module declarations, hierarchy instantiations, and include directives by
//! kind, file, name, and range. Coordinates are converted to 0-based editor
//! positions at insert time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::compiler::{
    IncludeSyntax, InstantiationSyntax, ModuleSyntax, SourceRange, SyntaxVisitor,
};

use super::types::{Location, Position, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructKind {
    ModuleDeclaration,
    HierarchyInstantiation,
    IncludeDirective,
}

type NamedLocations = Vec<(String, Location)>;

#[derive(Default)]
pub struct LookupIndex {
    constructs: HashMap<ConstructKind, HashMap<PathBuf, NamedLocations>>,
}

impl LookupIndex {
    fn record(&mut self, kind: ConstructKind, path: &Path, name: String, range: Range) {
        self.constructs
            .entry(kind)
            .or_default()
            .entry(path.to_path_buf())
            .or_default()
            .push((
                name,
                Location {
                    path: path.to_path_buf(),
                    range,
                },
            ));
    }

    /// Every location of a construct named `name` among the given kinds.
    pub fn find_by_name(&self, name: &str, kinds: &[ConstructKind]) -> Vec<Location> {
        let mut results = Vec::new();
        for kind in kinds {
            let Some(by_path) = self.constructs.get(kind) else {
                continue;
            };
            for entries in by_path.values() {
                for (entry_name, location) in entries {
                    if entry_name == name {
                        results.push(location.clone());
                    }
                }
            }
        }
        results
    }

    /// The first construct of one of `kinds` whose range contains the point.
    /// Only single-line ranges participate; multi-line constructs are not
    /// supported here.
    pub fn find_at(
        &self,
        path: &Path,
        row: u32,
        column: u32,
        kinds: &[ConstructKind],
    ) -> Option<(ConstructKind, String)> {
        for kind in kinds {
            let Some(by_path) = self.constructs.get(kind) else {
                continue;
            };
            let Some(entries) = by_path.get(path) else {
                continue;
            };
            for (name, location) in entries {
                let range = &location.range;
                if row == range.start.line
                    && row == range.end.line
                    && column >= range.start.character
                    && column <= range.end.character
                {
                    return Some((*kind, name.clone()));
                }
            }
        }
        None
    }
}

impl SyntaxVisitor for LookupIndex {
    fn visit_module(&mut self, module: &ModuleSyntax) {
        self.record(
            ConstructKind::ModuleDeclaration,
            &module.path,
            module.name.clone(),
            to_editor_range(module.range),
        );
    }

    fn visit_instantiation(&mut self, inst: &InstantiationSyntax) {
        self.record(
            ConstructKind::HierarchyInstantiation,
            &inst.path,
            inst.type_name.clone(),
            to_editor_range(inst.range),
        );
    }

    fn visit_include(&mut self, include: &IncludeSyntax) {
        let name = include.file_name.trim_matches('"').to_string();
        self.record(
            ConstructKind::IncludeDirective,
            &include.path,
            name,
            to_editor_range(include.range),
        );
    }
}

fn to_editor_range(range: SourceRange) -> Range {
    Range::new(
        Position::new(
            range.start.line.saturating_sub(1) as u32,
            range.start.column.saturating_sub(1) as u32,
        ),
        Position::new(
            range.end.line.saturating_sub(1) as u32,
            range.end.column.saturating_sub(1) as u32,
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::SourcePos;

    fn instantiation(path: &str, line: usize, col: usize, name: &str) -> InstantiationSyntax {
        InstantiationSyntax {
            type_name: name.to_string(),
            path: PathBuf::from(path),
            range: SourceRange {
                start: SourcePos { line, column: col },
                end: SourcePos {
                    line,
                    column: col + name.len(),
                },
            },
        }
    }

    #[test]
    fn point_lookup_hits_the_type_token_only() {
        let mut index = LookupIndex::default();
        index.visit_instantiation(&instantiation("/p/top.sv", 3, 3, "FIFO"));

        let kinds = [ConstructKind::HierarchyInstantiation];
        // 1-based (3,3) becomes 0-based (2,2); the token spans columns 2..=6.
        assert!(index.find_at(Path::new("/p/top.sv"), 2, 2, &kinds).is_some());
        assert!(index.find_at(Path::new("/p/top.sv"), 2, 6, &kinds).is_some());
        assert!(index.find_at(Path::new("/p/top.sv"), 2, 7, &kinds).is_none());
        assert!(index.find_at(Path::new("/p/top.sv"), 1, 3, &kinds).is_none());
        assert!(index
            .find_at(Path::new("/p/other.sv"), 2, 3, &kinds)
            .is_none());
    }

    #[test]
    fn name_lookup_spans_files() {
        let mut index = LookupIndex::default();
        let module = ModuleSyntax {
            name: "FIFO".to_string(),
            path: PathBuf::from("/p/fifo.sv"),
            range: SourceRange {
                start: SourcePos { line: 1, column: 1 },
                end: SourcePos { line: 2, column: 9 },
            },
            parameters: Vec::new(),
            ports: Vec::new(),
        };
        index.visit_module(&module);
        index.visit_instantiation(&instantiation("/p/top.sv", 3, 3, "FIFO"));

        let hits = index.find_by_name("FIFO", &[ConstructKind::ModuleDeclaration]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, PathBuf::from("/p/fifo.sv"));
        assert_eq!(hits[0].range.start, Position::new(0, 0));

        assert!(index
            .find_by_name("FIFO", &[ConstructKind::IncludeDirective])
            .is_empty());
    }

    #[test]
    fn kind_order_controls_priority() {
        let mut index = LookupIndex::default();
        index.visit_include(&IncludeSyntax {
            file_name: "defs.svh".to_string(),
            path: PathBuf::from("/p/top.sv"),
            range: SourceRange {
                start: SourcePos { line: 1, column: 1 },
                end: SourcePos {
                    line: 1,
                    column: 20,
                },
            },
        });
        let hit = index
            .find_at(
                Path::new("/p/top.sv"),
                0,
                4,
                &[
                    ConstructKind::HierarchyInstantiation,
                    ConstructKind::IncludeDirective,
                ],
            )
            .expect("hit");
        assert_eq!(hit.0, ConstructKind::IncludeDirective);
        assert_eq!(hit.1, "defs.svh");
    }
}
