//! Line-oriented syntax scan over Verilog/SystemVerilog sources.
//!
//! This is deliberately a heuristic pass, not a full parser: it tracks
//! preprocessor directives, ANSI-style module headers, hierarchy
//! instantiations, and suppression comments — the constructs the server
//! needs for diagnostics, completion, and definition lookup. Multi-line
//! instantiations and non-ANSI headers are out of scope.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::diag::{Diag, DiagCode, SuppressionDirective};
use super::source::SourceManager;

const MAX_INCLUDE_DEPTH: usize = 32;

static INCLUDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*`include\s+"([^"]+)"\s*$"#).expect("include regex"));
static DEFINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^`define\s+([A-Za-z_][A-Za-z0-9_$]*)\s*(.*)$").expect("define regex"));
static MACRO_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([A-Za-z_][A-Za-z0-9_$]*)").expect("macro ref regex"));
static INSTANTIATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\s*)([A-Za-z_][A-Za-z0-9_$]*)\s*(?:#\s*\([^)]*\)\s*)?[A-Za-z_][A-Za-z0-9_$]*\s*\(",
    )
    .expect("instantiation regex")
});
static LINT_OFF_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//\s*hdl\s+lint_off_file\s+([A-Za-z]+)").expect("lint_off_file regex"));
static LINT_OFF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//\s*hdl\s+lint_off\s+([A-Za-z]+)").expect("lint_off regex"));

/// Directives the preprocessor pass understands or deliberately ignores.
/// Anything else reached through a backtick must be a defined macro.
const KNOWN_DIRECTIVES: &[&str] = &[
    "include",
    "define",
    "undef",
    "undefineall",
    "ifdef",
    "ifndef",
    "elsif",
    "else",
    "endif",
    "timescale",
    "default_nettype",
    "resetall",
    "pragma",
    "celldefine",
    "endcelldefine",
    "begin_keywords",
    "end_keywords",
    "line",
    "__FILE__",
    "__LINE__",
];

/// Keywords that can never be an instantiated module type.
static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "module", "endmodule", "macromodule", "primitive", "endprimitive", "program",
        "endprogram", "interface", "endinterface", "package", "endpackage", "class", "endclass",
        "function", "endfunction", "task", "endtask", "begin", "end", "generate", "endgenerate",
        "genvar", "if", "else", "for", "while", "repeat", "forever", "foreach", "case", "casex",
        "casez", "endcase", "default", "assign", "deassign", "force", "release", "initial",
        "always", "always_comb", "always_ff", "always_latch", "final", "wire", "reg", "logic",
        "bit", "byte", "int", "integer", "shortint", "longint", "time", "real", "realtime",
        "shortreal", "signed", "unsigned", "input", "output", "inout", "ref", "parameter",
        "localparam", "specparam", "typedef", "struct", "enum", "union", "const", "var",
        "static", "automatic", "string", "event", "chandle", "import", "export", "modport",
        "clocking", "endclocking", "property", "endproperty", "sequence", "endsequence",
        "assert", "assume", "cover", "restrict", "expect", "bind", "alias", "posedge",
        "negedge", "edge", "wait", "disable", "fork", "join", "join_any", "join_none", "return",
        "break", "continue", "unique", "priority", "supply0", "supply1", "tri", "triand",
        "trior", "tri0", "tri1", "trireg", "wand", "wor", "uwire", "timeunit", "timeprecision",
        "defparam", "extern", "virtual", "pure", "protected", "local", "new", "this", "super",
        "null", "void", "and", "or", "nand", "nor", "xor", "xnor", "not", "buf", "bufif0",
        "bufif1", "notif0", "notif1", "pulldown", "pullup",
    ]
    .into_iter()
    .collect()
});

/// 1-based source position, matching the frontend's native coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub start: SourcePos,
    pub end: SourcePos,
}

#[derive(Debug, Clone)]
pub struct ParameterSyntax {
    pub name: String,
    /// Raw declarator text, `NAME` or `NAME = <expr>`, as spelled in source.
    pub declarator: String,
    pub local: bool,
    pub type_param: bool,
}

#[derive(Debug, Clone)]
pub struct ModuleSyntax {
    pub name: String,
    pub path: PathBuf,
    pub range: SourceRange,
    pub parameters: Vec<ParameterSyntax>,
    pub ports: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InstantiationSyntax {
    /// Name of the instantiated module type; the range covers the type token
    /// only, not the instance name or argument list.
    pub type_name: String,
    pub path: PathBuf,
    pub range: SourceRange,
}

#[derive(Debug, Clone)]
pub struct IncludeSyntax {
    /// Included file name with the surrounding quotes stripped.
    pub file_name: String,
    pub path: PathBuf,
    pub range: SourceRange,
}

#[derive(Debug, Clone)]
pub enum SyntaxNode {
    Module(ModuleSyntax),
    Instantiation(InstantiationSyntax),
    Include(IncludeSyntax),
}

#[derive(Debug)]
pub struct SyntaxTree {
    pub path: PathBuf,
    pub nodes: Vec<SyntaxNode>,
}

/// Read-only pass over syntax trees. Implementers override the hooks they
/// care about; `walk` drives them over every node.
pub trait SyntaxVisitor {
    fn visit_module(&mut self, _module: &ModuleSyntax) {}
    fn visit_instantiation(&mut self, _inst: &InstantiationSyntax) {}
    fn visit_include(&mut self, _include: &IncludeSyntax) {}
}

pub fn walk<V: SyntaxVisitor>(tree: &SyntaxTree, visitor: &mut V) {
    for node in &tree.nodes {
        match node {
            SyntaxNode::Module(m) => visitor.visit_module(m),
            SyntaxNode::Instantiation(i) => visitor.visit_instantiation(i),
            SyntaxNode::Include(inc) => visitor.visit_include(inc),
        }
    }
}

struct ConditionalFrame {
    active: bool,
    branch_taken: bool,
}

struct OpenModule {
    syntax: ModuleSyntax,
}

struct PendingHeader {
    start: SourcePos,
    text: String,
}

#[derive(Default)]
struct FileState {
    in_block_comment: bool,
    conditionals: Vec<ConditionalFrame>,
    open_modules: Vec<OpenModule>,
    pending_header: Option<PendingHeader>,
}

pub(super) struct Scanner<'a> {
    pub sources: &'a mut SourceManager,
    pub include_dirs: &'a [PathBuf],
    pub macros: &'a mut BTreeMap<String, String>,
    pub diags: &'a mut Vec<Diag>,
    pub line_suppressions: &'a mut Vec<SuppressionDirective>,
    pub file_suppressions: &'a mut Vec<SuppressionDirective>,
    /// Shared across the whole compilation so a file textually included from
    /// several places is only expanded once.
    pub visited: &'a mut HashSet<PathBuf>,
}

impl<'a> Scanner<'a> {
    pub fn scan_tree(&mut self, path: &Path) -> SyntaxTree {
        let mut nodes = Vec::new();
        self.scan_file(path, &mut nodes, 0);
        SyntaxTree {
            path: path.to_path_buf(),
            nodes,
        }
    }

    fn scan_file(&mut self, path: &Path, nodes: &mut Vec<SyntaxNode>, depth: usize) {
        if depth > MAX_INCLUDE_DEPTH || !self.visited.insert(path.to_path_buf()) {
            return;
        }
        let Some(text) = self.sources.get_text(path) else {
            return;
        };
        let mut state = FileState::default();
        let mut last_line = 0usize;
        let mut last_len = 0usize;
        for (idx, raw_line) in text.lines().enumerate() {
            last_line = idx + 1;
            last_len = raw_line.len();
            self.scan_line(path, raw_line, idx + 1, &mut state, nodes, depth);
        }
        // A module left open at end of file still yields a definition.
        while let Some(open) = state.open_modules.pop() {
            let mut syntax = open.syntax;
            syntax.range.end = SourcePos {
                line: last_line.max(syntax.range.start.line),
                column: last_len + 1,
            };
            nodes.push(SyntaxNode::Module(syntax));
        }
    }

    fn scan_line(
        &mut self,
        path: &Path,
        raw_line: &str,
        line_no: usize,
        state: &mut FileState,
        nodes: &mut Vec<SyntaxNode>,
        depth: usize,
    ) {
        if let Some(cap) = LINT_OFF_FILE_RE.captures(raw_line) {
            if let Some(code) = DiagCode::from_name(&cap[1]) {
                self.file_suppressions.push(SuppressionDirective {
                    path: path.to_path_buf(),
                    line: line_no,
                    code,
                });
            }
        } else if let Some(cap) = LINT_OFF_RE.captures(raw_line) {
            if let Some(code) = DiagCode::from_name(&cap[1]) {
                self.line_suppressions.push(SuppressionDirective {
                    path: path.to_path_buf(),
                    line: line_no,
                    code,
                });
            }
        }

        let code = strip_comments(raw_line, &mut state.in_block_comment);
        let trimmed = code.trim_start();
        let indent = code.len() - trimmed.len();

        if let Some(directive) = trimmed.strip_prefix('`') {
            let name: String = directive
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
                .collect();
            match name.as_str() {
                "ifdef" | "ifndef" => {
                    let defined = directive_operand(directive)
                        .map(|n| self.macros.contains_key(n))
                        .unwrap_or(false);
                    let active = if name == "ifdef" { defined } else { !defined };
                    state.conditionals.push(ConditionalFrame {
                        active,
                        branch_taken: active,
                    });
                    return;
                }
                "elsif" => {
                    let defined = directive_operand(directive)
                        .map(|n| self.macros.contains_key(n))
                        .unwrap_or(false);
                    match state.conditionals.last_mut() {
                        Some(frame) => {
                            frame.active = !frame.branch_taken && defined;
                            frame.branch_taken |= frame.active;
                        }
                        None => self.unbalanced(path, line_no, indent + 1),
                    }
                    return;
                }
                "else" => {
                    match state.conditionals.last_mut() {
                        Some(frame) => {
                            frame.active = !frame.branch_taken;
                            frame.branch_taken = true;
                        }
                        None => self.unbalanced(path, line_no, indent + 1),
                    }
                    return;
                }
                "endif" => {
                    if state.conditionals.pop().is_none() {
                        self.unbalanced(path, line_no, indent + 1);
                    }
                    return;
                }
                _ => {}
            }
        }

        if !state.conditionals.iter().all(|frame| frame.active) {
            return;
        }

        if let Some(directive) = trimmed.strip_prefix('`') {
            let name: String = directive
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
                .collect();
            match name.as_str() {
                "include" => {
                    let Some(cap) = INCLUDE_RE.captures(&code) else {
                        // Malformed include directive; ignored on purpose.
                        return;
                    };
                    let file_name = cap[1].to_string();
                    let start_col = indent + 1;
                    let end_col = code.trim_end().len();
                    nodes.push(SyntaxNode::Include(IncludeSyntax {
                        file_name: file_name.clone(),
                        path: path.to_path_buf(),
                        range: SourceRange {
                            start: SourcePos {
                                line: line_no,
                                column: start_col,
                            },
                            end: SourcePos {
                                line: line_no,
                                column: end_col.max(start_col),
                            },
                        },
                    }));
                    match self.resolve_include(path, &file_name) {
                        Some(resolved) => self.scan_file(&resolved, nodes, depth + 1),
                        None => self.diags.push(Diag::new(
                            path.to_path_buf(),
                            line_no,
                            start_col,
                            DiagCode::MissingInclude,
                            format!("'{file_name}': no such file or directory"),
                        )),
                    }
                    return;
                }
                "define" => {
                    if let Some(cap) = DEFINE_RE.captures(trimmed) {
                        let value = cap[2].trim();
                        self.macros.insert(
                            cap[1].to_string(),
                            if value.is_empty() {
                                "1".to_string()
                            } else {
                                value.to_string()
                            },
                        );
                    }
                    return;
                }
                "undef" => {
                    if let Some(operand) = directive_operand(directive) {
                        self.macros.remove(operand);
                    }
                    return;
                }
                "undefineall" => {
                    self.macros.clear();
                    return;
                }
                _ => {}
            }
        }

        self.check_macro_references(path, &blank_strings(&code), line_no);

        if let Some(mut pending) = state.pending_header.take() {
            pending.text.push(' ');
            pending.text.push_str(code.trim());
            if code.contains(';') {
                self.begin_module(path, pending, state);
            } else {
                state.pending_header = Some(pending);
            }
            return;
        }

        if let Some(rest) = module_keyword(trimmed) {
            let start = SourcePos {
                line: line_no,
                column: indent + 1,
            };
            let header = PendingHeader {
                start,
                text: format!("module {}", rest.trim()),
            };
            if code.contains(';') {
                self.begin_module(path, header, state);
            } else {
                state.pending_header = Some(header);
            }
            return;
        }

        if trimmed.starts_with("endmodule") {
            if let Some(open) = state.open_modules.pop() {
                let mut syntax = open.syntax;
                syntax.range.end = SourcePos {
                    line: line_no,
                    column: code.trim_end().len().max(1),
                };
                nodes.push(SyntaxNode::Module(syntax));
            }
            return;
        }

        if !state.open_modules.is_empty() {
            if let Some(cap) = INSTANTIATION_RE.captures(&code) {
                let type_name = &cap[2];
                if !KEYWORDS.contains(type_name) {
                    let start_col = cap[1].len() + 1;
                    nodes.push(SyntaxNode::Instantiation(InstantiationSyntax {
                        type_name: type_name.to_string(),
                        path: path.to_path_buf(),
                        range: SourceRange {
                            start: SourcePos {
                                line: line_no,
                                column: start_col,
                            },
                            end: SourcePos {
                                line: line_no,
                                column: start_col + type_name.len(),
                            },
                        },
                    }));
                }
            }
        }
    }

    fn begin_module(&mut self, path: &Path, header: PendingHeader, state: &mut FileState) {
        if let Some(syntax) = parse_module_header(path, &header) {
            state.open_modules.push(OpenModule { syntax });
        }
    }

    fn resolve_include(&mut self, from: &Path, file_name: &str) -> Option<PathBuf> {
        if let Some(parent) = from.parent() {
            let candidate = parent.join(file_name);
            if self.sources.exists(&candidate) {
                return Some(candidate);
            }
        }
        for dir in self.include_dirs {
            let candidate = dir.join(file_name);
            if self.sources.exists(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn check_macro_references(&mut self, path: &Path, code: &str, line_no: usize) {
        for cap in MACRO_REF_RE.captures_iter(code) {
            let name = &cap[1];
            if KNOWN_DIRECTIVES.contains(&name) || self.macros.contains_key(name) {
                continue;
            }
            let column = cap.get(0).map_or(1, |m| m.start() + 1);
            self.diags.push(Diag::new(
                path.to_path_buf(),
                line_no,
                column,
                DiagCode::UnknownDirective,
                format!("unknown macro or compiler directive '`{name}'"),
            ));
        }
    }

    fn unbalanced(&mut self, path: &Path, line_no: usize, column: usize) {
        self.diags.push(Diag::new(
            path.to_path_buf(),
            line_no,
            column,
            DiagCode::UnbalancedConditional,
            "unbalanced conditional compilation directive".to_string(),
        ));
    }
}

fn directive_operand(rest: &str) -> Option<&str> {
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_');
    let operand = rest.trim();
    let end = operand
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(operand.len());
    if end == 0 {
        None
    } else {
        Some(&operand[..end])
    }
}

fn module_keyword(trimmed: &str) -> Option<&str> {
    for keyword in ["macromodule", "module"] {
        if let Some(rest) = trimmed.strip_prefix(keyword) {
            if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace()) {
                return Some(rest);
            }
        }
    }
    None
}

/// Replace comments with spaces, preserving byte offsets so column positions
/// stay honest. String literals are kept verbatim.
fn strip_comments(line: &str, in_block_comment: &mut bool) -> String {
    let bytes = line.as_bytes();
    let mut out = vec![b' '; bytes.len()];
    let mut i = 0;
    let mut in_string = false;
    while i < bytes.len() {
        if *in_block_comment {
            if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                *in_block_comment = false;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }
        if in_string {
            out[i] = bytes[i];
            if bytes[i] == b'\\' && i + 1 < bytes.len() {
                out[i + 1] = bytes[i + 1];
                i += 2;
                continue;
            }
            if bytes[i] == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match bytes[i] {
            b'"' => {
                in_string = true;
                out[i] = b'"';
                i += 1;
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => break,
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                *in_block_comment = true;
                i += 2;
            }
            b => {
                out[i] = b;
                i += 1;
            }
        }
    }
    String::from_utf8(out).unwrap_or_default()
}

/// Blank out string literal contents; used before scanning for macro
/// references so text inside strings never reads as a directive.
fn blank_strings(code: &str) -> String {
    let bytes = code.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' && i + 1 < bytes.len() {
                out.push(b' ');
                out.push(b' ');
                i += 2;
                continue;
            }
            if b == b'"' {
                in_string = false;
                out.push(b'"');
            } else {
                out.push(b' ');
            }
        } else {
            if b == b'"' {
                in_string = true;
            }
            out.push(b);
        }
        i += 1;
    }
    String::from_utf8(out).unwrap_or_default()
}

fn parse_module_header(path: &Path, header: &PendingHeader) -> Option<ModuleSyntax> {
    let text = header.text.trim_end_matches(';').trim();
    let rest = text.strip_prefix("module").unwrap_or(text).trim_start();
    let name_end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(rest.len());
    if name_end == 0 {
        return None;
    }
    let name = rest[..name_end].to_string();
    let mut tail = rest[name_end..].trim_start();

    let mut parameters = Vec::new();
    if let Some(after_hash) = tail.strip_prefix('#') {
        let after_hash = after_hash.trim_start();
        if let Some((inner, remainder)) = balanced_parens(after_hash) {
            parameters = parse_parameter_list(inner);
            tail = remainder.trim_start();
        }
    }

    let mut ports = Vec::new();
    if let Some((inner, _)) = balanced_parens(tail) {
        ports = parse_port_list(inner);
    }

    Some(ModuleSyntax {
        name,
        path: path.to_path_buf(),
        range: SourceRange {
            start: header.start,
            end: header.start,
        },
        parameters,
        ports,
    })
}

/// Given text starting with `(`, return the contents of the balanced group
/// and the remainder after the closing paren.
fn balanced_parens(text: &str) -> Option<(&str, &str)> {
    if !text.starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[1..idx], &text[idx + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level_commas(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

fn parse_parameter_list(inner: &str) -> Vec<ParameterSyntax> {
    let mut params = Vec::new();
    let mut local = false;
    let mut type_param = false;
    for piece in split_top_level_commas(inner) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let mut body = piece;
        if let Some(rest) = body.strip_prefix("localparam") {
            local = true;
            type_param = false;
            body = rest.trim_start();
        } else if let Some(rest) = body.strip_prefix("parameter") {
            local = false;
            type_param = false;
            body = rest.trim_start();
        }
        if let Some(rest) = body.strip_prefix("type") {
            if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace()) {
                type_param = true;
                body = rest.trim_start();
            }
        }
        let (lhs, _) = match body.split_once('=') {
            Some((lhs, rhs)) => (lhs, Some(rhs)),
            None => (body, None),
        };
        let Some(name) = last_identifier(lhs) else {
            continue;
        };
        let name_pos = lhs.rfind(&name).unwrap_or(0);
        let declarator = body[name_pos..].trim().to_string();
        params.push(ParameterSyntax {
            name,
            declarator,
            local,
            type_param,
        });
    }
    params
}

fn parse_port_list(inner: &str) -> Vec<String> {
    let mut ports = Vec::new();
    for piece in split_top_level_commas(inner) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if let Some(name) = last_identifier(piece) {
            if !ports.contains(&name) {
                ports.push(name);
            }
        }
    }
    ports
}

/// Last identifier in `text` after dropping every `[...]` group, so packed
/// and unpacked dimensions never shadow the declared name.
fn last_identifier(text: &str) -> Option<String> {
    let mut cleaned = String::with_capacity(text.len());
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => cleaned.push(ch),
            _ => {}
        }
    }
    let mut last = None;
    let mut current = String::new();
    for ch in cleaned.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
            current.push(ch);
        } else {
            if !current.is_empty() && !current.starts_with(|c: char| c.is_ascii_digit()) {
                last = Some(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if !current.is_empty() && !current.starts_with(|c: char| c.is_ascii_digit()) {
        last = Some(current);
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_and_block_comments() {
        let mut in_block = false;
        let stripped = strip_comments("a /* b */ c // d", &mut in_block);
        assert_eq!(stripped.split_whitespace().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(stripped.len(), "a /* b */ c // d".len());
        assert!(!in_block);
        let stripped = strip_comments("x /* open", &mut in_block);
        assert!(stripped.starts_with('x'));
        assert!(in_block);
        let stripped = strip_comments("still closed */ y", &mut in_block);
        assert!(stripped.contains('y'));
        assert!(!in_block);
    }

    #[test]
    fn comments_inside_strings_are_kept() {
        let mut in_block = false;
        let stripped = strip_comments("$display(\"a // b\");", &mut in_block);
        assert!(stripped.contains("a // b"));
    }

    #[test]
    fn strings_do_not_leak_directives() {
        assert!(!blank_strings("$display(\"`FOO\");").contains('`'));
        assert!(blank_strings("x = `WIDTH; // code").contains("`WIDTH"));
    }

    #[test]
    fn parses_header_with_parameters_and_ports() {
        let header = PendingHeader {
            start: SourcePos { line: 1, column: 1 },
            text: "module fifo #(parameter int WIDTH = 8, DEPTH = 4, localparam L = 2) \
                   (input logic clk, input logic [WIDTH-1:0] din, output logic full);"
                .to_string(),
        };
        let module = parse_module_header(Path::new("/p/fifo.sv"), &header).expect("module");
        assert_eq!(module.name, "fifo");
        let names: Vec<_> = module.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["WIDTH", "DEPTH", "L"]);
        assert!(module.parameters[2].local);
        assert_eq!(module.parameters[0].declarator, "WIDTH = 8");
        assert_eq!(module.ports, vec!["clk", "din", "full"]);
    }

    #[test]
    fn port_names_survive_dimensions() {
        assert_eq!(
            last_identifier("output reg [7:0] data [0:3]"),
            Some("data".to_string())
        );
        assert_eq!(last_identifier("input wire clk"), Some("clk".to_string()));
        assert_eq!(last_identifier("[3:0]"), None);
    }
}
