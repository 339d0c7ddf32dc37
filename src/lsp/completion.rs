//! Completion synthesis: the static snippet table filtered by prefix, plus
//! module-instantiation snippets generated from the current compilation.

use tower_lsp_server::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionItemLabelDetails, CompletionList,
    CompletionTextEdit, InsertTextFormat, Position, Range, TextEdit,
};
use tracing::debug;

use crate::project::types::ModuleDeclaration;
use crate::project::Project;

use super::snippets::STATIC_SNIPPETS;

/// Build the completion list for a request at `(line, character)`. The
/// prefix is the cursor line's text trimmed of surrounding whitespace.
pub fn build_completions(
    project: &mut Project,
    line_text: &str,
    line: u32,
    character: u32,
) -> CompletionList {
    let prefix = line_text.trim();
    let edit_range = Range {
        start: Position::new(line, character.saturating_sub(prefix.len() as u32)),
        end: Position::new(line, character),
    };

    let mut items = Vec::new();
    for snippet in STATIC_SNIPPETS {
        if !snippet.label.starts_with(prefix) {
            continue;
        }
        debug!(label = snippet.label, "considering static completion");
        items.push(CompletionItem {
            label: snippet.label.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            insert_text_format: Some(InsertTextFormat::SNIPPET),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range: edit_range,
                new_text: snippet.body.to_string(),
            })),
            label_details: Some(CompletionItemLabelDetails {
                detail: Some(format!(" - {}", snippet.description)),
                description: None,
            }),
            ..Default::default()
        });
    }

    for module in project.get_modules() {
        if !module.name.starts_with(prefix) {
            continue;
        }
        debug!(name = %module.name, "considering module completion");
        items.push(CompletionItem {
            label: module.name.clone(),
            kind: Some(CompletionItemKind::MODULE),
            insert_text_format: Some(InsertTextFormat::SNIPPET),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range: edit_range,
                new_text: module_instantiation_snippet(&module),
            })),
            label_details: Some(CompletionItemLabelDetails {
                detail: Some(" - Module instantiation".to_string()),
                description: None,
            }),
            ..Default::default()
        });
    }

    CompletionList {
        is_incomplete: false,
        items,
    }
}

/// Multi-line instantiation snippet: optional parameter list, instance name,
/// then the port list. Placeholder indices are strictly increasing from 1
/// with no gaps.
pub fn module_instantiation_snippet(module: &ModuleDeclaration) -> String {
    let mut index = 1usize;
    let mut text = module.name.clone();

    if !module.parameters.is_empty() {
        text.push_str(" #(\n");
        for (i, (name, default)) in module.parameters.iter().enumerate() {
            let default = default.as_deref().unwrap_or("");
            text.push_str(&format!("  .{name}(${{{index}:{default}}})"));
            index += 1;
            text.push_str(if i + 1 != module.parameters.len() {
                ",\n"
            } else {
                "\n"
            });
        }
        text.push_str(") ");
    } else {
        text.push(' ');
    }

    text.push_str(&format!("${{{index}:instance_name}} (\n"));
    index += 1;

    for (i, port) in module.ports.iter().enumerate() {
        text.push_str(&format!("  .{port}(${{{index}:{port}}})"));
        index += 1;
        text.push_str(if i + 1 != module.ports.len() { ",\n" } else { "\n" });
    }

    text.push_str(");\n$0");
    text
}
