//! End-to-end scenarios over real project trees on disk: classification,
//! diagnostics, exclusion semantics, and definition lookup through the full
//! project model.

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use crate::lsp::completion::build_completions;
use crate::project::types::Severity;
use crate::project::Project;

fn write_file(root: &Path, name: &str, contents: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dirs");
    }
    fs::write(path, contents).expect("write fixture");
}

#[test]
fn include_only_file_is_not_a_top_unit() {
    let dir = tempdir().expect("tempdir");
    write_file(dir.path(), "a.sv", "`include \"b.sv\"\n");
    write_file(dir.path(), "b.sv", "module m;\nendmodule\n");

    let mut project = Project::create(dir.path()).expect("create project");
    let unit = project.unit_for_path(&dir.path().join("a.sv")).expect("unit");
    assert_eq!(unit.non_inlined_files(), [dir.path().join("a.sv")]);
    assert!(unit.inlined_files().contains(&dir.path().join("b.sv")));

    let errors: Vec<_> = project
        .find_diagnostics()
        .into_iter()
        .filter(|diag| diag.severity == Severity::Error)
        .collect();
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

#[test]
fn missing_include_reports_both_errors() {
    let dir = tempdir().expect("tempdir");
    write_file(
        dir.path(),
        "x.sv",
        "`include \"missing.sv\"\n\nmodule x;\n  initial $display(`missing);\nendmodule\n",
    );

    let mut project = Project::create(dir.path()).expect("create project");
    let diagnostics = project.find_diagnostics();
    let messages: Vec<String> = diagnostics
        .iter()
        .filter(|diag| diag.severity == Severity::Error)
        .map(|diag| diag.message.to_lowercase())
        .collect();
    assert!(
        messages
            .iter()
            .any(|m| m.contains("'missing.sv': no such file or directory")),
        "missing include error not found in {messages:?}"
    );
    assert!(
        messages
            .iter()
            .any(|m| m.contains("unknown macro or compiler directive '`missing'")),
        "unknown directive error not found in {messages:?}"
    );
}

#[test]
fn duplicate_module_definitions_are_reported() {
    let dir = tempdir().expect("tempdir");
    write_file(dir.path(), "foo1.sv", "module foo;\nendmodule\n");
    write_file(dir.path(), "foo2.sv", "module foo;\nendmodule\n");

    let mut project = Project::create(dir.path()).expect("create project");
    let diagnostics = project.find_diagnostics();
    assert!(
        diagnostics
            .iter()
            .any(|diag| diag.name.contains("DuplicateDefinition")),
        "expected a duplicate-definition diagnostic, got {diagnostics:?}"
    );
}

#[test]
fn excluded_paths_silence_their_diagnostics() {
    let dir = tempdir().expect("tempdir");
    write_file(dir.path(), "foo1.sv", "module foo;\nendmodule\n");
    write_file(dir.path(), "foo2.sv", "module foo;\nendmodule\n");
    write_file(dir.path(), ".hdl-project", r#"{"excludePaths": ["foo1.sv"]}"#);

    let mut project = Project::create(dir.path()).expect("create project");
    let diagnostics = project.find_diagnostics();
    assert!(
        !diagnostics
            .iter()
            .any(|diag| diag.name.contains("DuplicateDefinition")),
        "exclusion should remove the duplicate: {diagnostics:?}"
    );
}

#[test]
fn project_suppressions_filter_by_code_name() {
    let dir = tempdir().expect("tempdir");
    write_file(dir.path(), "foo1.sv", "module foo;\nendmodule\n");
    write_file(dir.path(), "foo2.sv", "module foo;\nendmodule\n");
    write_file(
        dir.path(),
        ".hdl-project",
        r#"{"projectSuppressions": ["DuplicateDefinition"]}"#,
    );

    let mut project = Project::create(dir.path()).expect("create project");
    let diagnostics = project.find_diagnostics();
    assert!(
        !diagnostics
            .iter()
            .any(|diag| diag.name.contains("DuplicateDefinition")),
        "suppression should drop the duplicate: {diagnostics:?}"
    );
}

#[test]
fn line_suppression_comments_drop_matching_diagnostics() {
    let dir = tempdir().expect("tempdir");
    write_file(dir.path(), "foo1.sv", "module foo;\nendmodule\n");
    write_file(
        dir.path(),
        "foo2.sv",
        "module foo; // hdl lint_off DuplicateDefinition\nendmodule\n",
    );

    let mut project = Project::create(dir.path()).expect("create project");
    let diagnostics = project.find_diagnostics();
    assert!(
        !diagnostics
            .iter()
            .any(|diag| diag.name.contains("DuplicateDefinition")),
        "line suppression should drop the duplicate: {diagnostics:?}"
    );
}

#[test]
fn include_resource_carves_a_path_out_of_an_excluded_ancestor() {
    let dir = tempdir().expect("tempdir");
    write_file(dir.path(), "foo1/lame/a.sv", "module a;\nendmodule\n");
    write_file(dir.path(), "foo1/ok/b.sv", "module b;\nendmodule\n");
    write_file(dir.path(), "foo1/dumb/c.sv", "module c;\nendmodule\n");
    write_file(dir.path(), "foo2/d.sv", "module d;\nendmodule\n");

    let mut project = Project::create(dir.path()).expect("create project");
    project
        .exclude_resource(dir.path())
        .expect("exclude the whole root");
    assert!(project.is_resource_excluded(&dir.path().join("foo1/lame")));

    project
        .include_resource(&dir.path().join("foo1/lame"))
        .expect("include foo1/lame");

    assert!(!project.is_resource_excluded(&dir.path().join("foo1/lame")));
    assert!(!project.is_resource_excluded(&dir.path().join("foo1")));
    assert!(!project.is_resource_excluded(dir.path()));
    assert!(project.is_resource_excluded(&dir.path().join("foo1/ok")));
    assert!(project.is_resource_excluded(&dir.path().join("foo1/dumb")));
    assert!(project.is_resource_excluded(&dir.path().join("foo2")));
}

#[test]
fn exclude_resource_leaves_no_separate_descendants() {
    let dir = tempdir().expect("tempdir");
    write_file(dir.path(), "rtl/core/a.sv", "module a;\nendmodule\n");
    write_file(dir.path(), "rtl/io/b.sv", "module b;\nendmodule\n");

    let mut project = Project::create(dir.path()).expect("create project");
    project
        .exclude_resource(&dir.path().join("rtl/core"))
        .expect("exclude core");
    project
        .exclude_resource(&dir.path().join("rtl"))
        .expect("exclude rtl");

    assert_eq!(project.excluded_paths().len(), 1);
    assert!(project.is_resource_excluded(&dir.path().join("rtl/core")));
    assert!(project.is_resource_excluded(&dir.path().join("rtl/io/b.sv")));
}

#[test]
fn definition_lookup_resolves_across_files() {
    let dir = tempdir().expect("tempdir");
    write_file(
        dir.path(),
        "top.sv",
        "module top;\n  FIFO fifo_inst (.clk(clk));\nendmodule\n",
    );
    write_file(dir.path(), "fifo.sv", "module FIFO;\nendmodule\n");

    let mut project = Project::create(dir.path()).expect("create project");
    // Line 2, column 3 in the editor's 0-based coordinates lands on `FIFO`.
    let locations = project.lookup(&dir.path().join("top.sv"), 1, 2);
    assert!(
        locations
            .iter()
            .any(|loc| loc.path == dir.path().join("fifo.sv")),
        "expected a location in fifo.sv, got {locations:?}"
    );
}

#[test]
fn include_directive_lookup_resolves_the_target_file() {
    let dir = tempdir().expect("tempdir");
    write_file(
        dir.path(),
        "top.sv",
        "`include \"util.sv\"\nmodule top;\nendmodule\n",
    );
    write_file(dir.path(), "util.sv", "module util;\nendmodule\n");

    let mut project = Project::create(dir.path()).expect("create project");
    // The directive spans line 1; the point sits inside it.
    let locations = project.lookup(&dir.path().join("top.sv"), 0, 4);
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].path, dir.path().join("util.sv"));
    assert_eq!(locations[0].range.start.line, 0);
    assert_eq!(locations[0].range.start.character, 0);
}

#[test]
fn defining_a_macro_clears_unknown_directive_errors() {
    let dir = tempdir().expect("tempdir");
    write_file(
        dir.path(),
        "main.sv",
        "module main;\n  initial $display(`FOO);\nendmodule\n",
    );

    let mut project = Project::create(dir.path()).expect("create project");
    assert!(!project.find_diagnostics().is_empty());

    project
        .set_macros(&[("FOO".to_string(), "1".to_string())])
        .expect("set macros");
    assert!(project.find_diagnostics().is_empty());

    project.set_macros(&[]).expect("clear macros");
    assert!(!project.find_diagnostics().is_empty());
}

#[test]
fn non_principal_root_units_are_not_linted() {
    let dir = tempdir().expect("tempdir");
    write_file(dir.path(), "top.sv", "module top;\nendmodule\n");
    let dep = tempdir().expect("dep tempdir");
    write_file(
        dep.path(),
        "dep.sv",
        "module dep;\n  initial $display(`UNDEFINED);\nendmodule\n",
    );

    let mut project = Project::create(dir.path()).expect("create project");
    project.add_root_unit(dep.path()).expect("add root unit");

    let diagnostics = project.find_diagnostics();
    assert!(
        diagnostics
            .iter()
            .all(|diag| !diag.path.starts_with(dep.path())),
        "dependency-only units must not be linted: {diagnostics:?}"
    );
}

#[test]
fn dotfile_round_trips_through_mutations() {
    let dir = tempdir().expect("tempdir");
    write_file(dir.path(), "top.sv", "module top;\nendmodule\n");
    write_file(dir.path(), "vendor/ip.sv", "module ip;\nendmodule\n");

    let mut project = Project::create(dir.path()).expect("create project");
    project
        .exclude_resource(&dir.path().join("vendor"))
        .expect("exclude vendor");
    project
        .set_macros(&[("WIDTH".to_string(), "8".to_string())])
        .expect("set macros");

    // A fresh project built from the same directory sees the persisted state.
    let reloaded = Project::create(dir.path()).expect("reload project");
    assert!(reloaded.is_resource_excluded(&dir.path().join("vendor")));
    assert_eq!(reloaded.defines(), ["WIDTH=8"]);
}

#[test]
fn completions_merge_snippets_and_modules_by_prefix() {
    let dir = tempdir().expect("tempdir");
    write_file(
        dir.path(),
        "fifo.sv",
        "module FIFO #(parameter WIDTH = 8) (input logic clk, output logic full);\nendmodule\n",
    );
    write_file(dir.path(), "top.sv", "module top;\nendmodule\n");

    let mut project = Project::create(dir.path()).expect("create project");
    let list = build_completions(&mut project, "  FIF", 1, 5);
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].label, "FIFO");

    let list = build_completions(&mut project, "  always", 4, 8);
    let labels: Vec<&str> = list.items.iter().map(|item| item.label.as_str()).collect();
    assert!(labels.contains(&"always"));
    assert!(labels.contains(&"always_ff"));
    assert!(labels.contains(&"always_comb"));
    assert!(!labels.contains(&"FIFO"));
}

#[test]
fn publish_rounds_match_the_files_with_diagnostics() {
    let dir = tempdir().expect("tempdir");
    write_file(dir.path(), "foo1.sv", "module foo;\nendmodule\n");
    write_file(dir.path(), "foo2.sv", "module foo;\nendmodule\n");

    let mut project = Project::create(dir.path()).expect("create project");
    let diagnostics = project.find_diagnostics();
    let first = project.plan_publishes(diagnostics);
    assert!(first.values().any(|diags| !diags.is_empty()));

    // Renaming the colliding module makes the next round clear the file.
    project.add_file(&dir.path().join("foo2.sv"), "module bar;\nendmodule\n");
    let diagnostics = project.find_diagnostics();
    let second = project.plan_publishes(diagnostics);
    let cleared: Vec<_> = second
        .iter()
        .filter(|(_, diags)| diags.is_empty())
        .collect();
    assert!(!cleared.is_empty(), "expected at least one cleared file");
}
