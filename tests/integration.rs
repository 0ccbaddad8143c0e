use predicates::prelude::*;
use pydox::{parse_source, Diagnostic, EntityKind, ScanOptions, SourceUnit, Visibility};
use serde_json::Value;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_pydox")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn fixture(name: &str) -> SourceUnit {
    let text = std::fs::read_to_string(fixture_path(name)).unwrap();
    let unit_name = name.trim_end_matches(".py");
    parse_source(unit_name, &text, &ScanOptions::default())
}

// -- doxy comment syntax --

#[test]
fn doxy_module_documentation() {
    let unit = fixture("py_doxy.py");
    let module = unit.module();
    assert_eq!(module.name(), "py_doxy");
    let doc = module.doc().unwrap();
    assert_eq!(doc.brief, "Documentation for package using doxy comment syntax.");
    assert_eq!(doc.details, "More details (doxy-1).");
    assert!(unit.diagnostics().is_empty());
    assert!(unit.orphans().is_empty());
}

#[test]
fn doxy_top_level_entities() {
    let unit = fixture("py_doxy.py");
    let top: Vec<(&str, EntityKind)> = unit.entities().iter().map(|e| (e.name(), e.kind())).collect();
    assert_eq!(top, [("func", EntityKind::Function), ("PyClass", EntityKind::Class)]);

    let func = &unit.entities()[0];
    assert_eq!(func.brief(), Some("Documentation for a function."));
    assert_eq!(func.doc().unwrap().details, "More details (doxy-2).");
}

#[test]
fn doxy_class_children_and_member() {
    let unit = fixture("py_doxy.py");
    let class = unit.find("PyClass").unwrap();
    assert_eq!(class.brief(), Some("Brief documentation for a python class."));

    let children: Vec<(&str, EntityKind, Option<&str>)> = class
        .children()
        .iter()
        .map(|e| (e.name(), e.kind(), e.brief()))
        .collect();
    assert_eq!(
        children,
        [
            ("__init__", EntityKind::Constructor, Some("Constructor documentation.")),
            ("PyMethod", EntityKind::Method, Some("Documentation for a method.")),
            ("classVar", EntityKind::ClassVariable, Some("A class variable.")),
        ]
    );

    let param = class.children()[1].doc().unwrap().tag("param").unwrap();
    assert_eq!(param.target.as_deref(), Some("self"));
    assert_eq!(param.text, "The object pointer.");

    assert_eq!(class.members().len(), 1);
    let member = &class.members()[0];
    assert_eq!(member.name(), "_memVar");
    assert_eq!(member.kind(), EntityKind::InstanceMember);
    assert_eq!(member.visibility(), Visibility::Protected);
    assert_eq!(member.brief(), Some("a member variable"));
}

// -- docstring syntax --

#[test]
fn docstring_module_and_function() {
    let unit = fixture("py_docstring.py");
    assert_eq!(unit.name(), "py_docstring");
    assert_eq!(unit.module().name(), "py_docString");
    assert_eq!(
        unit.module().brief(),
        Some("Documentation for package using docString comment syntax.")
    );
    assert_eq!(unit.find("func").unwrap().brief(), Some("Documentation for a function."));
    assert_eq!(
        unit.find("func").unwrap().doc().unwrap().details,
        "More details (docString-2)."
    );
    assert!(unit.diagnostics().is_empty());
}

#[test]
fn docstring_class_members() {
    let unit = fixture("py_docstring.py");
    assert_eq!(unit.find("PyClass").unwrap().brief(), Some("Documentation for a class."));
    assert_eq!(
        unit.find("PyClass.__init__").unwrap().brief(),
        Some("The constructor documentation.")
    );
    assert_eq!(
        unit.find("PyClass.PyMethod").unwrap().brief(),
        Some("Documentation for a method.")
    );
    let member = unit.find("PyClass._memVar").unwrap();
    assert_eq!(member.kind(), EntityKind::InstanceMember);
    assert!(member.doc().is_none());
}

// -- properties --

#[test]
fn parsing_is_idempotent() {
    for name in ["py_doxy.py", "py_docstring.py", "orphan_var.py", "malformed.py"] {
        assert_eq!(fixture(name), fixture(name), "{}", name);
    }
}

#[test]
fn top_level_count_matches_module_declarations() {
    for name in ["py_doxy.py", "py_docstring.py", "malformed.py", "dedented_comment.py"] {
        let text = std::fs::read_to_string(fixture_path(name)).unwrap();
        let declared = text
            .lines()
            .filter(|l| l.starts_with("def ") || l.starts_with("class "))
            .count();
        assert_eq!(fixture(name).entities().len(), declared, "{}", name);
    }
}

#[test]
fn dedented_comment_stays_in_class_body() {
    let unit = fixture("dedented_comment.py");
    let top: Vec<&str> = unit.entities().iter().map(|e| e.name()).collect();
    assert_eq!(top, ["Shape", "describe"]);

    let area = unit.find("Shape.area").unwrap();
    assert_eq!(area.kind(), EntityKind::Method);
    assert_eq!(area.brief(), Some("Documentation for area."));
    assert_eq!(unit.find("Shape.cached").unwrap().kind(), EntityKind::InstanceMember);
    assert_eq!(unit.find("describe").unwrap().brief(), Some("Module-level helper."));
    assert!(unit.diagnostics().is_empty());
}

#[test]
fn class_variable_and_member_with_same_name() {
    let input = "\
class Counter:
    def __init__(self):
        self.count = 0

    ## Shared default.
    count = 5
";
    let unit = parse_source("m", input, &ScanOptions::default());
    let class = unit.find("Counter").unwrap();
    let children: Vec<(&str, EntityKind)> = class.children().iter().map(|e| (e.name(), e.kind())).collect();
    assert_eq!(
        children,
        [("__init__", EntityKind::Constructor), ("count", EntityKind::ClassVariable)]
    );
    assert_eq!(class.children()[1].brief(), Some("Shared default."));
    assert_eq!(class.members()[0].kind(), EntityKind::InstanceMember);
    assert!(class.members()[0].doc().is_none());
}

#[test]
fn verbatim_docstrings_flag() {
    let input = std::fs::read_to_string(fixture_path("py_docstring.py")).unwrap();
    cmd()
        .args(["--verbatim-docstrings", "--name", "py_docstring"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "module py_docstring: @package py_docString Documentation for package using docString comment syntax.\n",
        ));
}

#[test]
fn license_only_file_is_empty() {
    let unit = fixture("license_only.py");
    assert!(unit.entities().is_empty());
    assert_eq!(unit.documented_count(), 0);
    assert!(unit.orphans().is_empty());
    assert!(unit.diagnostics().is_empty());
}

#[test]
fn missing_var_target_is_one_orphan() {
    let unit = fixture("orphan_var.py");
    assert_eq!(
        unit.diagnostics(),
        [Diagnostic::OrphanedDocBlock {
            line: 8,
            target: Some("missing".to_string())
        }]
    );
    assert_eq!(unit.orphans().len(), 1);

    let class = unit.find("Counter").unwrap();
    assert_eq!(class.children().len(), 1);
    assert_eq!(class.members().len(), 1);
    assert!(class.members()[0].doc().is_none());
}

#[test]
fn malformed_region_keeps_earlier_documentation() {
    let unit = fixture("malformed.py");
    assert_eq!(unit.find("ok").unwrap().brief(), Some("Documentation for a function."));
    assert!(unit.find("broken").unwrap().doc().is_none());
    assert!(matches!(
        unit.diagnostics(),
        [Diagnostic::MalformedBlock { line: 6, .. }]
    ));
}

#[test]
fn brief_is_first_paragraph_without_markers() {
    let cases = [
        "## Single line.\ndef f():\n    pass\n",
        "def f():\n    \"\"\"Single line.\"\"\"\n",
        "def f():\n    '''\n    Single line.\n\n    Details follow.\n    '''\n",
        "##   Single line.   \n#\n#  Details.\ndef f():\n    pass\n",
    ];
    for input in cases {
        let unit = parse_source("m", input, &ScanOptions::default());
        assert_eq!(unit.find("f").unwrap().brief(), Some("Single line."), "{:?}", input);
    }
}

// -- stdin mode --

#[test]
fn stdin_mode_outline() {
    let input = std::fs::read_to_string(fixture_path("py_doxy.py")).unwrap();
    cmd()
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "module py_doxy: Documentation for package using doxy comment syntax.\n",
        ))
        .stdout(predicate::str::contains(
            "    member _memVar: a member variable\n",
        ));
}

#[test]
fn stdin_mode_json() {
    let input = std::fs::read_to_string(fixture_path("py_docstring.py")).unwrap();
    let assert = cmd()
        .args(["-f", "json", "--name", "py_docstring"])
        .write_stdin(input)
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["name"], "py_docstring");
    assert_eq!(value["module"]["name"], "py_docString");
    assert_eq!(value["module"]["children"][1]["kind"], "class");
    assert_eq!(value["module"]["doc"]["style"], "docstring_literal");
}

#[test]
fn keep_license_documents_module() {
    let input = std::fs::read_to_string(fixture_path("license_only.py")).unwrap();
    cmd()
        .write_stdin(input.clone())
        .assert()
        .success()
        .stdout("module stdin\n");

    // Not followed by a declaration, so it is still not attached
    cmd()
        .arg("--keep-license")
        .write_stdin(input)
        .assert()
        .success()
        .stdout("module stdin\n");
}

// -- file mode --

#[test]
fn file_mode_creates_output() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap(), "-f", "json"])
        .arg(fixture_path("py_doxy.py"))
        .arg(fixture_path("py_docstring.py"))
        .assert()
        .success();

    let doxy: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("py_doxy.json")).unwrap())
            .unwrap();
    assert_eq!(doxy["module"]["children"][1]["name"], "PyClass");
    assert!(dir.path().join("py_docstring.json").exists());
}

#[test]
fn file_mode_directory_input() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(format!("{}/tests/fixtures", env!("CARGO_MANIFEST_DIR")))
        .assert()
        .success();

    for name in ["py_doxy", "py_docstring", "license_only", "orphan_var", "malformed", "dedented_comment"] {
        assert!(dir.path().join(format!("{}.txt", name)).exists(), "{}", name);
    }
}

#[test]
fn file_mode_prints_without_output_dir() {
    cmd()
        .arg(fixture_path("orphan_var.py"))
        .assert()
        .success()
        .stdout(predicate::str::contains("class Counter: A counter.\n"))
        .stdout(predicate::str::contains("\norphans:\n  line 8: documents a member that does not exist\n"))
        .stderr(predicate::str::contains("no entity named `missing`"));
}

#[test]
fn no_matching_files_warns() {
    cmd()
        .arg("/nonexistent/*.py")
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("no files matched"));
}

// -- errors --

#[test]
fn invalid_format_fails() {
    cmd()
        .args(["-f", "xml"])
        .write_stdin("def f():\n    pass\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format: xml"));
}

#[test]
fn deny_diagnostics_fails_on_orphans() {
    cmd()
        .arg("--deny-diagnostics")
        .arg(fixture_path("orphan_var.py"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 diagnostic(s) reported"));

    cmd()
        .arg("--deny-diagnostics")
        .arg(fixture_path("py_doxy.py"))
        .assert()
        .success();
}
