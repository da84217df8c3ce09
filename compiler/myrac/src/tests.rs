use crate::{Compiler, DriverError};
use myra_diagnostic::ErrorCode;
use std::fs;
use std::path::{Path, PathBuf};

fn write_project(root: &Path, files: &[(&str, &str)]) -> PathBuf {
    let src = root.join("src");
    fs::create_dir_all(&src).expect("mkdir src");
    for (name, contents) in files {
        fs::write(src.join(name), contents).expect("write source");
    }
    src.join(files[0].0)
}

#[test]
fn test_hello_project_builds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = write_project(
        dir.path(),
        &[
            (
                "Hello.myra",
                "module exe Hello;\nimport Console;\nbegin Console.PrintLn('Hi'); end.",
            ),
            (
                "Console.myra",
                "module lib Console;\nroutine PrintLn(s: STRING);\nbegin\nend;\nend.",
            ),
        ],
    );

    let mut compiler = Compiler::new();
    let summary = compiler.compile(&entry).expect("build succeeds");
    assert_eq!(compiler.diagnostics().len(), 0);

    let generated = dir.path().join("generated");
    let main_cpp = fs::read_to_string(generated.join("Hello.cpp")).expect("Hello.cpp");
    assert!(main_cpp.contains("int main(int argc, char* argv[])"));
    assert!(main_cpp.contains("Console::PrintLn(\"Hi\")"));
    assert!(generated.join("Hello.h").is_file());
    assert!(generated.join("Console.h").is_file());
    assert!(generated.join("Console.cpp").is_file());
    assert_eq!(summary.generated.len(), 4);
}

#[test]
fn test_import_cycle_short_circuits() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = write_project(
        dir.path(),
        &[
            (
                "A.myra",
                "module lib A;\nimport B;\nroutine FA(): INTEGER;\nbegin return 1; end;\nend.",
            ),
            (
                "B.myra",
                "module lib B;\nimport A;\nroutine FB(): INTEGER;\nbegin return 2; end;\nend.",
            ),
        ],
    );

    let mut compiler = Compiler::new();
    let summary = compiler.compile(&entry).expect("build succeeds");
    // Each of A and B is emitted exactly once.
    let headers: Vec<_> = summary
        .generated
        .iter()
        .filter(|p| p.extension().is_some_and(|e| e == "h"))
        .collect();
    assert_eq!(headers.len(), 2);
}

#[test]
fn test_module_reached_twice_is_emitted_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = write_project(
        dir.path(),
        &[
            (
                "Main.myra",
                "module exe Main;\nimport A, B;\nbegin end.",
            ),
            ("A.myra", "module lib A;\nimport Shared;\nend."),
            ("B.myra", "module lib B;\nimport Shared;\nend."),
            ("Shared.myra", "module lib Shared;\nend."),
        ],
    );

    let mut compiler = Compiler::new();
    let summary = compiler.compile(&entry).expect("build succeeds");
    let shared_outputs = summary
        .generated
        .iter()
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with("Shared"))
        })
        .count();
    assert_eq!(shared_outputs, 2, "one header and one source for Shared");
}

#[test]
fn test_missing_import_reports_e300() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = write_project(
        dir.path(),
        &[("Main.myra", "module exe Main;\nimport Nowhere;\nbegin end.")],
    );

    let mut compiler = Compiler::new();
    let result = compiler.compile(&entry);
    assert!(matches!(result, Err(DriverError::BuildFailed { .. })));
    assert!(compiler
        .diagnostics()
        .iter()
        .any(|d| d.code == ErrorCode::E300));
    // No output files on a failed build.
    assert!(!dir.path().join("generated").join("Main.cpp").exists());
}

#[test]
fn test_missing_source_is_fatal_e001() {
    let mut compiler = Compiler::new();
    let result = compiler.compile(Path::new("/definitely/not/here/M.myra"));
    assert!(matches!(result, Err(DriverError::BuildFailed { .. })));
    assert!(compiler
        .diagnostics()
        .iter()
        .any(|d| d.code == ErrorCode::E001));
}

#[test]
fn test_check_mode_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = write_project(
        dir.path(),
        &[("Main.myra", "module exe Main;\nbegin end.")],
    );

    let mut compiler = Compiler::check_only();
    let summary = compiler.compile(&entry).expect("check succeeds");
    assert!(summary.generated.is_empty());
    assert!(!dir.path().join("generated").exists());
}

#[test]
fn test_semantic_error_blocks_emission() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = write_project(
        dir.path(),
        &[(
            "Main.myra",
            "module exe Main;\nvar S: STRING;\nbegin\n  S := 42;\nend.",
        )],
    );

    let mut compiler = Compiler::new();
    let result = compiler.compile(&entry);
    assert!(matches!(result, Err(DriverError::BuildFailed { .. })));
    assert!(!dir.path().join("generated").join("Main.cpp").exists());
}

#[test]
fn test_breakpoints_sidecar_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = write_project(
        dir.path(),
        &[(
            "Main.myra",
            "module exe Main;\nvar X: INTEGER;\nbegin\n  #breakpoint\n  X := 1;\nend.",
        )],
    );

    let mut compiler = Compiler::new();
    compiler.compile(&entry).expect("build succeeds");
    let sidecar = dir.path().join("generated").join("Main.breakpoints.json");
    let json = fs::read_to_string(&sidecar).expect("sidecar written");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["version"], "1.0");
    assert_eq!(value["breakpoints"][0]["line"], 4);
}

#[test]
fn test_diagnostic_rendering_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = write_project(
        dir.path(),
        &[(
            "Main.myra",
            "module exe Main;\nvar S: STRING;\nbegin\n  S := 42;\nend.",
        )],
    );

    let mut compiler = Compiler::new();
    let _ = compiler.compile(&entry);
    let mut out = Vec::new();
    crate::render_report(compiler.diagnostics(), &mut out);
    let report = String::from_utf8(out).expect("utf8");
    assert!(report.contains("error E203:"), "report: {report}");
    assert!(report.contains("(4,"), "line/column rendered: {report}");
    assert!(report.contains("error(s)"));
}
