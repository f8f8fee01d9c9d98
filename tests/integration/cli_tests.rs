//! Integration tests for the command-line interface
//!
//! These run the compiled binary against on-disk project fixtures and
//! assert on output text, file side effects and exit codes.

mod common;

use assert_cmd::Command;
use common::{class_referencing, ProjectFixture};
use predicates::prelude::*;

fn depscan() -> Command {
    Command::cargo_bin("depscan").expect("binary built")
}

/// A project with one used and one unused declared dependency.
fn mixed_project() -> ProjectFixture {
    let fixture = ProjectFixture::new();
    fixture.write_jar("libs/used.jar", &["com.used.Api"]);
    fixture.write_jar("libs/idle.jar", &["com.idle.Never"]);
    fixture.write_config(
        r#"
        [[dependencies]]
        group = "org.used"
        artifact = "used"
        version = "1.0"
        path = "libs/used.jar"

        [[dependencies]]
        group = "org.idle"
        artifact = "idle"
        version = "2.0"
        path = "libs/idle.jar"
        "#,
    );
    fixture.write_main_class(
        "com.app.Main",
        &class_referencing("com.app.Main", &["com.used.Api"]),
    );
    fixture
}

/// A project whose single dependency is used.
fn clean_project() -> ProjectFixture {
    let fixture = ProjectFixture::new();
    fixture.write_jar("libs/used.jar", &["com.used.Api"]);
    fixture.write_config(
        r#"
        [[dependencies]]
        group = "org.used"
        artifact = "used"
        version = "1.0"
        path = "libs/used.jar"
        "#,
    );
    fixture.write_main_class(
        "com.app.Main",
        &class_referencing("com.app.Main", &["com.used.Api"]),
    );
    fixture
}

// ============================================================================
// Basic Invocation Tests
// ============================================================================

#[test]
fn help_lists_the_main_flags() {
    depscan()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--fail-on-warning"))
        .stdout(predicate::str::contains("--exclude"))
        .stdout(predicate::str::contains("--force-used"));
}

#[test]
fn version_is_printed() {
    depscan()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("depscan"));
}

#[test]
fn completions_generate_without_a_project() {
    depscan()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("depscan"));
}

// ============================================================================
// Terminal Report Tests
// ============================================================================

#[test]
fn clean_project_reports_no_warnings() {
    let fixture = clean_project();
    depscan()
        .arg(fixture.root())
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("No dependency warnings found!"))
        .stdout(predicate::str::contains(
            "Used declared dependencies found:",
        ))
        .stdout(predicate::str::contains("org.used:used:jar:1.0:compile"));
}

#[test]
fn unused_dependency_is_reported_with_coordinates() {
    let fixture = mixed_project();
    depscan()
        .arg(fixture.root())
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Unused declared dependencies found:",
        ))
        .stdout(predicate::str::contains("org.idle:idle:jar:2.0:compile"))
        .stdout(predicate::str::contains(
            "1 used declared, 0 used undeclared, 1 unused declared, 0 non-test scoped",
        ));
}

#[test]
fn show_usages_prints_the_referencing_classes() {
    let fixture = clean_project();
    depscan()
        .arg(fixture.root())
        .args(["-q", "--show-usages"])
        .assert()
        .success()
        .stdout(predicate::str::contains("com.used.Api (used by com.app.Main)"));
}

#[test]
fn exclude_flag_narrows_the_scan() {
    let fixture = clean_project();
    depscan()
        .arg(fixture.root())
        .args(["-q", "--exclude", r"com\.used\..*"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Unused declared dependencies found:",
        ));
}

#[test]
fn force_used_flag_clears_an_unused_warning() {
    let fixture = mixed_project();
    depscan()
        .arg(fixture.root())
        .args(["-q", "--force-used", "org.idle:idle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No dependency warnings found!"))
        .stdout(predicate::str::contains(
            "2 used declared, 0 used undeclared, 0 unused declared, 0 non-test scoped",
        ));
}

// ============================================================================
// Exit Code Tests
// ============================================================================

#[test]
fn fail_on_warning_exits_nonzero() {
    let fixture = mixed_project();
    depscan()
        .arg(fixture.root())
        .args(["-q", "--fail-on-warning"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("dependency warnings"));
}

#[test]
fn fail_on_warning_passes_a_clean_project() {
    let fixture = clean_project();
    depscan()
        .arg(fixture.root())
        .args(["-q", "--fail-on-warning"])
        .assert()
        .success();
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn json_format_is_machine_readable() {
    let fixture = mixed_project();
    let output = depscan()
        .arg(fixture.root())
        .args(["-q", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(report["summary"]["used_declared"], 1);
    assert_eq!(report["summary"]["unused_declared"], 1);
    assert_eq!(report["unused_declared"][0]["artifact"], "idle");
}

#[test]
fn json_report_writes_to_a_file() {
    let fixture = mixed_project();
    let report_path = fixture.root().join("report.json");
    depscan()
        .arg(fixture.root())
        .args(["--format", "json", "--output"])
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let raw = std::fs::read_to_string(&report_path).expect("report file exists");
    let report: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(report["summary"]["used_declared"], 1);
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[test]
fn broken_config_is_a_clean_error() {
    let fixture = ProjectFixture::new();
    fixture.write_config("[[dependencies]]\ngroup = ");
    depscan()
        .arg(fixture.root())
        .arg("-q")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unable to parse config file"));
}

#[test]
fn invalid_exclusion_pattern_is_a_clean_error() {
    let fixture = clean_project();
    depscan()
        .arg(fixture.root())
        .args(["-q", "--exclude", "("])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid exclusion pattern"));
}
