// ==============================================================================
// CLI Integration Tests: Exercise the `openapi-typegen` Binary via Subprocess
// ==============================================================================
//
// These tests run the compiled binary as a subprocess using `assert_cmd`,
// verifying exit codes, stdout/stderr content, and output file creation. They
// complement the library-level tests in `integration.rs` by testing the CLI
// surface (argument parsing, file I/O, error reporting).

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

const PETSTORE: &str = "tests/fixtures/petstore/openapi.yaml";

/// Helper to construct a `Command` for the binary built by this crate.
#[allow(deprecated)] // cargo_bin() warns about custom build-dir; acceptable here
fn typegen_cmd() -> Command {
    Command::cargo_bin("openapi-typegen").expect("openapi-typegen binary should be built by cargo")
}

#[test]
fn test_cli_stdout() {
    typegen_cmd()
        .arg(PETSTORE)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("export type Id = string;\n\nexport type NewPet = {"))
        .stdout(predicate::str::contains("  kind: 'cat' | 'dog';\n"))
        .stdout(predicate::str::ends_with("  tags?: string[];\n};\n"));
}

#[test]
fn test_cli_explicit_stdout_dash() {
    typegen_cmd()
        .args([PETSTORE, "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export type Owner = {"));
}

/// Write named-enum output to a file and check the enum declarations come
/// first, separated from the types by blank lines.
#[test]
fn test_cli_use_enums_to_file() {
    let out_dir = PathBuf::from("tmp/cli-test-use-enums");
    fs::create_dir_all(&out_dir).expect("create test output directory");
    let out_path = out_dir.join("types.ts");

    typegen_cmd()
        .args([
            "--use-enums",
            PETSTORE,
            out_path.to_str().expect("valid UTF-8 path"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = fs::read_to_string(&out_path).expect("read output file");
    assert!(
        content.starts_with("export enum OwnerStatus {\n  ACTIVE = 'active',\n  BANNED = 'banned',\n}\n\nexport enum Kind {"),
        "{content}"
    );
    assert!(content.contains("  status?: PetStatus;\n"), "{content}");
    assert!(content.ends_with("};\n"), "{content}");
}

#[test]
fn test_cli_namespace() {
    typegen_cmd()
        .args(["--namespace", "Api", PETSTORE])
        .assert()
        .success()
        .stdout(predicate::str::contains("  owner?: Api.Owner;\n"));
}

#[test]
fn test_cli_used_names() {
    typegen_cmd()
        .args(["--use-enums", "--used-names", PETSTORE])
        .assert()
        .success()
        .stdout("Id\nKind\nOwner\nOwnerStatus\nPet\nPetStatus\n");
}

#[test]
fn test_cli_nonexistent_file() {
    typegen_cmd()
        .arg("nonexistent.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent.yaml"));
}

#[test]
fn test_cli_inconsistent_document() {
    typegen_cmd()
        .arg("tests/fixtures/broken/openapi.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("are not described: id"));
}

#[test]
fn test_cli_help() {
    typegen_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--use-enums"));
}

#[test]
fn test_cli_missing_input() {
    typegen_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing INPUT"));
}

#[test]
fn test_cli_unknown_flag() {
    typegen_cmd()
        .args(["--bogus", PETSTORE])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bogus"));
}
