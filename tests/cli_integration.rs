//! CLI integration tests for fixproj
//!
//! These tests run the binary against project files in temporary
//! directories and check both the rewritten file and the reported changes.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command instance for the fixproj binary
fn fixproj_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("fixproj"));
    // Keep the user's global configuration out of the tests
    cmd.env("FIXPROJ_CONFIG", Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/empty.toml"));
    cmd
}

const MESSY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <RootNamespace>App</RootNamespace>
    <AssemblyName>App</AssemblyName>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="B.cs" />
    <Compile Include="A.cs" />
    <Compile Include="A.cs" />
    <Compile Include="C.cs" />
  </ItemGroup>
  <ItemGroup>
    <Reference Include="System" />
  </ItemGroup>
  <ItemGroup>
    <Compile Include="Models\User.cs" />
  </ItemGroup>
</Project>
"#;

/// Create a project directory with MESSY and every file except C.cs
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("App.csproj"), MESSY).unwrap();
    fs::write(dir.path().join("A.cs"), "").unwrap();
    fs::write(dir.path().join("B.cs"), "").unwrap();
    fs::create_dir_all(dir.path().join("Models")).unwrap();
    fs::write(dir.path().join("Models/User.cs"), "").unwrap();
    dir
}

fn compile_includes(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.trim().strip_prefix("<Compile Include=\""))
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Fixing
// =============================================================================

#[test]
fn test_fix_rewrites_project_file() {
    let dir = setup_project();

    fixproj_cmd()
        .arg(dir.path().join("App.csproj"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Fixed"));

    let fixed = fs::read_to_string(dir.path().join("App.csproj")).unwrap();
    assert_eq!(
        compile_includes(&fixed),
        vec!["A.cs", "B.cs", r"Models\User.cs"]
    );
    assert_eq!(fixed.matches("<ItemGroup>").count(), 2);
    assert!(fixed.contains(r#"<Reference Include="System"/>"#));

    // Properties are sorted by name
    let assembly = fixed.find("<AssemblyName>").unwrap();
    let root_ns = fixed.find("<RootNamespace>").unwrap();
    assert!(assembly < root_ns);
}

#[test]
fn test_fix_accepts_directory() {
    let dir = setup_project();

    fixproj_cmd()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("App.csproj"));
}

#[test]
fn test_fix_is_idempotent() {
    let dir = setup_project();
    let path = dir.path().join("App.csproj");

    fixproj_cmd().arg(&path).assert().success();
    let once = fs::read_to_string(&path).unwrap();

    fixproj_cmd()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes needed"));
    assert_eq!(fs::read_to_string(&path).unwrap(), once);
}

#[test]
fn test_verbose_lists_changes() {
    let dir = setup_project();

    fixproj_cmd()
        .arg(dir.path().join("App.csproj"))
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed duplicate Compile item: A.cs"))
        .stdout(predicate::str::contains(
            "Removed reference to missing file (Compile): C.cs",
        ))
        .stdout(predicate::str::contains("Merged 2 item groups containing Compile items"))
        .stderr(predicate::str::contains("[verbose"));
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn test_dry_run_leaves_file_alone() {
    let dir = setup_project();
    let path = dir.path().join("App.csproj");

    fixproj_cmd()
        .arg(&path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Would fix"))
        .stdout(predicate::str::contains("C.cs"));

    assert_eq!(fs::read_to_string(&path).unwrap(), MESSY);
}

#[test]
fn test_stdout_prints_document() {
    let dir = setup_project();
    let path = dir.path().join("App.csproj");

    fixproj_cmd()
        .arg(&path)
        .arg("--stdout")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<?xml"))
        .stdout(predicate::str::contains("<Compile Include=\"A.cs\"/>"));

    assert_eq!(fs::read_to_string(&path).unwrap(), MESSY);
}

#[test]
fn test_keep_flags_disable_pruning() {
    let dir = setup_project();
    let path = dir.path().join("App.csproj");

    fixproj_cmd()
        .arg(&path)
        .args(["--keep-missing", "--keep-duplicates", "--no-sort"])
        .assert()
        .success();

    let fixed = fs::read_to_string(&path).unwrap();
    assert_eq!(
        compile_includes(&fixed),
        vec!["B.cs", "A.cs", "A.cs", "C.cs", r"Models\User.cs"]
    );
}

#[test]
fn test_backup_keeps_original() {
    let dir = setup_project();

    fixproj_cmd()
        .arg(dir.path().join("App.csproj"))
        .arg("--backup")
        .assert()
        .success();

    let backups: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".bak"))
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(backups[0].path()).unwrap(), MESSY);
}

#[test]
fn test_json_output() {
    let dir = setup_project();

    let output = fixproj_cmd()
        .arg(dir.path().join("App.csproj"))
        .args(["--format", "json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["written"], true);
    let kinds: Vec<_> = json["changes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["kind"].as_str().unwrap().to_string())
        .collect();
    assert!(kinds.contains(&"duplicate_removed".to_string()));
    assert!(kinds.contains(&"missing_file_removed".to_string()));
}

#[test]
fn test_project_config_is_honored() {
    let dir = setup_project();
    fs::write(dir.path().join(".fixproj.toml"), "delete_missing = false\n").unwrap();
    let path = dir.path().join("App.csproj");

    fixproj_cmd().arg(&path).assert().success();

    let fixed = fs::read_to_string(&path).unwrap();
    assert!(compile_includes(&fixed).contains(&"C.cs".to_string()));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_missing_path_fails() {
    let dir = TempDir::new().unwrap();

    fixproj_cmd()
        .arg(dir.path().join("Nope.csproj"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_directory_without_project_fails() {
    let dir = TempDir::new().unwrap();

    fixproj_cmd()
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No project file found"));
}

#[test]
fn test_malformed_xml_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Broken.csproj");
    fs::write(&path, "<Project><ItemGroup></Project>").unwrap();

    fixproj_cmd()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse project file"));

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "<Project><ItemGroup></Project>"
    );
}
