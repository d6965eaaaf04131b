use std::fs;

use stdtasks::cargo::bump::{run_bump, run_temporary_bump, BumpOptions};
use stdtasks::cargo::{CargoManifest, CargoSettings};
use stdtasks::{Error, ErrorCode};
use tempfile::tempdir;
use toml::{Table, Value};

const WORKSPACE_ROOT: &str = r#"
[package]
name = "app"
version = "1.4.0"
edition = "2021"
description = "Demo application"
authors = ["Jane <jane@example.com>"]

[workspace]
members = ["crates/*"]
resolver = "2"

[workspace.package]
version = "1.4.0"
license = "MIT"

[dependencies]
core-lib = { path = "crates/core-lib" }
serde = { version = "1.0", features = ["derive"] }
log = "0.4"

[[bin]]
name = "app"
path = "src/main.rs"

[profile.release]
lto = true
"#;

fn parse(content: &str) -> Table {
    toml::from_str(content).unwrap()
}

fn registries() -> CargoSettings {
    let mut cargo = CargoSettings::default();
    cargo.add_registry("corp", "sparse+https://cargo.example.com/index/", None);
    cargo
}

#[test]
fn unmodified_save_preserves_every_section() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, WORKSPACE_ROOT).unwrap();

    let manifest = CargoManifest::read(&path).unwrap();
    let copy = dir.path().join("Copy.toml");
    manifest.save(Some(&copy)).unwrap();

    assert_eq!(parse(&fs::read_to_string(&copy).unwrap()), parse(WORKSPACE_ROOT));
}

#[test]
fn save_without_path_writes_back_to_source() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, WORKSPACE_ROOT).unwrap();

    let mut manifest = CargoManifest::read(&path).unwrap();
    manifest.package.as_mut().unwrap().version = Some("1.4.1".to_string());
    manifest.save(None).unwrap();

    let reread = CargoManifest::read(&path).unwrap();
    assert_eq!(reread.package.as_ref().unwrap().version.as_deref(), Some("1.4.1"));
    assert_eq!(reread.package.unwrap().unhandled.len(), 2);
    assert_eq!(reread.workspace.unwrap().members.as_deref(), Some(&["crates/*".to_string()][..]));
    assert!(!dir.path().join("Cargo.toml.tmp").exists());
}

#[test]
fn virtual_workspace_bump_is_a_no_op() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    let content = "[workspace]\nmembers = [\"a\"]\n";
    fs::write(&path, content).unwrap();

    let options = BumpOptions {
        manifest_path: path.clone(),
        version: "patch".parse().unwrap(),
        registry: Some("corp".to_string()),
    };
    let (outcome, ran) = run_temporary_bump(&options, &CargoSettings::default(), |_| Ok(true)).unwrap();

    assert!(ran);
    assert!(!outcome.bumped);
    assert!(outcome.version.is_none());
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn typed_sections_expose_recognized_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, WORKSPACE_ROOT).unwrap();

    let manifest = CargoManifest::read(&path).unwrap();
    let package = manifest.package.as_ref().unwrap();
    assert_eq!(package.name, "app");
    assert_eq!(package.version.as_deref(), Some("1.4.0"));
    assert!(package.unhandled.contains_key("description"));
    assert!(package.unhandled.contains_key("authors"));

    let workspace = manifest.workspace.as_ref().unwrap();
    assert_eq!(workspace.members.as_deref(), Some(&["crates/*".to_string()][..]));
    assert_eq!(workspace.package.as_ref().unwrap().version, "1.4.0");
    assert_eq!(manifest.bin.len(), 1);
    assert!(manifest.dependencies.as_ref().unwrap().get("log").is_some());
}

#[test]
fn bump_with_registry_pins_only_path_dependencies_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, WORKSPACE_ROOT).unwrap();

    let options = BumpOptions {
        manifest_path: path.clone(),
        version: "2.0.0".parse().unwrap(),
        registry: Some("corp".to_string()),
    };
    let outcome = run_bump(&options, &registries()).unwrap();
    assert_eq!(outcome.pinned_dependencies, vec!["core-lib".to_string()]);
    assert_eq!(outcome.previous_version.as_deref(), Some("1.4.0"));

    let written = parse(&fs::read_to_string(&path).unwrap());
    assert_eq!(written["package"]["version"].as_str(), Some("2.0.0"));
    assert_eq!(written["workspace"]["package"]["version"].as_str(), Some("2.0.0"));
    assert_eq!(written["workspace"]["members"].as_array().unwrap().len(), 1);

    let deps = written["dependencies"].as_table().unwrap();
    let core_lib = deps["core-lib"].as_table().unwrap();
    assert_eq!(core_lib["path"].as_str(), Some("crates/core-lib"));
    assert_eq!(core_lib["version"].as_str(), Some("2.0.0"));
    assert_eq!(core_lib["registry"].as_str(), Some("corp"));
    assert_eq!(deps["serde"]["version"].as_str(), Some("1.0"));
    assert!(deps["serde"].get("registry").is_none());
    assert_eq!(deps["log"], Value::String("0.4".to_string()));

    assert_eq!(written["profile"]["release"]["lto"].as_bool(), Some(true));
}

#[test]
fn minor_keyword_increments_current_version() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, WORKSPACE_ROOT).unwrap();

    let options = BumpOptions {
        manifest_path: path.clone(),
        version: "minor".parse().unwrap(),
        registry: None,
    };
    let outcome = run_bump(&options, &CargoSettings::default()).unwrap();

    assert_eq!(outcome.version.as_deref(), Some("1.5.0"));
    assert!(outcome.pinned_dependencies.is_empty());
    let written = parse(&fs::read_to_string(&path).unwrap());
    assert!(written["dependencies"]["core-lib"].get("version").is_none());
}

#[test]
fn temporary_bump_restores_original_bytes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, WORKSPACE_ROOT).unwrap();

    let options = BumpOptions {
        manifest_path: path.clone(),
        version: "9.9.9".parse().unwrap(),
        registry: Some("corp".to_string()),
    };
    let (outcome, seen) = run_temporary_bump(&options, &registries(), |_| {
        Ok(fs::read_to_string(&path).unwrap())
    })
    .unwrap();

    assert!(outcome.temporary);
    assert_eq!(parse(&seen)["package"]["version"].as_str(), Some("9.9.9"));
    assert_eq!(fs::read_to_string(&path).unwrap(), WORKSPACE_ROOT);
}

#[test]
fn temporary_bump_restores_after_failed_operation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, WORKSPACE_ROOT).unwrap();

    let options = BumpOptions {
        manifest_path: path.clone(),
        version: "9.9.9".parse().unwrap(),
        registry: None,
    };
    let err = run_temporary_bump(&options, &CargoSettings::default(), |_| -> stdtasks::Result<()> {
        Err(Error::internal_unexpected("publish failed"))
    })
    .unwrap_err();

    assert_eq!(err.code, ErrorCode::InternalUnexpected);
    assert_eq!(fs::read_to_string(&path).unwrap(), WORKSPACE_ROOT);
}

#[test]
fn unknown_registry_leaves_manifest_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, WORKSPACE_ROOT).unwrap();

    let options = BumpOptions {
        manifest_path: path.clone(),
        version: "2.0.0".parse().unwrap(),
        registry: Some("nowhere".to_string()),
    };
    let err = run_bump(&options, &CargoSettings::default()).unwrap_err();

    assert_eq!(err.code, ErrorCode::RegistryNotFound);
    assert_eq!(fs::read_to_string(&path).unwrap(), WORKSPACE_ROOT);
}

#[test]
fn read_is_strict_where_of_is_permissive() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    let content = "[dependencies]\nlog = \"0.4\"\n";
    fs::write(&path, content).unwrap();

    let err = CargoManifest::read(&path).unwrap_err();
    assert_eq!(err.code, ErrorCode::ManifestInvalid);

    let manifest = CargoManifest::of(&path, parse(content)).unwrap();
    assert!(manifest.package.is_none());
    assert!(manifest.workspace.is_none());
}

#[test]
fn bin_with_extra_keys_is_rejected() {
    let content = r#"
[package]
name = "app"

[[bin]]
name = "app"
path = "src/main.rs"
test = false
"#;
    let err = CargoManifest::of("Cargo.toml", parse(content)).unwrap_err();
    assert_eq!(err.code, ErrorCode::ManifestInvalidShape);
}

#[test]
fn package_without_name_is_missing_field() {
    let err = CargoManifest::of("Cargo.toml", parse("[package]\nversion = \"1.0.0\"\n")).unwrap_err();
    assert_eq!(err.code, ErrorCode::ManifestMissingField);
}

#[test]
fn member_manifests_follow_workspace_globs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, WORKSPACE_ROOT).unwrap();
    for member in ["core-lib", "cli"] {
        let member_dir = dir.path().join("crates").join(member);
        fs::create_dir_all(&member_dir).unwrap();
        fs::write(
            member_dir.join("Cargo.toml"),
            format!("[package]\nname = \"{}\"\nversion = \"1.4.0\"\n", member),
        )
        .unwrap();
    }
    fs::create_dir_all(dir.path().join("crates").join("notes")).unwrap();

    let members = CargoManifest::read(&path).unwrap().member_manifests().unwrap();

    assert_eq!(
        members,
        vec![
            dir.path().join("crates/cli/Cargo.toml"),
            dir.path().join("crates/core-lib/Cargo.toml"),
        ]
    );
}
