use crate::common::{
    pnpm2npm_command, read_json, run, unmet_peer_lockfile, workspace_lockfile, write,
};
use std::fs;
use tempfile::tempdir;

#[test]
fn converts_workspace_next_to_the_lockfile() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("pnpm-lock.yaml"), &workspace_lockfile());
    write(
        &dir.path().join("package.json"),
        r#"{ "name": "monorepo", "version": "1.0.0" }"#,
    );
    write(
        &dir.path().join("packages/lib/package.json"),
        r#"{ "name": "@acme/lib", "version": "0.3.0" }"#,
    );

    let (output, _stdout, stderr) = run(pnpm2npm_command(dir.path()).arg("convert"));
    assert!(output.status.success(), "convert failed: {stderr}");
    assert!(stderr.contains("package-lock.json SUCCESS"), "got: {stderr}");
    assert!(stderr.contains("pnpm-lock.yaml: "), "got: {stderr}");

    let lock = read_json(&dir.path().join("package-lock.json"));
    assert_eq!(lock["name"], "monorepo");
    assert_eq!(lock["lockfileVersion"], 3);
    assert_eq!(lock["requires"], true);

    let packages = &lock["packages"];
    assert_eq!(packages[""]["workspaces"][0], "packages/app");
    assert_eq!(packages["node_modules/b"]["version"], "1.0.0");
    assert_eq!(packages["node_modules/a/node_modules/b"]["version"], "2.0.0");
    assert_eq!(
        packages["node_modules/a"]["resolved"],
        "https://registry.npmjs.org/a/-/a-1.0.0.tgz"
    );
    assert_eq!(packages["node_modules/typescript"]["dev"], true);
    assert_eq!(packages["node_modules/typescript"]["engines"]["node"], ">=14.17");
    assert_eq!(packages["node_modules/@acme/lib"]["link"], true);
    assert_eq!(packages["node_modules/@acme/lib"]["resolved"], "packages/lib");
    assert_eq!(packages["packages/lib"]["version"], "0.3.0");
}

#[test]
fn discovers_lockfile_from_a_subdirectory() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("pnpm-lock.yaml"), &workspace_lockfile());
    let nested = dir.path().join("packages/app/src");
    fs::create_dir_all(&nested).unwrap();

    let (output, _stdout, stderr) = run(pnpm2npm_command(&nested).arg("convert"));
    assert!(output.status.success(), "convert failed: {stderr}");
    assert!(dir.path().join("package-lock.json").is_file());
}

#[test]
fn prints_to_stdout_without_writing() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("pnpm-lock.yaml"), &workspace_lockfile());

    let (output, stdout, stderr) =
        run(pnpm2npm_command(dir.path()).args(["convert", ".", "--stdout"]));
    assert!(output.status.success(), "convert failed: {stderr}");
    assert!(!dir.path().join("package-lock.json").exists());

    let lock: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(lock["packages"]["node_modules/a"]["version"], "1.0.0");
}

#[test]
fn writes_to_an_explicit_output_path() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("locks/pnpm-lock.yaml"), &workspace_lockfile());

    let (output, _stdout, stderr) = run(pnpm2npm_command(dir.path()).args([
        "convert",
        "locks/pnpm-lock.yaml",
        "--output",
        "out.json",
    ]));
    assert!(output.status.success(), "convert failed: {stderr}");
    assert!(dir.path().join("out.json").is_file());
    assert!(!dir.path().join("locks/package-lock.json").exists());
}

#[test]
fn uses_registry_from_npmrc() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("pnpm-lock.yaml"), &workspace_lockfile());
    write(
        &dir.path().join(".npmrc"),
        "registry=https://mirror.example/npm/\n",
    );

    let (output, stdout, stderr) = run(pnpm2npm_command(dir.path()).args(["convert", "--stdout"]));
    assert!(output.status.success(), "convert failed: {stderr}");

    let lock: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        lock["packages"]["node_modules/a"]["resolved"],
        "https://mirror.example/npm/a/-/a-1.0.0.tgz"
    );
}

#[test]
fn reads_npmrc_next_to_a_lockfile_outside_the_current_directory() {
    let dir = tempdir().unwrap();
    let project = dir.path().join("other/dir");
    write(&project.join("pnpm-lock.yaml"), &workspace_lockfile());
    write(&project.join(".npmrc"), "registry=https://project.example/\n");

    let (output, stdout, stderr) =
        run(pnpm2npm_command(dir.path()).args(["convert", "other/dir", "--stdout"]));
    assert!(output.status.success(), "convert failed: {stderr}");

    let lock: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        lock["packages"]["node_modules/a"]["resolved"],
        "https://project.example/a/-/a-1.0.0.tgz"
    );
}

#[test]
fn reports_unmet_peers_as_warnings() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("pnpm-lock.yaml"), &unmet_peer_lockfile());

    let (output, _stdout, stderr) = run(pnpm2npm_command(dir.path()).arg("convert"));
    assert!(output.status.success(), "convert failed: {stderr}");
    assert!(
        stderr.contains("warn plugin@1.0.0 at node_modules/plugin has unmet peer host@^2.0.0"),
        "got: {stderr}"
    );
}

#[test]
fn fails_on_malformed_lockfile() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("pnpm-lock.yaml"), "lockfileVersion: '4.0'\n");

    let (output, _stdout, stderr) = run(pnpm2npm_command(dir.path()).arg("convert"));
    assert!(!output.status.success());
    assert!(stderr.contains("Malformed pnpm lockfile"), "got: {stderr}");
    assert!(!dir.path().join("package-lock.json").exists());
}

#[test]
fn fails_without_a_lockfile() {
    let dir = tempdir().unwrap();

    let (output, _stdout, stderr) = run(pnpm2npm_command(dir.path()).arg("convert"));
    assert!(!output.status.success());
    assert!(stderr.contains("No pnpm-lock.yaml found"), "got: {stderr}");
}

#[test]
fn verbose_logs_configuration() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("pnpm-lock.yaml"), &workspace_lockfile());

    let (output, _stdout, stderr) = run(pnpm2npm_command(dir.path()).args(["-v", "convert"]));
    assert!(output.status.success(), "convert failed: {stderr}");
    assert!(stderr.contains("loaded configuration"), "got: {stderr}");
}
