use crate::common::{pnpm2npm_command, read_json, run, unmet_peer_lockfile, write};
use tempfile::tempdir;

#[test]
fn refuses_to_run_outside_a_rush_repo() {
    let dir = tempdir().unwrap();

    let (output, _stdout, stderr) = run(pnpm2npm_command(dir.path()).arg("rush"));
    assert!(!output.status.success());
    assert!(
        stderr.contains("This command must be run in a Rush repo root"),
        "got: {stderr}"
    );
}

#[test]
fn converts_the_common_lockfile() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("rush.json"), "{}");
    write(
        &dir.path().join("common/config/rush/pnpm-lock.yaml"),
        &unmet_peer_lockfile(),
    );

    let (output, _stdout, stderr) = run(pnpm2npm_command(dir.path()).arg("rush"));
    assert!(output.status.success(), "rush failed: {stderr}");
    assert!(stderr.contains("available in"), "got: {stderr}");

    let lock = read_json(&dir.path().join("common/config/rush/package-lock.json"));
    assert_eq!(lock["packages"]["node_modules/plugin"]["version"], "1.0.0");
    assert_eq!(
        lock["packages"]["node_modules/plugin"]["peerDependencies"]["host"],
        "^2.0.0"
    );
}

#[test]
fn workspace_paths_are_relative_to_the_written_lockfile() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("rush.json"), "{}");
    write(
        &dir.path().join("common/config/rush/pnpm-lock.yaml"),
        r#"lockfileVersion: '6.0'

importers:

  .: {}

  ../../apps/app:
    dependencies:
      '@acme/lib':
        specifier: workspace:*
        version: link:../../libraries/lib

  ../../libraries/lib: {}
"#,
    );
    write(
        &dir.path().join("apps/app/package.json"),
        r#"{ "name": "app", "version": "1.0.0" }"#,
    );
    write(
        &dir.path().join("libraries/lib/package.json"),
        r#"{ "name": "@acme/lib", "version": "0.2.0" }"#,
    );

    let (output, _stdout, stderr) = run(pnpm2npm_command(dir.path()).arg("rush"));
    assert!(output.status.success(), "rush failed: {stderr}");

    let lock = read_json(&dir.path().join("common/config/rush/package-lock.json"));
    let packages = &lock["packages"];
    assert_eq!(packages[""]["workspaces"][0], "../../../apps/app");
    assert_eq!(packages["../../../apps/app"]["version"], "1.0.0");
    assert_eq!(packages["../../../libraries/lib"]["name"], "@acme/lib");
    assert_eq!(packages["node_modules/@acme/lib"]["link"], true);
    assert_eq!(
        packages["node_modules/@acme/lib"]["resolved"],
        "../../../libraries/lib"
    );
}
