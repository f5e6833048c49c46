#![allow(dead_code, unreachable_pub)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub const INTEGRITY: &str = "sha512-v2kDEe57lecTulaDIuNTPy3Ry4gLGJ6Z1O3vE1krgXZNrsQ+mqGKPoGj6rbrU5tQDe2XYJGAWXRN4aqjO5NUGg==";

/// Returns the pnpm2npm binary that cargo built before launching the tests.
pub fn get_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pnpm2npm"))
}

/// A `pnpm2npm` command running in `dir`, isolated from the user's rc files
/// and registry settings.
pub fn pnpm2npm_command(dir: &Path) -> Command {
    let mut command = Command::new(get_bin());
    command.current_dir(dir);
    command.env("HOME", dir);
    command.env("NO_COLOR", "1");
    command.env_remove("NPM_CONFIG_REGISTRY");
    command.env_remove("npm_config_registry");
    command.env_remove("PNPM2NPM_MAX_DEPTH");
    command.env_remove("RUST_LOG");
    command
}

pub fn run(command: &mut Command) -> (Output, String, String) {
    let output = command.output().expect("Failed to execute pnpm2npm");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output, stdout, stderr)
}

pub fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn read_json(path: &Path) -> serde_json::Value {
    let data = fs::read_to_string(path).unwrap();
    serde_json::from_str(&data).unwrap()
}

/// A two-member workspace where `a` needs a newer `b` than the app does.
pub fn workspace_lockfile() -> String {
    format!(
        r#"lockfileVersion: '9.0'

settings:
  autoInstallPeers: true
  excludeLinksFromLockfile: false

importers:

  .:
    dependencies:
      a:
        specifier: ^1.0.0
        version: 1.0.0
    devDependencies:
      typescript:
        specifier: ^5.4.0
        version: 5.4.5

  packages/app:
    dependencies:
      '@acme/lib':
        specifier: workspace:*
        version: link:../lib
      b:
        specifier: ^1.0.0
        version: 1.0.0

  packages/lib: {{}}

packages:

  a@1.0.0:
    resolution: {{integrity: {INTEGRITY}}}

  b@1.0.0:
    resolution: {{integrity: {INTEGRITY}}}

  b@2.0.0:
    resolution: {{integrity: {INTEGRITY}}}

  typescript@5.4.5:
    resolution: {{integrity: {INTEGRITY}}}
    engines: {{node: '>=14.17'}}
    hasBin: true

snapshots:

  a@1.0.0:
    dependencies:
      b: 2.0.0

  b@1.0.0: {{}}

  b@2.0.0: {{}}

  typescript@5.4.5: {{}}
"#
    )
}

/// A single project whose plugin has a peer nobody provides.
pub fn unmet_peer_lockfile() -> String {
    format!(
        r#"lockfileVersion: '6.0'

dependencies:
  plugin:
    specifier: ^1.0.0
    version: 1.0.0

packages:

  /plugin@1.0.0:
    resolution: {{integrity: {INTEGRITY}}}
    peerDependencies:
      host: ^2.0.0
    dev: false
"#
    )
}
