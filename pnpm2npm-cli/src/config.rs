use directories::BaseDirs;
use pnpm2npm_core::Registry;
use pnpm2npm_core::convert::DEFAULT_MAX_DEPTH;
use pnpm2npm_core::registry::DEFAULT_REGISTRY;
use std::collections::BTreeMap;
use std::{env, fs, path::Path};
use tracing::debug;

const RC_FILES: [&str; 2] = [".npmrc", ".pnpmrc"];

#[derive(Debug, Clone)]
pub struct Config {
    pub default_registry: String,
    pub scoped_registries: BTreeMap<String, String>,
    pub max_depth: usize,
}

impl Config {
    /// Configuration for converting the lockfile in `project_dir`.
    pub fn from_env(project_dir: &Path) -> Self {
        let (default_registry, scoped_registries) = read_registry_config(project_dir);
        let max_depth = parse_max_depth(env::var("PNPM2NPM_MAX_DEPTH").ok().as_deref());

        debug!(
            registry = %default_registry,
            scoped = scoped_registries.len(),
            max_depth,
            "loaded configuration"
        );

        Config {
            default_registry,
            scoped_registries,
            max_depth,
        }
    }

    pub fn registry(&self) -> Registry {
        Registry {
            default: self.default_registry.clone(),
            scoped: self.scoped_registries.clone(),
        }
    }
}

fn parse_max_depth(value: Option<&str>) -> usize {
    let Some(value) = value else {
        return DEFAULT_MAX_DEPTH;
    };

    match value.trim().parse::<usize>() {
        Ok(parsed) if parsed > 0 => parsed,
        _ => {
            debug!(value, "ignoring invalid PNPM2NPM_MAX_DEPTH");
            DEFAULT_MAX_DEPTH
        }
    }
}

fn read_registry_config(project_dir: &Path) -> (String, BTreeMap<String, String>) {
    let mut default_registry = DEFAULT_REGISTRY.to_string();
    let mut scoped = BTreeMap::new();

    // 1) Global rc files in the user's home directory.
    if let Some(base) = BaseDirs::new() {
        let home = base.home_dir();
        for rc_name in RC_FILES {
            apply_rc_file(&home.join(rc_name), &mut default_registry, &mut scoped);
        }
    }

    // 2) Rc files from the filesystem root down to the project.
    apply_project_rc_files(project_dir, &mut default_registry, &mut scoped);

    // 3) Env overrides the default registry (npm-compatible).
    if let Ok(value) = env::var("NPM_CONFIG_REGISTRY").or_else(|_| env::var("npm_config_registry"))
    {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            default_registry = trimmed.to_string();
        }
    }

    (default_registry, scoped)
}

/// Applies the rc files of `dir` and all its ancestors, outermost first, so
/// the file nearest to the project wins.
fn apply_project_rc_files(
    dir: &Path,
    default_registry: &mut String,
    scoped: &mut BTreeMap<String, String>,
) {
    let directories: Vec<&Path> = dir.ancestors().collect();

    for directory in directories.into_iter().rev() {
        for rc_name in RC_FILES {
            apply_rc_file(&directory.join(rc_name), default_registry, scoped);
        }
    }
}

fn apply_rc_file(
    path: &Path,
    default_registry: &mut String,
    scoped: &mut BTreeMap<String, String>,
) {
    if !path.is_file() {
        return;
    }

    let Ok(data) = fs::read_to_string(path) else {
        return;
    };

    debug!(path = %path.display(), "reading rc file");

    for line in data.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };

        let key = key.trim();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        if key == "registry" {
            *default_registry = value.to_string();
        } else if let Some(scope) = key.strip_suffix(":registry") {
            let scope = scope.trim();
            if scope.starts_with('@') {
                scoped.insert(scope.to_string(), value.to_string());
            }
        }
    }
}
