use anyhow::{Context, Result, bail};
use pnpm2npm_core::{ImporterManifest, LockGraph, lockfile, npm};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const RUSH_JSON: &str = "rush.json";
const RUSH_CONFIG_DIR: &str = "common/config/rush";
/// Rush runs pnpm in `common/temp`, so importer paths in its lockfile are
/// relative to that directory. This is the same directory seen from
/// `common/config/rush`.
const RUSH_TEMP_FROM_CONFIG: &str = "../../temp";

/// The fields of `package.json` that end up in `package-lock.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug)]
pub struct Project {
    /// Directory `package-lock.json` describes: workspace paths in the
    /// output are relative to it.
    pub root: PathBuf,
    pub lockfile_path: PathBuf,
    /// Where pnpm ran, relative to `root`, when that is not `root` itself.
    pub importer_base: Option<&'static str>,
}

impl Project {
    /// Walks up from `start` to the nearest directory holding a pnpm lockfile.
    pub fn discover(start: &Path) -> Result<Self> {
        let mut current = Some(start);

        while let Some(dir) = current {
            let candidate = dir.join(lockfile::FILE_NAME);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "found pnpm lockfile");
                return Self::from_lockfile_path(candidate);
            }
            current = dir.parent();
        }

        bail!(
            "No {} found in {} or any parent directory",
            lockfile::FILE_NAME,
            start.display()
        )
    }

    /// `path` is either the lockfile itself or a directory containing one.
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.is_dir() {
            let candidate = path.join(lockfile::FILE_NAME);
            if !candidate.is_file() {
                bail!("No {} found in {}", lockfile::FILE_NAME, path.display());
            }
            return Self::from_lockfile_path(candidate);
        }

        if !path.is_file() {
            bail!("{} does not exist", path.display());
        }

        Self::from_lockfile_path(path.to_path_buf())
    }

    pub fn rush(repo_root: &Path) -> Result<Self> {
        if !repo_root.join(RUSH_JSON).is_file() || !repo_root.join(RUSH_CONFIG_DIR).is_dir() {
            bail!("This command must be run in a Rush repo root");
        }

        let lockfile_path = repo_root.join(RUSH_CONFIG_DIR).join(lockfile::FILE_NAME);
        if !lockfile_path.is_file() {
            bail!("No {} found in {}", lockfile::FILE_NAME, RUSH_CONFIG_DIR);
        }

        Ok(Project {
            root: repo_root.join(RUSH_CONFIG_DIR),
            lockfile_path,
            importer_base: Some(RUSH_TEMP_FROM_CONFIG),
        })
    }

    fn from_lockfile_path(path: PathBuf) -> Result<Self> {
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .with_context(|| format!("{} has no parent directory", path.display()))?;

        Ok(Project {
            root,
            lockfile_path: path,
            importer_base: None,
        })
    }

    pub fn read_lockfile(&self) -> Result<String> {
        fs::read_to_string(&self.lockfile_path)
            .with_context(|| format!("Failed to read {}", self.lockfile_path.display()))
    }

    /// `package-lock.json` next to the source lockfile.
    pub fn default_output(&self) -> PathBuf {
        self.lockfile_path.with_file_name(npm::FILE_NAME)
    }

    /// Rewrites workspace paths so they are relative to `root`.
    pub fn relocate(&self, graph: &mut LockGraph) {
        if let Some(base) = self.importer_base {
            debug!(base, "rebasing workspace paths");
            graph.rebase(base);
        }
    }

    /// Names and versions of every importer that has a `package.json`.
    pub fn importer_manifests(
        &self,
        graph: &LockGraph,
    ) -> Result<BTreeMap<String, ImporterManifest>> {
        let mut manifests = BTreeMap::new();

        for importer in &graph.importers {
            let path = self.root.join(&importer.location).join("package.json");
            if !path.is_file() {
                debug!(importer = %importer.location, "no package.json for importer");
                continue;
            }

            let manifest = read_manifest(&path)?;
            manifests.insert(
                importer.location.clone(),
                ImporterManifest {
                    name: manifest.name,
                    version: manifest.version,
                },
            );
        }

        Ok(manifests)
    }
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&data).with_context(|| format!("Failed to parse JSON in {}", path.display()))
}
