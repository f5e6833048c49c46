use crate::graph::{PackageId, Resolution};
use std::collections::BTreeMap;

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

/// Registries used to spell out `resolved` URLs for packages that pnpm only
/// records by integrity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    pub default: String,
    /// `@scope` → registry URL.
    pub scoped: BTreeMap<String, String>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry {
            default: DEFAULT_REGISTRY.to_string(),
            scoped: BTreeMap::new(),
        }
    }
}

impl Registry {
    pub fn for_package(&self, name: &str) -> &str {
        if let Some((scope, _)) = name.split_once('/')
            && scope.starts_with('@')
            && let Some(url) = self.scoped.get(scope)
        {
            return url;
        }

        &self.default
    }

    pub fn tarball_url(&self, id: &PackageId) -> String {
        let base = self.for_package(&id.name).trim_end_matches('/');
        let basename = id.name.rsplit('/').next().unwrap_or(&id.name);
        format!("{}/{}/-/{}-{}.tgz", base, id.name, basename, id.version)
    }

    /// The `resolved` field npm expects for a package with this resolution.
    pub fn resolved(&self, id: &PackageId, resolution: &Resolution) -> String {
        match resolution {
            Resolution::Registry { .. } => self.tarball_url(id),
            Resolution::Tarball { tarball, .. } => tarball.clone(),
            Resolution::Git { repo, commit } => {
                if repo.starts_with("git+") {
                    format!("{repo}#{commit}")
                } else {
                    format!("git+{repo}#{commit}")
                }
            }
            Resolution::Directory { directory } => format!("file:{directory}"),
        }
    }
}
