//! The `package-lock.json` document produced by the converter.

use serde::Serialize;
use std::collections::BTreeMap;

pub const FILE_NAME: &str = "package-lock.json";
pub const LOCKFILE_VERSION: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NpmLockfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub lockfile_version: u32,
    pub requires: bool,
    pub packages: BTreeMap<String, InstallEntry>,
}

impl NpmLockfile {
    pub fn entry(&self, location: &str) -> Option<&InstallEntry> {
        self.packages.get(location)
    }

    /// Every placement of the package called `name`, keyed by location.
    pub fn entries_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a InstallEntry)> + 'a {
        self.packages.iter().filter(move |(location, entry)| {
            entry.name.as_deref() == Some(name)
                || (entry.name.is_none() && installed_name(location) == Some(name))
        })
    }
}

/// The directory name a `node_modules` location installs into.
pub fn installed_name(location: &str) -> Option<&str> {
    let idx = location.rfind("node_modules/")?;
    Some(&location[idx + "node_modules/".len()..])
}

/// One row of `packages`, keyed by its placement path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub link: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub dev: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub dev_optional: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub peer: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub has_install_script: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_dependencies: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_dependencies: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_dependencies_meta: BTreeMap<String, PeerDependencyMeta>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub os: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cpu: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub engines: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeerDependencyMeta {
    pub optional: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}
