//! Serde shapes of `pnpm-lock.yaml`, covering lockfile versions 5, 6 and 9.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// A YAML scalar read as text. Hand-edited lockfiles sometimes leave
/// numbers like `specifier: 1` unquoted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scalar(pub String);

impl Scalar {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Any {
            Str(String),
            Int(i64),
            Float(f64),
            Bool(bool),
        }

        Ok(match Any::deserialize(deserializer)? {
            Any::Str(value) => Scalar(value),
            Any::Int(value) => Scalar(value.to_string()),
            Any::Float(value) => Scalar(value.to_string()),
            Any::Bool(value) => Scalar(value.to_string()),
        })
    }
}

pub type ScalarMap = IndexMap<String, Scalar>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLockfile {
    pub lockfile_version: Option<Scalar>,
    #[serde(default)]
    pub importers: Option<IndexMap<String, RawImporter>>,
    // Single-project lockfiles keep the root importer at the top level.
    #[serde(default)]
    pub specifiers: ScalarMap,
    #[serde(default)]
    pub dependencies: IndexMap<String, RawReference>,
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, RawReference>,
    #[serde(default)]
    pub optional_dependencies: IndexMap<String, RawReference>,
    #[serde(default)]
    pub packages: IndexMap<String, RawPackage>,
    #[serde(default)]
    pub snapshots: IndexMap<String, RawSnapshot>,
}

impl RawLockfile {
    pub fn take_root_importer(&mut self) -> RawImporter {
        RawImporter {
            specifiers: std::mem::take(&mut self.specifiers),
            dependencies: std::mem::take(&mut self.dependencies),
            dev_dependencies: std::mem::take(&mut self.dev_dependencies),
            optional_dependencies: std::mem::take(&mut self.optional_dependencies),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImporter {
    #[serde(default)]
    pub specifiers: ScalarMap,
    #[serde(default)]
    pub dependencies: IndexMap<String, RawReference>,
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, RawReference>,
    #[serde(default)]
    pub optional_dependencies: IndexMap<String, RawReference>,
}

/// `name: 1.0.0` (v5) or `name: { specifier: ^1.0.0, version: 1.0.0 }` (v6+).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawReference {
    Inline { specifier: Scalar, version: Scalar },
    Bare(Scalar),
}

impl RawReference {
    pub fn version(&self) -> &str {
        match self {
            RawReference::Inline { version, .. } => version.as_str(),
            RawReference::Bare(version) => version.as_str(),
        }
    }

    pub fn specifier(&self) -> Option<&str> {
        match self {
            RawReference::Inline { specifier, .. } => Some(specifier.as_str()),
            RawReference::Bare(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPackage {
    #[serde(default)]
    pub resolution: Option<RawResolution>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<Scalar>,
    #[serde(default)]
    pub dependencies: ScalarMap,
    #[serde(default)]
    pub optional_dependencies: ScalarMap,
    #[serde(default)]
    pub peer_dependencies: ScalarMap,
    #[serde(default)]
    pub peer_dependencies_meta: IndexMap<String, RawPeerMeta>,
    #[serde(default)]
    pub os: Vec<String>,
    #[serde(default)]
    pub cpu: Vec<String>,
    #[serde(default)]
    pub engines: ScalarMap,
    #[serde(default)]
    pub requires_build: bool,
    #[serde(default)]
    pub has_bin: bool,
    #[serde(default)]
    pub deprecated: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    #[serde(default)]
    pub dependencies: ScalarMap,
    #[serde(default)]
    pub optional_dependencies: ScalarMap,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPeerMeta {
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawResolution {
    #[serde(default)]
    pub integrity: Option<String>,
    #[serde(default)]
    pub tarball: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
}
