//! In-memory form of a parsed `pnpm-lock.yaml`.

use crate::location;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PackageId {
    pub name: String,
    pub version: String,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        PackageId {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// What a dependency edge points at.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum DependencyTarget {
    Package(PackageId),
    /// A workspace link, relative to the repository root.
    Link(String),
}

/// One dependency declared by an importer's manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Specifier {
    pub name: String,
    pub requested: String,
    pub target: DependencyTarget,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum DependencyKind {
    Regular,
    Optional,
    Peer,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    /// Name under which the dependency is installed. Differs from the
    /// target's package name for aliases.
    pub name: String,
    pub target: DependencyTarget,
    pub kind: DependencyKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerRequirement {
    pub range: String,
    pub optional: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Registry {
        integrity: String,
    },
    Tarball {
        tarball: String,
        integrity: Option<String>,
    },
    Git {
        repo: String,
        commit: String,
    },
    Directory {
        directory: String,
    },
}

impl Resolution {
    pub fn integrity(&self) -> Option<&str> {
        match self {
            Resolution::Registry { integrity } => Some(integrity),
            Resolution::Tarball { integrity, .. } => integrity.as_deref(),
            Resolution::Git { .. } | Resolution::Directory { .. } => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PackageNode {
    pub id: PackageId,
    pub resolution: Resolution,
    pub edges: Vec<Edge>,
    pub peer_dependencies: IndexMap<String, PeerRequirement>,
    pub os: Vec<String>,
    pub cpu: Vec<String>,
    pub engines: BTreeMap<String, String>,
    pub requires_build: bool,
    pub has_bin: bool,
    pub deprecated: Option<String>,
}

impl PackageNode {
    pub fn edges_of(&self, kind: DependencyKind) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }

    pub fn edge(&self, name: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.name == name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Importer {
    /// `""` for the repository root, otherwise the workspace member's path.
    pub location: String,
    pub dependencies: Vec<Specifier>,
    pub dev_dependencies: Vec<Specifier>,
    pub optional_dependencies: Vec<Specifier>,
}

impl Importer {
    pub fn is_root(&self) -> bool {
        self.location.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct LockGraph {
    pub lockfile_version: String,
    pub importers: Vec<Importer>,
    pub packages: BTreeMap<PackageId, PackageNode>,
}

impl LockGraph {
    pub fn package(&self, id: &PackageId) -> Option<&PackageNode> {
        self.packages.get(id)
    }

    /// Re-expresses every workspace path against another directory. `base`
    /// is the directory pnpm ran in, written relative to the new one. The
    /// root importer keeps its empty location.
    pub fn rebase(&mut self, base: &str) {
        let rebase_target = |target: &mut DependencyTarget| {
            if let DependencyTarget::Link(path) = target {
                *path = location::join(base, path);
            }
        };

        for importer in &mut self.importers {
            if !importer.is_root() {
                importer.location = location::join(base, &importer.location);
            }

            for specifier in importer
                .dependencies
                .iter_mut()
                .chain(importer.dev_dependencies.iter_mut())
                .chain(importer.optional_dependencies.iter_mut())
            {
                rebase_target(&mut specifier.target);
            }
        }

        for package in self.packages.values_mut() {
            for edge in &mut package.edges {
                rebase_target(&mut edge.target);
            }

            if let Resolution::Directory { directory } = &mut package.resolution {
                *directory = location::join(base, directory);
            }
        }
    }
}
