//! Lays a parsed pnpm graph out as an npm `node_modules` tree.

mod tree;

pub use tree::Flags;

use crate::graph::{DependencyKind, DependencyTarget, Edge, Importer, LockGraph, PackageId, Specifier};
use crate::npm::{self, InstallEntry, NpmLockfile, PeerDependencyMeta};
use crate::registry::Registry;
use crate::{Result, location};
use std::collections::BTreeMap;
use thiserror::Error;
use tree::{Placement, Tree};

/// Nesting depth past which a chain of hard dependencies is treated as a
/// cycle that cannot be laid out.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Name and version from an importer's `package.json`. pnpm does not record
/// them in the lockfile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImporterManifest {
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Keyed by importer location (`""` for the root).
    pub importers: BTreeMap<String, ImporterManifest>,
    pub registry: Registry,
    pub max_depth: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            importers: BTreeMap::new(),
            registry: Registry::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug)]
pub struct Conversion {
    pub lockfile: NpmLockfile,
    pub warnings: Vec<ConvertWarning>,
}

/// Problems that leave the output usable but not a faithful copy of the
/// pnpm graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertWarning {
    #[error(
        "{dependent} at {} has unmet peer {peer}@{range}{}",
        display_location(.location),
        found_suffix(.found)
    )]
    UnresolvedPeerDependency {
        dependent: String,
        location: String,
        peer: String,
        range: String,
        found: Option<String>,
    },

    #[error("Cannot place {wanted} at {location}: already taken by {existing}")]
    PlacementConflict {
        location: String,
        wanted: String,
        existing: String,
    },

    #[error(
        "Skipped {name} below {}: dependency chain deeper than {depth} levels",
        display_location(.location)
    )]
    DepthLimitExceeded {
        location: String,
        name: String,
        depth: usize,
    },
}

fn display_location(location: &str) -> &str {
    if location.is_empty() { "the root" } else { location }
}

fn found_suffix(found: &Option<String>) -> String {
    match found {
        Some(found) => format!(" (found {found})"),
        None => String::new(),
    }
}

pub fn convert(graph: &LockGraph, options: &ConvertOptions) -> Result<Conversion> {
    let mut tree = Tree::new(graph, options.max_depth);
    tree.seed(&graph.importers);
    tree.run()?;

    let (placements, warnings) = tree.finish();
    let lockfile = emit(graph, options, &placements);

    Ok(Conversion { lockfile, warnings })
}

fn emit(
    graph: &LockGraph,
    options: &ConvertOptions,
    placements: &BTreeMap<String, Placement<'_>>,
) -> NpmLockfile {
    let mut packages = BTreeMap::new();

    let mut link_names: BTreeMap<&str, &str> = BTreeMap::new();
    for (location, placement) in placements {
        if let DependencyTarget::Link(path) = placement.occupant
            && let Some(name) = npm::installed_name(location)
        {
            link_names.entry(path.as_str()).or_insert(name);
        }
    }

    let workspaces: Vec<String> = graph
        .importers
        .iter()
        .filter(|importer| !importer.is_root())
        .map(|importer| importer.location.clone())
        .collect();

    for importer in &graph.importers {
        let manifest = options.importers.get(&importer.location);
        let mut entry = importer_entry(importer, manifest);

        if entry.name.is_none() && !importer.is_root() {
            entry.name = link_names
                .get(importer.location.as_str())
                .map(|name| name.to_string());
        }
        if importer.is_root() {
            entry.workspaces = workspaces.clone();
        }

        packages.insert(importer.location.clone(), entry);
    }

    for (location, placement) in placements {
        packages.insert(
            location.clone(),
            placed_entry(graph, &options.registry, location, placement),
        );
    }

    // Workspace members are reachable by name from anywhere in the tree,
    // whether or not another member depends on them.
    for importer in graph.importers.iter().filter(|importer| !importer.is_root()) {
        let Some(name) = options
            .importers
            .get(&importer.location)
            .and_then(|manifest| manifest.name.as_deref())
        else {
            continue;
        };

        packages
            .entry(location::child("", name))
            .or_insert_with(|| InstallEntry {
                resolved: Some(importer.location.clone()),
                link: true,
                ..Default::default()
            });
    }

    let root = options.importers.get("");
    NpmLockfile {
        name: root.and_then(|manifest| manifest.name.clone()),
        version: root.and_then(|manifest| manifest.version.clone()),
        lockfile_version: npm::LOCKFILE_VERSION,
        requires: true,
        packages,
    }
}

fn importer_entry(importer: &Importer, manifest: Option<&ImporterManifest>) -> InstallEntry {
    InstallEntry {
        name: manifest.and_then(|manifest| manifest.name.clone()),
        version: manifest.and_then(|manifest| manifest.version.clone()),
        dependencies: requested(&importer.dependencies),
        dev_dependencies: requested(&importer.dev_dependencies),
        optional_dependencies: requested(&importer.optional_dependencies),
        ..Default::default()
    }
}

fn requested(specifiers: &[Specifier]) -> BTreeMap<String, String> {
    specifiers
        .iter()
        .map(|specifier| (specifier.name.clone(), specifier.requested.clone()))
        .collect()
}

fn placed_entry(
    graph: &LockGraph,
    registry: &Registry,
    location: &str,
    placement: &Placement<'_>,
) -> InstallEntry {
    let flags = placement.flags;
    let mut entry = InstallEntry {
        dev: flags.dev,
        optional: flags.optional,
        dev_optional: flags.dev_optional(),
        peer: flags.peer,
        ..Default::default()
    };

    let id = match placement.occupant {
        DependencyTarget::Link(path) => {
            entry.resolved = Some(path.clone());
            entry.link = true;
            return entry;
        }
        DependencyTarget::Package(id) => id,
    };

    if npm::installed_name(location) != Some(id.name.as_str()) {
        entry.name = Some(id.name.clone());
    }
    entry.version = Some(id.version.clone());

    let Some(package) = graph.package(id) else {
        return entry;
    };

    entry.resolved = Some(registry.resolved(id, &package.resolution));
    entry.integrity = package.resolution.integrity().map(str::to_string);
    entry.has_install_script = package.requires_build;
    entry.dependencies = dependency_specs(package.edges_of(DependencyKind::Regular));
    entry.optional_dependencies = dependency_specs(package.edges_of(DependencyKind::Optional));
    entry.peer_dependencies = package
        .peer_dependencies
        .iter()
        .map(|(name, peer)| (name.clone(), peer.range.clone()))
        .collect();
    entry.peer_dependencies_meta = package
        .peer_dependencies
        .iter()
        .filter(|(_, peer)| peer.optional)
        .map(|(name, _)| (name.clone(), PeerDependencyMeta { optional: true }))
        .collect();
    entry.os = package.os.clone();
    entry.cpu = package.cpu.clone();
    entry.engines = package.engines.clone();
    entry.deprecated = package.deprecated.clone();

    entry
}

fn dependency_specs<'a>(edges: impl Iterator<Item = &'a Edge>) -> BTreeMap<String, String> {
    edges
        .map(|edge| (edge.name.clone(), dependency_spec(&edge.name, &edge.target)))
        .collect()
}

/// How a placed package refers to what it depends on: the exact version,
/// `npm:real@version` for aliases, `file:` for links.
fn dependency_spec(name: &str, target: &DependencyTarget) -> String {
    match target {
        DependencyTarget::Package(PackageId {
            name: real,
            version,
        }) if real != name => format!("npm:{real}@{version}"),
        DependencyTarget::Package(id) => id.version.clone(),
        DependencyTarget::Link(path) => format!("file:{path}"),
    }
}
